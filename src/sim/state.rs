//! Game state and round lifecycle
//!
//! Everything the simulation mutates lives in [`GameState`]. Given the same
//! seed, settings and per-tick inputs, the state evolves identically.

use std::fmt;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::actor::Actor;
use super::collision::circles_overlap;
use super::maze::{CellCoord, Maze, MazeGeometry};
use super::portal::{Polarity, PortalRegistry};
use super::projectile::ProjectileKind;
use crate::error::SimError;
use crate::settings::Settings;

/// Most tanks a match supports
pub const MAX_PLAYERS: usize = 4;

/// Attempts at finding a free cell before a power-up spawn is skipped
const POWERUP_PLACEMENT_ATTEMPTS: usize = 8;

/// Player slot (0-based); displays as `P1`..`P4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u8);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0 + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TankColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl TankColor {
    pub fn for_slot(id: ActorId) -> Self {
        match id.0 % 4 {
            0 => TankColor::Red,
            1 => TankColor::Blue,
            2 => TankColor::Green,
            _ => TankColor::Yellow,
        }
    }

    /// Packed 0xRRGGBB
    pub fn rgb(self) -> u32 {
        match self {
            TankColor::Red => 0xff5252,
            TankColor::Blue => 0x448aff,
            TankColor::Green => 0x4caf50,
            TankColor::Yellow => 0xffeb3b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    Homing,
    Ghost,
    Wireless,
    Portal,
    TimeWarp,
}

/// How a held power-up gets used up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumption {
    /// Spent by the next shot
    PerShot,
    /// Spent on the fire press that activates it; no shot is fired
    Activation,
    /// Spent after two shots (blue then orange)
    PairedShots,
}

impl PowerUpKind {
    pub fn consumption(self) -> Consumption {
        match self {
            PowerUpKind::Homing | PowerUpKind::Ghost | PowerUpKind::Wireless => {
                Consumption::PerShot
            }
            PowerUpKind::Portal => Consumption::PairedShots,
            PowerUpKind::TimeWarp => Consumption::Activation,
        }
    }
}

/// A collectible lying in the arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub pos: Vec2,
    pub kind: PowerUpKind,
    pub active: bool,
}

/// Read-only view of an actor, taken before actors update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    pub id: ActorId,
    pub pos: Vec2,
    pub alive: bool,
}

/// A running time-warp bubble
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpField {
    pub owner: ActorId,
    pub center: Vec2,
    pub radius: f32,
    /// Motion multiplier inside the bubble
    pub factor: f32,
}

/// Motion multiplier for something owned by `subject` at `pos`. Fields never
/// slow their owner; overlapping fields take the strongest slowdown.
pub fn time_scale_at(fields: &[WarpField], pos: Vec2, subject: ActorId) -> f32 {
    fields
        .iter()
        .filter(|f| f.owner != subject && pos.distance_squared(f.center) < f.radius * f.radius)
        .map(|f| f.factor)
        .fold(1.0, f32::min)
}

/// Top-level phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No match running; the maze is shown as a backdrop
    Menu,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Winner(ActorId),
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    Active,
    /// Outcome decided; a fresh round starts on tick `resume_at`
    Ended { outcome: RoundOutcome, resume_at: u64 },
}

/// Things that happened during one tick, in the order they happened
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimEvent {
    RoundStarted {
        round: u32,
    },
    PowerUpSpawned {
        id: u32,
        kind: PowerUpKind,
        pos: Vec2,
    },
    PowerUpCollected {
        actor: ActorId,
        kind: PowerUpKind,
    },
    ProjectileFired {
        owner: ActorId,
        projectile: u32,
        kind: ProjectileKind,
    },
    TimeWarpActivated {
        actor: ActorId,
        until: u64,
    },
    PortalPlaced {
        polarity: Polarity,
        pos: Vec2,
    },
    ProjectileTeleported {
        projectile: u32,
        from: Polarity,
    },
    ActorTeleported {
        actor: ActorId,
        from: Polarity,
    },
    ActorKilled {
        victim: ActorId,
        by: ActorId,
    },
    RoundEnded {
        outcome: RoundOutcome,
    },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Match seed for reproducibility
    pub seed: u64,
    /// Single random source for maze carving and power-up spawns
    rng: Pcg32,
    pub settings: Settings,
    pub phase: GamePhase,
    pub round: RoundStatus,
    /// Rounds started this match (1-based once playing)
    pub round_index: u32,
    pub player_count: usize,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub maze: Maze,
    /// Indexed by player slot
    pub actors: Vec<Actor>,
    pub power_ups: Vec<PowerUp>,
    pub portals: PortalRegistry,
    /// Tick on or after which the next power-up appears
    pub next_power_up_at: u64,
    /// Events raised by the most recent tick
    pub events: Vec<SimEvent>,
    /// Raised outside a tick (match start), delivered with the next tick's
    pub(crate) pending_events: Vec<SimEvent>,
    /// Next entity ID
    pub(crate) next_id: u32,
}

impl GameState {
    /// Create a state sitting on the menu, with a backdrop maze
    pub fn new(seed: u64, settings: Settings) -> Result<Self, SimError> {
        settings.validate()?;
        let mut rng = Pcg32::seed_from_u64(seed);
        let maze = Self::fresh_maze(&settings, &mut rng);
        Ok(Self {
            seed,
            rng,
            settings,
            phase: GamePhase::Menu,
            round: RoundStatus::Active,
            round_index: 0,
            player_count: 0,
            time_ticks: 0,
            maze,
            actors: Vec::new(),
            power_ups: Vec::new(),
            portals: PortalRegistry::new(),
            next_power_up_at: 0,
            events: Vec::new(),
            pending_events: Vec::new(),
            next_id: 1,
        })
    }

    fn fresh_maze(settings: &Settings, rng: &mut Pcg32) -> Maze {
        let arena = &settings.arena;
        let geometry = MazeGeometry {
            cell_size: arena.cell_size,
            wall_thickness: arena.wall_thickness,
        };
        Maze::generate(arena.rows, arena.cols, geometry, rng)
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Begin a match with `player_count` tanks (2 to 4)
    pub fn start_game(&mut self, player_count: usize) -> Result<(), SimError> {
        if !(2..=MAX_PLAYERS).contains(&player_count) {
            return Err(SimError::InvalidPlayerCount(player_count));
        }
        self.player_count = player_count;
        self.round_index = 0;
        self.phase = GamePhase::Playing;
        log::info!("Starting {}-player match (seed {})", player_count, self.seed);
        self.events.clear();
        self.pending_events.clear();
        self.init_round();
        self.pending_events.append(&mut self.events);
        Ok(())
    }

    /// Drop the current match and go back to the menu
    pub fn return_to_menu(&mut self) {
        self.phase = GamePhase::Menu;
        self.round = RoundStatus::Active;
        self.actors.clear();
        self.power_ups.clear();
        self.portals.clear();
        self.events.clear();
        self.pending_events.clear();
        log::info!("Returned to menu");
    }

    /// Fresh maze, tanks back at their spawn corners, no projectiles,
    /// power-ups or portals, and a new power-up timer.
    pub fn init_round(&mut self) {
        self.maze = Self::fresh_maze(&self.settings, &mut self.rng);
        self.power_ups.clear();
        self.portals.clear();
        self.round = RoundStatus::Active;
        self.round_index += 1;

        let spawns = spawn_points(&self.maze);
        self.actors = spawns
            .iter()
            .take(self.player_count)
            .enumerate()
            .map(|(slot, &(pos, angle))| Actor::new(ActorId(slot as u8), pos, angle))
            .collect();

        self.schedule_next_power_up();
        self.events.push(SimEvent::RoundStarted {
            round: self.round_index,
        });
        log::info!("Round {} started", self.round_index);
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    pub fn alive_count(&self) -> usize {
        self.actors.iter().filter(|a| a.alive).count()
    }

    pub fn schedule_next_power_up(&mut self) {
        let tuning = &self.settings.power_up;
        let delay = self
            .rng
            .random_range(tuning.spawn_min_ticks..=tuning.spawn_max_ticks);
        self.next_power_up_at = self.time_ticks + delay;
    }

    /// Drop a power-up in the centre of a random cell that has no live tank
    /// or power-up on it, then schedule the next one.
    pub fn spawn_power_up(&mut self) {
        self.schedule_next_power_up();

        let pool_len = self.settings.power_up.pool.len();
        if pool_len == 0 {
            log::debug!("Power-up pool is empty, skipping spawn");
            return;
        }

        let Some(pos) = self.free_power_up_spot() else {
            log::debug!("No free cell for a power-up");
            return;
        };
        let kind = self.settings.power_up.pool[self.rng.random_range(0..pool_len)];
        let id = self.next_entity_id();
        self.power_ups.push(PowerUp {
            id,
            pos,
            kind,
            active: true,
        });
        self.events.push(SimEvent::PowerUpSpawned { id, kind, pos });
        log::debug!("Spawned {:?} power-up at {:?}", kind, pos);
    }

    fn free_power_up_spot(&mut self) -> Option<Vec2> {
        let reach = self.settings.tank.radius() + self.settings.power_up.size / 2.0;
        for _ in 0..POWERUP_PLACEMENT_ATTEMPTS {
            let coord = CellCoord::new(
                self.rng.random_range(0..self.maze.rows()),
                self.rng.random_range(0..self.maze.cols()),
            );
            let pos = self.maze.cell_center(coord);
            let tank_near = self
                .actors
                .iter()
                .any(|a| a.alive && circles_overlap(a.pos, reach, pos, 0.0));
            let taken = self
                .power_ups
                .iter()
                .any(|p| p.active && self.maze.cell_of(p.pos) == Some(coord));
            if !tank_near && !taken {
                return Some(pos);
            }
        }
        None
    }
}

/// Spawn corners in slot order: top-left, bottom-right, top-right, bottom-left
pub fn spawn_points(maze: &Maze) -> [(Vec2, f32); MAX_PLAYERS] {
    use std::f32::consts::{FRAC_PI_2, PI};
    let half = maze.cell_size() / 2.0;
    let (w, h) = (maze.width(), maze.height());
    [
        (Vec2::new(half, half), 0.0),
        (Vec2::new(w - half, h - half), PI),
        (Vec2::new(w - half, half), FRAC_PI_2),
        (Vec2::new(half, h - half), -FRAC_PI_2),
    ]
}
