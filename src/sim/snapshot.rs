//! Read-only view of the simulation for renderers and tooling
//!
//! A snapshot copies out everything a presentation layer draws: wall flags,
//! tanks, live projectiles, power-ups, portal anchors and the round status.
//! It serializes to JSON for replays and headless inspection.

use glam::Vec2;
use serde::Serialize;

use super::maze::Walls;
use super::portal::{Polarity, PortalAnchor};
use super::projectile::ProjectileKind;
use super::state::{ActorId, GamePhase, GameState, PowerUp, PowerUpKind, RoundStatus, TankColor};

#[derive(Debug, Clone, Serialize)]
pub struct MazeView {
    pub rows: usize,
    pub cols: usize,
    pub cell_size: f32,
    pub wall_thickness: f32,
    /// Row-major
    pub walls: Vec<Walls>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActorView {
    pub id: ActorId,
    pub color: TankColor,
    pub pos: Vec2,
    pub angle: f32,
    pub turret_angle: f32,
    pub alive: bool,
    pub power_up: Option<PowerUpKind>,
    pub warping: bool,
    pub piloting: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    pub id: u32,
    pub owner: ActorId,
    pub kind: ProjectileKind,
    pub pos: Vec2,
    pub angle: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub round: RoundStatus,
    pub round_index: u32,
    pub maze: MazeView,
    pub actors: Vec<ActorView>,
    pub projectiles: Vec<ProjectileView>,
    pub power_ups: Vec<PowerUp>,
    pub portals: Vec<(Polarity, PortalAnchor)>,
}

impl GameState {
    pub fn snapshot(&self) -> Snapshot {
        let geometry = self.maze.geometry();
        let now = self.time_ticks;

        let actors = self
            .actors
            .iter()
            .map(|a| ActorView {
                id: a.id,
                color: a.color,
                pos: a.pos,
                angle: a.angle,
                turret_angle: a.turret_angle,
                alive: a.alive,
                power_up: a.power_up,
                warping: a.warp_field(now, &self.settings).is_some(),
                piloting: a.is_piloting(),
            })
            .collect();

        let projectiles = self
            .actors
            .iter()
            .flat_map(|a| a.projectiles.iter())
            .filter(|p| p.active)
            .map(|p| ProjectileView {
                id: p.id,
                owner: p.owner,
                kind: p.kind,
                pos: p.pos,
                angle: p.angle,
            })
            .collect();

        let portals = [Polarity::Blue, Polarity::Orange]
            .into_iter()
            .filter_map(|polarity| self.portals.get(polarity).map(|a| (polarity, *a)))
            .collect();

        Snapshot {
            tick: now,
            phase: self.phase,
            round: self.round,
            round_index: self.round_index,
            maze: MazeView {
                rows: self.maze.rows(),
                cols: self.maze.cols(),
                cell_size: geometry.cell_size,
                wall_thickness: geometry.wall_thickness,
                walls: self.maze.walls().collect(),
            },
            actors,
            projectiles,
            power_ups: self.power_ups.iter().filter(|p| p.active).cloned().collect(),
            portals,
        }
    }
}
