//! Tanks: driving, firing, power-up use and remote piloting
//!
//! An actor owns its projectiles. Each tick it prunes dead ones, drives (or
//! hands its controls to a piloted projectile), fires, and then advances
//! every projectile it still owns.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{crossing_contacts, disc_blocked};
use super::maze::Maze;
use super::portal::{Polarity, PortalRegistry};
use super::projectile::{Projectile, ProjectileEnv, ProjectileKind};
use super::state::{
    ActorId, Consumption, PowerUpKind, SimEvent, TankColor, TargetView, WarpField, time_scale_at,
};
use crate::settings::{CollisionTier, Settings};
use crate::{angle_of, normalize_angle, polar_to_cartesian, steer_toward};

/// Digital direction keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// One player's controls for one tick.
///
/// A non-zero `stick` takes priority over `keys`. The stick's length (capped
/// at 1) scales drive speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlInput {
    pub stick: Vec2,
    pub keys: DirectionKeys,
    pub fire: bool,
}

impl ControlInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn with_stick(stick: Vec2, fire: bool) -> Self {
        Self {
            stick,
            fire,
            ..Self::default()
        }
    }
}

/// An actor steering one of its own projectiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteLink {
    pub projectile: u32,
    pub until: u64,
}

/// World access for one actor's update
pub struct ActorEnv<'a> {
    pub maze: &'a Maze,
    pub settings: &'a Settings,
    pub targets: &'a [TargetView],
    pub warp_fields: &'a [WarpField],
    pub portals: &'a mut PortalRegistry,
    pub events: &'a mut Vec<SimEvent>,
    pub next_id: &'a mut u32,
    pub now: u64,
}

impl ActorEnv<'_> {
    fn next_entity_id(&mut self) -> u32 {
        let id = *self.next_id;
        *self.next_id += 1;
        id
    }
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub id: ActorId,
    pub color: TankColor,
    pub pos: Vec2,
    /// Hull heading
    pub angle: f32,
    pub turret_angle: f32,
    pub alive: bool,
    pub power_up: Option<PowerUpKind>,
    /// Polarity the next portal shot will place
    pub portal_next: Polarity,
    /// Last tick of an active time-warp field
    pub warp_until: Option<u64>,
    pub remote: Option<RemoteLink>,
    pub last_shot: Option<u64>,
    pub teleport_ready_at: u64,
    pub projectiles: Vec<Projectile>,
}

impl Actor {
    pub fn new(id: ActorId, pos: Vec2, angle: f32) -> Self {
        Self {
            id,
            color: TankColor::for_slot(id),
            pos,
            angle,
            turret_angle: angle,
            alive: true,
            power_up: None,
            portal_next: Polarity::Blue,
            warp_until: None,
            remote: None,
            last_shot: None,
            teleport_ready_at: 0,
            projectiles: Vec::new(),
        }
    }

    pub fn active_projectiles(&self) -> usize {
        self.projectiles.iter().filter(|p| p.active).count()
    }

    pub fn is_piloting(&self) -> bool {
        self.remote.is_some()
    }

    /// The time-warp field this actor projects, if one is running
    pub fn warp_field(&self, now: u64, settings: &Settings) -> Option<WarpField> {
        let until = self.warp_until?;
        (self.alive && now <= until).then(|| WarpField {
            owner: self.id,
            center: self.pos,
            radius: settings.power_up.warp_radius,
            factor: settings.power_up.warp_factor,
        })
    }

    pub fn target_view(&self) -> TargetView {
        TargetView {
            id: self.id,
            pos: self.pos,
            alive: self.alive,
        }
    }

    /// Give the actor a power-up, replacing whatever it held
    pub fn grant(&mut self, kind: PowerUpKind) {
        self.power_up = Some(kind);
        self.portal_next = Polarity::Blue;
    }

    /// Advance one tick. Projectiles of dead actors keep flying.
    pub fn update(&mut self, input: &ControlInput, env: &mut ActorEnv) {
        self.projectiles.retain(|p| p.active);

        if self.alive {
            let piloting = self.refresh_remote_link(env.now);
            if !piloting {
                self.drive(input, env);
                self.try_teleport(env);
                self.try_fire(input, env);
            }
        } else {
            self.remote = None;
        }

        self.update_projectiles(input, env);

        if let Some(link) = self.remote {
            let still_flying = self
                .projectiles
                .iter()
                .any(|p| p.id == link.projectile && p.active);
            if !still_flying {
                self.release_remote();
            }
        }
    }

    /// Drop the remote link once it runs out of time or its projectile is
    /// gone. Returns whether the actor is still piloting.
    fn refresh_remote_link(&mut self, now: u64) -> bool {
        let Some(link) = self.remote else {
            return false;
        };
        let flying = self
            .projectiles
            .iter()
            .any(|p| p.id == link.projectile && p.active);
        if flying && now < link.until {
            return true;
        }
        self.release_remote();
        false
    }

    fn release_remote(&mut self) {
        self.remote = None;
        log::debug!("{} released remote control", self.id);
    }

    fn drive(&mut self, input: &ControlInput, env: &ActorEnv) {
        let tank = &env.settings.tank;
        let mut step = Vec2::ZERO;

        if input.stick != Vec2::ZERO {
            let desired = angle_of(input.stick);
            self.angle = normalize_angle(steer_toward(self.angle, desired, tank.stick_turn));
            let throttle = input.stick.length().min(1.0);
            step = polar_to_cartesian(tank.speed * throttle, self.angle);
        } else {
            if input.keys.left {
                self.angle -= tank.rot_speed;
            }
            if input.keys.right {
                self.angle += tank.rot_speed;
            }
            self.angle = normalize_angle(self.angle);
            if input.keys.up {
                step = polar_to_cartesian(tank.speed, self.angle);
            }
            if input.keys.down {
                step = -polar_to_cartesian(tank.speed * tank.reverse_factor, self.angle);
            }
        }
        self.turret_angle = self.angle;

        let step = step * time_scale_at(env.warp_fields, self.pos, self.id);
        self.pos = slide_move(
            env.maze,
            env.settings.arena.collision_tier,
            self.pos,
            step,
            tank.radius(),
        );
    }

    fn try_teleport(&mut self, env: &mut ActorEnv) {
        if env.now < self.teleport_ready_at {
            return;
        }
        let portal = &env.settings.portal;
        let Some(exit) = env
            .portals
            .exit_for(self.pos, portal.tank_capture, portal.tank_clearance)
        else {
            return;
        };
        let radius = env.settings.tank.radius();
        if disc_blocked(env.maze, exit.pos, radius, env.settings.arena.collision_tier) {
            return;
        }

        self.pos = exit.pos;
        self.angle = angle_of(exit.direction);
        self.turret_angle = self.angle;
        self.teleport_ready_at = env.now + portal.teleport_cooldown_ticks;
        env.events.push(SimEvent::ActorTeleported {
            actor: self.id,
            from: exit.from,
        });
        log::debug!("{} teleported via {:?}", self.id, exit.from);
    }

    fn try_fire(&mut self, input: &ControlInput, env: &mut ActorEnv) {
        if !input.fire {
            return;
        }
        let settings = env.settings;
        let tank = &settings.tank;
        if let Some(last) = self.last_shot {
            if env.now.saturating_sub(last) <= tank.shoot_delay_ticks {
                return;
            }
        }

        if let Some(held) = self.power_up {
            if held.consumption() == Consumption::Activation {
                self.activate(held, env);
                return;
            }
        }

        if self.active_projectiles() >= tank.max_active_projectiles {
            return;
        }

        let kind = match self.power_up {
            None => ProjectileKind::Normal,
            Some(PowerUpKind::Homing) => ProjectileKind::Homing,
            Some(PowerUpKind::Ghost) => ProjectileKind::Ghost,
            Some(PowerUpKind::Wireless) => ProjectileKind::Wireless,
            Some(PowerUpKind::Portal) => ProjectileKind::Portal(self.portal_next),
            Some(PowerUpKind::TimeWarp) => return,
        };

        let id = env.next_entity_id();
        let muzzle = self.muzzle(kind, env.maze, settings);
        let speed = kind.speed(&settings.projectile);
        self.projectiles.push(Projectile::new(
            id,
            self.id,
            kind,
            muzzle,
            self.turret_angle,
            speed,
            env.now,
        ));
        self.last_shot = Some(env.now);
        env.events.push(SimEvent::ProjectileFired {
            owner: self.id,
            projectile: id,
            kind,
        });

        if kind == ProjectileKind::Wireless {
            self.remote = Some(RemoteLink {
                projectile: id,
                until: env.now + settings.projectile.wireless_control_ticks,
            });
            log::debug!("{} piloting projectile {}", self.id, id);
        }

        if let Some(held) = self.power_up {
            self.spend(held);
        }
    }

    /// Launch point for a new shot. Falls back to the tank centre when the
    /// barrel pokes through a wall, so wall-bound shots start on this side.
    fn muzzle(&self, kind: ProjectileKind, maze: &Maze, settings: &Settings) -> Vec2 {
        let tip = self.pos + polar_to_cartesian(settings.tank.size * 0.8, self.turret_angle);
        if kind.ignores_walls() {
            return tip;
        }
        let Some(home) = maze.cell_of(self.pos) else {
            return self.pos;
        };
        let radius = settings.projectile.radius;
        if crossing_contacts(maze, home, tip).any()
            || disc_blocked(maze, tip, radius, settings.arena.collision_tier)
        {
            self.pos
        } else {
            tip
        }
    }

    /// Use a power-up that acts on the actor instead of launching a shot
    fn activate(&mut self, held: PowerUpKind, env: &mut ActorEnv) {
        match held {
            PowerUpKind::TimeWarp => {
                let until = env.now + env.settings.power_up.warp_duration_ticks;
                self.warp_until = Some(until);
                env.events.push(SimEvent::TimeWarpActivated {
                    actor: self.id,
                    until,
                });
                log::debug!("{} activated time warp until tick {}", self.id, until);
            }
            PowerUpKind::Homing
            | PowerUpKind::Ghost
            | PowerUpKind::Wireless
            | PowerUpKind::Portal => {}
        }
        self.last_shot = Some(env.now);
        self.spend(held);
    }

    fn spend(&mut self, held: PowerUpKind) {
        match held.consumption() {
            Consumption::PerShot | Consumption::Activation => self.power_up = None,
            Consumption::PairedShots => {
                let placed = self.portal_next;
                self.portal_next = placed.other();
                if placed == Polarity::Orange {
                    self.power_up = None;
                }
            }
        }
    }

    fn update_projectiles(&mut self, input: &ControlInput, env: &mut ActorEnv) {
        let piloted = self.remote.map(|link| link.projectile);
        let mut projectile_env = ProjectileEnv {
            maze: env.maze,
            settings: env.settings,
            targets: env.targets,
            warp_fields: env.warp_fields,
            portals: &mut *env.portals,
            events: &mut *env.events,
            now: env.now,
        };
        for projectile in &mut self.projectiles {
            let pilot = (piloted == Some(projectile.id)).then_some(input);
            projectile.update(&mut projectile_env, pilot);
        }
    }
}

/// Move a disc by `step`, sliding along walls: try the full step, then each
/// axis on its own. Stays put if every option is blocked.
pub fn slide_move(maze: &Maze, tier: CollisionTier, pos: Vec2, step: Vec2, radius: f32) -> Vec2 {
    if step == Vec2::ZERO {
        return pos;
    }
    [step, Vec2::new(step.x, 0.0), Vec2::new(0.0, step.y)]
        .into_iter()
        .filter(|s| *s != Vec2::ZERO)
        .map(|s| pos + s)
        .find(|&candidate| !disc_blocked(maze, candidate, radius, tier))
        .unwrap_or(pos)
}
