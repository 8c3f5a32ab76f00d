//! Maze Tanks - deterministic simulation engine for a local multiplayer tank arena
//!
//! Core modules:
//! - `sim`: Deterministic simulation (maze, collisions, projectiles, tanks, rounds)
//! - `settings`: Data-driven tunables, loadable from JSON
//! - `error`: Errors surfaced at the lifecycle and configuration boundaries
//! - `clock`: Fixed-timestep accumulator for frame-driven hosts

pub mod clock;
pub mod error;
pub mod settings;
pub mod sim;

pub use clock::FixedStep;
pub use error::SimError;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants (reference values behind `Settings::default`)
pub mod consts {
    /// Simulation rate. Every duration in the engine is counted in ticks of this rate.
    pub const SIM_HZ: u32 = 60;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = 1.0 / SIM_HZ as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Maze grid
    pub const ROWS: usize = 11;
    pub const COLS: usize = 11;
    pub const CELL_SIZE: f32 = 60.0;
    pub const WALL_THICKNESS: f32 = 4.0;

    /// Tanks (speeds are pixels per tick)
    pub const TANK_SIZE: f32 = 20.0;
    pub const TANK_SPEED: f32 = 2.0;
    pub const TANK_ROT_SPEED: f32 = 0.05;
    pub const TANK_REVERSE_FACTOR: f32 = 0.7;
    pub const TANK_STICK_TURN: f32 = 0.1;
    pub const SHOOT_DELAY_TICKS: u64 = 18; // 300 ms
    pub const MAX_ACTIVE_PROJECTILES: usize = 5;

    /// Projectiles
    pub const BULLET_RADIUS: f32 = 3.0;
    pub const BULLET_SPEED: f32 = 4.0;
    pub const MAX_BOUNCES: u32 = 5;
    pub const BULLET_LIFESPAN_TICKS: u64 = 600; // 10 s
    pub const OWN_IMMUNITY_TICKS: u64 = 30; // 500 ms

    /// Homing missiles
    pub const HOMING_LIFESPAN_TICKS: u64 = 1200; // 20 s
    pub const HOMING_MAX_BOUNCES: u32 = 50;
    pub const HOMING_START_TICKS: u64 = 150; // 2.5 s
    pub const HOMING_END_TICKS: u64 = 1200;
    pub const HOMING_PATH_REFRESH_TICKS: u64 = 18; // 300 ms
    pub const HOMING_TURN: f32 = 0.1;

    /// Ghost lasers
    pub const GHOST_RANGE: f32 = 400.0;
    pub const GHOST_CONE: f32 = std::f32::consts::FRAC_PI_3;
    pub const GHOST_TURN: f32 = 0.03;

    /// Wireless missiles
    pub const WIRELESS_SPEED_MULT: f32 = 1.5;
    pub const WIRELESS_CONTROL_TICKS: u64 = 300; // 5 s
    pub const WIRELESS_TURN: f32 = 0.15;

    /// Portals
    pub const PROJECTILE_PORTAL_CAPTURE: f32 = 12.0;
    pub const PROJECTILE_PORTAL_CLEARANCE: f32 = 20.0;
    pub const TANK_PORTAL_CAPTURE: f32 = 18.0;
    pub const TANK_PORTAL_CLEARANCE: f32 = 30.0;
    pub const TELEPORT_COOLDOWN_TICKS: u64 = 30;

    /// Time-warp field
    pub const WARP_RADIUS: f32 = 150.0;
    pub const WARP_FACTOR: f32 = 0.4;
    pub const WARP_DURATION_TICKS: u64 = 300; // 5 s

    /// Power-ups
    pub const POWERUP_SIZE: f32 = 30.0;
    pub const POWERUP_SPAWN_MIN_TICKS: u64 = 1200; // 20 s
    pub const POWERUP_SPAWN_MAX_TICKS: u64 = 1800; // 30 s

    /// Round end overlay duration before the next round starts
    pub const ROUND_END_DELAY_TICKS: u64 = 180; // 3 s
}

/// Normalize angle to (-π, π]
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

/// Turn `current` toward `target` by `gain` of the shortest signed difference
#[inline]
pub fn steer_toward(current: f32, target: f32, gain: f32) -> f32 {
    current + normalize_angle(target - current) * gain
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Angle of a vector in screen space (y grows downward)
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}
