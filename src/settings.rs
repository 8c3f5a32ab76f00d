//! Simulation tunables
//!
//! Every gameplay number lives here so a match can be rebalanced from a JSON
//! file without touching the simulation. Durations are in ticks (`SIM_HZ`),
//! speeds in pixels per tick.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;

/// Precision of the disc-vs-wall query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CollisionTier {
    /// Test only the cell containing the disc centre
    SingleCell,
    /// Test every cell the disc could overlap
    #[default]
    MultiCell,
}

impl CollisionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionTier::SingleCell => "single-cell",
            CollisionTier::MultiCell => "multi-cell",
        }
    }

}

impl FromStr for CollisionTier {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "single-cell" => Ok(CollisionTier::SingleCell),
            "multi" | "multi-cell" => Ok(CollisionTier::MultiCell),
            _ => Err(SimError::InvalidSetting {
                field: "arena.collision_tier",
                reason: "expected single-cell or multi-cell",
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    pub rows: usize,
    pub cols: usize,
    pub cell_size: f32,
    pub wall_thickness: f32,
    pub collision_tier: CollisionTier,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            rows: ROWS,
            cols: COLS,
            cell_size: CELL_SIZE,
            wall_thickness: WALL_THICKNESS,
            collision_tier: CollisionTier::MultiCell,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TankSettings {
    /// Body width; collision radius is half of this
    pub size: f32,
    pub speed: f32,
    /// Rotation per tick while a turn key is held
    pub rot_speed: f32,
    /// Backward speed as a fraction of forward speed
    pub reverse_factor: f32,
    /// Fraction of the heading error corrected per tick under stick control
    pub stick_turn: f32,
    pub shoot_delay_ticks: u64,
    pub max_active_projectiles: usize,
}

impl Default for TankSettings {
    fn default() -> Self {
        Self {
            size: TANK_SIZE,
            speed: TANK_SPEED,
            rot_speed: TANK_ROT_SPEED,
            reverse_factor: TANK_REVERSE_FACTOR,
            stick_turn: TANK_STICK_TURN,
            shoot_delay_ticks: SHOOT_DELAY_TICKS,
            max_active_projectiles: MAX_ACTIVE_PROJECTILES,
        }
    }
}

impl TankSettings {
    #[inline]
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileSettings {
    pub radius: f32,
    pub speed: f32,
    pub max_bounces: u32,
    pub lifespan_ticks: u64,
    /// Window after firing during which a projectile cannot hit its owner
    pub own_immunity_ticks: u64,

    pub homing_lifespan_ticks: u64,
    pub homing_max_bounces: u32,
    pub homing_start_ticks: u64,
    pub homing_end_ticks: u64,
    pub homing_path_refresh_ticks: u64,
    pub homing_turn: f32,

    pub ghost_range: f32,
    /// Half-angle of the forward cone a ghost laser will curve toward
    pub ghost_cone: f32,
    pub ghost_turn: f32,

    pub wireless_speed_mult: f32,
    pub wireless_control_ticks: u64,
    pub wireless_turn: f32,
}

impl Default for ProjectileSettings {
    fn default() -> Self {
        Self {
            radius: BULLET_RADIUS,
            speed: BULLET_SPEED,
            max_bounces: MAX_BOUNCES,
            lifespan_ticks: BULLET_LIFESPAN_TICKS,
            own_immunity_ticks: OWN_IMMUNITY_TICKS,
            homing_lifespan_ticks: HOMING_LIFESPAN_TICKS,
            homing_max_bounces: HOMING_MAX_BOUNCES,
            homing_start_ticks: HOMING_START_TICKS,
            homing_end_ticks: HOMING_END_TICKS,
            homing_path_refresh_ticks: HOMING_PATH_REFRESH_TICKS,
            homing_turn: HOMING_TURN,
            ghost_range: GHOST_RANGE,
            ghost_cone: GHOST_CONE,
            ghost_turn: GHOST_TURN,
            wireless_speed_mult: WIRELESS_SPEED_MULT,
            wireless_control_ticks: WIRELESS_CONTROL_TICKS,
            wireless_turn: WIRELESS_TURN,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalSettings {
    pub projectile_capture: f32,
    pub projectile_clearance: f32,
    pub tank_capture: f32,
    pub tank_clearance: f32,
    pub teleport_cooldown_ticks: u64,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            projectile_capture: PROJECTILE_PORTAL_CAPTURE,
            projectile_clearance: PROJECTILE_PORTAL_CLEARANCE,
            tank_capture: TANK_PORTAL_CAPTURE,
            tank_clearance: TANK_PORTAL_CLEARANCE,
            teleport_cooldown_ticks: TELEPORT_COOLDOWN_TICKS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpSettings {
    pub size: f32,
    pub spawn_min_ticks: u64,
    pub spawn_max_ticks: u64,
    /// Kinds the spawner draws from, uniformly
    pub pool: Vec<crate::sim::PowerUpKind>,
    pub warp_radius: f32,
    pub warp_factor: f32,
    pub warp_duration_ticks: u64,
}

impl Default for PowerUpSettings {
    fn default() -> Self {
        use crate::sim::PowerUpKind;
        Self {
            size: POWERUP_SIZE,
            spawn_min_ticks: POWERUP_SPAWN_MIN_TICKS,
            spawn_max_ticks: POWERUP_SPAWN_MAX_TICKS,
            pool: vec![
                PowerUpKind::Homing,
                PowerUpKind::Ghost,
                PowerUpKind::Wireless,
                PowerUpKind::Portal,
                PowerUpKind::TimeWarp,
            ],
            warp_radius: WARP_RADIUS,
            warp_factor: WARP_FACTOR,
            warp_duration_ticks: WARP_DURATION_TICKS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundSettings {
    pub end_delay_ticks: u64,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            end_delay_ticks: ROUND_END_DELAY_TICKS,
        }
    }
}

/// All simulation tunables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub arena: ArenaSettings,
    pub tank: TankSettings,
    pub projectile: ProjectileSettings,
    pub portal: PortalSettings,
    pub power_up: PowerUpSettings,
    pub round: RoundSettings,
}

impl Settings {
    /// Parse settings from JSON; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject tunables the simulation cannot run with
    pub fn validate(&self) -> Result<(), SimError> {
        let arena = &self.arena;
        if arena.rows < 2 || arena.cols < 2 {
            return Err(SimError::InvalidGrid {
                rows: arena.rows,
                cols: arena.cols,
            });
        }
        if !(arena.cell_size > 0.0) {
            return Err(SimError::InvalidSetting {
                field: "arena.cell_size",
                reason: "must be positive",
            });
        }
        if !(arena.wall_thickness >= 0.0) || arena.wall_thickness >= arena.cell_size / 2.0 {
            return Err(SimError::InvalidSetting {
                field: "arena.wall_thickness",
                reason: "must be non-negative and under half a cell",
            });
        }
        if self.tank.size >= arena.cell_size - arena.wall_thickness {
            return Err(SimError::InvalidSetting {
                field: "tank.size",
                reason: "tanks must fit inside a cell",
            });
        }
        // Ricochet assumes one step crosses at most one cell edge per axis and
        // never reaches the far wall band of a cell
        let margin = self.projectile.radius + arena.wall_thickness / 2.0;
        let fastest = self.projectile.speed * self.projectile.wireless_speed_mult.max(1.0);
        if fastest * 2.0 >= arena.cell_size - margin * 2.0 {
            return Err(SimError::InvalidSetting {
                field: "projectile.speed",
                reason: "must stay under half the open width of a cell per tick",
            });
        }
        if self.power_up.spawn_min_ticks > self.power_up.spawn_max_ticks {
            return Err(SimError::InvalidSetting {
                field: "power_up.spawn_min_ticks",
                reason: "must not exceed spawn_max_ticks",
            });
        }
        if !(0.0..=1.0).contains(&self.power_up.warp_factor) {
            return Err(SimError::InvalidSetting {
                field: "power_up.warp_factor",
                reason: "must be within 0..=1",
            });
        }
        Ok(())
    }

    /// Play-field width in pixels
    pub fn field_width(&self) -> f32 {
        self.arena.cols as f32 * self.arena.cell_size
    }

    /// Play-field height in pixels
    pub fn field_height(&self) -> f32 {
        self.arena.rows as f32 * self.arena.cell_size
    }
}
