//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by player slot, then firing order)
//! - No rendering or platform dependencies

pub mod actor;
pub mod collision;
pub mod maze;
pub mod pathfind;
pub mod portal;
pub mod projectile;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use actor::{Actor, ControlInput, DirectionKeys};
pub use collision::disc_blocked;
pub use maze::{CellCoord, Maze, MazeGeometry, Side, Walls};
pub use pathfind::shortest_cell_path;
pub use portal::{Polarity, PortalAnchor, PortalRegistry};
pub use projectile::{Projectile, ProjectileKind};
pub use snapshot::Snapshot;
pub use state::{
    ActorId, GamePhase, GameState, PowerUp, PowerUpKind, RoundOutcome, RoundStatus, SimEvent,
    TankColor,
};
pub use tick::tick;
