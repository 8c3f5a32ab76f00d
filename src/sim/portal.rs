//! Round-scoped portal anchors
//!
//! At most one anchor per polarity exists at a time. Portal projectiles write
//! their own polarity slot on their first wall strike; tanks and projectiles
//! read the pair to teleport. Nothing teleports until both slots are filled.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Which end of the portal pair an anchor is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    /// Entry
    Blue,
    /// Exit
    Orange,
}

impl Polarity {
    pub fn other(self) -> Polarity {
        match self {
            Polarity::Blue => Polarity::Orange,
            Polarity::Orange => Polarity::Blue,
        }
    }
}

/// A wall-attached teleport endpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortalAnchor {
    pub pos: Vec2,
    /// Unit normal pointing away from the wall the anchor sits on
    pub normal: Vec2,
}

/// Where a teleport puts an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeleportExit {
    pub pos: Vec2,
    pub direction: Vec2,
    pub from: Polarity,
}

#[derive(Debug, Clone, Default)]
pub struct PortalRegistry {
    blue: Option<PortalAnchor>,
    orange: Option<PortalAnchor>,
}

impl PortalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, polarity: Polarity) -> Option<&PortalAnchor> {
        match polarity {
            Polarity::Blue => self.blue.as_ref(),
            Polarity::Orange => self.orange.as_ref(),
        }
    }

    /// Overwrite the slot for `polarity`
    pub fn place(&mut self, polarity: Polarity, anchor: PortalAnchor) {
        match polarity {
            Polarity::Blue => self.blue = Some(anchor),
            Polarity::Orange => self.orange = Some(anchor),
        }
    }

    pub fn clear(&mut self) {
        self.blue = None;
        self.orange = None;
    }

    /// Both anchors, once both have been placed
    pub fn pair(&self) -> Option<(&PortalAnchor, &PortalAnchor)> {
        Some((self.blue.as_ref()?, self.orange.as_ref()?))
    }

    pub fn is_linked(&self) -> bool {
        self.pair().is_some()
    }

    /// If `pos` is within `capture` of either anchor, the spot `clearance`
    /// out from the other anchor along its wall normal.
    pub fn exit_for(&self, pos: Vec2, capture: f32, clearance: f32) -> Option<TeleportExit> {
        let (blue, orange) = self.pair()?;
        let capture_sq = capture * capture;
        let (from, exit) = if pos.distance_squared(blue.pos) < capture_sq {
            (Polarity::Blue, orange)
        } else if pos.distance_squared(orange.pos) < capture_sq {
            (Polarity::Orange, blue)
        } else {
            return None;
        };
        Some(TeleportExit {
            pos: exit.pos + exit.normal * clearance,
            direction: exit.normal,
            from,
        })
    }
}
