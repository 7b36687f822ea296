//! Fundamental handle and geometry types.

use serde::{Deserialize, Serialize};

pub use glam::Vec2;

/// Generation-checked handle to a registered entity.
///
/// The index is reused after the entity is removed; the generation is bumped
/// at the same time, so a handle kept past removal never resolves again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

/// Marker bit distinguishing an owned user-data slot from the zero default.
const USER_DATA_TAG: u128 = 1 << 64;

impl EntityId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Pack into a physics user-data slot.
    pub fn to_user_data(self) -> u128 {
        USER_DATA_TAG | ((self.generation as u128) << 32) | self.index as u128
    }

    /// Unpack a physics user-data slot. Zero (never tagged) yields `None`.
    pub fn from_user_data(data: u128) -> Option<Self> {
        if data & USER_DATA_TAG == 0 {
            return None;
        }
        Some(Self {
            index: data as u32,
            generation: (data >> 32) as u32,
        })
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}g{}", self.index, self.generation)
    }
}

/// A single active pointer reported by a touch event, in raw client pixels
/// (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

impl Touch {
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }
}
