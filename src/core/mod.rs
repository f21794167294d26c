//! Core types: item identities, slot coordinates, configuration, RNG.
//!
//! Everything here is plain data shared by the playfield, the move rules
//! and the gameplay engine.

pub mod item;
pub mod coord;
pub mod config;
pub mod rng;

pub use item::{Card, Chip, Item, ItemId, ItemKind};
pub use coord::{ContainerId, SlotCoord, SlotId};
pub use config::{GameplayConfig, DEFAULT_RETENTION};
pub use rng::GameRng;
