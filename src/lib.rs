//! # tabletop-sync
//!
//! Turn log and conflict resolution for peer-to-peer tabletop card games.
//!
//! Every peer keeps its own copy of the table and exchanges only moves.
//! Moves race: two players may grab the same card, or a move may arrive
//! after later turns were already computed. The engine resolves this the
//! same way on every peer, so all tables converge without a server.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: The log is a pure function of the moves each turn
//!    has received. Delivery order does not matter.
//!
//! 2. **Immutable snapshots**: Slots, containers and playfields are
//!    persistent values (`im-rs`). Each turn keeps its own snapshot; a
//!    replay builds new ones and shares structure with the old.
//!
//! 3. **No back-pointers**: Items and slots are plain data, addressed by
//!    id and `SlotCoord` against a playfield.
//!
//! ## Modules
//!
//! - `core`: Item ids and kinds, cards and chips, slot coordinates,
//!   configuration, seeded RNG
//! - `playfield`: Slots, containers and the playfield snapshot
//! - `moves`: Moves and the conflict rules between them
//! - `turns`: A playfield plus the moves played against it
//! - `gameplay`: The bounded turn log and its replay
//! - `net`: Peer messages, wire codec, transport seams, sessions
//! - `setup`: Seeded dealing of opening playfields

pub mod core;
pub mod playfield;
pub mod moves;
pub mod turns;
pub mod gameplay;
pub mod net;
pub mod setup;

// Re-export commonly used types
pub use crate::core::{
    Card, Chip, ContainerId, GameRng, GameplayConfig, Item, ItemId, ItemKind, SlotCoord, SlotId,
};
pub use crate::gameplay::{ChangeSet, EngineError, Gameplay};
pub use crate::moves::{Move, MoveError, Resolution, Source};
pub use crate::net::{ChangeListener, PeerMessage, Session, Transport};
pub use crate::playfield::{Container, Playfield, PlayfieldError, Slot};
pub use crate::turns::{StaleMove, Turn};
