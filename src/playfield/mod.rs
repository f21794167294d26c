//! Playfield model: slots, containers and immutable snapshots.
//!
//! All types here are persistent values. Mutators return a new value and
//! leave the receiver untouched, so a `Turn` can hold a snapshot while
//! later turns derive new ones from it.
//!
//! ## Key Types
//!
//! - `Slot<I>`: ordered items at one `(container, slot)` coordinate
//! - `Container<I>`: named group of slots with a secrecy flag
//! - `Playfield`: all card and chip containers plus a sequence number
//! - `PlayfieldError`: precondition violations

mod error;
pub mod slot;
pub mod container;
pub mod snapshot;

pub use error::PlayfieldError;
pub use slot::Slot;
pub use container::Container;
pub use snapshot::Playfield;
