//! Moves: item transfers between slots and the rules for resolving them.
//!
//! ## Key Types
//!
//! - `Move`: items taken from source slots into a destination, tagged with
//!   the turn it targets and an origin counter for tie-breaking
//! - `Resolution`: outcome of `Move::resolve_conflict_with`
//! - `MoveError`: structural problems caught by `Move::validate`

mod conflict;
mod transfer;

pub use conflict::{MoveError, Resolution};
pub use transfer::{Move, Source};
