//! Turns: snapshots paired with the moves proposed against them.
//!
//! A `Turn` is a persistent value. The gameplay engine replaces turns in
//! its log with updated copies; nothing mutates a turn in place.

mod turn;

pub use turn::{StaleMove, Turn};
