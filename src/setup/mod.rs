//! Opening playfields.
//!
//! Peers share a seed instead of a playfield: dealing is deterministic, so
//! each peer builds the same opening table locally and starts its
//! [`Gameplay`](crate::gameplay::Gameplay) from it.

mod deal;

pub use deal::{deal_into, deal_round_robin, deck};
