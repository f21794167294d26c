//! The reconciliation engine.
//!
//! ## Key Types
//!
//! - `Gameplay`: owns the turn log; integrates moves, restates turns,
//!   replays and trims
//! - `ChangeSet`: slot coordinates touched by a call, for narrow redraws
//! - `EngineError`: input the engine refused
//!
//! Conflicting moves are not errors. They are resolved deterministically
//! and the losers are kept on the turn as `invalidated` for diagnostics.

mod change;
mod engine;
mod error;

pub use change::ChangeSet;
pub use engine::Gameplay;
pub use error::EngineError;
