//! Peer plumbing around the engine.
//!
//! The engine itself never touches the network. This module supplies the
//! seams a host application plugs into:
//!
//! - [`Transport`]: fire-and-forget broadcast to the other peers
//! - [`ChangeListener`]: told which slots changed after every call
//! - [`Session`]: one peer; stamps local moves, integrates remote ones and
//!   parks moves that arrive before their turn exists
//! - [`encode`] / [`decode`]: binary wire format for [`PeerMessage`]
//!
//! ## Example Usage
//!
//! ```
//! use tabletop_sync::core::{Card, GameplayConfig, ItemId, ItemKind, SlotCoord};
//! use tabletop_sync::gameplay::{ChangeSet, Gameplay};
//! use tabletop_sync::moves::Move;
//! use tabletop_sync::net::{Outbox, PeerMessage, Session};
//! use tabletop_sync::playfield::{Container, Playfield, Slot};
//!
//! let stock = SlotCoord::new("stock", 0);
//! let field = Playfield::new()
//!     .with_container(Container::<Card>::with_empty_slots("stock", true, 1)).unwrap()
//!     .with_container(Container::<Card>::with_empty_slots("hand", false, 1)).unwrap()
//!     .with_slot(Slot::with_items(stock.clone(), &[Card::new(ItemId(7), 0)]).unwrap()).unwrap();
//!
//! let mut redraws = Vec::new();
//! let mut session = Session::new(
//!     Gameplay::new(GameplayConfig::default(), field),
//!     Outbox::new(),
//!     |changes: &ChangeSet| redraws.push(changes.len()),
//! );
//!
//! let draft = Move::new(ItemKind::Card, 0, 0, SlotCoord::new("hand", 0))
//!     .with_source(stock, &[ItemId(7)]);
//! session.propose(draft).unwrap();
//!
//! assert_eq!(session.gameplay().last_sequence(), 1);
//! assert!(matches!(session.transport_mut().drain().as_slice(), [PeerMessage::Move(_)]));
//! drop(session);
//! assert_eq!(redraws, vec![2]);
//! ```

mod codec;
mod message;
mod outbox;
mod session;

pub use codec::{decode, encode, CodecError};
pub use message::{PeerMessage, SyncState};
pub use outbox::Outbox;
pub use session::{Received, Session, SessionError};

use crate::gameplay::ChangeSet;

/// Outgoing side of the peer network.
///
/// Delivery is best effort and unordered; the engine converges regardless
/// of the order in which peers see moves.
pub trait Transport {
    /// Send `message` to every other peer.
    fn broadcast(&mut self, message: &PeerMessage);
}

/// Receives the slots touched by each session call, for redraws.
pub trait ChangeListener {
    fn slots_changed(&mut self, changes: &ChangeSet);
}

impl<F> ChangeListener for F
where
    F: FnMut(&ChangeSet),
{
    fn slots_changed(&mut self, changes: &ChangeSet) {
        self(changes);
    }
}
