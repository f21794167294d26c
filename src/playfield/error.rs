//! Playfield precondition failures.

use thiserror::Error;

use crate::core::{ContainerId, ItemId, ItemKind, SlotCoord};

/// A slot, container or playfield operation was asked to do something its
/// current contents do not allow.
///
/// These are precondition violations: either a programming error or a
/// move that no longer matches the snapshot it is applied to.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlayfieldError {
    #[error("{item} is already in slot {slot}")]
    AlreadyPresent { slot: SlotCoord, item: ItemId },

    #[error("{item} is not in slot {slot}")]
    Missing { slot: SlotCoord, item: ItemId },

    #[error("anchor {item} is not in slot {slot}")]
    AnchorMissing { slot: SlotCoord, item: ItemId },

    #[error("no slot at {0}")]
    UnknownSlot(SlotCoord),

    #[error("slot {0} already exists")]
    DuplicateSlot(SlotCoord),

    #[error("slot {slot} does not belong to container {container}")]
    ForeignSlot { container: ContainerId, slot: SlotCoord },

    #[error("container {0} already exists")]
    DuplicateContainer(ContainerId),

    #[error("{kind} {item} is in both {first} and {second}")]
    DuplicateOwner {
        kind: ItemKind,
        item: ItemId,
        first: SlotCoord,
        second: SlotCoord,
    },
}
