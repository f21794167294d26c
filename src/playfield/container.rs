//! Named groups of slots.

use im::Vector;
use serde::{Deserialize, Serialize};

use super::{PlayfieldError, Slot};
use crate::core::{ContainerId, Item, SlotCoord, SlotId};

/// A named, ordered collection of slots sharing one secrecy flag.
///
/// A player's hand, the draw pile or the pot are containers. `secret`
/// tells renderers whether the contents are face down for everyone but
/// the owner; the engine itself never reads it.
///
/// Invariant: slot ids are unique within the container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "I: Item"))]
pub struct Container<I: Item> {
    id: ContainerId,
    secret: bool,
    slots: Vector<Slot<I>>,
}

impl<I: Item> Container<I> {
    /// Create a container with no slots.
    pub fn new(id: impl Into<ContainerId>, secret: bool) -> Self {
        Self {
            id: id.into(),
            secret,
            slots: Vector::new(),
        }
    }

    /// Create a container with `count` empty slots numbered `0..count`.
    pub fn with_empty_slots(id: impl Into<ContainerId>, secret: bool, count: u32) -> Self {
        let id = id.into();
        let slots = (0..count)
            .map(|slot| {
                Slot::empty(SlotCoord {
                    container: id.clone(),
                    slot: SlotId(slot),
                })
            })
            .collect();
        Self { id, secret, slots }
    }

    #[must_use]
    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    #[must_use]
    pub fn is_secret(&self) -> bool {
        self.secret
    }

    /// Slots in order.
    #[must_use]
    pub fn slots(&self) -> &Vector<Slot<I>> {
        &self.slots
    }

    /// Look up a slot by id.
    #[must_use]
    pub fn slot(&self, id: SlotId) -> Option<&Slot<I>> {
        self.slots.iter().find(|slot| slot.id() == id)
    }

    /// Append a slot.
    ///
    /// Fails if the slot belongs to another container or its id is taken.
    pub fn add_slot(&self, slot: Slot<I>) -> Result<Self, PlayfieldError> {
        if slot.container() != &self.id {
            return Err(PlayfieldError::ForeignSlot {
                container: self.id.clone(),
                slot: slot.coord(),
            });
        }
        if self.slot(slot.id()).is_some() {
            return Err(PlayfieldError::DuplicateSlot(slot.coord()));
        }

        let mut slots = self.slots.clone();
        slots.push_back(slot);
        Ok(Self {
            slots,
            ..self.clone()
        })
    }

    /// Replace the slot with the same id.
    pub fn replace_slot(&self, slot: Slot<I>) -> Result<Self, PlayfieldError> {
        let index = self
            .slots
            .iter()
            .position(|existing| existing.id() == slot.id() && slot.container() == &self.id)
            .ok_or_else(|| PlayfieldError::UnknownSlot(slot.coord()))?;

        Ok(Self {
            slots: self.slots.update(index, slot),
            ..self.clone()
        })
    }

    /// Total number of items across all slots.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.slots.iter().map(Slot::len).sum()
    }
}
