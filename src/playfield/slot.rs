//! Ordered, persistent item slots.
//!
//! A `Slot` is an ordered run of items (a pile, a hand, a stack of chips).
//! Every mutator returns a new slot and leaves the receiver untouched;
//! the backing `im::Vector` shares structure, so this is cheap.

use im::Vector;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::PlayfieldError;
use crate::core::{ContainerId, Item, ItemId, SlotCoord, SlotId};

/// An ordered sequence of items at one coordinate.
///
/// Index 0 is the bottom of the slot; new items are appended on top
/// unless an anchor is given.
///
/// ## Usage
///
/// ```
/// use tabletop_sync::core::{Card, ItemId, SlotCoord};
/// use tabletop_sync::playfield::Slot;
///
/// let a = Card::new(ItemId(1), 0);
/// let b = Card::new(ItemId(2), 0);
/// let c = Card::new(ItemId(3), 0);
///
/// let slot = Slot::empty(SlotCoord::new("table", 0));
/// let slot = slot.add(&[a, b], None).unwrap();
/// let slot = slot.add(&[c], Some(ItemId(2))).unwrap();
///
/// let ids: Vec<_> = slot.ids().collect();
/// assert_eq!(ids, vec![ItemId(1), ItemId(3), ItemId(2)]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "I: Item"))]
pub struct Slot<I: Item> {
    id: SlotId,
    container: ContainerId,
    items: Vector<I>,
}

impl<I: Item> Slot<I> {
    /// Create an empty slot at `coord`.
    #[must_use]
    pub fn empty(coord: SlotCoord) -> Self {
        Self {
            id: coord.slot,
            container: coord.container,
            items: Vector::new(),
        }
    }

    /// Create a slot holding `items`, bottom first.
    pub fn with_items(coord: SlotCoord, items: &[I]) -> Result<Self, PlayfieldError> {
        Self::empty(coord).add(items, None)
    }

    /// Slot id within its container.
    #[must_use]
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Owning container id.
    #[must_use]
    pub fn container(&self) -> &ContainerId {
        &self.container
    }

    /// Full coordinate of this slot.
    #[must_use]
    pub fn coord(&self) -> SlotCoord {
        SlotCoord {
            container: self.container.clone(),
            slot: self.id,
        }
    }

    /// Items in order, bottom first.
    #[must_use]
    pub fn items(&self) -> &Vector<I> {
        &self.items
    }

    /// Item ids in order, bottom first.
    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().map(Item::id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Top item (last in order).
    #[must_use]
    pub fn top(&self) -> Option<&I> {
        self.items.last()
    }

    /// Index of an item, if present.
    #[must_use]
    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Check whether an item is in this slot.
    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.position(id).is_some()
    }

    /// Insert `items` (in the given order) before `before`, or on top when
    /// `before` is `None`.
    ///
    /// Fails if any item is already present (or repeated in `items`), or if
    /// `before` is not in this slot.
    pub fn add(&self, items: &[I], before: Option<ItemId>) -> Result<Self, PlayfieldError> {
        let mut seen = FxHashSet::default();
        for item in items {
            let id = item.id();
            if self.contains(id) || !seen.insert(id) {
                return Err(PlayfieldError::AlreadyPresent {
                    slot: self.coord(),
                    item: id,
                });
            }
        }

        let mut next = self.items.clone();
        let tail = match before {
            Some(anchor) => {
                let index = self.position(anchor).ok_or_else(|| PlayfieldError::AnchorMissing {
                    slot: self.coord(),
                    item: anchor,
                })?;
                next.split_off(index)
            }
            None => Vector::new(),
        };
        next.extend(items.iter().cloned());
        next.append(tail);

        Ok(Self {
            items: next,
            ..self.clone()
        })
    }

    /// Remove `items` from this slot.
    ///
    /// Items are matched by id. Fails if any of them is absent.
    pub fn remove(&self, items: &[I]) -> Result<Self, PlayfieldError> {
        let ids: Vec<ItemId> = items.iter().map(Item::id).collect();
        self.take(&ids).map(|(slot, _)| slot)
    }

    /// Remove the items with the given ids, returning the new slot and the
    /// removed items in slot order (bottom first).
    ///
    /// Fails if any id is absent or repeated.
    pub fn take(&self, ids: &[ItemId]) -> Result<(Self, Vec<I>), PlayfieldError> {
        let mut wanted = FxHashSet::default();
        for &id in ids {
            if !self.contains(id) || !wanted.insert(id) {
                return Err(PlayfieldError::Missing {
                    slot: self.coord(),
                    item: id,
                });
            }
        }

        let mut kept = Vector::new();
        let mut taken = Vec::with_capacity(ids.len());
        for item in &self.items {
            if wanted.contains(&item.id()) {
                taken.push(item.clone());
            } else {
                kept.push_back(item.clone());
            }
        }

        let slot = Self {
            items: kept,
            ..self.clone()
        };
        Ok((slot, taken))
    }

    /// Replace the item `old` with `new`, keeping its position.
    ///
    /// Fails if `old` is absent or if `new` is already present under a
    /// different position.
    pub fn replace(&self, old: ItemId, new: I) -> Result<Self, PlayfieldError> {
        let index = self.position(old).ok_or_else(|| PlayfieldError::Missing {
            slot: self.coord(),
            item: old,
        })?;
        if new.id() != old && self.contains(new.id()) {
            return Err(PlayfieldError::AlreadyPresent {
                slot: self.coord(),
                item: new.id(),
            });
        }

        Ok(Self {
            items: self.items.update(index, new),
            ..self.clone()
        })
    }
}
