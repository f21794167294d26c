//! Immutable playfield snapshots.

use im::Vector;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::{Container, PlayfieldError, Slot};
use crate::core::{Card, Chip, ContainerId, Item, ItemId, SlotCoord};

/// Every container on the table at one turn sequence.
///
/// Card containers and chip containers are kept apart; item ids only have
/// to be unique within a kind. Cloning is O(1) thanks to `im`.
///
/// ## Usage
///
/// ```
/// use tabletop_sync::core::{Card, ItemId, SlotCoord};
/// use tabletop_sync::playfield::{Container, Playfield, Slot};
///
/// let stock = SlotCoord::new("stock", 0);
/// let field = Playfield::new()
///     .with_container(Container::<Card>::with_empty_slots("stock", true, 1))
///     .unwrap();
/// let field = field
///     .with_slot(Slot::with_items(stock.clone(), &[Card::new(ItemId(1), 0)]).unwrap())
///     .unwrap();
///
/// assert_eq!(field.locate::<Card>(ItemId(1)), Some(stock));
/// assert!(field.check_consistency().is_ok());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playfield {
    sequence: u64,
    cards: Vector<Container<Card>>,
    chips: Vector<Container<Chip>>,
}

impl Playfield {
    /// Create an empty playfield at sequence 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn sequence this snapshot belongs to.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Same contents at a different sequence.
    #[must_use]
    pub fn with_sequence(&self, sequence: u64) -> Self {
        Self {
            sequence,
            ..self.clone()
        }
    }

    /// Card containers in order.
    #[must_use]
    pub fn cards(&self) -> &Vector<Container<Card>> {
        &self.cards
    }

    /// Chip containers in order.
    #[must_use]
    pub fn chips(&self) -> &Vector<Container<Chip>> {
        &self.chips
    }

    pub(crate) fn with_cards(&self, cards: Vector<Container<Card>>) -> Self {
        Self {
            cards,
            ..self.clone()
        }
    }

    pub(crate) fn with_chips(&self, chips: Vector<Container<Chip>>) -> Self {
        Self {
            chips,
            ..self.clone()
        }
    }

    /// Check whether any container (of either kind) uses `id`.
    #[must_use]
    pub fn has_container(&self, id: &ContainerId) -> bool {
        self.cards.iter().any(|c| c.id() == id) || self.chips.iter().any(|c| c.id() == id)
    }

    /// Add a container.
    ///
    /// Container ids are unique across both item kinds.
    pub fn with_container<I: Item>(&self, container: Container<I>) -> Result<Self, PlayfieldError> {
        if self.has_container(container.id()) {
            return Err(PlayfieldError::DuplicateContainer(container.id().clone()));
        }

        let mut containers = I::containers(self).clone();
        containers.push_back(container);
        Ok(I::with_containers(self, containers))
    }

    /// Look up a container of kind `I`.
    #[must_use]
    pub fn container<I: Item>(&self, id: &ContainerId) -> Option<&Container<I>> {
        I::containers(self).iter().find(|c| c.id() == id)
    }

    /// Look up a slot of kind `I`.
    #[must_use]
    pub fn slot<I: Item>(&self, coord: &SlotCoord) -> Option<&Slot<I>> {
        self.container::<I>(&coord.container)?.slot(coord.slot)
    }

    /// Replace the slot at `slot.coord()`.
    pub fn with_slot<I: Item>(&self, slot: Slot<I>) -> Result<Self, PlayfieldError> {
        let containers = I::containers(self);
        let index = containers
            .iter()
            .position(|c| c.id() == slot.container())
            .ok_or_else(|| PlayfieldError::UnknownSlot(slot.coord()))?;

        let container = containers[index].replace_slot(slot)?;
        Ok(I::with_containers(self, containers.update(index, container)))
    }

    /// Find the slot holding an item of kind `I`.
    #[must_use]
    pub fn locate<I: Item>(&self, id: ItemId) -> Option<SlotCoord> {
        I::containers(self)
            .iter()
            .flat_map(|c| c.slots().iter())
            .find(|slot| slot.contains(id))
            .map(Slot::coord)
    }

    /// Number of items of kind `I` on the playfield.
    #[must_use]
    pub fn item_count<I: Item>(&self) -> usize {
        I::containers(self).iter().map(Container::item_count).sum()
    }

    /// Verify the playfield's structural invariants:
    ///
    /// - container ids unique across both kinds
    /// - slot ids unique within each container, and owned by it
    /// - every item appears in at most one slot (per kind)
    pub fn check_consistency(&self) -> Result<(), PlayfieldError> {
        let mut containers = FxHashSet::default();
        let ids = self
            .cards
            .iter()
            .map(Container::id)
            .chain(self.chips.iter().map(Container::id));
        for id in ids {
            if !containers.insert(id) {
                return Err(PlayfieldError::DuplicateContainer(id.clone()));
            }
        }

        check_single_owner::<Card>(self)?;
        check_single_owner::<Chip>(self)
    }
}

fn check_single_owner<I: Item>(playfield: &Playfield) -> Result<(), PlayfieldError> {
    let mut owners: FxHashMap<ItemId, SlotCoord> = FxHashMap::default();

    for container in I::containers(playfield) {
        let mut slot_ids = FxHashSet::default();
        for slot in container.slots() {
            if slot.container() != container.id() {
                return Err(PlayfieldError::ForeignSlot {
                    container: container.id().clone(),
                    slot: slot.coord(),
                });
            }
            if !slot_ids.insert(slot.id()) {
                return Err(PlayfieldError::DuplicateSlot(slot.coord()));
            }
            for id in slot.ids() {
                if let Some(first) = owners.insert(id, slot.coord()) {
                    return Err(PlayfieldError::DuplicateOwner {
                        kind: I::KIND,
                        item: id,
                        first,
                        second: slot.coord(),
                    });
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ItemKind, SlotId};

    fn card(id: u32) -> Card {
        Card::new(ItemId(id), id)
    }

    fn table() -> Playfield {
        Playfield::new()
            .with_container(Container::<Card>::with_empty_slots("stock", true, 1))
            .unwrap()
            .with_container(Container::<Card>::with_empty_slots("waste", false, 2))
            .unwrap()
            .with_container(Container::<Chip>::with_empty_slots("pot", false, 1))
            .unwrap()
    }

    #[test]
    fn test_with_slot_replaces() {
        let field = table();
        let stock = SlotCoord::new("stock", 0);
        let filled = Slot::with_items(stock.clone(), &[card(1), card(2)]).unwrap();

        let next = field.with_slot(filled).unwrap();

        assert_eq!(next.slot::<Card>(&stock).map(Slot::len), Some(2));
        assert_eq!(field.slot::<Card>(&stock).map(Slot::len), Some(0));
        assert_eq!(next.item_count::<Card>(), 2);
    }

    #[test]
    fn test_with_slot_unknown_container() {
        let field = table();
        let err = field
            .with_slot(Slot::<Card>::empty(SlotCoord::new("nowhere", 0)))
            .unwrap_err();
        assert_eq!(err, PlayfieldError::UnknownSlot(SlotCoord::new("nowhere", 0)));
    }

    #[test]
    fn test_kinds_are_separate() {
        let field = table();
        let pot = SlotCoord::new("pot", 0);

        assert!(field.slot::<Chip>(&pot).is_some());
        assert!(field.slot::<Card>(&pot).is_none());
    }

    #[test]
    fn test_duplicate_container_across_kinds() {
        let err = table()
            .with_container(Container::<Chip>::new("stock", false))
            .unwrap_err();
        assert_eq!(err, PlayfieldError::DuplicateContainer(ContainerId::new("stock")));
    }

    #[test]
    fn test_consistency_detects_duplicate_owner() {
        let field = table()
            .with_slot(Slot::with_items(SlotCoord::new("stock", 0), &[card(1)]).unwrap())
            .unwrap()
            .with_slot(Slot::with_items(SlotCoord::new("waste", 1), &[card(1)]).unwrap())
            .unwrap();

        let err = field.check_consistency().unwrap_err();
        assert_eq!(
            err,
            PlayfieldError::DuplicateOwner {
                kind: ItemKind::Card,
                item: ItemId(1),
                first: SlotCoord::new("stock", 0),
                second: SlotCoord::new("waste", 1),
            }
        );
    }

    #[test]
    fn test_same_id_different_kind_is_consistent() {
        let field = table()
            .with_slot(Slot::with_items(SlotCoord::new("stock", 0), &[card(1)]).unwrap())
            .unwrap()
            .with_slot(
                Slot::with_items(SlotCoord::new("pot", 0), &[Chip::new(ItemId(1), 5)]).unwrap(),
            )
            .unwrap();

        assert!(field.check_consistency().is_ok());
    }

    #[test]
    fn test_locate() {
        let field = table()
            .with_slot(Slot::with_items(SlotCoord::new("waste", 1), &[card(9)]).unwrap())
            .unwrap();

        let found = field.locate::<Card>(ItemId(9)).unwrap();
        assert_eq!(found.slot, SlotId(1));
        assert_eq!(field.locate::<Card>(ItemId(10)), None);
    }

    #[test]
    fn test_serialization() {
        let field = table().with_sequence(4);
        let json = serde_json::to_string(&field).unwrap();
        let deserialized: Playfield = serde_json::from_str(&json).unwrap();
        assert_eq!(field, deserialized);
    }
}
