//! Change notifications.

use im::OrdSet;
use serde::{Deserialize, Serialize};

use crate::core::{ContainerId, SlotCoord};
use crate::playfield::Playfield;
use crate::turns::Turn;

/// Slot coordinates touched by an engine call.
///
/// Renderers use this to refresh individual slots or containers instead of
/// diffing the whole playfield.
///
/// ```
/// use tabletop_sync::core::SlotCoord;
/// use tabletop_sync::gameplay::ChangeSet;
///
/// let mut changes = ChangeSet::new();
/// changes.insert(SlotCoord::new("waste", 0));
/// changes.insert(SlotCoord::new("waste", 0));
/// changes.insert(SlotCoord::new("stock", 0));
///
/// assert_eq!(changes.len(), 2);
/// assert!(changes.touches_container(&"stock".into()));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    slots: OrdSet<SlotCoord>,
}

impl ChangeSet {
    /// Create an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every slot on `playfield`, for a full refresh.
    #[must_use]
    pub fn all_slots(playfield: &Playfield) -> Self {
        let cards = playfield.cards().iter().flat_map(|c| c.slots().iter().map(|s| s.coord()));
        let chips = playfield.chips().iter().flat_map(|c| c.slots().iter().map(|s| s.coord()));
        cards.chain(chips).collect()
    }

    pub fn insert(&mut self, coord: SlotCoord) {
        self.slots.insert(coord);
    }

    /// Record every slot a turn's pending and discarded moves touch.
    pub(crate) fn record_turn(&mut self, turn: &Turn) {
        for mv in turn.moves().iter().chain(turn.invalidated().iter()) {
            self.extend(mv.slots_changed().cloned());
        }
    }

    /// Add everything in `other`.
    pub fn merge(&mut self, other: ChangeSet) {
        self.slots = std::mem::take(&mut self.slots).union(other.slots);
    }

    #[must_use]
    pub fn contains(&self, coord: &SlotCoord) -> bool {
        self.slots.contains(coord)
    }

    /// Check whether any changed slot belongs to `container`.
    #[must_use]
    pub fn touches_container(&self, container: &ContainerId) -> bool {
        self.slots.iter().any(|coord| &coord.container == container)
    }

    /// Distinct containers touched, in order.
    #[must_use]
    pub fn containers(&self) -> Vec<ContainerId> {
        let mut containers: Vec<ContainerId> = Vec::new();
        for coord in &self.slots {
            if containers.last() != Some(&coord.container) {
                containers.push(coord.container.clone());
            }
        }
        containers
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Changed coordinates in order.
    pub fn iter(&self) -> impl Iterator<Item = &SlotCoord> {
        self.slots.iter()
    }
}

impl Extend<SlotCoord> for ChangeSet {
    fn extend<T: IntoIterator<Item = SlotCoord>>(&mut self, iter: T) {
        for coord in iter {
            self.slots.insert(coord);
        }
    }
}

impl FromIterator<SlotCoord> for ChangeSet {
    fn from_iter<T: IntoIterator<Item = SlotCoord>>(iter: T) -> Self {
        let mut changes = Self::new();
        changes.extend(iter);
        changes
    }
}
