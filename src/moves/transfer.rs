//! Move representation: sources, destination, and the apply step.
//!
//! A move names its items by id only. That keeps the wire form small and
//! lets a peer replay it against whatever snapshot its target turn ends up
//! holding after reconciliation.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{Card, Chip, Item, ItemId, ItemKind, SlotCoord};
use crate::playfield::{Playfield, PlayfieldError};

/// Items taken from one source slot.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Source {
    /// Slot the items are taken from.
    pub slot: SlotCoord,
    /// Ids of the items taken.
    /// SmallVec covers the common single-card case without heap allocation.
    pub items: SmallVec<[ItemId; 4]>,
}

/// A transfer of items from one or more source slots into one destination.
///
/// ## Precedence
///
/// `Ord` on `Move` is its precedence key: the origin counter first, then
/// the rest of the content. When two moves conflict, the one that sorts
/// first wins. The key depends only on what was sent, never on arrival
/// order or on which peer is evaluating it, so every peer picks the same
/// winner.
///
/// ## Example
///
/// ```
/// use tabletop_sync::core::{ItemId, ItemKind, SlotCoord};
/// use tabletop_sync::moves::Move;
///
/// // Against turn 0, with origin counter 1: card 7 from stock to waste.
/// let mv = Move::new(ItemKind::Card, 0, 1, SlotCoord::new("waste", 0))
///     .with_source(SlotCoord::new("stock", 0), &[ItemId(7)]);
///
/// assert!(mv.moves_item(ItemId(7)));
/// assert_eq!(mv.slots_changed().count(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Move {
    /// Origin/version counter used as the primary tie-break.
    pub origin: u64,

    /// Which kind of item is moved.
    pub kind: ItemKind,

    /// Source slots and the items taken from each.
    pub sources: SmallVec<[Source; 2]>,

    /// Slot receiving the items.
    pub destination: SlotCoord,

    /// Insert before this item in the destination; `None` appends on top.
    pub before: Option<ItemId>,

    /// Turn this move was issued against.
    pub turn_sequence: u64,
}

impl Move {
    /// Create a move with no sources yet.
    #[must_use]
    pub fn new(kind: ItemKind, turn_sequence: u64, origin: u64, destination: SlotCoord) -> Self {
        Self {
            origin,
            kind,
            sources: SmallVec::new(),
            destination,
            before: None,
            turn_sequence,
        }
    }

    /// Add a source slot and the items taken from it.
    #[must_use]
    pub fn with_source(mut self, slot: SlotCoord, items: &[ItemId]) -> Self {
        self.sources.push(Source {
            slot,
            items: SmallVec::from_slice(items),
        });
        self
    }

    /// Insert before `anchor` instead of on top.
    #[must_use]
    pub fn with_before(mut self, anchor: ItemId) -> Self {
        self.before = Some(anchor);
        self
    }

    /// Same move re-targeted at `turn_sequence` with origin counter `origin`.
    #[must_use]
    pub fn stamped(mut self, turn_sequence: u64, origin: u64) -> Self {
        self.turn_sequence = turn_sequence;
        self.origin = origin;
        self
    }

    /// All item ids moved, source by source.
    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.sources.iter().flat_map(|s| s.items.iter().copied())
    }

    /// Check whether this move relocates `id`.
    #[must_use]
    pub fn moves_item(&self, id: ItemId) -> bool {
        self.item_ids().any(|moved| moved == id)
    }

    /// Coordinates this move touches: every source, then the destination.
    ///
    /// A move that reorders within one slot yields that coordinate twice.
    pub fn slots_changed(&self) -> impl Iterator<Item = &SlotCoord> + '_ {
        self.sources
            .iter()
            .map(|s| &s.slot)
            .chain(std::iter::once(&self.destination))
    }

    /// Apply this move to `playfield`.
    ///
    /// Items are removed from each source in turn and inserted into the
    /// destination in source order, keeping each source's slot order.
    /// The sequence number is left unchanged; `Turn` advances it.
    ///
    /// Fails if a slot is unknown, a source lacks a claimed item, or the
    /// destination already holds one of them or lacks the anchor.
    pub fn apply(&self, playfield: &Playfield) -> Result<Playfield, PlayfieldError> {
        match self.kind {
            ItemKind::Card => self.transfer::<Card>(playfield),
            ItemKind::Chip => self.transfer::<Chip>(playfield),
        }
    }

    fn transfer<I: Item>(&self, playfield: &Playfield) -> Result<Playfield, PlayfieldError> {
        let mut field = playfield.clone();
        let mut moving: Vec<I> = Vec::with_capacity(self.item_ids().count());

        for source in &self.sources {
            let (rest, taken) = field
                .slot::<I>(&source.slot)
                .ok_or_else(|| PlayfieldError::UnknownSlot(source.slot.clone()))?
                .take(&source.items)?;
            moving.extend(taken);
            field = field.with_slot(rest)?;
        }

        let destination = field
            .slot::<I>(&self.destination)
            .ok_or_else(|| PlayfieldError::UnknownSlot(self.destination.clone()))?
            .add(&moving, self.before)?;
        field.with_slot(destination)
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} move #{} @{} [", self.kind, self.origin, self.turn_sequence)?;
        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}:", source.slot)?;
            for id in &source.items {
                write!(f, " {}", id.0)?;
            }
        }
        write!(f, "] -> {}", self.destination)
    }
}
