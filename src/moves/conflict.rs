//! Conflict detection and deterministic resolution between moves.
//!
//! Two moves of the same item kind conflict when
//! - they claim a common item (it cannot end up in two slots), or
//! - one inserts before an anchor item that the other relocates.
//!
//! Moves of different kinds never conflict. Moves with disjoint items and
//! no anchor dependency commute except for their relative order inside a
//! shared destination, which the turn's precedence ordering fixes.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Move;
use crate::core::{ItemId, SlotCoord};

/// Outcome of resolving a pair of moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// The moves do not actually conflict; keep both.
    BothStay,
    /// Keep the left (receiver) move, discard the right.
    LeftStay,
    /// Keep the right (argument) move, discard the left.
    RightStay,
    /// Discard both.
    BothRemove,
}

/// Structural problems that make a move meaningless on any playfield.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("move has no sources")]
    NoSources,

    #[error("source {0} lists no items")]
    EmptySource(SlotCoord),

    #[error("source {0} is listed twice")]
    DuplicateSource(SlotCoord),

    #[error("{0} is moved more than once")]
    DuplicateItem(ItemId),

    #[error("anchor {0} is itself being moved")]
    AnchorMoved(ItemId),
}

impl Move {
    /// Check that the move is well formed, independent of any playfield.
    pub fn validate(&self) -> Result<(), MoveError> {
        if self.sources.is_empty() {
            return Err(MoveError::NoSources);
        }

        let mut slots = FxHashSet::default();
        let mut items = FxHashSet::default();
        for source in &self.sources {
            if source.items.is_empty() {
                return Err(MoveError::EmptySource(source.slot.clone()));
            }
            if !slots.insert(&source.slot) {
                return Err(MoveError::DuplicateSource(source.slot.clone()));
            }
            for &id in &source.items {
                if !items.insert(id) {
                    return Err(MoveError::DuplicateItem(id));
                }
            }
        }

        match self.before {
            Some(anchor) if items.contains(&anchor) => Err(MoveError::AnchorMoved(anchor)),
            _ => Ok(()),
        }
    }

    /// Check whether applying both moves in one turn could leave the
    /// playfield inconsistent. Symmetric.
    #[must_use]
    pub fn is_conflicting_with(&self, other: &Move) -> bool {
        self.kind == other.kind
            && (self.shares_items_with(other) || self.anchored_on(other) || other.anchored_on(self))
    }

    /// Decide which of two moves survive.
    ///
    /// - no conflict: `BothStay`
    /// - a shared item: the move with the lower precedence key stays
    /// - one move's anchor is relocated by the other: the anchored move goes
    /// - each relocates the other's anchor: `BothRemove`
    ///
    /// `a.resolve_conflict_with(b)` and `b.resolve_conflict_with(a)` always
    /// agree on which moves survive.
    #[must_use]
    pub fn resolve_conflict_with(&self, other: &Move) -> Resolution {
        if !self.is_conflicting_with(other) {
            return Resolution::BothStay;
        }

        if self.shares_items_with(other) {
            return if self <= other {
                Resolution::LeftStay
            } else {
                Resolution::RightStay
            };
        }

        match (self.anchored_on(other), other.anchored_on(self)) {
            (true, true) => Resolution::BothRemove,
            (true, false) => Resolution::RightStay,
            (false, true) => Resolution::LeftStay,
            (false, false) => Resolution::BothStay,
        }
    }

    fn shares_items_with(&self, other: &Move) -> bool {
        self.item_ids().any(|id| other.moves_item(id))
    }

    fn anchored_on(&self, other: &Move) -> bool {
        self.before.is_some_and(|anchor| other.moves_item(anchor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ItemKind;

    fn card_move(origin: u64, items: &[u32], from: &str, to: &str) -> Move {
        let ids: Vec<_> = items.iter().copied().map(ItemId).collect();
        Move::new(ItemKind::Card, 0, origin, SlotCoord::new(to, 0))
            .with_source(SlotCoord::new(from, 0), &ids)
    }

    #[test]
    fn test_shared_item_conflicts() {
        let a = card_move(1, &[7], "stock", "p0");
        let b = card_move(2, &[7], "stock", "p1");

        assert!(a.is_conflicting_with(&b));
        assert!(b.is_conflicting_with(&a));
        assert_eq!(a.resolve_conflict_with(&b), Resolution::LeftStay);
        assert_eq!(b.resolve_conflict_with(&a), Resolution::RightStay);
    }

    #[test]
    fn test_equal_origin_falls_back_to_content() {
        let a = card_move(3, &[7], "stock", "p0");
        let b = card_move(3, &[7], "stock", "p1");

        // "p0" < "p1", so `a` has precedence on every peer
        assert_eq!(a.resolve_conflict_with(&b), Resolution::LeftStay);
        assert_eq!(b.resolve_conflict_with(&a), Resolution::RightStay);
    }

    #[test]
    fn test_disjoint_moves_stay() {
        let a = card_move(1, &[7], "stock", "p0");
        let b = card_move(2, &[8], "stock", "p0");

        assert!(!a.is_conflicting_with(&b));
        assert_eq!(a.resolve_conflict_with(&b), Resolution::BothStay);
    }

    #[test]
    fn test_kinds_never_conflict() {
        let a = card_move(1, &[7], "stock", "p0");
        let mut b = card_move(2, &[7], "pot", "p1");
        b.kind = ItemKind::Chip;

        assert!(!a.is_conflicting_with(&b));
    }

    #[test]
    fn test_anchor_dependency() {
        // `a` inserts before card 9; `b` takes card 9 away
        let a = card_move(1, &[7], "stock", "waste").with_before(ItemId(9));
        let b = card_move(2, &[9], "waste", "p0");

        assert!(a.is_conflicting_with(&b));
        assert_eq!(a.resolve_conflict_with(&b), Resolution::RightStay);
        assert_eq!(b.resolve_conflict_with(&a), Resolution::LeftStay);
    }

    #[test]
    fn test_mutual_anchor_removes_both() {
        let a = card_move(1, &[7], "p0", "p1").with_before(ItemId(8));
        let b = card_move(2, &[8], "p1", "p0").with_before(ItemId(7));

        assert_eq!(a.resolve_conflict_with(&b), Resolution::BothRemove);
        assert_eq!(b.resolve_conflict_with(&a), Resolution::BothRemove);
    }

    #[test]
    fn test_validate() {
        assert!(card_move(1, &[7], "stock", "p0").validate().is_ok());

        let none = Move::new(ItemKind::Card, 0, 1, SlotCoord::new("p0", 0));
        assert_eq!(none.validate(), Err(MoveError::NoSources));

        let empty = card_move(1, &[], "stock", "p0");
        assert_eq!(empty.validate(), Err(MoveError::EmptySource(SlotCoord::new("stock", 0))));

        let twice = card_move(1, &[7, 7], "stock", "p0");
        assert_eq!(twice.validate(), Err(MoveError::DuplicateItem(ItemId(7))));

        let repeated = card_move(1, &[7], "stock", "p0").with_source(SlotCoord::new("stock", 0), &[ItemId(8)]);
        assert_eq!(
            repeated.validate(),
            Err(MoveError::DuplicateSource(SlotCoord::new("stock", 0)))
        );

        let self_anchor = card_move(1, &[7], "stock", "p0").with_before(ItemId(7));
        assert_eq!(self_anchor.validate(), Err(MoveError::AnchorMoved(ItemId(7))));
    }
}
