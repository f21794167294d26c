//! A playfield snapshot plus the moves proposed against it.

use im::Vector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::moves::{Move, Resolution};
use crate::playfield::{Playfield, PlayfieldError};

/// A move in a valid turn failed to apply to the turn's playfield.
///
/// Happens when the playfield was rebound after an upstream turn changed
/// and the move was issued against the old outcome.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("move {index} of turn {sequence} no longer applies: {source}")]
pub struct StaleMove {
    /// Sequence of the turn holding the move.
    pub sequence: u64,
    /// Index of the move in the turn's move list.
    pub index: usize,
    /// Why it failed.
    pub source: PlayfieldError,
}

/// One entry of the turn log.
///
/// `moves` is kept sorted by precedence (`Ord` on [`Move`]). Arrival order
/// differs between peers; precedence order does not, so folding and
/// resolving in list order gives the same answer everywhere. Inserting a
/// move never changes the relative order of the moves already present.
///
/// `invalidated` holds moves discarded by conflict resolution or by
/// cascading from an upstream turn. It is diagnostic metadata and is not
/// serialized.
///
/// ## Example
///
/// ```
/// use tabletop_sync::core::{ItemKind, ItemId, SlotCoord};
/// use tabletop_sync::moves::Move;
/// use tabletop_sync::playfield::Playfield;
/// use tabletop_sync::turns::Turn;
///
/// let turn = Turn::new(Playfield::new());
/// assert!(turn.is_empty());
///
/// let mv = Move::new(ItemKind::Card, 0, 1, SlotCoord::new("waste", 0))
///     .with_source(SlotCoord::new("stock", 0), &[ItemId(1)]);
/// let turn = turn.with_move(mv.clone());
///
/// assert!(turn.contains(&mv));
/// assert!(turn.is_valid());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    playfield: Playfield,
    sequence: u64,
    moves: Vector<Move>,
    #[serde(skip)]
    invalidated: Vector<Move>,
}

impl Turn {
    /// Create an empty turn over `playfield`, at the playfield's sequence.
    #[must_use]
    pub fn new(playfield: Playfield) -> Self {
        Self {
            sequence: playfield.sequence(),
            playfield,
            moves: Vector::new(),
            invalidated: Vector::new(),
        }
    }

    /// Create a turn over `playfield` with the given pending moves.
    ///
    /// Panics if a move targets another sequence.
    pub fn with_moves(playfield: Playfield, moves: impl IntoIterator<Item = Move>) -> Self {
        moves
            .into_iter()
            .fold(Self::new(playfield), |turn, mv| turn.with_move(mv))
    }

    /// Snapshot at the start of this turn.
    #[must_use]
    pub fn playfield(&self) -> &Playfield {
        &self.playfield
    }

    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Pending moves in precedence order.
    #[must_use]
    pub fn moves(&self) -> &Vector<Move> {
        &self.moves
    }

    /// Moves discarded from this turn, in precedence order.
    #[must_use]
    pub fn invalidated(&self) -> &Vector<Move> {
        &self.invalidated
    }

    /// True when no moves are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// True when the turn holds any move, pending or discarded.
    #[must_use]
    pub fn has_received(&self) -> bool {
        !self.moves.is_empty() || !self.invalidated.is_empty()
    }

    /// True when no two pending moves conflict.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.moves.iter().enumerate().all(|(i, a)| {
            self.moves
                .iter()
                .skip(i + 1)
                .all(|b| !a.is_conflicting_with(b))
        })
    }

    /// Check whether this turn has seen `mv`, pending or discarded.
    #[must_use]
    pub fn contains(&self, mv: &Move) -> bool {
        self.moves.binary_search(mv).is_ok() || self.invalidated.binary_search(mv).is_ok()
    }

    /// Insert a move at its precedence position. Already-pending moves are
    /// not duplicated.
    ///
    /// Panics if the move targets another sequence.
    #[must_use]
    pub fn with_move(&self, mv: Move) -> Self {
        assert_eq!(
            mv.turn_sequence, self.sequence,
            "Move for turn {} added to turn {}",
            mv.turn_sequence, self.sequence
        );

        Self {
            moves: insert_sorted(&self.moves, mv),
            ..self.clone()
        }
    }

    /// Same moves over a new snapshot.
    ///
    /// Panics if the snapshot belongs to another sequence.
    #[must_use]
    pub fn with_playfield(&self, playfield: Playfield) -> Self {
        assert_eq!(
            playfield.sequence(),
            self.sequence,
            "Playfield {} rebound onto turn {}",
            playfield.sequence(),
            self.sequence
        );

        Self {
            playfield,
            ..self.clone()
        }
    }

    /// Fold every pending move over this turn's playfield, in list order.
    /// The result belongs to `sequence + 1`.
    ///
    /// Panics if the turn is not valid.
    pub fn next_playfield(&self) -> Result<Playfield, StaleMove> {
        assert!(self.is_valid(), "Turn {} has conflicting moves", self.sequence);

        let mut field = self.playfield.clone();
        for (index, mv) in self.moves.iter().enumerate() {
            field = mv.apply(&field).map_err(|source| StaleMove {
                sequence: self.sequence,
                index,
                source,
            })?;
        }
        Ok(field.with_sequence(self.sequence + 1))
    }

    /// Move the pending move at `index` to the invalidated set.
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn with_discarded(&self, index: usize) -> Self {
        let mut moves = self.moves.clone();
        let dropped = moves.remove(index);
        Self {
            moves,
            invalidated: insert_sorted(&self.invalidated, dropped),
            ..self.clone()
        }
    }

    /// Drop every pending move that conflicts with anything in
    /// `invalidated`, adding the drops to this turn's invalidated set.
    ///
    /// Used to cascade discards from an upstream turn: a move built on top
    /// of a discarded one must go too.
    #[must_use]
    pub fn with_conflicts_removed(&self, invalidated: &Vector<Move>) -> Self {
        if invalidated.is_empty() {
            return self.clone();
        }

        let (dropped, kept): (Vector<Move>, Vector<Move>) = self
            .moves
            .iter()
            .cloned()
            .partition(|mv| invalidated.iter().any(|gone| mv.is_conflicting_with(gone)));

        Self {
            moves: kept,
            invalidated: dropped
                .into_iter()
                .fold(self.invalidated.clone(), |acc, mv| insert_sorted(&acc, mv)),
            ..self.clone()
        }
    }

    /// Reduce the pending moves to a conflict-free subset.
    ///
    /// One linear pass in list order: each candidate is compared with every
    /// move accepted so far and [`Move::resolve_conflict_with`] decides who
    /// survives. Accepted moves the candidate beats are only dropped once
    /// the candidate has cleared every comparison; if some other accepted
    /// move beats it, they stay. Because a candidate is checked against
    /// all accepted moves and accepted moves are only ever removed, the
    /// survivors are pairwise conflict-free when the pass ends.
    ///
    /// Panics if there are no pending moves.
    #[must_use]
    pub fn with_conflicts_resolved(&self) -> Self {
        assert!(
            !self.moves.is_empty(),
            "Cannot resolve conflicts in turn {} with no moves",
            self.sequence
        );

        let mut accepted: Vec<Move> = Vec::with_capacity(self.moves.len());
        let mut invalidated = self.invalidated.clone();

        for candidate in &self.moves {
            let mut keep = true;
            // Indices into `accepted`, ascending
            let mut beaten = Vec::new();
            let mut i = 0;
            while i < accepted.len() {
                match accepted[i].resolve_conflict_with(candidate) {
                    Resolution::BothStay => i += 1,
                    Resolution::RightStay => {
                        beaten.push(i);
                        i += 1;
                    }
                    Resolution::LeftStay => {
                        keep = false;
                        break;
                    }
                    Resolution::BothRemove => {
                        invalidated = insert_sorted(&invalidated, accepted.remove(i));
                        keep = false;
                        break;
                    }
                }
            }

            if keep {
                for index in beaten.into_iter().rev() {
                    invalidated = insert_sorted(&invalidated, accepted.remove(index));
                }
                accepted.push(candidate.clone());
            } else {
                invalidated = insert_sorted(&invalidated, candidate.clone());
            }
        }

        Self {
            moves: accepted.into_iter().collect(),
            invalidated,
            ..self.clone()
        }
    }

    /// Put every discarded move back among the pending ones.
    ///
    /// Replay reopens turns before recomputing them so that the outcome
    /// depends only on which moves a turn has received, not on the order
    /// earlier resolutions happened in.
    #[must_use]
    pub fn reopened(&self) -> Self {
        if self.invalidated.is_empty() {
            return self.clone();
        }

        Self {
            moves: self
                .invalidated
                .iter()
                .cloned()
                .fold(self.moves.clone(), |acc, mv| insert_sorted(&acc, mv)),
            invalidated: Vector::new(),
            ..self.clone()
        }
    }
}

fn insert_sorted(moves: &Vector<Move>, mv: Move) -> Vector<Move> {
    match moves.binary_search(&mv) {
        Ok(_) => moves.clone(),
        Err(index) => {
            let mut next = moves.clone();
            next.insert(index, mv);
            next
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, ItemId, ItemKind, SlotCoord};
    use crate::playfield::{Container, Slot};

    fn table() -> Playfield {
        let cards: Vec<_> = (1..=4).map(|id| Card::new(ItemId(id), id)).collect();
        Playfield::new()
            .with_container(Container::<Card>::with_empty_slots("stock", true, 1))
            .unwrap()
            .with_container(Container::<Card>::with_empty_slots("p0", false, 1))
            .unwrap()
            .with_container(Container::<Card>::with_empty_slots("p1", false, 1))
            .unwrap()
            .with_slot(Slot::with_items(SlotCoord::new("stock", 0), &cards).unwrap())
            .unwrap()
    }

    fn card_move(origin: u64, item: u32, from: &str, to: &str) -> Move {
        Move::new(ItemKind::Card, 0, origin, SlotCoord::new(to, 0))
            .with_source(SlotCoord::new(from, 0), &[ItemId(item)])
    }

    #[test]
    fn test_with_move_keeps_precedence_order() {
        let a = card_move(1, 1, "stock", "p0");
        let b = card_move(2, 2, "stock", "p0");
        let c = card_move(3, 3, "stock", "p1");

        let forward = Turn::new(table()).with_move(a.clone()).with_move(b.clone()).with_move(c.clone());
        let backward = Turn::new(table()).with_move(c).with_move(b).with_move(a);

        assert_eq!(forward, backward);
        assert_eq!(forward.moves().len(), 3);
    }

    #[test]
    fn test_with_move_ignores_duplicate() {
        let a = card_move(1, 1, "stock", "p0");
        let turn = Turn::new(table()).with_move(a.clone()).with_move(a);
        assert_eq!(turn.moves().len(), 1);
    }

    #[test]
    #[should_panic(expected = "Move for turn 5")]
    fn test_with_move_wrong_sequence_panics() {
        let mv = card_move(1, 1, "stock", "p0").stamped(5, 1);
        let _ = Turn::new(table()).with_move(mv);
    }

    #[test]
    fn test_next_playfield_folds_moves() {
        let turn = Turn::new(table())
            .with_move(card_move(1, 1, "stock", "p0"))
            .with_move(card_move(2, 2, "stock", "p1"));

        let next = turn.next_playfield().unwrap();

        assert_eq!(next.sequence(), 1);
        assert_eq!(next.locate::<Card>(ItemId(1)), Some(SlotCoord::new("p0", 0)));
        assert_eq!(next.locate::<Card>(ItemId(2)), Some(SlotCoord::new("p1", 0)));
        assert_eq!(turn.playfield().sequence(), 0);
    }

    #[test]
    fn test_next_playfield_reports_stale_move() {
        let turn = Turn::new(table()).with_move(card_move(1, 1, "p0", "p1"));

        let err = turn.next_playfield().unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(err.sequence, 0);
    }

    #[test]
    #[should_panic(expected = "conflicting")]
    fn test_next_playfield_requires_valid() {
        let turn = Turn::new(table())
            .with_move(card_move(1, 1, "stock", "p0"))
            .with_move(card_move(2, 1, "stock", "p1"));
        let _ = turn.next_playfield();
    }

    #[test]
    fn test_conflicts_resolved_by_precedence() {
        let winner = card_move(1, 1, "stock", "p1");
        let loser = card_move(2, 1, "stock", "p0");
        let bystander = card_move(3, 2, "stock", "p0");

        let turn = Turn::new(table())
            .with_move(loser.clone())
            .with_move(bystander.clone())
            .with_move(winner.clone());
        assert!(!turn.is_valid());

        let resolved = turn.with_conflicts_resolved();

        assert!(resolved.is_valid());
        assert_eq!(resolved.moves().iter().cloned().collect::<Vec<_>>(), vec![winner, bystander]);
        assert_eq!(resolved.invalidated().iter().cloned().collect::<Vec<_>>(), vec![loser]);
    }

    #[test]
    fn test_conflicts_resolved_anchor_loser_goes() {
        // origin 1 anchors on card 2; origin 2 takes card 2 away
        let field = table();
        let anchored = Move::new(ItemKind::Card, 0, 1, SlotCoord::new("stock", 0))
            .with_source(SlotCoord::new("stock", 0), &[ItemId(4)])
            .with_before(ItemId(2));
        let taker = card_move(2, 2, "stock", "p0");

        let resolved = Turn::new(field)
            .with_move(anchored.clone())
            .with_move(taker.clone())
            .with_conflicts_resolved();

        assert_eq!(resolved.moves().iter().cloned().collect::<Vec<_>>(), vec![taker]);
        assert!(resolved.invalidated().contains(&anchored));
    }

    #[test]
    fn test_conflicts_resolved_spares_move_whose_rival_lost() {
        // Re-tucks card 4 under card 2
        let tuck = Move::new(ItemKind::Card, 0, 1, SlotCoord::new("stock", 0))
            .with_source(SlotCoord::new("stock", 0), &[ItemId(4)])
            .with_before(ItemId(2));
        let single = card_move(2, 1, "stock", "p1");
        // Takes tuck's anchor, but loses card 1 to `single`
        let pair = Move::new(ItemKind::Card, 0, 3, SlotCoord::new("p1", 0))
            .with_source(SlotCoord::new("stock", 0), &[ItemId(1), ItemId(2)]);

        let resolved = Turn::new(table())
            .with_move(pair.clone())
            .with_move(single.clone())
            .with_move(tuck.clone())
            .with_conflicts_resolved();

        assert!(resolved.is_valid());
        assert_eq!(resolved.moves().iter().cloned().collect::<Vec<_>>(), vec![tuck, single]);
        assert_eq!(resolved.invalidated().iter().cloned().collect::<Vec<_>>(), vec![pair]);
    }

    #[test]
    #[should_panic(expected = "no moves")]
    fn test_resolve_empty_panics() {
        let _ = Turn::new(table()).with_conflicts_resolved();
    }

    #[test]
    fn test_conflicts_removed_cascades() {
        let upstream: Vector<Move> = vec![card_move(1, 1, "stock", "p0")].into_iter().collect();
        let dependent = card_move(4, 1, "p0", "p1").stamped(1, 4);
        let unrelated = card_move(5, 3, "stock", "p1").stamped(1, 5);

        let field = table().with_sequence(1);
        let turn = Turn::new(field).with_move(dependent.clone()).with_move(unrelated.clone());

        let next = turn.with_conflicts_removed(&upstream);

        assert_eq!(next.moves().iter().cloned().collect::<Vec<_>>(), vec![unrelated]);
        assert_eq!(next.invalidated().iter().cloned().collect::<Vec<_>>(), vec![dependent]);
    }

    #[test]
    fn test_with_discarded_and_reopened() {
        let a = card_move(1, 1, "stock", "p0");
        let b = card_move(2, 2, "stock", "p0");
        let turn = Turn::new(table()).with_move(a.clone()).with_move(b.clone());

        let discarded = turn.with_discarded(0);
        assert_eq!(discarded.moves().len(), 1);
        assert!(discarded.contains(&a));
        assert!(discarded.invalidated().contains(&a));

        let reopened = discarded.reopened();
        assert_eq!(reopened, turn);
        assert!(reopened.invalidated().is_empty());
    }

    #[test]
    fn test_serialization_skips_invalidated() {
        let turn = Turn::new(table())
            .with_move(card_move(1, 1, "stock", "p0"))
            .with_move(card_move(2, 1, "stock", "p1"))
            .with_conflicts_resolved();

        let json = serde_json::to_string(&turn).unwrap();
        let deserialized: Turn = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.moves(), turn.moves());
        assert!(deserialized.invalidated().is_empty());
    }
}
