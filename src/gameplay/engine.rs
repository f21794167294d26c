//! The reconciliation engine: an ordered, bounded log of turns.

use std::collections::VecDeque;

use im::Vector;
use tracing::{debug, error, info, instrument, warn};

use super::{ChangeSet, EngineError};
use crate::core::GameplayConfig;
use crate::moves::Move;
use crate::playfield::Playfield;
use crate::turns::Turn;

/// Owns the turn log of one peer.
///
/// Every peer runs its own `Gameplay` over the same deterministic rules.
/// Two engines seeded with the same playfield that receive the same moves,
/// in any order, end up with identical logs.
///
/// The log is never empty. Its last turn is the current one, usually with
/// no pending moves; [`current_playfield`](Self::current_playfield) is what
/// the table looks like right now.
///
/// ## Usage
///
/// ```
/// use tabletop_sync::core::{Card, GameplayConfig, ItemId, ItemKind, SlotCoord};
/// use tabletop_sync::gameplay::Gameplay;
/// use tabletop_sync::moves::Move;
/// use tabletop_sync::playfield::{Container, Playfield, Slot};
///
/// let stock = SlotCoord::new("stock", 0);
/// let waste = SlotCoord::new("waste", 0);
/// let field = Playfield::new()
///     .with_container(Container::<Card>::with_empty_slots("stock", true, 1)).unwrap()
///     .with_container(Container::<Card>::with_empty_slots("waste", false, 1)).unwrap()
///     .with_slot(Slot::with_items(stock.clone(), &[Card::new(ItemId(1), 0)]).unwrap()).unwrap();
///
/// let mut gameplay = Gameplay::new(GameplayConfig::default(), field);
/// let mv = Move::new(ItemKind::Card, 0, 1, waste.clone()).with_source(stock.clone(), &[ItemId(1)]);
///
/// let changes = gameplay.integrate_move(mv).unwrap();
///
/// assert!(changes.contains(&stock) && changes.contains(&waste));
/// assert_eq!(gameplay.last_sequence(), 1);
/// assert_eq!(gameplay.current_playfield().locate::<Card>(ItemId(1)), Some(waste));
/// ```
#[derive(Clone, Debug)]
pub struct Gameplay {
    config: GameplayConfig,

    /// Turn log, oldest first. Never empty.
    turns: VecDeque<Turn>,

    /// Invalidated set of the most recently trimmed turn. Cascades into the
    /// head of the log on replay.
    horizon: Vector<Move>,
}

impl Gameplay {
    /// Start a log with a single empty turn over `playfield`.
    #[must_use]
    pub fn new(config: GameplayConfig, playfield: Playfield) -> Self {
        let mut turns = VecDeque::with_capacity(config.retention + 1);
        turns.push_back(Turn::new(playfield));
        Self {
            config,
            turns,
            horizon: Vector::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &GameplayConfig {
        &self.config
    }

    /// Replace the whole log, for a fresh start or a full-state sync.
    ///
    /// The turns must be non-empty and contiguous, each turn's playfield
    /// must belong to its sequence, and the head playfield must be
    /// consistent. Pending moves are re-sorted and the log replayed from
    /// its head. Returns every slot of the resulting current playfield.
    #[instrument(skip_all)]
    pub fn new_game(&mut self, turns: impl IntoIterator<Item = Turn>) -> Result<ChangeSet, EngineError> {
        let mut log = VecDeque::new();
        for turn in turns {
            let turn = normalize(turn)?;
            if let Some(previous) = log.back().map(Turn::sequence) {
                if turn.sequence() != previous + 1 {
                    error!(previous, next = turn.sequence(), "Rejected turn log with a gap");
                    return Err(EngineError::SequenceGap {
                        previous,
                        next: turn.sequence(),
                    });
                }
            }
            log.push_back(turn);
        }

        let head = log.front().ok_or(EngineError::EmptyLog)?;
        head.playfield().check_consistency().map_err(|e| {
            error!(error = %e, "Rejected turn log with inconsistent head playfield");
            EngineError::from(e)
        })?;

        info!(
            first = head.sequence(),
            turns = log.len(),
            "Starting new game"
        );
        self.turns = log;
        self.horizon = Vector::new();
        self.replay(0);
        self.trim();

        Ok(ChangeSet::all_slots(self.current_playfield()))
    }

    /// Add a move to the turn it targets and replay from there.
    ///
    /// Re-delivery of a move the turn already holds (pending or discarded)
    /// is a no-op. Returns the slots touched by every turn that was
    /// advanced.
    ///
    /// Fails without touching the log if the move is malformed or its turn
    /// is not in the log (never created yet, or already trimmed).
    #[instrument(skip_all, fields(sequence = mv.turn_sequence, origin = mv.origin))]
    pub fn integrate_move(&mut self, mv: Move) -> Result<ChangeSet, EngineError> {
        if let Err(e) = mv.validate() {
            warn!(error = %e, "Rejected malformed move");
            return Err(e.into());
        }

        let index = self.index_of(mv.turn_sequence).ok_or_else(|| {
            let err = self.unknown_turn(mv.turn_sequence);
            error!(error = %err, "Move targets a turn outside the log");
            err
        })?;

        if self.turns[index].contains(&mv) {
            debug!("Move already integrated");
            return Ok(ChangeSet::new());
        }

        debug!(%mv, "Integrating move");
        self.turns[index] = self.turns[index].with_move(mv);
        let changes = self.replay(index);
        self.trim();
        Ok(changes)
    }

    /// Overwrite the turn with the same sequence and replay from it.
    #[instrument(skip_all, fields(sequence = turn.sequence()))]
    pub fn restate_turn(&mut self, turn: Turn) -> Result<ChangeSet, EngineError> {
        let index = self.index_of(turn.sequence()).ok_or_else(|| {
            let err = self.unknown_turn(turn.sequence());
            error!(error = %err, "Restated turn is outside the log");
            err
        })?;
        let turn = normalize(turn)?;

        info!(moves = turn.moves().len(), "Restating turn");
        self.turns[index] = turn;
        let changes = self.replay(index);
        self.trim();
        Ok(changes)
    }

    /// Re-run replay over the whole log without new input.
    ///
    /// The log is a function of the moves each turn has received, so this
    /// leaves an already reconciled log unchanged.
    pub fn reconcile(&mut self) -> ChangeSet {
        let changes = self.replay(0);
        self.trim();
        changes
    }

    /// Check whether the log holds a turn with sequence `sequence`.
    #[must_use]
    pub fn has_sequence(&self, sequence: u64) -> bool {
        self.index_of(sequence).is_some()
    }

    /// The turn with sequence `sequence`, if still in the log.
    #[must_use]
    pub fn turn(&self, sequence: u64) -> Option<&Turn> {
        self.index_of(sequence).map(|index| &self.turns[index])
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// The last turn of the log.
    #[must_use]
    pub fn current_turn(&self) -> &Turn {
        self.tail()
    }

    /// The table as it stands: the last turn's snapshot.
    #[must_use]
    pub fn current_playfield(&self) -> &Playfield {
        self.tail().playfield()
    }

    #[must_use]
    pub fn first_sequence(&self) -> u64 {
        self.head().sequence()
    }

    #[must_use]
    pub fn last_sequence(&self) -> u64 {
        self.tail().sequence()
    }

    /// Number of turns in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn head(&self) -> &Turn {
        &self.turns[0]
    }

    fn tail(&self) -> &Turn {
        &self.turns[self.turns.len() - 1]
    }

    fn index_of(&self, sequence: u64) -> Option<usize> {
        let first = self.first_sequence();
        if sequence < first || sequence > self.last_sequence() {
            return None;
        }
        usize::try_from(sequence - first).ok()
    }

    fn unknown_turn(&self, sequence: u64) -> EngineError {
        EngineError::UnknownTurn {
            sequence,
            first: self.first_sequence(),
            last: self.last_sequence(),
        }
    }

    /// Recompute the log from `start` to its end.
    ///
    /// Every turn from `start` on is reopened, then discards cascade in
    /// from the turn before `start`. From there each turn is either
    /// advanced (valid: fold its moves into the next turn's snapshot) or
    /// resolved in place (invalid: drop the losers and cascade them
    /// forward), until a tail turn that has received no move is reached.
    ///
    /// A turn whose moves were all discarded still gets a successor. The
    /// length of the log then depends only on which moves arrived, so
    /// peers agree on the current sequence whatever order they saw the
    /// moves in.
    fn replay(&mut self, start: usize) -> ChangeSet {
        let mut changes = ChangeSet::new();

        for turn in self.turns.iter_mut().skip(start) {
            *turn = turn.reopened();
        }
        let upstream = match start {
            0 => self.horizon.clone(),
            _ => self.turns[start - 1].invalidated().clone(),
        };
        self.cascade(start, upstream);

        let mut i = start;
        while i < self.turns.len() {
            let turn = &self.turns[i];
            let is_tail = i + 1 == self.turns.len();

            if !turn.is_valid() {
                let resolved = turn.with_conflicts_resolved();
                for lost in resolved.invalidated().iter().filter(|mv| !turn.invalidated().contains(mv)) {
                    warn!(sequence = turn.sequence(), %lost, "Discarded conflicting move");
                }
                let invalidated = resolved.invalidated().clone();
                self.turns[i] = resolved;
                self.cascade(i + 1, invalidated);
                continue;
            }

            if is_tail && !turn.has_received() {
                break;
            }

            match turn.next_playfield() {
                Ok(next) => {
                    changes.record_turn(turn);
                    if is_tail {
                        self.turns.push_back(Turn::new(next));
                    } else {
                        let following = self.turns[i + 1].with_playfield(next);
                        self.turns[i + 1] = following;
                    }
                    assert_eq!(
                        self.turns[i + 1].sequence(),
                        self.turns[i].sequence() + 1,
                        "Replay produced a sequence gap after turn {}",
                        self.turns[i].sequence()
                    );
                    i += 1;
                }
                Err(stale) => {
                    warn!(error = %stale, "Discarded stale move");
                    let pruned = turn.with_discarded(stale.index);
                    let invalidated = pruned.invalidated().clone();
                    self.turns[i] = pruned;
                    self.cascade(i + 1, invalidated);
                }
            }
        }

        debug!(
            start,
            turns = self.turns.len(),
            changed = changes.len(),
            "Replay finished"
        );
        self.assert_contiguous();
        changes
    }

    /// Chain an invalidated set forward from turn `from`: each turn drops
    /// the moves conflicting with its predecessor's discards and passes
    /// its own discards on.
    fn cascade(&mut self, from: usize, mut invalidated: Vector<Move>) {
        for turn in self.turns.iter_mut().skip(from) {
            *turn = turn.with_conflicts_removed(&invalidated);
            invalidated = turn.invalidated().clone();
        }
    }

    /// Drop the oldest turns beyond the retention window.
    fn trim(&mut self) {
        while self.turns.len() > self.config.retention {
            if let Some(dropped) = self.turns.pop_front() {
                debug!(sequence = dropped.sequence(), "Trimmed turn from log");
                self.horizon = dropped.invalidated().clone();
            }
        }
        self.assert_contiguous();
    }

    fn assert_contiguous(&self) {
        for (previous, next) in self.turns.iter().zip(self.turns.iter().skip(1)) {
            assert_eq!(
                next.sequence(),
                previous.sequence() + 1,
                "Turn log jumps from {} to {}",
                previous.sequence(),
                next.sequence()
            );
        }
    }
}

/// Check a turn that came from outside and rebuild it through `with_move`
/// so its moves are in precedence order.
fn normalize(turn: Turn) -> Result<Turn, EngineError> {
    if turn.playfield().sequence() != turn.sequence() {
        error!(
            turn = turn.sequence(),
            playfield = turn.playfield().sequence(),
            "Rejected turn with mismatched snapshot"
        );
        return Err(EngineError::SnapshotMismatch {
            turn: turn.sequence(),
            playfield: turn.playfield().sequence(),
        });
    }

    for mv in turn.moves() {
        if mv.turn_sequence != turn.sequence() {
            error!(expected = turn.sequence(), found = mv.turn_sequence, "Rejected misplaced move");
            return Err(EngineError::MisplacedMove {
                expected: turn.sequence(),
                found: mv.turn_sequence,
            });
        }
        mv.validate()?;
    }

    Ok(Turn::with_moves(
        turn.playfield().clone(),
        turn.moves().iter().cloned(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, ItemId, ItemKind, SlotCoord};
    use crate::playfield::{Container, Slot};

    fn table() -> Playfield {
        let cards: Vec<_> = (1..=6).map(|id| Card::new(ItemId(id), id)).collect();
        Playfield::new()
            .with_container(Container::<Card>::with_empty_slots("stock", true, 1))
            .unwrap()
            .with_container(Container::<Card>::with_empty_slots("waste", false, 1))
            .unwrap()
            .with_slot(Slot::with_items(SlotCoord::new("stock", 0), &cards).unwrap())
            .unwrap()
    }

    fn card_move(sequence: u64, origin: u64, item: u32, from: &str, to: &str) -> Move {
        Move::new(ItemKind::Card, sequence, origin, SlotCoord::new(to, 0))
            .with_source(SlotCoord::new(from, 0), &[ItemId(item)])
    }

    #[test]
    fn test_new_has_single_empty_turn() {
        let gameplay = Gameplay::new(GameplayConfig::default(), table());

        assert_eq!(gameplay.len(), 1);
        assert!(!gameplay.is_empty());
        assert!(gameplay.current_turn().is_empty());
        assert!(gameplay.has_sequence(0));
        assert!(!gameplay.has_sequence(1));
    }

    #[test]
    fn test_integrate_advances_log() {
        let mut gameplay = Gameplay::new(GameplayConfig::default(), table());

        gameplay.integrate_move(card_move(0, 1, 1, "stock", "waste")).unwrap();
        gameplay.integrate_move(card_move(1, 2, 2, "stock", "waste")).unwrap();

        assert_eq!(gameplay.len(), 3);
        assert_eq!(gameplay.last_sequence(), 2);
        let waste = gameplay.current_playfield().slot::<Card>(&SlotCoord::new("waste", 0)).unwrap();
        assert_eq!(waste.ids().collect::<Vec<_>>(), vec![ItemId(1), ItemId(2)]);
    }

    #[test]
    fn test_unknown_turn_is_rejected() {
        let mut gameplay = Gameplay::new(GameplayConfig::default(), table());

        let err = gameplay.integrate_move(card_move(3, 1, 1, "stock", "waste")).unwrap_err();

        assert_eq!(err, EngineError::UnknownTurn { sequence: 3, first: 0, last: 0 });
        assert_eq!(gameplay.len(), 1);
    }

    #[test]
    fn test_malformed_move_is_rejected() {
        let mut gameplay = Gameplay::new(GameplayConfig::default(), table());
        let empty = Move::new(ItemKind::Card, 0, 1, SlotCoord::new("waste", 0));

        assert!(matches!(
            gameplay.integrate_move(empty),
            Err(EngineError::MalformedMove(_))
        ));
    }

    #[test]
    fn test_redelivery_is_noop() {
        let mut gameplay = Gameplay::new(GameplayConfig::default(), table());
        let mv = card_move(0, 1, 1, "stock", "waste");

        gameplay.integrate_move(mv.clone()).unwrap();
        let before: Vec<Turn> = gameplay.turns().cloned().collect();
        let changes = gameplay.integrate_move(mv).unwrap();

        assert!(changes.is_empty());
        assert_eq!(gameplay.turns().cloned().collect::<Vec<_>>(), before);
    }

    #[test]
    fn test_stale_move_is_discarded() {
        let mut gameplay = Gameplay::new(GameplayConfig::default(), table());
        gameplay.integrate_move(card_move(0, 1, 1, "stock", "waste")).unwrap();

        // Card 2 is still in the stock at turn 1, not in the waste
        let stale = card_move(1, 2, 2, "waste", "stock");
        gameplay.integrate_move(stale.clone()).unwrap();

        let turn = gameplay.turn(1).unwrap();
        assert!(turn.is_empty());
        assert!(turn.invalidated().contains(&stale));
        // The turn saw a move, so it still gets a successor
        assert_eq!(gameplay.len(), 3);
        assert_eq!(gameplay.current_playfield(), &turn.playfield().with_sequence(2));
    }

    #[test]
    fn test_restate_turn() {
        let mut gameplay = Gameplay::new(GameplayConfig::default(), table());
        gameplay.integrate_move(card_move(0, 1, 1, "stock", "waste")).unwrap();

        let restated = Turn::with_moves(table(), vec![card_move(0, 9, 3, "stock", "waste")]);
        gameplay.restate_turn(restated).unwrap();

        let field = gameplay.current_playfield();
        assert_eq!(field.locate::<Card>(ItemId(3)), Some(SlotCoord::new("waste", 0)));
        assert_eq!(field.locate::<Card>(ItemId(1)), Some(SlotCoord::new("stock", 0)));
    }

    #[test]
    fn test_restate_unknown_turn() {
        let mut gameplay = Gameplay::new(GameplayConfig::default(), table());
        let turn = Turn::new(table().with_sequence(4));

        assert!(matches!(
            gameplay.restate_turn(turn),
            Err(EngineError::UnknownTurn { sequence: 4, .. })
        ));
    }

    #[test]
    fn test_new_game_rejects_gap() {
        let mut gameplay = Gameplay::new(GameplayConfig::default(), table());
        let turns = vec![Turn::new(table()), Turn::new(table().with_sequence(2))];

        assert_eq!(
            gameplay.new_game(turns),
            Err(EngineError::SequenceGap { previous: 0, next: 2 })
        );
        assert_eq!(gameplay.len(), 1);
    }

    #[test]
    fn test_new_game_rejects_empty() {
        let mut gameplay = Gameplay::new(GameplayConfig::default(), table());
        assert_eq!(gameplay.new_game(Vec::new()), Err(EngineError::EmptyLog));
    }

    #[test]
    fn test_new_game_replays_moves() {
        let mut gameplay = Gameplay::new(GameplayConfig::default(), table());
        let turns = vec![Turn::with_moves(
            table().with_sequence(5),
            vec![card_move(5, 1, 4, "stock", "waste")],
        )];

        let changes = gameplay.new_game(turns).unwrap();

        assert_eq!(gameplay.first_sequence(), 5);
        assert_eq!(gameplay.last_sequence(), 6);
        assert_eq!(changes.len(), 2);
        assert_eq!(
            gameplay.current_playfield().locate::<Card>(ItemId(4)),
            Some(SlotCoord::new("waste", 0))
        );
    }

    #[test]
    fn test_trim_keeps_retention() {
        let config = GameplayConfig::default().with_retention(3);
        let mut gameplay = Gameplay::new(config, table());

        for (sequence, item) in (0..5).zip(1..) {
            gameplay
                .integrate_move(card_move(sequence, sequence + 1, item, "stock", "waste"))
                .unwrap();
        }

        assert_eq!(gameplay.len(), 3);
        assert_eq!(gameplay.first_sequence(), 3);
        assert_eq!(gameplay.last_sequence(), 5);
        assert!(!gameplay.has_sequence(2));
    }
}
