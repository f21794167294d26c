//! Seeded dealing.

use tracing::debug;

use crate::core::{Card, GameRng, Item, ItemId, SlotCoord};
use crate::playfield::{Playfield, PlayfieldError, Slot};

/// A full run of cards with ids `1..=count` and faces `0..count`.
#[must_use]
pub fn deck(count: u32) -> Vec<Card> {
    (0..count).map(|face| Card::new(ItemId(face + 1), face)).collect()
}

/// Shuffle `items` with `seed` and put them on top of the slot at `coord`.
///
/// Every peer calling this with the same arguments gets the same playfield.
/// Fails if the slot does not exist or an item is already on the playfield.
///
/// ```
/// use tabletop_sync::core::{Card, SlotCoord};
/// use tabletop_sync::playfield::{Container, Playfield};
/// use tabletop_sync::setup::{deal_into, deck};
///
/// let stock = SlotCoord::new("stock", 0);
/// let field = Playfield::new()
///     .with_container(Container::<Card>::with_empty_slots("stock", true, 1))
///     .unwrap();
///
/// let a = deal_into(&field, &stock, deck(52), 7).unwrap();
/// let b = deal_into(&field, &stock, deck(52), 7).unwrap();
///
/// assert_eq!(a, b);
/// assert_eq!(a.item_count::<Card>(), 52);
/// ```
pub fn deal_into<I: Item>(
    playfield: &Playfield,
    coord: &SlotCoord,
    mut items: Vec<I>,
    seed: u64,
) -> Result<Playfield, PlayfieldError> {
    let slot = playfield
        .slot::<I>(coord)
        .ok_or_else(|| PlayfieldError::UnknownSlot(coord.clone()))?;

    GameRng::new(seed).shuffle(&mut items);
    let field = playfield.with_slot(slot.add(&items, None)?)?;
    field.check_consistency()?;

    debug!(%coord, count = items.len(), seed, "Dealt items");
    Ok(field)
}

/// Deal `per_target` items, one at a time in rotation, from the top of
/// `from` onto each slot in `targets`.
///
/// Stops early without error when `from` runs out.
pub fn deal_round_robin<I: Item>(
    playfield: &Playfield,
    from: &SlotCoord,
    targets: &[SlotCoord],
    per_target: usize,
) -> Result<Playfield, PlayfieldError> {
    let mut field = playfield.clone();

    for _ in 0..per_target {
        for target in targets {
            let source = field
                .slot::<I>(from)
                .ok_or_else(|| PlayfieldError::UnknownSlot(from.clone()))?;
            let Some(top) = source.top().map(Item::id) else {
                return Ok(field);
            };
            let dest = field
                .slot::<I>(target)
                .ok_or_else(|| PlayfieldError::UnknownSlot(target.clone()))?;

            let (source, taken) = source.take(&[top])?;
            let dest: Slot<I> = dest.add(&taken, None)?;
            field = field.with_slot(source)?.with_slot(dest)?;
        }
    }

    Ok(field)
}
