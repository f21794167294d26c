//! Identity-bearing items: cards and chips.
//!
//! Items are immutable values. Identity is carried by `ItemId`, which is
//! unique **within one item kind**: card 7 and chip 7 are unrelated.
//!
//! ## Usage
//!
//! ```
//! use tabletop_sync::core::{Card, Chip, Item, ItemId, ItemKind};
//!
//! let ace = Card::new(ItemId(7), 1);
//! let chip = Chip::new(ItemId(7), 25);
//!
//! assert_eq!(ace.id(), chip.id());
//! assert_eq!(Card::KIND, ItemKind::Card);
//! assert_eq!(Chip::KIND, ItemKind::Chip);
//! ```

use std::fmt::Debug;
use std::hash::Hash;

use im::Vector;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::playfield::{Container, Playfield};

/// Stable identifier of an item within its kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl ItemId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for ItemId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Item({})", self.0)
    }
}

/// Tag distinguishing the item kinds a playfield holds.
///
/// Moves carry this tag so turns and the gameplay engine can treat every
/// move uniformly while each kind keeps its own containers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Playing cards.
    Card,
    /// Betting chips.
    Chip,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Card => f.write_str("card"),
            Self::Chip => f.write_str("chip"),
        }
    }
}

/// An item that can live in a slot.
///
/// Implementors also know where their containers live inside a
/// [`Playfield`], which lets slot-level code stay generic while the
/// playfield stores each kind separately.
pub trait Item:
    Clone + Debug + PartialEq + Eq + Hash + Serialize + DeserializeOwned + 'static
{
    /// The kind tag for this item type.
    const KIND: ItemKind;

    /// Stable identity of this item.
    fn id(&self) -> ItemId;

    /// This kind's containers within a playfield.
    fn containers(playfield: &Playfield) -> &Vector<Container<Self>>;

    /// A copy of `playfield` with this kind's containers replaced.
    fn with_containers(playfield: &Playfield, containers: Vector<Container<Self>>) -> Playfield;
}

/// A playing card.
///
/// `face` is an opaque value assigned by the game (rank/suit encoding,
/// deck index, ...). The engine only looks at `id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    /// Identity of this card.
    pub id: ItemId,
    /// Game-defined face value.
    pub face: u32,
}

impl Card {
    /// Create a card.
    #[must_use]
    pub const fn new(id: ItemId, face: u32) -> Self {
        Self { id, face }
    }
}

impl Item for Card {
    const KIND: ItemKind = ItemKind::Card;

    fn id(&self) -> ItemId {
        self.id
    }

    fn containers(playfield: &Playfield) -> &Vector<Container<Self>> {
        playfield.cards()
    }

    fn with_containers(playfield: &Playfield, containers: Vector<Container<Self>>) -> Playfield {
        playfield.with_cards(containers)
    }
}

/// A betting chip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chip {
    /// Identity of this chip.
    pub id: ItemId,
    /// Chip value.
    pub denomination: u32,
}

impl Chip {
    /// Create a chip.
    #[must_use]
    pub const fn new(id: ItemId, denomination: u32) -> Self {
        Self { id, denomination }
    }
}

impl Item for Chip {
    const KIND: ItemKind = ItemKind::Chip;

    fn id(&self) -> ItemId {
        self.id
    }

    fn containers(playfield: &Playfield) -> &Vector<Container<Self>> {
        playfield.chips()
    }

    fn with_containers(playfield: &Playfield, containers: Vector<Container<Self>>) -> Playfield {
        playfield.with_chips(containers)
    }
}
