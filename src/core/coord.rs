//! Slot coordinates.
//!
//! Every slot on the playfield is addressed by `(ContainerId, SlotId)`.
//! Slots and containers never point back at the playfield that holds
//! them; code that needs a slot looks it up by coordinate against a
//! playfield it was handed.

use serde::{Deserialize, Serialize};

/// Name of a container ("stock", "waste", "p0-hand", ...).
///
/// Container ids are unique across the whole playfield, including across
/// item kinds.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub String);

impl ContainerId {
    /// Create a container ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the container name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContainerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Slot identifier, unique within its container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(pub u32);

impl SlotId {
    /// Create a new slot ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Address of a slot on the playfield.
///
/// ```
/// use tabletop_sync::core::{SlotCoord, SlotId};
///
/// let stock = SlotCoord::new("stock", 0);
/// assert_eq!(stock.container.as_str(), "stock");
/// assert_eq!(stock.slot, SlotId(0));
/// assert_eq!(stock.to_string(), "stock/0");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotCoord {
    /// Owning container.
    pub container: ContainerId,
    /// Slot within the container.
    pub slot: SlotId,
}

impl SlotCoord {
    /// Create a coordinate.
    pub fn new(container: impl Into<ContainerId>, slot: u32) -> Self {
        Self {
            container: container.into(),
            slot: SlotId(slot),
        }
    }
}

impl std::fmt::Display for SlotCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.container, self.slot.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_ordering() {
        let a = SlotCoord::new("p0", 1);
        let b = SlotCoord::new("p0", 2);
        let c = SlotCoord::new("p1", 0);

        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_container_id_from_str() {
        let id: ContainerId = "waste".into();
        assert_eq!(id, ContainerId::new("waste"));
        assert_eq!(id.to_string(), "waste");
    }

    #[test]
    fn test_serialization() {
        let coord = SlotCoord::new("stock", 3);
        let json = serde_json::to_string(&coord).unwrap();
        let deserialized: SlotCoord = serde_json::from_str(&json).unwrap();
        assert_eq!(coord, deserialized);
    }
}
