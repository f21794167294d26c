//! Binary wire encoding for peer messages.
//!
//! ```
//! use tabletop_sync::net::{decode, encode, PeerMessage};
//!
//! let bytes = encode(&PeerMessage::RequestSync).unwrap();
//! assert_eq!(decode(&bytes).unwrap(), PeerMessage::RequestSync);
//! ```

use thiserror::Error;

use super::PeerMessage;

/// A message could not be converted to or from bytes.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode message: {0}")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode message: {0}")]
    Decode(#[source] bincode::Error),
}

/// Serialize a message for the transport.
pub fn encode(message: &PeerMessage) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(message).map_err(CodecError::Encode)
}

/// Deserialize a message received from the transport.
pub fn decode(bytes: &[u8]) -> Result<PeerMessage, CodecError> {
    bincode::deserialize(bytes).map_err(CodecError::Decode)
}
