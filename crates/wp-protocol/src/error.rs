//! Errors raised while framing or parsing circuit traffic

use thiserror::Error;

use crate::message::MessageType;

#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Header carries a type byte outside the known message set
    #[error("Unknown message type 0x{0:02x}")]
    UnknownMessageType(u8),

    #[error("Header announces {header:?} but payload decodes as {payload:?}")]
    TypeMismatch {
        header: MessageType,
        payload: MessageType,
    },

    #[error("Payload of {size} bytes does not fit a frame (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Malformed payload: {0}")]
    Payload(#[from] bincode::Error),

    /// Required by the tokio codec traits
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
