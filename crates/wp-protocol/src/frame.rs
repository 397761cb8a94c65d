//! Circuit frame header
//!
//! Every datagram on a circuit starts with an 8-byte header:
//!
//! | bytes | field          | encoding       |
//! |-------|----------------|----------------|
//! | 0..4  | sequence       | u32 big-endian |
//! | 4     | message type   | u8             |
//! | 5..8  | payload length | u24 big-endian |

use bytes::BufMut;

use crate::error::ProtocolError;
use crate::message::MessageType;

/// Size of the frame header in bytes
pub const HEADER_SIZE: usize = 8;

/// Largest payload the 24-bit length field can describe
pub const MAX_PAYLOAD_SIZE: usize = 0x00FF_FFFF;

/// Header preceding each message on a circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Per-circuit outbound sequence number
    pub sequence: u32,
    pub message_type: MessageType,
    pub payload_length: u32,
}

impl FrameHeader {
    /// Build a header for a payload of `payload_length` bytes
    pub fn new(
        sequence: u32,
        message_type: MessageType,
        payload_length: usize,
    ) -> Result<Self, ProtocolError> {
        if payload_length > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_length,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        Ok(Self {
            sequence,
            message_type,
            payload_length: payload_length as u32,
        })
    }

    /// Header plus payload, in bytes
    pub fn frame_len(&self) -> usize {
        HEADER_SIZE + self.payload_length as usize
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let [_, len_hi, len_mid, len_lo] = self.payload_length.to_be_bytes();
        let [s0, s1, s2, s3] = self.sequence.to_be_bytes();
        [
            s0,
            s1,
            s2,
            s3,
            self.message_type.as_u8(),
            len_hi,
            len_mid,
            len_lo,
        ]
    }

    pub fn write_to<B: BufMut>(&self, dst: &mut B) {
        dst.put_slice(&self.to_bytes());
    }

    /// Read a header from the front of `src` without consuming it.
    ///
    /// `Ok(None)` means fewer than [`HEADER_SIZE`] bytes are available.
    pub fn peek(src: &[u8]) -> Result<Option<Self>, ProtocolError> {
        let Some(raw) = src.get(..HEADER_SIZE) else {
            return Ok(None);
        };

        let message_type =
            MessageType::from_u8(raw[4]).ok_or(ProtocolError::UnknownMessageType(raw[4]))?;

        Ok(Some(Self {
            sequence: u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]),
            message_type,
            payload_length: u32::from_be_bytes([0, raw[5], raw[6], raw[7]]),
        }))
    }
}
