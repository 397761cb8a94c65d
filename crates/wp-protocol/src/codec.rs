//! Tokio codec for circuit frames
//!
//! Decoding never consumes a partial frame: bytes stay in the buffer until
//! header and payload are both present, so the codec itself is stateless.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;
use crate::frame::{FrameHeader, HEADER_SIZE};
use crate::message::Message;

/// A message together with the sequence number it travelled under
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub sequence: u32,
    pub message: Message,
}

impl Frame {
    pub fn new(sequence: u32, message: Message) -> Self {
        Self { sequence, message }
    }
}

/// Encodes [`Frame`]s as header plus bincode payload
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameCodec;

impl FrameCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(header) = FrameHeader::peek(src)? else {
            return Ok(None);
        };

        // Length field is untrusted: never reserve for it
        if src.len() < header.frame_len() {
            return Ok(None);
        }

        src.advance(HEADER_SIZE);
        let payload = src.split_to(header.payload_length as usize);
        let message: Message = bincode::deserialize(&payload)?;

        if message.message_type() != header.message_type {
            return Err(ProtocolError::TypeMismatch {
                header: header.message_type,
                payload: message.message_type(),
            });
        }

        Ok(Some(Frame {
            sequence: header.sequence,
            message,
        }))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = bincode::serialize(&frame.message)?;
        let header = FrameHeader::new(frame.sequence, frame.message.message_type(), payload.len())?;

        dst.reserve(header.frame_len());
        header.write_to(dst);
        dst.extend_from_slice(&payload);
        Ok(())
    }
}
