//! ABX wire codec.
//!
//! # Request frame (client → server, 2 bytes)
//!
//! | Offset | Size | Field    | Description                                  |
//! |--------|------|----------|----------------------------------------------|
//! | 0      | 1    | callType | 1 = stream all packets, 2 = resend one packet |
//! | 1      | 1    | arg      | low byte of the target sequence (callType 2) |
//!
//! # Response frame (server → client, 17 bytes, big-endian)
//!
//! `[symbol:4][side:1][quantity:4][price:4][sequence:4]`, one frame per
//! record. The stream-all response ends when the server closes the
//! connection; a resend response is zero or one frame.

use abx_core::{AbxError, Record, SYMBOL_LEN, Side, Symbol};

/// Size of an encoded request.
pub const REQUEST_LEN: usize = 2;

/// Size of one response frame.
pub const FRAME_LEN: usize = 17;

const SIDE_OFFSET: usize = 4;
const QUANTITY_OFFSET: usize = 5;
const PRICE_OFFSET: usize = 9;
const SEQUENCE_OFFSET: usize = 13;

/// Protocol opcode carried in the first request byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CallType {
    StreamAll = 1,
    ResendPacket = 2,
}

/// A request the client can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Stream every available packet, then close.
    StreamAll,
    /// Resend the packet with this sequence number.
    ///
    /// Sequences are 32-bit everywhere else, but the request frame only has
    /// room for one byte, so only the low 8 bits reach the server.
    Resend(u32),
}

impl Request {
    #[inline]
    pub fn call_type(self) -> CallType {
        match self {
            Self::StreamAll => CallType::StreamAll,
            Self::Resend(_) => CallType::ResendPacket,
        }
    }

    /// Encode as `[callType, arg]`. The argument byte is zero for stream-all.
    #[inline]
    pub fn encode(self) -> [u8; REQUEST_LEN] {
        let arg = match self {
            Self::StreamAll => 0,
            Self::Resend(sequence) => (sequence & 0xFF) as u8,
        };
        [self.call_type() as u8, arg]
    }
}

/// Read a big-endian u32 at `offset`. The caller has checked the length.
#[inline]
fn read_u32_be(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

/// Decode exactly one response frame into a [`Record`].
///
/// Fails with [`AbxError::MalformedPacket`] when `data` is not exactly
/// [`FRAME_LEN`] bytes or the side byte is neither `'B'` nor `'S'`.
pub fn decode_record(data: &[u8]) -> Result<Record, AbxError> {
    if data.len() != FRAME_LEN {
        return Err(AbxError::MalformedPacket(format!(
            "expected {FRAME_LEN} bytes, got {}",
            data.len()
        )));
    }

    let mut symbol = [0u8; SYMBOL_LEN];
    symbol.copy_from_slice(&data[..SYMBOL_LEN]);

    let side_byte = data[SIDE_OFFSET];
    let side = Side::from_byte(side_byte)
        .ok_or_else(|| AbxError::MalformedPacket(format!("invalid side byte {side_byte:#04x}")))?;

    Ok(Record {
        symbol: Symbol::from_bytes(symbol),
        side,
        quantity: read_u32_be(data, QUANTITY_OFFSET),
        price: read_u32_be(data, PRICE_OFFSET),
        sequence: read_u32_be(data, SEQUENCE_OFFSET),
    })
}

/// Encode a record as the server would send it.
///
/// The client never sends records; this exists for fake servers and tests.
pub fn encode_record(record: &Record) -> [u8; FRAME_LEN] {
    let mut buf = [0u8; FRAME_LEN];
    buf[..SYMBOL_LEN].copy_from_slice(record.symbol.as_bytes());
    buf[SIDE_OFFSET] = record.side.as_byte();
    buf[QUANTITY_OFFSET..PRICE_OFFSET].copy_from_slice(&record.quantity.to_be_bytes());
    buf[PRICE_OFFSET..SEQUENCE_OFFSET].copy_from_slice(&record.price.to_be_bytes());
    buf[SEQUENCE_OFFSET..].copy_from_slice(&record.sequence.to_be_bytes());
    buf
}
