//! The decoded market-data event and its side enum.
//!
//! # Wire layout (17 bytes, big-endian)
//!
//! | Offset | Size | Field    |
//! |--------|------|----------|
//! | 0      | 4    | symbol   |
//! | 4      | 1    | side     |
//! | 5      | 4    | quantity |
//! | 9      | 4    | price    |
//! | 13     | 4    | sequence |

use serde::Serialize;

use super::symbol::Symbol;

/// Order side, encoded on the wire as ASCII `'B'` or `'S'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    #[serde(rename = "B")]
    Buy,
    #[serde(rename = "S")]
    Sell,
}

impl Side {
    /// Parse the wire byte. Any value other than `'B'`/`'S'` is rejected.
    #[inline]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'B' => Some(Self::Buy),
            b'S' => Some(Self::Sell),
            _ => None,
        }
    }

    #[inline]
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Buy => b'B',
            Self::Sell => b'S',
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_byte() as char)
    }
}

/// One market-data event, immutable once decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Record {
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: u32,
    pub price: u32,
    pub sequence: u32,
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | Side: {} | Qty: {} | Price: {} | Seq: {}",
            self.symbol, self.side, self.quantity, self.price, self.sequence,
        )
    }
}
