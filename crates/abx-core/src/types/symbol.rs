//! Fixed-size instrument symbol as carried on the wire.
//!
//! The protocol sends exactly four symbol bytes, without a terminator and
//! padded however the server chose. [`Symbol`] keeps those bytes verbatim;
//! conversion to text happens only for display and serialization.

use serde::{Serialize, Serializer};

/// Length of the symbol field in a response frame.
pub const SYMBOL_LEN: usize = 4;

/// Four verbatim symbol bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol([u8; SYMBOL_LEN]);

impl Symbol {
    #[inline]
    pub const fn from_bytes(bytes: [u8; SYMBOL_LEN]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; SYMBOL_LEN] {
        &self.0
    }

    /// Symbol text with invalid UTF-8 replaced. Padding is kept as received.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl From<&str> for Symbol {
    /// Copies up to four bytes of `s`, space-padding shorter input.
    fn from(s: &str) -> Self {
        let mut buf = [b' '; SYMBOL_LEN];
        let len = s.len().min(SYMBOL_LEN);
        buf[..len].copy_from_slice(&s.as_bytes()[..len]);
        Self(buf)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Symbol({:?})", self.to_string_lossy())
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}
