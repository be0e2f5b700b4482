//! Prefixed serial generation for articles, versions and tags.
//!
//! A serial is the entity prefix followed by the hex form of a UUIDv7, e.g.
//! `ART0190f3b2c4d87a1e9b2f4c6d8e0a1b2c`. UUIDv7 embeds a millisecond
//! timestamp, so serials of one kind sort roughly by creation time.

use uuid::Uuid;

use crate::types::Serial;

/// Entity kind a serial is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialKind {
    Article,
    Version,
    Tag,
}

impl SerialKind {
    /// The three-letter prefix stored at the front of every serial.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Article => "ART",
            Self::Version => "VER",
            Self::Tag => "TAG",
        }
    }
}

/// Generate a new globally unique serial for `kind`.
pub fn generate(kind: SerialKind) -> Serial {
    format!("{}{}", kind.prefix(), Uuid::now_v7().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_carries_kind_prefix() {
        assert!(generate(SerialKind::Article).starts_with("ART"));
        assert!(generate(SerialKind::Version).starts_with("VER"));
        assert!(generate(SerialKind::Tag).starts_with("TAG"));
    }

    #[test]
    fn serials_are_unique() {
        let a = generate(SerialKind::Tag);
        let b = generate(SerialKind::Tag);
        assert_ne!(a, b);
        // prefix + 32 hex chars
        assert_eq!(a.len(), 3 + 32);
    }
}
