//! Configuration types for key-space search

use crate::error::{KeySweepError, Result};
use crate::oracle::{KEY_LEN, Key};

/// First byte value tried in each variable key position (`!`).
pub const ASCII_START: u8 = 33;
/// Last byte value tried in each variable key position (`z`).
pub const ASCII_END: u8 = 122;
/// Width of the variable key segment in the reference layout.
pub const DEFAULT_SEGMENT_WIDTH: usize = 4;

/// How the flattened index range is split between workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionStrategy {
    /// One contiguous block per worker
    #[default]
    Block,
    /// Fixed-size chunks dealt out round-robin
    Chunked,
}

impl std::fmt::Display for PartitionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartitionStrategy::Block => write!(f, "block"),
            PartitionStrategy::Chunked => write!(f, "chunked"),
        }
    }
}

impl std::str::FromStr for PartitionStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "block" | "contiguous" => Ok(PartitionStrategy::Block),
            "chunked" | "round-robin" | "interleaved" => Ok(PartitionStrategy::Chunked),
            _ => Err(format!(
                "Unknown partition strategy: '{}'. Valid options: block, chunked",
                s
            )),
        }
    }
}

/// Known and unknown parts of the key being recovered.
///
/// The key is `prefix || segment || suffix`, where every byte of the
/// segment ranges over `[range_start, range_end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    /// Known leading key bytes
    pub prefix: Vec<u8>,
    /// Known trailing key bytes
    pub suffix: Vec<u8>,
    /// Number of unknown bytes between prefix and suffix
    pub width: usize,
    /// Lowest candidate byte (inclusive)
    pub range_start: u8,
    /// Highest candidate byte (inclusive)
    pub range_end: u8,
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self {
            prefix: b"######".to_vec(),
            suffix: b"######".to_vec(),
            width: DEFAULT_SEGMENT_WIDTH,
            range_start: ASCII_START,
            range_end: ASCII_END,
        }
    }
}

impl KeyLayout {
    /// Layout with the variable segment at `offset..offset + width` of `key`.
    ///
    /// Used when the full key is known (self-test) and only the position of
    /// the hidden segment is configured.
    pub fn around(key: &Key, offset: usize, width: usize) -> Result<Self> {
        let end = offset
            .checked_add(width)
            .filter(|&end| end <= KEY_LEN)
            .ok_or(KeySweepError::KeyLength {
                expected: KEY_LEN,
                actual: offset.saturating_add(width),
            })?;
        Ok(Self {
            prefix: key[..offset].to_vec(),
            suffix: key[end..].to_vec(),
            width,
            ..Self::default()
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<Vec<u8>>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn with_range(mut self, start: u8, end: u8) -> Self {
        self.range_start = start;
        self.range_end = end;
        self
    }

    /// Set the width so the layout fills a whole key.
    pub fn fill_width(mut self) -> Self {
        self.width = KEY_LEN.saturating_sub(self.prefix.len() + self.suffix.len());
        self
    }

    /// Number of values each variable byte can take.
    pub fn radix(&self) -> u64 {
        u64::from(self.range_end).saturating_sub(u64::from(self.range_start)) + 1
    }

    /// Check the layout describes a searchable, non-empty space.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(KeySweepError::EmptySegment);
        }
        let actual = self.prefix.len() + self.width + self.suffix.len();
        if actual != KEY_LEN {
            return Err(KeySweepError::KeyLength {
                expected: KEY_LEN,
                actual,
            });
        }
        if self.range_start > self.range_end {
            return Err(KeySweepError::InvalidByteRange {
                start: self.range_start,
                end: self.range_end,
            });
        }
        let width = u32::try_from(self.width).map_err(|_| KeySweepError::KeySpaceOverflow {
            radix: self.radix(),
            width: self.width,
        })?;
        self.radix()
            .checked_pow(width)
            .ok_or(KeySweepError::KeySpaceOverflow {
                radix: self.radix(),
                width: self.width,
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_from_str() {
        assert_eq!(
            "block".parse::<PartitionStrategy>().unwrap(),
            PartitionStrategy::Block
        );
        assert_eq!(
            "round-robin".parse::<PartitionStrategy>().unwrap(),
            PartitionStrategy::Chunked
        );
        assert!("diagonal".parse::<PartitionStrategy>().is_err());
    }

    #[test]
    fn test_partition_display() {
        assert_eq!(format!("{}", PartitionStrategy::Block), "block");
        assert_eq!(format!("{}", PartitionStrategy::Chunked), "chunked");
    }

    #[test]
    fn test_default_layout_is_reference() {
        let layout = KeyLayout::default();
        assert_eq!(layout.radix(), 90);
        assert_eq!(layout.width, 4);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_layout_around_known_key() {
        let layout = KeyLayout::around(b"######9Hb3######", 6, 4).unwrap();
        assert_eq!(layout.prefix, b"######");
        assert_eq!(layout.suffix, b"######");
        assert!(layout.validate().is_ok());

        assert!(KeyLayout::around(b"######9Hb3######", 14, 4).is_err());
    }

    #[test]
    fn test_layout_builder() {
        let layout = KeyLayout::default()
            .with_prefix(b"abcdefghij".to_vec())
            .with_suffix(b"klmn".to_vec())
            .fill_width()
            .with_range(b'0', b'9');

        assert_eq!(layout.width, 2);
        assert_eq!(layout.radix(), 10);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_layouts() {
        let short = KeyLayout::default().with_width(3);
        assert!(matches!(
            short.validate(),
            Err(KeySweepError::KeyLength {
                expected: 16,
                actual: 15
            })
        ));

        let empty = KeyLayout::default()
            .with_prefix(b"########".to_vec())
            .with_suffix(b"########".to_vec())
            .with_width(0);
        assert!(matches!(empty.validate(), Err(KeySweepError::EmptySegment)));

        let inverted = KeyLayout::default().with_range(122, 33);
        assert!(matches!(
            inverted.validate(),
            Err(KeySweepError::InvalidByteRange { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_overflowing_space() {
        let layout = KeyLayout::default()
            .with_prefix(Vec::new())
            .with_suffix(Vec::new())
            .with_width(16)
            .with_range(0, 255);
        assert!(matches!(
            layout.validate(),
            Err(KeySweepError::KeySpaceOverflow { .. })
        ));
    }
}
