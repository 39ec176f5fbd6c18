//! Dotted block identifiers such as `1.2.3` or `1._2`.
//!
//! Each segment is a positive ordinal, optionally prefixed with the
//! randomization marker. The marker is ignored for identity (the clean id)
//! but kept so consumers know which siblings may be shuffled.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub ordinal: u32,
    pub randomized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockId {
    raw: String,
    segments: Vec<Segment>,
}

impl BlockId {
    /// Parse a dotted id. The error is a human-readable reason; callers
    /// attach the cell coordinate.
    pub fn parse(raw: &str, marker: char) -> Result<BlockId, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("empty block id".to_owned());
        }
        let mut segments = Vec::new();
        for piece in raw.split('.') {
            let (randomized, digits) = match piece.strip_prefix(marker) {
                Some(rest) => (true, rest),
                None => (false, piece),
            };
            let ordinal = digits
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0 && digits.bytes().all(|b| b.is_ascii_digit()))
                .ok_or_else(|| {
                    format!(
                        "malformed block id '{}': segment '{}' is not a positive integer",
                        raw, piece
                    )
                })?;
            segments.push(Segment {
                ordinal,
                randomized,
            });
        }
        Ok(BlockId {
            raw: raw.to_owned(),
            segments,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_top_level(&self) -> bool {
        self.depth() == 1
    }

    /// Whether this block may be shuffled among its siblings.
    pub fn is_randomized(&self) -> bool {
        self.segments.last().is_some_and(|s| s.randomized)
    }

    /// Identity used for lookups: ordinals only, markers stripped.
    pub fn clean(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.ordinal.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Id with the last segment dropped, keeping the raw spelling of the
    /// remaining segments. `None` for top-level ids.
    pub fn parent(&self) -> Option<BlockId> {
        if self.is_top_level() {
            return None;
        }
        let cut = self.raw.rfind('.')?;
        Some(BlockId {
            raw: self.raw[..cut].to_owned(),
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Sibling ordering key.
    pub fn sort_key(&self) -> Vec<u32> {
        self.segments.iter().map(|s| s.ordinal).collect()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Strip randomization markers from a raw id.
pub fn clean_block_id(raw: &str, marker: char) -> Result<String, String> {
    BlockId::parse(raw, marker).map(|id| id.clean())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_nested_id() {
        let id = BlockId::parse("1.2.3", '_').unwrap();
        assert_eq!(id.depth(), 3);
        assert_eq!(id.clean(), "1.2.3");
        assert!(!id.is_randomized());
        assert_eq!(id.parent().unwrap().raw(), "1.2");
    }

    #[test]
    fn marker_is_stripped_for_identity_only() {
        let id = BlockId::parse("1._2", '_').unwrap();
        assert_eq!(id.clean(), "1.2");
        assert_eq!(
            id.segments(),
            &[
                Segment { ordinal: 1, randomized: false },
                Segment { ordinal: 2, randomized: true },
            ]
        );
        assert_eq!(id.raw(), "1._2");
        assert!(id.is_randomized());
        let parent = id.parent().unwrap();
        assert!(!parent.is_randomized());
        assert!(parent.is_top_level());
        assert!(parent.parent().is_none());
    }

    #[test]
    fn malformed_ids_are_rejected() {
        for bad in ["", "1..2", "a", "1.0", "__1", "1.-2", "1.+2"] {
            assert!(BlockId::parse(bad, '_').is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn sort_key_orders_numerically() {
        let mut ids: Vec<BlockId> = ["10", "2", "_1"]
            .iter()
            .map(|s| BlockId::parse(s, '_').unwrap())
            .collect();
        ids.sort_by_key(BlockId::sort_key);
        let clean: Vec<String> = ids.iter().map(BlockId::clean).collect();
        assert_eq!(clean, vec!["1", "2", "10"]);
    }

    #[test]
    fn clean_block_id_uses_marker() {
        assert_eq!(clean_block_id("_3._1", '_').unwrap(), "3.1");
        assert_eq!(clean_block_id("+3", '+').unwrap(), "3");
    }
}
