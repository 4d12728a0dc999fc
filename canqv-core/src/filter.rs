//! Identifier filters for the transport
//!
//! Filters are given on the command line as `ID`, `ID/MASK` or `ID:MASK` (hex).
//! An identifier written with more than three hex digits is extended.

use crate::types::{MonitorError, Result, EFF_FLAG, EFF_MASK, RTR_FLAG};
use std::fmt;
use std::str::FromStr;

/// Identifier/mask pair, in the layout of a raw-socket receive filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    pub can_id: u32,
    pub can_mask: u32,
}

impl FilterSpec {
    pub fn new(can_id: u32, can_mask: u32) -> Self {
        Self { can_id, can_mask }
    }

    /// Parse `ID`, `ID/MASK` or `ID:MASK`
    pub fn parse(token: &str) -> Result<Self> {
        let invalid = || MonitorError::InvalidFilter(token.to_string());

        let (id_text, mask_text) = match token.find(['/', ':']) {
            Some(split) => (&token[..split], Some(&token[split + 1..])),
            None => (token, None),
        };

        let id_digits = strip_hex_prefix(id_text);
        if id_digits.is_empty() {
            return Err(invalid());
        }
        let mut can_id = u32::from_str_radix(id_digits, 16).map_err(|_| invalid())?;
        if id_digits.len() > 3 {
            can_id |= EFF_FLAG;
        }

        let can_mask = match mask_text {
            Some(text) => {
                u32::from_str_radix(strip_hex_prefix(text), 16).map_err(|_| invalid())?
                    | EFF_FLAG
                    | RTR_FLAG
            }
            None => EFF_MASK | EFF_FLAG | RTR_FLAG,
        };

        Ok(Self { can_id, can_mask })
    }

    /// True if the transport would let this identifier word through
    pub fn accepts(&self, can_id: u32) -> bool {
        (can_id & self.can_mask) == (self.can_id & self.can_mask)
    }
}

fn strip_hex_prefix(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
}

impl FromStr for FilterSpec {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}/{:08X}", self.can_id, self.can_mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_id_without_mask() {
        let filter = FilterSpec::parse("123").unwrap();
        assert_eq!(filter.can_id, 0x123);
        assert_eq!(filter.can_mask, EFF_MASK | EFF_FLAG | RTR_FLAG);
        assert!(filter.accepts(0x123));
        assert!(!filter.accepts(0x124));
        assert!(!filter.accepts(0x123 | EFF_FLAG));
        assert!(!filter.accepts(0x123 | RTR_FLAG));
    }

    #[test]
    fn test_extended_id_by_digit_count() {
        let filter = FilterSpec::parse("0123").unwrap();
        assert_eq!(filter.can_id, 0x123 | EFF_FLAG);
        assert!(filter.accepts(0x123 | EFF_FLAG));
        assert!(!filter.accepts(0x123));
    }

    #[test]
    fn test_mask_separators() {
        let slash = FilterSpec::parse("100/700").unwrap();
        let colon = FilterSpec::parse("100:700").unwrap();
        assert_eq!(slash, colon);
        assert_eq!(slash.can_mask, 0x700 | EFF_FLAG | RTR_FLAG);
        assert!(slash.accepts(0x1FF));
        assert!(!slash.accepts(0x200));
    }

    #[test]
    fn test_hex_prefix() {
        let filter = FilterSpec::parse("0x123").unwrap();
        assert_eq!(filter, FilterSpec::parse("123").unwrap());

        // Digit count excludes the prefix
        assert_eq!(FilterSpec::parse("0X7DF").unwrap().can_id, 0x7DF);
        assert_eq!(FilterSpec::parse("0x0123").unwrap().can_id, 0x123 | EFF_FLAG);

        let masked = FilterSpec::parse("0x100/0x700").unwrap();
        assert_eq!(masked, FilterSpec::parse("100/700").unwrap());
        assert!(FilterSpec::parse("0x").is_err());
    }

    #[test]
    fn test_invalid_tokens() {
        assert!(FilterSpec::parse("").is_err());
        assert!(FilterSpec::parse("/700").is_err());
        assert!(FilterSpec::parse("xyz").is_err());
        assert!(FilterSpec::parse("100/zz").is_err());
        assert!("123456789".parse::<FilterSpec>().is_err());
    }
}
