//! Byte encodings shared by every table: bincode record blobs and order-preserving composite keys.
//!
//! Composite keys are concatenations of big-endian integers and NUL-terminated strings, so the
//! lexicographic byte order redb sorts by equals the logical order of the key columns.

use crate::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Decimal strings are left-padded to this width in the balance index, wide enough for any u256.
pub const DECIMAL_WIDTH: usize = 78;

const SEPARATOR: u8 = 0x00;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, AppError> {
    Ok(bincode::serialize(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    Ok(bincode::deserialize(bytes)?)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyBuf(Vec<u8>);

impl KeyBuf {
    pub fn new() -> Self {
        KeyBuf(Vec::with_capacity(64))
    }

    /// Appends a string column followed by a separator so that `"0xab"` never prefixes `"0xabc"`.
    pub fn str(mut self, s: &str) -> Self {
        self.0.extend_from_slice(s.as_bytes());
        self.0.push(SEPARATOR);
        self
    }

    /// Appends raw text without a separator, used for prefix searches.
    pub fn text(mut self, s: &str) -> Self {
        self.0.extend_from_slice(s.as_bytes());
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn decimal(mut self, digits: &str) -> Self {
        self.0.extend_from_slice(pad_decimal(digits).as_bytes());
        self
    }

    pub fn bytes(mut self, b: &[u8]) -> Self {
        self.0.extend_from_slice(b);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.0
    }
}

/// Whether `digits` is an unsigned integer that fits the padded key width.
pub fn is_decimal(digits: &str) -> bool {
    let digits = digits.trim();
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && digits.trim_start_matches('0').len() <= DECIMAL_WIDTH
}

/// Left-pads a decimal string with zeros; non-digit input sorts as zero.
pub fn pad_decimal(digits: &str) -> String {
    let trimmed = digits.trim().trim_start_matches('0');
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) || trimmed.len() > DECIMAL_WIDTH {
        return "0".repeat(DECIMAL_WIDTH);
    }
    format!("{:0>width$}", trimmed, width = DECIMAL_WIDTH)
}

/// Smallest key strictly greater than every key starting with `prefix`, `None` when unbounded.
pub fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.pop() {
        if last < u8::MAX {
            upper.push(last + 1);
            return Some(upper);
        }
    }
    None
}

/// Lower-cased words of a display name, used by the token name index.
pub fn words(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let lower = word.to_lowercase();
        if !out.contains(&lower) {
            out.push(lower);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_keys_sort_by_columns() {
        let a = KeyBuf::new().str("0xab").u64(5).build();
        let b = KeyBuf::new().str("0xab").u64(300).build();
        let c = KeyBuf::new().str("0xabc").u64(1).build();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn padded_decimals_sort_numerically() {
        assert!(pad_decimal("9") < pad_decimal("10"));
        assert!(pad_decimal("000123") == pad_decimal("123"));
        assert_eq!(pad_decimal("abc"), pad_decimal("0"));
        assert_eq!(pad_decimal("1").len(), DECIMAL_WIDTH);
    }

    #[test]
    fn decimal_check_rejects_what_would_rank_as_zero() {
        assert!(is_decimal("0"));
        assert!(is_decimal(" 1500000000000000000 "));
        assert!(!is_decimal(""));
        assert!(!is_decimal("1.5"));
        assert!(!is_decimal("-3"));
        assert!(!is_decimal("0x10"));
        assert!(!is_decimal(&"9".repeat(DECIMAL_WIDTH + 1)));
    }

    #[test]
    fn upper_bound_skips_saturated_bytes() {
        assert_eq!(prefix_upper_bound(b"ab"), Some(b"ac".to_vec()));
        assert_eq!(prefix_upper_bound(&[0x01, 0xff]), Some(vec![0x02]));
        assert_eq!(prefix_upper_bound(&[0xff, 0xff]), None);
        assert_eq!(prefix_upper_bound(&[]), None);
    }

    #[test]
    fn words_are_lowercased_and_unique() {
        assert_eq!(words("Wrapped Ether (Wrapped)"), vec!["wrapped".to_string(), "ether".to_string()]);
    }
}
