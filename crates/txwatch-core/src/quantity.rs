//! Hex quantity encoding (`"0x"`-prefixed, no leading zeros), as used for
//! block heights on the JSON-RPC wire and in stored records.

use crate::error::IndexError;

/// Encode a height as a hex quantity, e.g. `4959573` → `"0x4bad55"`.
pub fn encode_quantity(value: u64) -> String {
    format!("0x{value:x}")
}

/// Decode a `"0x"`-prefixed hex quantity.
///
/// Unlike a lenient parser this rejects values without the prefix, so a
/// decimal string such as `"1234"` is an error rather than `0x1234`.
pub fn decode_quantity(s: &str) -> Result<u64, IndexError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| IndexError::InvalidQuantity(format!("missing 0x prefix: {s:?}")))?;
    if digits.is_empty() {
        return Err(IndexError::InvalidQuantity(format!("no digits: {s:?}")));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| IndexError::InvalidQuantity(format!("{s:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_known_height() {
        assert_eq!(decode_quantity("0x4bad55").unwrap(), 4_959_573);
        assert_eq!(decode_quantity("0x0").unwrap(), 0);
        assert_eq!(decode_quantity("0xFF").unwrap(), 255);
    }

    #[test]
    fn encode_is_lowercase_without_padding() {
        assert_eq!(encode_quantity(4_959_573), "0x4bad55");
        assert_eq!(encode_quantity(0), "0x0");
        assert_eq!(encode_quantity(19_912_329), "0x12fd689");
    }

    #[test]
    fn decode_rejects_missing_prefix() {
        let err = decode_quantity("4bad55").unwrap_err();
        assert!(matches!(err, IndexError::InvalidQuantity(_)));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_quantity("0x").is_err());
        assert!(decode_quantity("0xzz").is_err());
        assert!(decode_quantity("").is_err());
    }
}
