//! Integer literals with a radix prefix.
//!
//! Reports encode some limits (device sizes, alignments) as strings like
//! `"0x100"`, and the architecture taxonomy writes every id and mask that way.

/// Parse an integer literal, honoring its radix prefix.
///
/// Accepts an optional sign, then `0x` (hex), `0o` (octal), `0b` (binary)
/// or plain decimal digits. `_` separators are allowed between digits.
/// Decimal literals with a redundant leading zero (`"010"`) are rejected
/// as ambiguous.
pub fn parse_int_literal(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, body) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let lower = body.get(..2).map(str::to_ascii_lowercase);
    let (radix, digits) = match lower.as_deref() {
        Some("0x") => (16, &body[2..]),
        Some("0o") => (8, &body[2..]),
        Some("0b") => (2, &body[2..]),
        _ => (10, body),
    };

    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return None;
    }
    let digits: String = digits.chars().filter(|c| *c != '_').collect();
    if radix == 10 && digits.len() > 1 && digits.starts_with('0') && digits.bytes().any(|b| b != b'0') {
        return None;
    }

    // Parse with the sign attached so i64::MIN stays representable.
    let signed = if negative { format!("-{digits}") } else { digits };
    i64::from_str_radix(&signed, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert_eq!(parse_int_literal("0x100"), Some(256));
        assert_eq!(parse_int_literal("0X10DE"), Some(0x10de));
        assert_eq!(parse_int_literal("0o17"), Some(15));
        assert_eq!(parse_int_literal("0b101"), Some(5));
        assert_eq!(parse_int_literal("256"), Some(256));
    }

    #[test]
    fn test_sign_and_whitespace() {
        assert_eq!(parse_int_literal(" -0x10 "), Some(-16));
        assert_eq!(parse_int_literal("+42"), Some(42));
    }

    #[test]
    fn test_separators() {
        assert_eq!(parse_int_literal("0xFF_FF"), Some(0xFFFF));
        assert_eq!(parse_int_literal("1_000"), Some(1000));
        assert_eq!(parse_int_literal("1__000"), None);
        assert_eq!(parse_int_literal("_1"), None);
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_int_literal(""), None);
        assert_eq!(parse_int_literal("0x"), None);
        assert_eq!(parse_int_literal("0xZZ"), None);
        assert_eq!(parse_int_literal("ten"), None);
        assert_eq!(parse_int_literal("010"), None);
    }

    #[test]
    fn test_zeroes() {
        assert_eq!(parse_int_literal("0"), Some(0));
        assert_eq!(parse_int_literal("000"), Some(0));
    }
}
