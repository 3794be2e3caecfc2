use std::num::ParseIntError;

// ----------------------------------------------------------------------------
// Integer literals

/// Signed integer literal: `-`? followed by a prefixed or decimal body.
pub fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if body.is_empty() || body.starts_with(['-', '+']) {
        return None;
    }
    let value = parse_with_prefix(body).ok()? as i64;
    Some(if negative { value.wrapping_neg() } else { value })
}

/// Unsigned body with one of the radix sigils:
/// `0x`/`$` hex, `0b`/`%` binary, `@`/leading `0` octal, otherwise decimal.
pub fn parse_with_prefix(s: &str) -> Result<u64, ParseIntError> {
    let (radix, digits) = if let Some(hex) = s.strip_prefix("0x").or(s.strip_prefix("0X")) {
        (16, hex)
    } else if let Some(hex) = s.strip_prefix('$') {
        (16, hex)
    } else if let Some(bin) = s.strip_prefix("0b").or(s.strip_prefix("0B")) {
        (2, bin)
    } else if let Some(bin) = s.strip_prefix('%') {
        (2, bin)
    } else if let Some(oct) = s.strip_prefix('@') {
        (8, oct)
    } else if s.len() > 1 && s.starts_with('0') {
        (8, &s[1..])
    } else {
        (10, s)
    };
    // from_str_radix accepts a leading '+', literals do not
    if digits.starts_with('+') {
        return u64::from_str_radix("", radix);
    }
    u64::from_str_radix(digits, radix)
}

// ----------------------------------------------------------------------------
// Float literals

/// Decimal float literal. Requires a fraction or an exponent so that plain
/// integers keep their integer meaning.
pub fn parse_float(s: &str) -> Option<f64> {
    let s = s.trim();
    if !is_float_literal(s) {
        return None;
    }
    s.parse::<f64>().ok()
}

pub fn is_float_literal(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    let mut digits = 0;
    let mut dot = false;
    let mut exp = false;
    let mut prev = ' ';
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' if !dot && !exp => dot = true,
            'e' | 'E' if !exp && digits > 0 => exp = true,
            '-' | '+' if prev == 'e' || prev == 'E' => {}
            _ => return false,
        }
        prev = c;
    }
    digits > 0 && (dot || exp) && !matches!(prev, 'e' | 'E' | '-' | '+')
}

/// Render a float so that it reads back as a float literal.
pub fn format_float(value: f64) -> String {
    let text = format!("{:?}", value);
    if is_float_literal(&text) {
        text
    } else {
        format!("{text}.0")
    }
}

// ----------------------------------------------------------------------------
// Identifiers

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! case {
        ($($name:ident: $text:expr => $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(parse_int($text), $value);
                }
            )*
        }
    }

    case! {
        decimal: "42" => Some(42),
        negative: "-42" => Some(-42),
        zero: "0" => Some(0),
        hex_0x: "0x1F" => Some(31),
        hex_dollar: "$ff" => Some(255),
        negative_hex: "-$10" => Some(-16),
        binary_0b: "0b101" => Some(5),
        binary_percent: "%1111" => Some(15),
        octal_at: "@17" => Some(15),
        octal_zero: "017" => Some(15),
        full_width: "$FFFFFFFFFFFFFFFF" => Some(-1),
        garbage: "12a" => None,
        empty: "" => None,
        sign_only: "-" => None,
        double_sign: "--1" => None,
        plus_in_body: "$+1" => None,
        label: "loop" => None,
    }

    #[test]
    fn floats() {
        assert_eq!(parse_float("1.5"), Some(1.5));
        assert_eq!(parse_float("-0.25"), Some(-0.25));
        assert_eq!(parse_float("2e3"), Some(2000.0));
        assert_eq!(parse_float("1.0e-2"), Some(0.01));
        assert_eq!(parse_float("3"), None);
        assert_eq!(parse_float("1e"), None);
        assert_eq!(parse_float("inf"), None);
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(0.5), "0.5");
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("main"));
        assert!(is_identifier("_loop2"));
        assert!(!is_identifier("2loop"));
        assert!(!is_identifier(".local"));
        assert!(!is_identifier(""));
    }
}
