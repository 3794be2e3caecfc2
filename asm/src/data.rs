use arch::size::Size;
use byteorder::{ByteOrder, LittleEndian};

use crate::error::Error;
use crate::number::{parse_float, parse_int};

/// Raw bytes of a `dc.x` list. Only `dc.b` takes quoted strings; no
/// terminator is added.
pub fn encode(size: Size, values: &[String]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    for value in values {
        if value.starts_with('"') {
            if size != Size::Byte {
                return Err(Error::syntax(format!("Strings need `dc.b`, got `dc.{size}`")));
            }
            out.extend(unquote(value)?);
            continue;
        }
        match size {
            Size::Single | Size::Double => {
                let v = parse_float(value)
                    .or_else(|| parse_int(value).map(|i| i as f64))
                    .ok_or_else(|| Error::syntax(format!("`{value}` is not a number")))?;
                let mut buf = [0u8; 8];
                if size == Size::Single {
                    LittleEndian::write_f32(&mut buf, v as f32);
                } else {
                    LittleEndian::write_f64(&mut buf, v);
                }
                out.extend_from_slice(&buf[..size.bytes()]);
            }
            _ => {
                let v = parse_int(value)
                    .ok_or_else(|| Error::syntax(format!("`{value}` is not an integer")))?;
                if !fits(v, size) {
                    return Err(Error::syntax(format!("`{value}` does not fit in `.{size}`")));
                }
                let mut buf = [0u8; 8];
                LittleEndian::write_i64(&mut buf, v);
                out.extend_from_slice(&buf[..size.bytes()]);
            }
        }
    }
    Ok(out)
}

/// Signed or unsigned range of an integer operation size.
pub fn fits(value: i64, size: Size) -> bool {
    let bits = size.bits();
    if bits >= 64 {
        return true;
    }
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << bits) - 1;
    (min..=max).contains(&value)
}

fn unquote(text: &str) -> Result<Vec<u8>, Error> {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(|| Error::syntax(format!("Unterminated string {text}")))?;
    let mut out = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        out.push(match chars.next() {
            Some('n') => b'\n',
            Some('t') => b'\t',
            Some('r') => b'\r',
            Some('0') => 0,
            Some('\\') => b'\\',
            Some('"') => b'"',
            other => {
                return Err(Error::syntax(format!(
                    "Unknown escape `\\{}`",
                    other.map(String::from).unwrap_or_default()
                )))
            }
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn integers_little_endian() {
        assert_eq!(
            encode(Size::Word, &values(&["$1234", "-1"])).unwrap(),
            vec![0x34, 0x12, 0xFF, 0xFF]
        );
        assert_eq!(encode(Size::Long, &values(&["1"])).unwrap(), vec![1, 0, 0, 0]);
        assert_eq!(encode(Size::Byte, &values(&["255", "-128"])).unwrap(), vec![255, 128]);
        assert!(encode(Size::Byte, &values(&["256"])).is_err());
        assert!(encode(Size::Byte, &values(&["-129"])).is_err());
    }

    #[test]
    fn floats() {
        assert_eq!(encode(Size::Single, &values(&["1.0"])).unwrap(), 1.0f32.to_le_bytes().to_vec());
        assert_eq!(encode(Size::Double, &values(&["2"])).unwrap(), 2.0f64.to_le_bytes().to_vec());
    }

    #[test]
    fn strings() {
        assert_eq!(
            encode(Size::Byte, &values(&[r#""a\n\"b""#, "0"])).unwrap(),
            vec![b'a', b'\n', b'"', b'b', 0]
        );
        assert!(encode(Size::Word, &values(&[r#""ab""#])).is_err());
        assert!(encode(Size::Byte, &values(&[r#""\q""#])).is_err());
    }
}
