use arch::ea::Mode;
use arch::size::Size;

use super::Ea;
use crate::data::fits;
use crate::error::Error;
use crate::number::{is_float_literal, parse_float, parse_int};
use crate::preproc::Value;

/// `#literal`, stored at the operation size.
pub fn parse(text: &str, size: Size) -> Result<Option<Ea>, Error> {
    let Some(literal) = text.strip_prefix('#') else {
        return Ok(None);
    };
    let literal = literal.trim();
    let not_constant = || Error::syntax(format!("Immediate `{text}` is not a constant"));

    let ea = match size {
        Size::Single => {
            let v = float(literal).ok_or_else(not_constant)? as f32;
            Ea {
                immediate: Some(Value::Float(v as f64)),
                ..Ea::new(Mode::FLT_S, v.to_le_bytes().to_vec())
            }
        }
        Size::Double => {
            let v = float(literal).ok_or_else(not_constant)?;
            Ea {
                immediate: Some(Value::Float(v)),
                ..Ea::new(Mode::FLT_D, v.to_le_bytes().to_vec())
            }
        }
        _ => {
            if is_float_literal(literal) {
                return Err(Error::syntax(format!(
                    "Float immediate `{text}` in a `.{size}` operand"
                )));
            }
            let v = parse_int(literal).ok_or_else(not_constant)?;
            if !fits(v, size) {
                return Err(Error::syntax(format!("Immediate `{text}` does not fit in `.{size}`")));
            }
            let mode = Mode::INT_B + size.index_field().unwrap_or(3);
            Ea {
                immediate: Some(Value::Int(size.sign_extend(v))),
                ..Ea::new(mode, v.to_le_bytes()[..size.bytes()].to_vec())
            }
        }
    };
    Ok(Some(ea))
}

fn float(literal: &str) -> Option<f64> {
    parse_float(literal).or_else(|| parse_int(literal).map(|i| i as f64))
}
