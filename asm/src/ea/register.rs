use arch::ea::Mode;
use arch::reg::{Fpr, Gpr};
use arch::size::Size;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{displacement, indexed, Ea};
use crate::error::Error;

static DIRECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").expect("direct regex"));
static INDIRECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-])?\(\s*([A-Za-z0-9]+)\s*\)([+-])?$").expect("indirect regex")
});
static DISPLACEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^(),\s]+)\(\s*([A-Za-z0-9]+)\s*\)$").expect("displacement regex")
});

pub fn gpr(name: &str) -> Result<u8, Error> {
    Gpr::parse(name)
        .map(Gpr::index)
        .map_err(|_| Error::UnknownRegister(name.to_string()))
}

fn is_pc(name: &str) -> bool {
    name.eq_ignore_ascii_case("pc")
}

/// Register direct, the indirect forms and register based indexing.
/// `Ok(None)` leaves the text to the next family.
pub fn parse(text: &str, size: Size) -> Result<Option<Ea>, Error> {
    if DIRECT.is_match(text) {
        return direct(text, size);
    }

    if let Some(caps) = INDIRECT.captures(text) {
        let name = &caps[2];
        if is_pc(name) {
            return Err(Error::syntax(format!("`{text}` is not a pc-relative form")));
        }
        let reg = gpr(name)?;
        let pre = caps.get(1).map(|m| m.as_str());
        let post = caps.get(3).map(|m| m.as_str());
        let mode = match (pre, post) {
            (None, None) => Mode::R_IND,
            (None, Some("+")) => Mode::R_IND_POST_INC,
            (None, Some(_)) => Mode::R_IND_POST_DEC,
            (Some("+"), None) => Mode::R_IND_PRE_INC,
            (Some(_), None) => Mode::R_IND_PRE_DEC,
            (Some(_), Some(_)) => {
                return Err(Error::syntax(format!("`{text}` has both pre and post update")))
            }
        };
        return Ok(Some(Ea::new(mode + reg, vec![])));
    }

    if let Some(caps) = DISPLACEMENT.captures(text) {
        let name = &caps[2];
        if is_pc(name) {
            return Ok(None);
        }
        let reg = gpr(name)?;
        let disp = displacement(&caps[1])?;
        return Ok(Some(Ea::new(Mode::R_IND_DSP + reg, disp.to_le_bytes().to_vec())));
    }

    if let Some(idx) = indexed(text)? {
        if is_pc(idx.base) {
            return Ok(None);
        }
        let base = gpr(idx.base)?;
        let mut payload = vec![base << 4 | idx.index, idx.scale];
        let mode = match idx.disp {
            Some(disp) => {
                payload.extend_from_slice(&displacement(disp)?.to_le_bytes());
                Mode::R_IDX_DSP
            }
            None => Mode::R_IDX,
        };
        return Ok(Some(Ea::new(mode + idx.size, payload)));
    }

    Ok(None)
}

fn direct(text: &str, size: Size) -> Result<Option<Ea>, Error> {
    if let Ok(reg) = Gpr::parse(text) {
        if size.is_float() {
            return Err(Error::syntax(format!(
                "Integer register `{text}` in a `.{size}` operand"
            )));
        }
        return Ok(Some(Ea::new(Mode::R_DIR + reg.index(), vec![])));
    }
    if let Ok(reg) = Fpr::parse(text) {
        if !size.is_float() {
            return Err(Error::syntax(format!(
                "Float register `{text}` in a `.{size}` operand"
            )));
        }
        return Ok(Some(Ea::new(Mode::FP_DIR + reg.index(), vec![])));
    }
    Ok(None)
}
