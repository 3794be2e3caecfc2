use arch::ea::Mode;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{displacement, indexed, Ea};
use crate::error::Error;

static PC_DISPLACEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^(),\s]+)?\(\s*[pP][cC]\s*\)$").expect("pc regex"));

/// `d(pc)`, `(pc, rI.x*s)` and `d(pc, rI.x*s)`.
pub fn parse(text: &str) -> Result<Option<Ea>, Error> {
    if let Some(caps) = PC_DISPLACEMENT.captures(text) {
        let disp = match caps.get(1) {
            Some(d) => displacement(d.as_str())?,
            None => 0,
        };
        return Ok(Some(Ea::new(Mode::PC_IND_DSP, disp.to_le_bytes().to_vec())));
    }

    match indexed(text)? {
        Some(idx) if idx.base.eq_ignore_ascii_case("pc") => {
            let mut payload = vec![idx.index, idx.scale];
            let mode = match idx.disp {
                Some(disp) => {
                    payload.extend_from_slice(&displacement(disp)?.to_le_bytes());
                    Mode::PC_IDX_DSP
                }
                None => Mode::PC_IDX,
            };
            Ok(Some(Ea::new(mode + idx.size, payload)))
        }
        _ => Ok(None),
    }
}
