pub mod immediate;
pub mod import;
pub mod pc;
pub mod register;

use arch::ea::{Family, Mode};
use arch::size::Size;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::Context;
use crate::error::Error;
use crate::label::Qualifiers;
use crate::number::parse_int;
use crate::preproc::Value;

/// Sentinel written into 32-bit fields that the second pass fills in.
pub const UNRESOLVED: [u8; 4] = [0xFF; 4];

// `d(base, index.x*s)` with an optional displacement
static INDEXED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([^(),\s]+)?\(\s*([A-Za-z0-9]+)\s*,\s*([A-Za-z0-9]+)(?:\.([A-Za-z]))?(?:\s*\*\s*([0-9]+))?\s*\)$",
    )
    .expect("indexed regex")
});

// ----------------------------------------------------------------------------
// Encoded operand

#[derive(Debug, Clone, PartialEq)]
pub struct Ea {
    pub mode: u8,
    pub payload: Vec<u8>,
    /// Decoded value when the operand is an immediate.
    pub immediate: Option<Value>,
    /// Imported label whose id goes into the payload.
    pub import: Option<String>,
}

impl Ea {
    pub fn new(mode: u8, payload: Vec<u8>) -> Self {
        Ea {
            mode,
            payload,
            immediate: None,
            import: None,
        }
    }

    pub fn same_as_dest() -> Self {
        Ea::new(Mode::SAME_AS_DEST, vec![])
    }

    pub fn family(&self) -> Option<Family> {
        Family::of(self.mode)
    }

    pub fn len(&self) -> usize {
        1 + self.payload.len()
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.push(self.mode);
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}

// ----------------------------------------------------------------------------
// Operand positions

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Value is read: every mode.
    Read,
    /// Value is written: no immediates, nothing pc-relative.
    Write,
    /// An address to jump to or take: memory forms only.
    Control,
}

impl Position {
    fn qualifier(self) -> (Qualifiers, char) {
        match self {
            Position::Read => (Qualifiers::READ, 'r'),
            Position::Write => (Qualifiers::WRITE, 'w'),
            Position::Control => (Qualifiers::CALL, 'x'),
        }
    }

    pub fn permits(self, family: Family) -> bool {
        match self {
            Position::Read => !matches!(family, Family::SameAsDest),
            Position::Write => !matches!(
                family,
                Family::Immediate(_)
                    | Family::PcIndexed(_)
                    | Family::PcIndexedDisplacement(_)
                    | Family::PcDisplacement
                    | Family::SameAsDest
            ),
            Position::Control => matches!(
                family,
                Family::RegIndirect(_)
                    | Family::Displacement(_)
                    | Family::Indexed(_)
                    | Family::IndexedDisplacement(_)
                    | Family::PcIndexed(_)
                    | Family::PcIndexedDisplacement(_)
                    | Family::PcDisplacement
                    | Family::Import
            ),
        }
    }
}

/// Operation size and position of one operand of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub size: Size,
    pub position: Position,
}

impl Slot {
    pub fn read(size: Size) -> Self {
        Slot {
            size,
            position: Position::Read,
        }
    }

    pub fn write(size: Size) -> Self {
        Slot {
            size,
            position: Position::Write,
        }
    }

    pub fn control() -> Self {
        Slot {
            size: Size::Quad,
            position: Position::Control,
        }
    }
}

// ----------------------------------------------------------------------------
// Composite

/// Try every family in priority order and check the winner against the slot.
pub fn encode(text: &str, slot: Slot, ctx: &Context) -> Result<Ea, Error> {
    let text = text.trim();
    let ea = match immediate::parse(text, slot.size)? {
        Some(ea) => ea,
        None => match pc::parse(text)? {
            Some(ea) => ea,
            None => match register::parse(text, slot.size)? {
                Some(ea) => ea,
                None => match import::parse(text, ctx.registry) {
                    Some(ea) => ea,
                    None => return Err(Error::syntax(format!("Invalid operand `{text}`"))),
                },
            },
        },
    };

    let family = ea
        .family()
        .ok_or_else(|| Error::syntax(format!("Invalid operand `{text}`")))?;
    if !slot.position.permits(family) {
        let role = match slot.position {
            Position::Read => "a source",
            Position::Write => "a destination",
            Position::Control => "a control address",
        };
        return Err(Error::syntax(format!("`{text}` cannot be used as {role}")));
    }
    if let Some(name) = &ea.import {
        let (needed, letter) = slot.position.qualifier();
        let declared = ctx.registry.import(name).map(|d| d.qualifiers);
        if !declared.is_some_and(|q| q.contains(needed)) {
            return Err(Error::ImportAccess {
                name: name.clone(),
                qualifier: letter,
            });
        }
    }
    Ok(ea)
}

/// Replace a source that repeats an elidable destination by the one byte
/// marker.
pub fn elide(dst: &Ea, src: Ea) -> Ea {
    let elidable = dst.family().is_some_and(Family::is_elidable);
    if elidable && dst.bytes() == src.bytes() {
        Ea::same_as_dest()
    } else {
        src
    }
}

// ----------------------------------------------------------------------------
// Shared helpers

pub(crate) fn displacement(text: &str) -> Result<i32, Error> {
    let value = parse_int(text)
        .ok_or_else(|| Error::syntax(format!("Displacement `{text}` is not a constant")))?;
    i32::try_from(value)
        .map_err(|_| Error::syntax(format!("Displacement `{text}` does not fit in 32 bits")))
}

/// Parts of an indexed operand.
pub(crate) struct Indexed<'t> {
    pub disp: Option<&'t str>,
    pub base: &'t str,
    pub index: u8,
    pub size: u8,
    pub scale: u8,
}

pub(crate) fn indexed(text: &str) -> Result<Option<Indexed<'_>>, Error> {
    let Some(caps) = INDEXED.captures(text) else {
        return Ok(None);
    };
    let (Some(base), Some(index)) = (caps.get(2), caps.get(3)) else {
        return Ok(None);
    };
    let index = register::gpr(index.as_str())?;
    let size = match caps.get(4) {
        Some(suffix) => suffix
            .as_str()
            .to_ascii_lowercase()
            .parse::<Size>()
            .ok()
            .and_then(Size::index_field)
            .ok_or_else(|| Error::syntax(format!("Bad index size `.{}`", suffix.as_str())))?,
        None => 3,
    };
    let scale = match caps.get(5).map(|m| m.as_str()) {
        None => 1,
        Some("1") => 1,
        Some("2") => 2,
        Some("4") => 4,
        Some("8") => 8,
        Some(other) => return Err(Error::syntax(format!("Bad index scale `{other}`"))),
    };
    Ok(Some(Indexed {
        disp: caps.get(1).map(|m| m.as_str()),
        base: base.as_str(),
        index,
        size,
        scale,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Registry;
    use pretty_assertions::assert_eq;

    fn enc(text: &str, slot: Slot) -> Result<Vec<u8>, Error> {
        let registry = Registry::new();
        let ctx = Context::new(&registry, "t.s", 0);
        encode(text, slot, &ctx).map(|ea| ea.bytes())
    }

    #[test]
    fn priority_order() {
        assert_eq!(enc("#1", Slot::read(Size::Byte)).unwrap(), vec![0xA0, 1]);
        assert_eq!(enc("4(pc)", Slot::read(Size::Long)).unwrap(), vec![0x90, 4, 0, 0, 0]);
        assert_eq!(enc("r3", Slot::read(Size::Long)).unwrap(), vec![0x03]);
        assert_eq!(enc("fp3", Slot::read(Size::Double)).unwrap(), vec![0x73]);
        assert!(matches!(enc("nowhere", Slot::read(Size::Long)), Err(Error::Syntax(_))));
    }

    #[test]
    fn position_checks() {
        assert!(enc("#1", Slot::write(Size::Long)).is_err());
        assert!(enc("4(pc)", Slot::write(Size::Long)).is_err());
        assert!(enc("r0", Slot::control()).is_err());
        assert!(enc("(r0)+", Slot::control()).is_err());
        assert_eq!(enc("(a0)", Slot::control()).unwrap(), vec![0x18]);
        assert_eq!(enc("(r0)+", Slot::write(Size::Long)).unwrap(), vec![0x20]);
    }

    #[test]
    fn float_and_integer_registers() {
        assert!(enc("fp0", Slot::read(Size::Long)).is_err());
        assert!(enc("r0", Slot::read(Size::Single)).is_err());
        assert_eq!(enc("(r0)", Slot::read(Size::Single)).unwrap(), vec![0x10]);
    }

    #[test]
    fn elision() {
        let registry = Registry::new();
        let ctx = Context::new(&registry, "t.s", 0);
        let slot = Slot::read(Size::Long);
        let dst = encode("8(r1)", slot, &ctx).unwrap();
        let src = encode("8(r1)", slot, &ctx).unwrap();
        assert_eq!(elide(&dst, src).bytes(), vec![Mode::SAME_AS_DEST]);

        // register direct is not elidable
        let dst = encode("r1", slot, &ctx).unwrap();
        let src = encode("r1", slot, &ctx).unwrap();
        assert_eq!(elide(&dst, src).bytes(), vec![0x01]);

        // side effects are not elidable
        let dst = encode("(r1)+", slot, &ctx).unwrap();
        let src = encode("(r1)+", slot, &ctx).unwrap();
        assert_eq!(elide(&dst, src).bytes(), vec![0x21]);

        let dst = encode("(r1)", slot, &ctx).unwrap();
        let src = encode("(r2)", slot, &ctx).unwrap();
        assert_eq!(elide(&dst, src).bytes(), vec![0x12]);
    }
}
