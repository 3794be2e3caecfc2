use super::{Code, Fixup};
use crate::context::Context;
use crate::ea::UNRESOLVED;
use crate::error::Error;
use crate::label::{is_local, key};
use crate::number::{is_identifier, parse_int};

/// Branch destination as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Literal displacement, taken as is.
    Literal(i32),
    /// Label, with its offset when it is already declared.
    Label {
        name: String,
        key: String,
        offset: Option<usize>,
    },
}

pub fn parse_target(text: &str, ctx: &Context) -> Result<Target, Error> {
    let text = text.trim();
    if let Some(value) = parse_int(text) {
        let disp = i32::try_from(value)
            .map_err(|_| Error::syntax(format!("Branch displacement `{text}` out of range")))?;
        return Ok(Target::Literal(disp));
    }

    let bare = text.strip_prefix('.').unwrap_or(text);
    if !is_identifier(bare) {
        return Err(Error::syntax(format!("Invalid branch target `{text}`")));
    }
    if !is_local(text) && ctx.registry.import(text).is_some() {
        return Err(Error::syntax(format!(
            "Cannot branch to imported label `{text}`, use `jmp` or `jsr`"
        )));
    }
    Ok(Target::Label {
        name: text.to_string(),
        key: key(text, ctx.file),
        offset: ctx.registry.lookup(text, ctx.file).map(|l| l.offset),
    })
}

/// A backward literal that does not clear the instruction would land the
/// program counter inside it.
pub fn check_literal(target: &Target, length: usize) -> Result<(), Error> {
    if let Target::Literal(disp) = *target {
        let disp = disp as i64;
        if disp < 0 && disp.unsigned_abs() <= length as u64 {
            return Err(Error::InvalidDisplacement { disp, length });
        }
    }
    Ok(())
}

impl Code {
    /// Append the 32-bit displacement field. `base` is the code offset of
    /// the first byte of `self`.
    pub fn push_target(&mut self, target: &Target, base: usize) -> Result<(), Error> {
        let at = self.bytes.len();
        let field_end = base + at + 4;
        match target {
            Target::Literal(disp) => self.bytes.extend_from_slice(&disp.to_le_bytes()),
            Target::Label {
                offset: Some(offset),
                name,
                ..
            } => {
                let disp = i32::try_from(*offset as i64 - field_end as i64)
                    .map_err(|_| Error::syntax(format!("Branch to `{name}` out of range")))?;
                self.bytes.extend_from_slice(&disp.to_le_bytes());
            }
            Target::Label {
                offset: None,
                name,
                key,
            } => {
                self.bytes.extend_from_slice(&UNRESOLVED);
                self.fixups.push(Fixup::Branch {
                    at,
                    label: name.clone(),
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::{Qualifiers, Registry};
    use pretty_assertions::assert_eq;

    #[test]
    fn literal_targets() {
        let registry = Registry::new();
        let ctx = Context::new(&registry, "a.s", 0);
        assert_eq!(parse_target("-16", &ctx).unwrap(), Target::Literal(-16));
        assert_eq!(parse_target("$20", &ctx).unwrap(), Target::Literal(32));
        assert!(parse_target("$1FFFFFFFF", &ctx).is_err());
    }

    #[test]
    fn backward_literal_inside_instruction() {
        assert!(check_literal(&Target::Literal(-5), 5).is_err());
        assert!(check_literal(&Target::Literal(-1), 5).is_err());
        assert!(check_literal(&Target::Literal(-6), 5).is_ok());
        assert!(check_literal(&Target::Literal(0), 5).is_ok());
        assert!(check_literal(&Target::Literal(3), 5).is_ok());
        match check_literal(&Target::Literal(-7), 7) {
            Err(Error::InvalidDisplacement { disp, length }) => {
                assert_eq!(disp, -7);
                assert_eq!(length, 7);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn label_targets() {
        let mut registry = Registry::new();
        registry.declare("top", "a.s", 1, 4).unwrap();
        registry.declare(".inner", "a.s", 2, 8).unwrap();
        registry
            .declare_import("ext", Qualifiers::CALL, "a.s", 3)
            .unwrap();
        let ctx = Context::new(&registry, "a.s", 32);

        let top = parse_target("top", &ctx).unwrap();
        assert_eq!(
            top,
            Target::Label {
                name: "top".into(),
                key: "top".into(),
                offset: Some(4)
            }
        );
        let inner = parse_target(".inner", &ctx).unwrap();
        assert!(matches!(inner, Target::Label { offset: Some(8), .. }));
        let ahead = parse_target("later", &ctx).unwrap();
        assert!(matches!(ahead, Target::Label { offset: None, .. }));

        assert!(matches!(parse_target("ext", &ctx), Err(Error::Syntax(_))));
        assert!(parse_target("(r0)", &ctx).is_err());
    }

    #[test]
    fn displacement_field() {
        let mut code = Code::default();
        code.bytes.push(0x00);
        let backward = Target::Label {
            name: "top".into(),
            key: "top".into(),
            offset: Some(4),
        };
        // field at 33..37, so 4 - 37
        code.push_target(&backward, 32).unwrap();
        assert_eq!(&code.bytes[1..], &(-33i32).to_le_bytes());

        let mut code = Code::default();
        let forward = Target::Label {
            name: "later".into(),
            key: "later".into(),
            offset: None,
        };
        code.push_target(&forward, 0).unwrap();
        assert_eq!(code.bytes, UNRESOLVED.to_vec());
        assert_eq!(
            code.fixups,
            vec![Fixup::Branch {
                at: 0,
                label: "later".into(),
                key: "later".into()
            }]
        );
    }
}
