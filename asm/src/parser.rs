use arch::size::Size;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;
use crate::label::Qualifiers;
use crate::lexer::{tokenize, Token};
use crate::number::{is_identifier, parse_int};

static LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\.?[A-Za-z_][A-Za-z0-9_]*):(.*)$").expect("label regex"));
static DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*@([A-Za-z]+)(?:\s+(.*?))?\s*$").expect("directive regex"));

/// Largest `@align` accepted.
pub const MAX_ALIGN: i64 = 4096;

// ----------------------------------------------------------------------------
// Statement

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Define(String, String),
    Undefine(String),
    Import(String, Qualifiers),
    Export(String, Qualifiers),
    Align(usize),
    Data(Size, Vec<String>),
    Code(Token),
}

/// One source line after preprocessing: an optional label declaration and
/// an optional statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Line {
    pub label: Option<String>,
    pub stmt: Option<Stmt>,
}

impl Line {
    pub fn parse(code: &str) -> Result<Line, Error> {
        if code.trim().is_empty() {
            return Ok(Line::default());
        }
        if let Some(caps) = LABEL.captures(code) {
            let rest = caps.get(2).map_or("", |m| m.as_str());
            if LABEL.is_match(rest) {
                return Err(Error::syntax("Only one label per line"));
            }
            return Ok(Line {
                label: Some(caps[1].to_string()),
                stmt: Stmt::parse(rest)?,
            });
        }
        Ok(Line {
            label: None,
            stmt: Stmt::parse(code)?,
        })
    }
}

/// `@def` and `@undef` lines are taken before macro substitution, otherwise
/// redefining a name would substitute the name itself.
pub fn is_macro_edit(code: &str) -> bool {
    DIRECTIVE
        .captures(code)
        .is_some_and(|caps| matches!(&caps[1], "def" | "undef"))
}

impl Stmt {
    fn parse(code: &str) -> Result<Option<Stmt>, Error> {
        if code.trim().is_empty() {
            return Ok(None);
        }
        if let Some(caps) = DIRECTIVE.captures(code) {
            let args = caps.get(2).map_or("", |m| m.as_str());
            return Stmt::directive(&caps[1], args).map(Some);
        }
        match tokenize(code) {
            Some(token) if token.mnemonic.starts_with("dc.") => Stmt::data(token).map(Some),
            Some(token) => Ok(Some(Stmt::Code(token))),
            None => Err(Error::syntax(format!("Unrecognised statement `{}`", code.trim()))),
        }
    }

    fn directive(name: &str, args: &str) -> Result<Stmt, Error> {
        let words: Vec<&str> = args.split_whitespace().collect();
        let ident = |word: Option<&&str>| -> Result<String, Error> {
            match word {
                Some(w) if is_identifier(w) => Ok(w.to_string()),
                Some(w) => Err(Error::syntax(format!("`{w}` is not a valid name"))),
                None => Err(Error::syntax(format!("`@{name}` needs a name"))),
            }
        };
        let qualified = |words: &[&str]| -> Result<(String, Qualifiers), Error> {
            match words {
                [label, q] => Ok((label.to_string(), Qualifiers::parse(q)?)),
                _ => Err(Error::syntax(format!("usage: `@{name} <label> <rwx>`"))),
            }
        };

        match name {
            "def" => {
                let name = ident(words.first())?;
                let value = args.trim_start()[name.len()..].trim();
                Ok(Stmt::Define(name, value.to_string()))
            }
            "undef" => match words.as_slice() {
                [_] => Ok(Stmt::Undefine(ident(words.first())?)),
                _ => Err(Error::syntax("usage: `@undef <name>`")),
            },
            "import" => {
                let (label, q) = qualified(&words)?;
                Ok(Stmt::Import(label, q))
            }
            "export" => {
                let (label, q) = qualified(&words)?;
                Ok(Stmt::Export(label, q))
            }
            "align" => {
                let align = match words.as_slice() {
                    [n] => parse_int(n)
                        .filter(|&n| n > 0 && n <= MAX_ALIGN && (n as u64).is_power_of_two()),
                    _ => None,
                };
                match align {
                    Some(n) => Ok(Stmt::Align(n as usize)),
                    None => Err(Error::syntax(format!(
                        "`@align` needs a power of two up to {MAX_ALIGN}"
                    ))),
                }
            }
            _ => Err(Error::syntax(format!("Unknown directive `@{name}`"))),
        }
    }

    fn data(token: Token) -> Result<Stmt, Error> {
        let suffix = token.mnemonic.trim_start_matches("dc.");
        let size = suffix
            .parse::<Size>()
            .map_err(|_| Error::UnknownMnemonic(token.mnemonic.clone()))?;
        if token.operands.is_empty() {
            return Err(Error::OperandCount {
                mnemonic: token.mnemonic,
                expected: 1,
                actual: 0,
            });
        }
        Ok(Stmt::Data(size, token.operands))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stmt(code: &str) -> Stmt {
        Line::parse(code).unwrap().stmt.unwrap()
    }

    #[test]
    fn labels() {
        let line = Line::parse("main:").unwrap();
        assert_eq!(line.label.as_deref(), Some("main"));
        assert_eq!(line.stmt, None);

        let line = Line::parse("  .loop: sub.l #1, r0").unwrap();
        assert_eq!(line.label.as_deref(), Some(".loop"));
        assert!(
            matches!(line.stmt, Some(Stmt::Code(Token { ref mnemonic, .. })) if mnemonic == "sub.l")
        );

        assert!(Line::parse("a: b:").is_err());
    }

    #[test]
    fn directives() {
        assert_eq!(
            stmt("@def WIDTH  (320 * 2)"),
            Stmt::Define("WIDTH".into(), "(320 * 2)".into())
        );
        assert_eq!(stmt("@def EMPTY"), Stmt::Define("EMPTY".into(), "".into()));
        assert_eq!(stmt("@undef WIDTH"), Stmt::Undefine("WIDTH".into()));
        assert_eq!(stmt("@import print x"), Stmt::Import("print".into(), Qualifiers::CALL));
        assert_eq!(
            stmt("@export table rw"),
            Stmt::Export("table".into(), Qualifiers::parse("rw").unwrap())
        );
        assert_eq!(stmt("@align 8"), Stmt::Align(8));
    }

    #[test]
    fn bad_directives() {
        assert!(Line::parse("@align 6").is_err());
        assert!(matches!(Line::parse("@align 8192"), Err(Error::Syntax(_))));
        assert!(matches!(
            Line::parse("@align $4000000000000000"),
            Err(Error::Syntax(_))
        ));
        assert_eq!(Line::parse("@align 4096").unwrap().stmt, Some(Stmt::Align(4096)));
        assert!(Line::parse("@align").is_err());
        assert!(Line::parse("@import print").is_err());
        assert!(Line::parse("@export 1abc r").is_err());
        assert!(Line::parse("@def 9 x").is_err());
        assert!(Line::parse("@frobnicate").is_err());
    }

    #[test]
    fn data() {
        assert_eq!(
            stmt(r#"dc.b "hi, there", 0"#),
            Stmt::Data(Size::Byte, vec![r#""hi, there""#.into(), "0".into()])
        );
        assert_eq!(
            stmt("dc.d 1.5, -2"),
            Stmt::Data(Size::Double, vec!["1.5".into(), "-2".into()])
        );
        assert!(matches!(Line::parse("dc.x 1"), Err(Error::UnknownMnemonic(_))));
        assert!(matches!(Line::parse("dc.l"), Err(Error::OperandCount { .. })));
    }

    #[test]
    fn macro_edits() {
        assert!(is_macro_edit("@def X 1"));
        assert!(is_macro_edit("  @undef X"));
        assert!(!is_macro_edit("@import X r"));
        assert!(!is_macro_edit("move.l #X, r0"));
    }

    #[test]
    fn garbage_is_a_syntax_error() {
        assert!(matches!(Line::parse("!!"), Err(Error::Syntax(_))));
        assert_eq!(Line::parse("   ").unwrap(), Line::default());
    }
}
