use color_print::cprintln;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("`{mnemonic}` requires {expected} operand(s), got {actual}")]
    OperandCount {
        mnemonic: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown mnemonic: `{0}`")]
    UnknownMnemonic(String),

    #[error("Unknown register: `{0}`")]
    UnknownRegister(String),

    #[error("Unresolved symbol: `{name}`")]
    UnresolvedSymbol {
        name: String,
        file: String,
        line: usize,
    },

    #[error("Re-defined label: `{name}` (first declared at {file}:{line})")]
    DuplicateLabel {
        name: String,
        file: String,
        line: usize,
    },

    #[error("Invalid displacement {disp}: target lies inside the {length} byte instruction")]
    InvalidDisplacement { disp: i64, length: usize },

    #[error("Cannot evaluate constant expression `{0}`: {1}")]
    ConstantExpression(String, String),

    #[error("Imported symbol `{name}` is not declared `{qualifier}`")]
    ImportAccess { name: String, qualifier: char },

    #[error("No operand set registered for opcode `{0}`")]
    Unregistered(String),

    #[error("Invalid option `{0}`: {1}")]
    InvalidOption(String, String),

    #[error("Failed to parse project file: {0}")]
    Project(String, #[source] serde_json::Error),

    #[error("Malformed binary: {0}")]
    Format(String),

    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to read line: {0}")]
    FileRead(String, #[source] std::io::Error),

    #[error("Failed to create file: {0}")]
    FileCreate(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),

    #[error("{0}")]
    Line(Box<Located>),
}

/// A per-line failure, with enough context to print a diagnostic.
#[derive(Debug)]
pub struct Located {
    pub file: String,
    pub line: usize,
    pub raw: String,
    pub previous: Option<String>,
    pub error: Error,
}

impl fmt::Display for Located {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.error)
    }
}

impl Error {
    /// Attach the line being processed. Already located errors pass through.
    pub fn at(self, file: &str, line: usize, raw: &str, previous: Option<&str>) -> Error {
        match self {
            Error::Line(_) => self,
            error => Error::Line(Box::new(Located {
                file: file.to_string(),
                line,
                raw: raw.to_string(),
                previous: previous.map(str::to_string),
                error,
            })),
        }
    }

    /// The underlying error with any location wrapper removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Line(located) => located.error.root(),
            error => error,
        }
    }

    pub fn syntax(msg: impl Into<String>) -> Error {
        Error::Syntax(msg.into())
    }
}

impl Error {
    /// Print error with diagnostic information showing file location and line content
    pub fn print_diag(&self) {
        match self {
            Error::Line(located) => {
                cprintln!("<red,bold>error</>: {}", located.error);
                cprintln!("     <blue>--></> <underline>{}:{}</>", located.file, located.line);
                cprintln!("      <blue>|</>");
                if let Some(previous) = &located.previous {
                    cprintln!(" <blue>{:>4} |</> {}", located.line.saturating_sub(1), previous);
                }
                cprintln!(" <blue>{:>4} |</> {}", located.line, located.raw);
                cprintln!("      <blue>|</>");
            }
            Error::UnresolvedSymbol { file, line, .. } => {
                cprintln!("<red,bold>error</>: {}", self);
                cprintln!("     <blue>--></> <underline>{}:{}</>", file, line);
            }
            _ => cprintln!("<red,bold>error</>: {}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn located_errors_keep_their_root() {
        let err = Error::syntax("bad operand").at("main.s", 4, "move.l ?, r0", Some("start:"));
        assert!(matches!(err.root(), Error::Syntax(_)));
        assert_eq!(err.to_string(), "main.s:4: Syntax error: bad operand");

        // a second wrap keeps the innermost location
        let again = err.at("other.s", 9, "", None);
        match again {
            Error::Line(located) => {
                assert_eq!(located.file, "main.s");
                assert_eq!(located.previous.as_deref(), Some("start:"));
            }
            _ => panic!("expected located error"),
        }
    }

    #[test]
    fn duplicate_label_names_first_declaration() {
        let err = Error::DuplicateLabel {
            name: "loop".into(),
            file: "a.s".into(),
            line: 3,
        };
        assert_eq!(
            err.to_string(),
            "Re-defined label: `loop` (first declared at a.s:3)"
        );
    }
}
