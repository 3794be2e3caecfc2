mod expr;

pub use expr::{evaluate, fold, Value};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use crate::error::Error;

static STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(?:[^"\\]|\\.)*""#).expect("string regex"));
static ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\.?[A-Za-z_][A-Za-z0-9_]*:").expect("anchor regex"));
static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(;|//).*$").expect("comment regex"));
static SHIELD: Lazy<Regex> = Lazy::new(|| Regex::new("\x02([0-9]+)\x02").expect("shield regex"));

// ----------------------------------------------------------------------------
// Macro table

/// Textual definitions. The substitution regex is rebuilt whenever the table
/// changes, longest names first so that a name never shadows a longer one.
#[derive(Debug, Clone, Default)]
pub struct Macros {
    defs: IndexMap<String, String>,
    matcher: Option<Regex>,
}

impl Macros {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, value: &str) {
        self.defs.insert(name.to_string(), value.trim().to_string());
        self.rebuild();
    }

    pub fn undefine(&mut self, name: &str) -> Option<String> {
        let prev = self.defs.shift_remove(name);
        self.rebuild();
        prev
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.defs.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    fn rebuild(&mut self) {
        if self.defs.is_empty() {
            self.matcher = None;
            return;
        }
        let mut names: Vec<&String> = self.defs.keys().collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let alternation = names
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|");
        self.matcher = Regex::new(&format!(r"\b(?:{alternation})\b")).ok();
    }

    /// One left-to-right replacement pass; substituted text is not rescanned.
    pub fn apply(&self, line: &str) -> String {
        match &self.matcher {
            Some(matcher) => matcher
                .replace_all(line, |caps: &regex::Captures| {
                    self.get(&caps[0]).unwrap_or(&caps[0]).to_string()
                })
                .into_owned(),
            None => line.to_string(),
        }
    }
}

// ----------------------------------------------------------------------------
// Preprocess

/// Comments, macro substitution and constant folding for one source line.
/// String literals and the leading `label:` anchor are shielded from the
/// substitution and folding steps.
pub fn preprocess(line: &str, macros: &Macros) -> Result<String, Error> {
    let mut shielded: Vec<String> = Vec::new();

    // 1. protect literals
    let mut code = STRING
        .replace_all(line, |caps: &regex::Captures| shield(&caps[0], &mut shielded))
        .into_owned();
    code = ANCHOR
        .replace(&code, |caps: &regex::Captures| shield(&caps[0], &mut shielded))
        .into_owned();

    // 2. comments
    code = COMMENT.replace(&code, NoExpand("")).trim_end().to_string();

    // 3. macros
    code = macros.apply(&code);

    // 4. constants
    code = fold(&code)?;

    // 5. restore
    Ok(restore(&code, &shielded))
}

/// Comment removal alone, for lines that must not see macro substitution.
pub fn strip_comment(line: &str) -> String {
    let mut shielded: Vec<String> = Vec::new();
    let code = STRING
        .replace_all(line, |caps: &regex::Captures| shield(&caps[0], &mut shielded))
        .into_owned();
    let code = COMMENT.replace(&code, NoExpand("")).trim_end().to_string();
    restore(&code, &shielded)
}

fn shield(text: &str, shielded: &mut Vec<String>) -> String {
    shielded.push(text.to_string());
    format!("\x02{}\x02", shielded.len() - 1)
}

fn restore(code: &str, shielded: &[String]) -> String {
    SHIELD
        .replace_all(code, |caps: &regex::Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| shielded.get(i))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn macros(defs: &[(&str, &str)]) -> Macros {
        let mut m = Macros::new();
        for (k, v) in defs {
            m.define(k, v);
        }
        m
    }

    #[test]
    fn strips_comments() {
        let m = Macros::new();
        assert_eq!(preprocess("  rts ; done", &m).unwrap(), "  rts");
        assert_eq!(preprocess("rts // done", &m).unwrap(), "rts");
        assert_eq!(preprocess("; only a comment", &m).unwrap(), "");
    }

    #[test]
    fn strings_survive_comments_and_macros() {
        let m = macros(&[("hello", "42")]);
        assert_eq!(
            preprocess(r#"dc.b "hello; world", 0 ; trailing"#, &m).unwrap(),
            r#"dc.b "hello; world", 0"#
        );
    }

    #[test]
    fn substitutes_longest_name_first() {
        let m = macros(&[("SIZE", "4"), ("SIZE_X", "8")]);
        assert_eq!(
            preprocess("move.l #SIZE_X, r0", &m).unwrap(),
            "move.l #8, r0"
        );
        assert_eq!(preprocess("move.l #SIZE, r0", &m).unwrap(), "move.l #4, r0");
    }

    #[test]
    fn label_anchor_is_protected() {
        let m = macros(&[("loop", "99")]);
        assert_eq!(
            preprocess("loop: bra loop", &m).unwrap(),
            "loop: bra 99"
        );
    }

    #[test]
    fn folds_after_substitution() {
        let m = macros(&[("WIDTH", "320"), ("HEIGHT", "200")]);
        assert_eq!(
            preprocess("move.l #(WIDTH*HEIGHT), r0", &m).unwrap(),
            "move.l #64000, r0"
        );
    }

    #[test]
    fn idempotent_without_work() {
        let m = macros(&[("X", "1")]);
        let line = "add.l (r0)+, 8(r1)";
        let once = preprocess(line, &m).unwrap();
        assert_eq!(once, line);
        assert_eq!(preprocess(&once, &m).unwrap(), once);
    }

    #[test]
    fn bad_constant_is_an_error() {
        let m = Macros::new();
        assert!(preprocess("move.l #(1/0), r0", &m).is_err());
    }

    #[test]
    fn comment_only_strip() {
        assert_eq!(strip_comment("@def X 1 ; one"), "@def X 1");
        assert_eq!(strip_comment(r#"@def S "a;b""#), r#"@def S "a;b""#);
    }

    #[test]
    fn undefine() {
        let mut m = macros(&[("A", "1")]);
        assert_eq!(m.undefine("A").as_deref(), Some("1"));
        assert!(m.is_empty());
        assert_eq!(preprocess("move.l #A, r0", &m).unwrap(), "move.l #A, r0");
    }
}
