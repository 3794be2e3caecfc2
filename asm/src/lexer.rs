use once_cell::sync::Lazy;
use regex::Regex;

static STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z0-9_]*(?:\.[A-Za-z])?)(?:\s+(.*?))?\s*$")
        .expect("statement regex")
});
static STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(?:[^"\\]|\\.)*""#).expect("string regex"));
static GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^()]*\)").expect("group regex"));
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new("\x01([0-9]+)\x01").expect("placeholder regex"));

// ----------------------------------------------------------------------------
// Token

/// One instruction statement: the mnemonic with its size suffix and the raw,
/// trimmed operand texts in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub mnemonic: String,
    pub operands: Vec<String>,
}

pub trait Tokenizer {
    fn tokenize(&self, line: &str) -> Option<Token>;
}

/// Line grammar driven by `regex`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexTokenizer;

impl Tokenizer for RegexTokenizer {
    fn tokenize(&self, line: &str) -> Option<Token> {
        let caps = STATEMENT.captures(line)?;
        let mnemonic = caps.get(1)?.as_str().to_string();
        let operands = match caps.get(2) {
            Some(list) if !list.as_str().trim().is_empty() => split_operands(list.as_str()),
            _ => vec![],
        };
        Some(Token { mnemonic, operands })
    }
}

pub fn tokenize(line: &str) -> Option<Token> {
    RegexTokenizer.tokenize(line)
}

// ----------------------------------------------------------------------------
// Operand list

/// Split on top level commas. Strings and parenthesised spans are swapped for
/// placeholders first so the commas inside them survive.
fn split_operands(list: &str) -> Vec<String> {
    let mut held: Vec<String> = Vec::new();
    let mut hold = |caps: &regex::Captures| {
        held.push(caps[0].to_string());
        format!("\x01{}\x01", held.len() - 1)
    };

    let mut text = STRING.replace_all(list, &mut hold).into_owned();
    // nested groups collapse from the inside out
    loop {
        let next = GROUP.replace_all(&text, &mut hold).into_owned();
        if next == text {
            break;
        }
        text = next;
    }

    text.split(',')
        .map(|part| restore(part, &held).trim().to_string())
        .collect()
}

fn restore(text: &str, held: &[String]) -> String {
    let mut text = text.to_string();
    while PLACEHOLDER.is_match(&text) {
        text = PLACEHOLDER
            .replace_all(&text, |caps: &regex::Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| held.get(i))
                    .cloned()
                    .unwrap_or_default()
            })
            .into_owned();
    }
    text
}
