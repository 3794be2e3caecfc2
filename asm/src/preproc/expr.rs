use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;
use crate::number::{format_float, parse_float, parse_int};

// Innermost parenthesised group
static GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^()]*)\)").expect("group regex"));

// ----------------------------------------------------------------------------
// Tokens

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tok {
    Int(i64),
    Float(f64),
    Op(Op),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Not,
}

impl Op {
    fn precedence(self) -> u8 {
        match self {
            Op::Or => 1,
            Op::Xor => 2,
            Op::And => 3,
            Op::Shl | Op::Shr => 4,
            Op::Add | Op::Sub => 5,
            Op::Mul | Op::Div | Op::Rem => 6,
            Op::Not => 7,
        }
    }
}

/// Outcome of scanning a group: a token stream, a group that is not a
/// constant expression at all (it names a register, a label, ...), or one
/// that is made of literals but cannot be read.
enum Scan {
    Tokens(Vec<Tok>),
    NotConstant,
    Malformed(&'static str),
}

fn scan(text: &str) -> Scan {
    let chars: Vec<char> = text.chars().collect();
    let mut toks = Vec::new();
    let mut i = 0;
    // true when the next token should be a literal or a unary operator
    let mut operand = true;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if operand {
            let sigil = matches!(c, '$' | '%' | '@')
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_alphanumeric());
            if c.is_ascii_digit() || c == '.' || sigil {
                let start = i;
                i += 1;
                while i < chars.len() {
                    let n = chars[i];
                    let exp_sign = matches!(n, '+' | '-')
                        && matches!(chars[i - 1], 'e' | 'E')
                        && !chars[start..i].iter().any(|c| matches!(c, 'x' | 'X' | '$'));
                    if n.is_ascii_alphanumeric() || n == '.' || n == '_' || exp_sign {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                if let Some(value) = parse_int(&literal) {
                    toks.push(Tok::Int(value));
                } else if let Some(value) = parse_float(&literal) {
                    toks.push(Tok::Float(value));
                } else {
                    return Scan::NotConstant;
                }
                operand = false;
                continue;
            }
            match c {
                '-' => toks.push(Tok::Op(Op::Sub)),
                '+' => toks.push(Tok::Op(Op::Add)),
                '~' => toks.push(Tok::Op(Op::Not)),
                _ => return Scan::NotConstant,
            }
            i += 1;
            continue;
        }

        let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
        let (op, width) = match (c, two.as_str()) {
            (_, "<<") => (Op::Shl, 2),
            (_, ">>") => (Op::Shr, 2),
            ('+', _) => (Op::Add, 1),
            ('-', _) => (Op::Sub, 1),
            ('*', _) => (Op::Mul, 1),
            ('/', _) => (Op::Div, 1),
            ('%', _) => (Op::Rem, 1),
            ('&', _) => (Op::And, 1),
            ('|', _) => (Op::Or, 1),
            ('^', _) => (Op::Xor, 1),
            _ if c.is_ascii_digit() => return Scan::Malformed("operator expected"),
            _ => return Scan::NotConstant,
        };
        toks.push(Tok::Op(op));
        i += width;
        operand = true;
    }
    Scan::Tokens(toks)
}

// ----------------------------------------------------------------------------
// Evaluation

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn render(self) -> String {
        match self {
            Value::Int(v) => v.to_string(),
            Value::Float(v) => format_float(v),
        }
    }
}

struct Eval<'a> {
    text: &'a str,
    toks: &'a [Tok],
    pos: usize,
    float: bool,
}

impl Eval<'_> {
    fn fail(&self, why: &str) -> Error {
        Error::ConstantExpression(self.text.trim().to_string(), why.to_string())
    }

    fn primary(&mut self) -> Result<Value, Error> {
        let tok = self.toks.get(self.pos).copied();
        self.pos += 1;
        match tok {
            Some(Tok::Int(v)) if self.float => Ok(Value::Float(v as f64)),
            Some(Tok::Int(v)) => Ok(Value::Int(v)),
            Some(Tok::Float(v)) => Ok(Value::Float(v)),
            Some(Tok::Op(Op::Sub)) => match self.primary()? {
                Value::Int(v) => Ok(Value::Int(v.wrapping_neg())),
                Value::Float(v) => Ok(Value::Float(-v)),
            },
            Some(Tok::Op(Op::Add)) => self.primary(),
            Some(Tok::Op(Op::Not)) => match self.primary()? {
                Value::Int(v) => Ok(Value::Int(!v)),
                Value::Float(_) => Err(self.fail("`~` is not defined for floats")),
            },
            Some(Tok::Op(_)) => Err(self.fail("operand expected")),
            None => Err(self.fail("unexpected end of expression")),
        }
    }

    fn expr(&mut self, min: u8) -> Result<Value, Error> {
        let mut lhs = self.primary()?;
        while let Some(Tok::Op(op)) = self.toks.get(self.pos).copied() {
            if op.precedence() < min {
                break;
            }
            self.pos += 1;
            let rhs = self.expr(op.precedence() + 1)?;
            lhs = self.apply(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn apply(&self, op: Op, lhs: Value, rhs: Value) -> Result<Value, Error> {
        match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(match op {
                Op::Add => a.wrapping_add(b),
                Op::Sub => a.wrapping_sub(b),
                Op::Mul => a.wrapping_mul(b),
                Op::Div if b == 0 => return Err(self.fail("division by zero")),
                Op::Div => a.wrapping_div(b),
                Op::Rem if b == 0 => return Err(self.fail("modulo by zero")),
                Op::Rem => a.wrapping_rem(b),
                Op::And => a & b,
                Op::Or => a | b,
                Op::Xor => a ^ b,
                Op::Shl => a.wrapping_shl(b as u32),
                Op::Shr => a.wrapping_shr(b as u32),
                Op::Not => return Err(self.fail("`~` is unary")),
            })),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(match op {
                Op::Add => a + b,
                Op::Sub => a - b,
                Op::Mul => a * b,
                Op::Div if b == 0.0 => return Err(self.fail("division by zero")),
                Op::Div => a / b,
                _ => return Err(self.fail("operator is not defined for floats")),
            })),
            _ => Err(self.fail("mixed integer and float operands")),
        }
    }
}

/// Evaluate one group body. `Ok(None)` when the text is not a constant
/// expression and must be left alone.
pub fn evaluate(text: &str) -> Result<Option<Value>, Error> {
    if !text.chars().any(|c| c.is_ascii_digit()) {
        return Ok(None);
    }
    let toks = match scan(text) {
        Scan::Tokens(toks) => toks,
        Scan::NotConstant => return Ok(None),
        Scan::Malformed(why) => {
            return Err(Error::ConstantExpression(text.trim().to_string(), why.to_string()))
        }
    };
    let float = toks.iter().any(|t| matches!(t, Tok::Float(_)));
    let mut eval = Eval {
        text,
        toks: &toks,
        pos: 0,
        float,
    };
    let value = eval.expr(1)?;
    if eval.pos != toks.len() {
        return Err(eval.fail("trailing tokens"));
    }
    Ok(Some(value))
}

// ----------------------------------------------------------------------------
// Folding

/// Replace every constant group by its value, float groups first, until the
/// line stops changing.
pub fn fold(line: &str) -> Result<String, Error> {
    let mut line = line.to_string();
    loop {
        let floats = fold_pass(&line, true)?;
        let ints = fold_pass(&floats, false)?;
        if ints == line {
            return Ok(ints);
        }
        line = ints;
    }
}

fn fold_pass(line: &str, float: bool) -> Result<String, Error> {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for caps in GROUP.captures_iter(line) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = match evaluate(body.as_str())? {
            Some(value) => value,
            None => continue,
        };
        if matches!(value, Value::Float(_)) != float {
            continue;
        }
        out.push_str(&line[last..whole.start()]);
        out.push_str(&value.render());
        last = whole.end();
    }
    out.push_str(&line[last..]);
    Ok(out)
}
