use arch::op::Opcode;
use arch::size::Size;

use crate::preproc::Value;

fn stem(opcode: Opcode) -> &'static str {
    let mnemonic = opcode.mnemonic();
    mnemonic.split('.').next().unwrap_or(mnemonic)
}

/// Outcome of a one operand test on a constant, `None` when the opcode does
/// not fold.
pub fn monadic(opcode: Opcode, value: Value) -> Option<bool> {
    match value {
        Value::Int(v) => match stem(opcode) {
            "biz" => Some(v == 0),
            "bnz" => Some(v != 0),
            "bmi" => Some(v < 0),
            "bpl" => Some(v >= 0),
            _ => None,
        },
        Value::Float(v) => match stem(opcode) {
            "fbiz" => Some(v == 0.0),
            "fbnz" => Some(v != 0.0),
            "fbmi" => Some(v < 0.0),
            "fbpl" => Some(v >= 0.0),
            _ => None,
        },
    }
}

/// Outcome of comparing a constant destination against a constant source.
pub fn dyadic(opcode: Opcode, size: Size, src: Value, dst: Value) -> Option<bool> {
    match (src, dst) {
        (Value::Int(s), Value::Int(d)) => match stem(opcode) {
            "beq" => Some(d == s),
            "bne" => Some(d != s),
            "blt" => Some(d < s),
            "ble" => Some(d <= s),
            "bgt" => Some(d > s),
            "bge" => Some(d >= s),
            "bbs" | "bbc" => {
                let bit = (s as u64) % size.bits() as u64;
                let set = (d as u64 >> bit) & 1 == 1;
                Some(if stem(opcode) == "bbs" { set } else { !set })
            }
            _ => None,
        },
        (Value::Float(s), Value::Float(d)) => match stem(opcode) {
            "fbeq" => Some(d == s),
            "fbne" => Some(d != s),
            "fblt" => Some(d < s),
            "fble" => Some(d <= s),
            "fbgt" => Some(d > s),
            "fbge" => Some(d >= s),
            _ => None,
        },
        _ => None,
    }
}
