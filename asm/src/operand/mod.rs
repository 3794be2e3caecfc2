pub mod branch;
pub mod fold;
pub mod table;

use arch::op::Opcode;

use crate::context::Context;
use crate::ea::{self, Ea, Slot};
use crate::error::Error;
use branch::{check_literal, parse_target, Target};

// ----------------------------------------------------------------------------
// Encoded output

/// A field the session has to register for the second pass. `at` is relative
/// to the first byte of the code it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fixup {
    Branch { at: usize, label: String, key: String },
    Import { at: usize, name: String },
}

impl Fixup {
    fn shifted(self, by: usize) -> Fixup {
        match self {
            Fixup::Branch { at, label, key } => Fixup::Branch {
                at: at + by,
                label,
                key,
            },
            Fixup::Import { at, name } => Fixup::Import { at: at + by, name },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Code {
    pub bytes: Vec<u8>,
    pub fixups: Vec<Fixup>,
}

impl Code {
    pub fn push_ea(&mut self, ea: &Ea) {
        self.bytes.push(ea.mode);
        if let Some(name) = &ea.import {
            self.fixups.push(Fixup::Import {
                at: self.bytes.len(),
                name: name.clone(),
            });
        }
        self.bytes.extend_from_slice(&ea.payload);
    }

    /// Put `byte` in front, moving every fixup along.
    pub fn prefixed(self, byte: u8) -> Code {
        let mut bytes = Vec::with_capacity(self.bytes.len() + 1);
        bytes.push(byte);
        bytes.extend(self.bytes);
        Code {
            bytes,
            fixups: self.fixups.into_iter().map(|f| f.shifted(1)).collect(),
        }
    }
}

/// Result of an operand set: operand bytes to follow the opcode, or a whole
/// replacement instruction (possibly empty) for a branch decided at assembly
/// time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    Emit(Code),
    Fold(Code),
}

// ----------------------------------------------------------------------------
// Operand sets

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandSet {
    None,
    Branch,
    Monadic,
    Dyadic,
    IntegerMonadicBranch,
    FloatMonadicBranch,
    IntegerDyadicBranch,
    FloatDyadicBranch,
}

pub fn assert_count(mnemonic: &str, operands: &[String], expected: usize) -> Result<(), Error> {
    if operands.len() != expected {
        return Err(Error::OperandCount {
            mnemonic: mnemonic.to_string(),
            expected,
            actual: operands.len(),
        });
    }
    Ok(())
}

fn operand<'s>(operands: &'s [String], slots: &[Slot], i: usize) -> Result<(&'s str, Slot), Error> {
    match (operands.get(i), slots.get(i)) {
        (Some(text), Some(slot)) => Ok((text.as_str(), *slot)),
        _ => Err(Error::syntax(format!("Missing operand {}", i + 1))),
    }
}

impl OperandSet {
    /// Data operands, not counting a branch target.
    pub fn data_operands(self) -> usize {
        match self {
            OperandSet::None | OperandSet::Branch => 0,
            OperandSet::Monadic
            | OperandSet::IntegerMonadicBranch
            | OperandSet::FloatMonadicBranch => 1,
            OperandSet::Dyadic
            | OperandSet::IntegerDyadicBranch
            | OperandSet::FloatDyadicBranch => 2,
        }
    }

    pub fn has_target(self) -> bool {
        !matches!(
            self,
            OperandSet::None | OperandSet::Monadic | OperandSet::Dyadic
        )
    }

    pub fn operand_count(self) -> usize {
        self.data_operands() + usize::from(self.has_target())
    }

    /// Operand bytes for `opcode`. Operands arrive in source order (source,
    /// destination, target); they are laid out destination first, then
    /// source, then the displacement.
    pub fn encode(
        self,
        opcode: Opcode,
        operands: &[String],
        slots: &[Slot],
        ctx: &mut Context,
    ) -> Result<Emission, Error> {
        assert_count(opcode.mnemonic(), operands, self.operand_count())?;
        // code offset of the first operand byte
        let base = ctx.offset + 1;
        let mut code = Code::default();

        match self {
            OperandSet::None => {}

            OperandSet::Branch => {
                let target = parse_target(&operands[0], ctx)?;
                check_literal(&target, BRA_LEN)?;
                code.push_target(&target, base)?;
            }

            OperandSet::Monadic => {
                let (text, slot) = operand(operands, slots, 0)?;
                code.push_ea(&ea::encode(text, slot, ctx)?);
            }

            OperandSet::Dyadic => {
                let (src, dst) = dyadic(operands, slots, ctx)?;
                code.push_ea(&dst);
                code.push_ea(&ea::elide(&dst, src));
            }

            OperandSet::IntegerMonadicBranch | OperandSet::FloatMonadicBranch => {
                let (text, slot) = operand(operands, slots, 0)?;
                let ea = ea::encode(text, slot, ctx)?;
                let target = parse_target(&operands[1], ctx)?;
                let length = 1 + ea.len() + 4;
                check_literal(&target, length)?;

                if let Some(taken) = ea.immediate.and_then(|v| fold::monadic(opcode, v)) {
                    return folded(taken, &target, length, ctx);
                }
                code.push_ea(&ea);
                code.push_target(&target, base)?;
            }

            OperandSet::IntegerDyadicBranch | OperandSet::FloatDyadicBranch => {
                let (src, dst) = dyadic(operands, slots, ctx)?;
                let target = parse_target(&operands[2], ctx)?;
                let same = dst.bytes() == src.bytes();
                let src = ea::elide(&dst, src);
                let length = 1 + dst.len() + src.len() + 4;
                check_literal(&target, length)?;

                if let (Some(s), Some(d)) = (src.immediate, dst.immediate) {
                    if let Some(taken) = fold::dyadic(opcode, slots[0].size, s, d) {
                        return folded(taken, &target, length, ctx);
                    }
                }
                if same {
                    ctx.warn(format!(
                        "`{}` compares `{}` with itself, the outcome never changes",
                        opcode.mnemonic(),
                        operands[1].trim()
                    ));
                }
                code.push_ea(&dst);
                code.push_ea(&src);
                code.push_target(&target, base)?;
            }
        }
        Ok(Emission::Emit(code))
    }
}

fn dyadic(operands: &[String], slots: &[Slot], ctx: &Context) -> Result<(Ea, Ea), Error> {
    let (src, src_slot) = operand(operands, slots, 0)?;
    let (dst, dst_slot) = operand(operands, slots, 1)?;
    let src = ea::encode(src, src_slot, ctx)?;
    let dst = ea::encode(dst, dst_slot, ctx)?;
    Ok((src, dst))
}

const BRA_LEN: usize = 1 + 4;

/// Taken: an unconditional `bra` to the same target. Not taken: nothing.
/// `length` is the size the unfolded instruction would have had.
fn folded(taken: bool, target: &Target, length: usize, ctx: &Context) -> Result<Emission, Error> {
    let mut code = Code::default();
    if !taken {
        return Ok(Emission::Fold(code));
    }
    // a backward literal counts from the end of the longer instruction; code
    // after it moves up with the fold, so forward literals stay as written
    let target = match *target {
        Target::Literal(disp) if disp < 0 => {
            let shrink = i32::try_from(length.saturating_sub(BRA_LEN))
                .map_err(|_| Error::syntax("Branch instruction too long"))?;
            Target::Literal(disp.saturating_add(shrink))
        }
        _ => target.clone(),
    };
    check_literal(&target, BRA_LEN)?;
    code.bytes.push(Opcode::BRA.into());
    code.push_target(&target, ctx.offset)?;
    Ok(Emission::Fold(code))
}
