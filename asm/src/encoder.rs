use arch::op::Opcode;
use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::context::Context;
use crate::ea::Slot;
use crate::error::Error;
use crate::lexer::Token;
use crate::operand::{Emission, OperandSet};

static ENCODER: Lazy<Encoder> = Lazy::new(Encoder::new);

/// Opcode to operand set registry, filled by each set declaring the opcodes
/// it owns.
#[derive(Debug)]
pub struct Encoder {
    table: IndexMap<Opcode, (OperandSet, Vec<Slot>)>,
}

impl Default for Encoder {
    fn default() -> Self {
        Encoder::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        let mut table = IndexMap::new();
        for set in OperandSet::ALL {
            for (opcode, slots) in set.opcodes() {
                table.insert(opcode, (set, slots));
            }
        }
        Encoder { table }
    }

    pub fn lookup(&self, opcode: Opcode) -> Option<(OperandSet, &[Slot])> {
        self.table
            .get(&opcode)
            .map(|(set, slots)| (*set, slots.as_slice()))
    }

    /// Opcode byte followed by the operand bytes, or the folded replacement.
    pub fn encode_line(&self, token: &Token, ctx: &mut Context) -> Result<Emission, Error> {
        let opcode = Opcode::parse(&token.mnemonic)
            .map_err(|_| Error::UnknownMnemonic(token.mnemonic.clone()))?;
        let (set, slots) = self
            .lookup(opcode)
            .ok_or_else(|| Error::Unregistered(token.mnemonic.clone()))?;

        Ok(match set.encode(opcode, &token.operands, slots, ctx)? {
            Emission::Emit(code) => Emission::Emit(code.prefixed(opcode.into())),
            fold => fold,
        })
    }
}

pub fn encode_line(token: &Token, ctx: &mut Context) -> Result<Emission, Error> {
    ENCODER.encode_line(token, ctx)
}
