use arch::op::Opcode::{self, *};
use arch::size::Size;

use super::OperandSet;
use crate::ea::Slot;

/// Contiguous opcode bytes `first..=last`.
fn span(first: Opcode, last: Opcode) -> Vec<Opcode> {
    (u8::from(first)..=u8::from(last))
        .filter_map(|byte| Opcode::try_from(byte).ok())
        .collect()
}

/// Operation size from the mnemonic suffix.
pub fn suffix(opcode: Opcode) -> Size {
    opcode
        .mnemonic()
        .rsplit_once('.')
        .and_then(|(_, s)| s.parse().ok())
        .unwrap_or(Size::Quad)
}

fn each(ops: Vec<Opcode>, slots: impl Fn(Size) -> Vec<Slot>) -> Vec<(Opcode, Vec<Slot>)> {
    ops.into_iter().map(|op| (op, slots(suffix(op)))).collect()
}

fn rw(size: Size) -> Vec<Slot> {
    vec![Slot::read(size), Slot::write(size)]
}

fn rr(size: Size) -> Vec<Slot> {
    vec![Slot::read(size), Slot::read(size)]
}

fn convert(src: Size, dst: Size) -> Vec<Slot> {
    vec![Slot::read(src), Slot::write(dst)]
}

impl OperandSet {
    pub const ALL: [OperandSet; 8] = [
        OperandSet::None,
        OperandSet::Branch,
        OperandSet::Monadic,
        OperandSet::Dyadic,
        OperandSet::IntegerMonadicBranch,
        OperandSet::FloatMonadicBranch,
        OperandSet::IntegerDyadicBranch,
        OperandSet::FloatDyadicBranch,
    ];

    /// The opcodes this family encodes, with the slot of each operand in
    /// source order.
    pub fn opcodes(self) -> Vec<(Opcode, Vec<Slot>)> {
        match self {
            OperandSet::None => vec![(HCF, vec![]), (RTS, vec![])],
            OperandSet::Branch => vec![(BRA, vec![]), (BSR, vec![])],
            OperandSet::Monadic => {
                let mut ops = vec![(JMP, vec![Slot::control()]), (JSR, vec![Slot::control()])];
                for (first, last) in [(CLR_B, CLR_Q), (NOT_B, NOT_Q), (NEG_B, NEG_Q)] {
                    ops.extend(each(span(first, last), |s| vec![Slot::write(s)]));
                }
                ops
            }
            OperandSet::Dyadic => {
                let mut ops = Vec::new();
                for (first, last) in [
                    (MOVE_B, FMOVE_D),
                    (AND_B, EOR_Q),
                    (LSL_B, ROR_Q),
                    (ADD_B, SUB_Q),
                    (ASL_B, DIVU_Q),
                    (FADD_S, FSQRT_D),
                ] {
                    ops.extend(each(span(first, last), rw));
                }
                ops.extend([
                    (EXG, vec![Slot::write(Size::Quad), Slot::write(Size::Quad)]),
                    (FEXG, vec![Slot::write(Size::Double), Slot::write(Size::Double)]),
                    (LEA, vec![Slot::control(), Slot::write(Size::Quad)]),
                    (EXTB_W, convert(Size::Byte, Size::Word)),
                    (EXTB_L, convert(Size::Byte, Size::Long)),
                    (EXTB_Q, convert(Size::Byte, Size::Quad)),
                    (EXTW_L, convert(Size::Word, Size::Long)),
                    (EXTW_Q, convert(Size::Word, Size::Quad)),
                    (EXTL_Q, convert(Size::Long, Size::Quad)),
                    (FMOVEL_S, convert(Size::Long, Size::Single)),
                    (FMOVEL_D, convert(Size::Long, Size::Double)),
                    (FMOVEQ_S, convert(Size::Quad, Size::Single)),
                    (FMOVEQ_D, convert(Size::Quad, Size::Double)),
                    (FMOVES_L, convert(Size::Single, Size::Long)),
                    (FMOVES_Q, convert(Size::Single, Size::Quad)),
                    (FMOVED_L, convert(Size::Double, Size::Long)),
                    (FMOVED_Q, convert(Size::Double, Size::Quad)),
                    (FMOVES_D, convert(Size::Single, Size::Double)),
                    (FMOVED_S, convert(Size::Double, Size::Single)),
                ]);
                ops
            }
            OperandSet::IntegerMonadicBranch => {
                let mut ops = each(span(BIZ_B, BPL_Q), |s| vec![Slot::read(s)]);
                ops.push((DBNZ, vec![Slot::write(Size::Long)]));
                ops
            }
            OperandSet::FloatMonadicBranch => each(span(FBIZ_S, FBPL_D), |s| vec![Slot::read(s)]),
            OperandSet::IntegerDyadicBranch => {
                let mut ops = each(span(BEQ_B, BGE_Q), rr);
                ops.extend(each(span(BBS_B, BBC_Q), rr));
                ops
            }
            OperandSet::FloatDyadicBranch => each(span(FBEQ_S, FBGE_D), rr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn every_opcode_belongs_to_one_family() {
        let mut seen = HashSet::new();
        for set in OperandSet::ALL {
            for (op, slots) in set.opcodes() {
                assert!(seen.insert(op), "{op} declared twice");
                assert_eq!(slots.len(), set.data_operands(), "{op} slot count");
            }
        }
        for op in Opcode::iter() {
            assert!(seen.contains(&op), "{op} has no operand set");
        }
    }

    #[test]
    fn suffix_sizes() {
        assert_eq!(suffix(ADD_B), Size::Byte);
        assert_eq!(suffix(FMOVE_D), Size::Double);
        assert_eq!(suffix(FMOVEL_S), Size::Single);
        assert_eq!(suffix(LEA), Size::Quad);
    }

    #[test]
    fn conversions_carry_two_sizes() {
        let ops = OperandSet::Dyadic.opcodes();
        let (_, slots) = ops.iter().find(|(op, _)| *op == FMOVES_L).unwrap();
        assert_eq!(slots[0].size, Size::Single);
        assert_eq!(slots[1].size, Size::Long);
    }
}
