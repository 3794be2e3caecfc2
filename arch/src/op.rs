use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

// ----------------------------------------------------------------------------
// Group

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Group {
    Control,
    DataMove,
    Logical,
    Arithmetic,
}

impl Group {
    pub const CONTROL: std::ops::RangeInclusive<u8> = 0x00..=0x5F;
    pub const DATA_MOVE: std::ops::RangeInclusive<u8> = 0x60..=0x8F;
    pub const LOGICAL: std::ops::RangeInclusive<u8> = 0x90..=0xBF;
    pub const ARITHMETIC: std::ops::RangeInclusive<u8> = 0xC0..=0xFF;

    pub fn of(byte: u8) -> Group {
        match byte {
            0x00..=0x5F => Group::Control,
            0x60..=0x8F => Group::DataMove,
            0x90..=0xBF => Group::Logical,
            _ => Group::Arithmetic,
        }
    }
}

// ----------------------------------------------------------------------------
// Opcode

/// One byte per instruction. The mnemonic text (including the size suffix)
/// is the strum serialization, so `"add.l".parse::<Opcode>()` is the lookup.
#[allow(non_camel_case_types)]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    IntoPrimitive,
    TryFromPrimitive,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[repr(u8)]
pub enum Opcode {
    // Control ----------------------------------------------------------------
    #[strum(to_string = "hcf")]
    HCF = 0x00,
    #[strum(to_string = "rts")]
    RTS = 0x01,
    #[strum(to_string = "bra")]
    BRA = 0x02,
    #[strum(to_string = "bsr")]
    BSR = 0x03,
    #[strum(to_string = "jmp")]
    JMP = 0x04,
    #[strum(to_string = "jsr")]
    JSR = 0x05,
    #[strum(to_string = "dbnz")]
    DBNZ = 0x06,

    #[strum(to_string = "biz.b")]
    BIZ_B = 0x08,
    #[strum(to_string = "biz.w")]
    BIZ_W,
    #[strum(to_string = "biz.l")]
    BIZ_L,
    #[strum(to_string = "biz.q")]
    BIZ_Q,
    #[strum(to_string = "bnz.b")]
    BNZ_B,
    #[strum(to_string = "bnz.w")]
    BNZ_W,
    #[strum(to_string = "bnz.l")]
    BNZ_L,
    #[strum(to_string = "bnz.q")]
    BNZ_Q,
    #[strum(to_string = "bmi.b")]
    BMI_B,
    #[strum(to_string = "bmi.w")]
    BMI_W,
    #[strum(to_string = "bmi.l")]
    BMI_L,
    #[strum(to_string = "bmi.q")]
    BMI_Q,
    #[strum(to_string = "bpl.b")]
    BPL_B,
    #[strum(to_string = "bpl.w")]
    BPL_W,
    #[strum(to_string = "bpl.l")]
    BPL_L,
    #[strum(to_string = "bpl.q")]
    BPL_Q,

    #[strum(to_string = "fbiz.s")]
    FBIZ_S = 0x18,
    #[strum(to_string = "fbiz.d")]
    FBIZ_D,
    #[strum(to_string = "fbnz.s")]
    FBNZ_S,
    #[strum(to_string = "fbnz.d")]
    FBNZ_D,
    #[strum(to_string = "fbmi.s")]
    FBMI_S,
    #[strum(to_string = "fbmi.d")]
    FBMI_D,
    #[strum(to_string = "fbpl.s")]
    FBPL_S,
    #[strum(to_string = "fbpl.d")]
    FBPL_D,

    #[strum(to_string = "beq.b")]
    BEQ_B = 0x20,
    #[strum(to_string = "beq.w")]
    BEQ_W,
    #[strum(to_string = "beq.l")]
    BEQ_L,
    #[strum(to_string = "beq.q")]
    BEQ_Q,
    #[strum(to_string = "bne.b")]
    BNE_B,
    #[strum(to_string = "bne.w")]
    BNE_W,
    #[strum(to_string = "bne.l")]
    BNE_L,
    #[strum(to_string = "bne.q")]
    BNE_Q,
    #[strum(to_string = "blt.b")]
    BLT_B,
    #[strum(to_string = "blt.w")]
    BLT_W,
    #[strum(to_string = "blt.l")]
    BLT_L,
    #[strum(to_string = "blt.q")]
    BLT_Q,
    #[strum(to_string = "ble.b")]
    BLE_B,
    #[strum(to_string = "ble.w")]
    BLE_W,
    #[strum(to_string = "ble.l")]
    BLE_L,
    #[strum(to_string = "ble.q")]
    BLE_Q,
    #[strum(to_string = "bgt.b")]
    BGT_B,
    #[strum(to_string = "bgt.w")]
    BGT_W,
    #[strum(to_string = "bgt.l")]
    BGT_L,
    #[strum(to_string = "bgt.q")]
    BGT_Q,
    #[strum(to_string = "bge.b")]
    BGE_B,
    #[strum(to_string = "bge.w")]
    BGE_W,
    #[strum(to_string = "bge.l")]
    BGE_L,
    #[strum(to_string = "bge.q")]
    BGE_Q,

    #[strum(to_string = "fbeq.s")]
    FBEQ_S = 0x38,
    #[strum(to_string = "fbeq.d")]
    FBEQ_D,
    #[strum(to_string = "fbne.s")]
    FBNE_S,
    #[strum(to_string = "fbne.d")]
    FBNE_D,
    #[strum(to_string = "fblt.s")]
    FBLT_S,
    #[strum(to_string = "fblt.d")]
    FBLT_D,
    #[strum(to_string = "fble.s")]
    FBLE_S,
    #[strum(to_string = "fble.d")]
    FBLE_D,
    #[strum(to_string = "fbgt.s")]
    FBGT_S,
    #[strum(to_string = "fbgt.d")]
    FBGT_D,
    #[strum(to_string = "fbge.s")]
    FBGE_S,
    #[strum(to_string = "fbge.d")]
    FBGE_D,

    #[strum(to_string = "bbs.b")]
    BBS_B = 0x44,
    #[strum(to_string = "bbs.w")]
    BBS_W,
    #[strum(to_string = "bbs.l")]
    BBS_L,
    #[strum(to_string = "bbs.q")]
    BBS_Q,
    #[strum(to_string = "bbc.b")]
    BBC_B,
    #[strum(to_string = "bbc.w")]
    BBC_W,
    #[strum(to_string = "bbc.l")]
    BBC_L,
    #[strum(to_string = "bbc.q")]
    BBC_Q,

    // Data move --------------------------------------------------------------
    #[strum(to_string = "move.b")]
    MOVE_B = 0x60,
    #[strum(to_string = "move.w")]
    MOVE_W,
    #[strum(to_string = "move.l")]
    MOVE_L,
    #[strum(to_string = "move.q")]
    MOVE_Q,
    #[strum(to_string = "fmove.s")]
    FMOVE_S,
    #[strum(to_string = "fmove.d")]
    FMOVE_D,
    #[strum(to_string = "clr.b")]
    CLR_B,
    #[strum(to_string = "clr.w")]
    CLR_W,
    #[strum(to_string = "clr.l")]
    CLR_L,
    #[strum(to_string = "clr.q")]
    CLR_Q,
    #[strum(to_string = "exg")]
    EXG,
    #[strum(to_string = "fexg")]
    FEXG,
    #[strum(to_string = "lea")]
    LEA,
    #[strum(to_string = "extb.w")]
    EXTB_W,
    #[strum(to_string = "extb.l")]
    EXTB_L,
    #[strum(to_string = "extb.q")]
    EXTB_Q,
    #[strum(to_string = "extw.l")]
    EXTW_L,
    #[strum(to_string = "extw.q")]
    EXTW_Q,
    #[strum(to_string = "extl.q")]
    EXTL_Q,
    #[strum(to_string = "fmovel.s")]
    FMOVEL_S,
    #[strum(to_string = "fmovel.d")]
    FMOVEL_D,
    #[strum(to_string = "fmoveq.s")]
    FMOVEQ_S,
    #[strum(to_string = "fmoveq.d")]
    FMOVEQ_D,
    #[strum(to_string = "fmoves.l")]
    FMOVES_L,
    #[strum(to_string = "fmoves.q")]
    FMOVES_Q,
    #[strum(to_string = "fmoved.l")]
    FMOVED_L,
    #[strum(to_string = "fmoved.q")]
    FMOVED_Q,
    #[strum(to_string = "fmoves.d")]
    FMOVES_D,
    #[strum(to_string = "fmoved.s")]
    FMOVED_S,

    // Logical ----------------------------------------------------------------
    #[strum(to_string = "and.b")]
    AND_B = 0x90,
    #[strum(to_string = "and.w")]
    AND_W,
    #[strum(to_string = "and.l")]
    AND_L,
    #[strum(to_string = "and.q")]
    AND_Q,
    #[strum(to_string = "or.b")]
    OR_B,
    #[strum(to_string = "or.w")]
    OR_W,
    #[strum(to_string = "or.l")]
    OR_L,
    #[strum(to_string = "or.q")]
    OR_Q,
    #[strum(to_string = "eor.b")]
    EOR_B,
    #[strum(to_string = "eor.w")]
    EOR_W,
    #[strum(to_string = "eor.l")]
    EOR_L,
    #[strum(to_string = "eor.q")]
    EOR_Q,
    #[strum(to_string = "not.b")]
    NOT_B,
    #[strum(to_string = "not.w")]
    NOT_W,
    #[strum(to_string = "not.l")]
    NOT_L,
    #[strum(to_string = "not.q")]
    NOT_Q,
    #[strum(to_string = "lsl.b")]
    LSL_B,
    #[strum(to_string = "lsl.w")]
    LSL_W,
    #[strum(to_string = "lsl.l")]
    LSL_L,
    #[strum(to_string = "lsl.q")]
    LSL_Q,
    #[strum(to_string = "lsr.b")]
    LSR_B,
    #[strum(to_string = "lsr.w")]
    LSR_W,
    #[strum(to_string = "lsr.l")]
    LSR_L,
    #[strum(to_string = "lsr.q")]
    LSR_Q,
    #[strum(to_string = "rol.b")]
    ROL_B,
    #[strum(to_string = "rol.w")]
    ROL_W,
    #[strum(to_string = "rol.l")]
    ROL_L,
    #[strum(to_string = "rol.q")]
    ROL_Q,
    #[strum(to_string = "ror.b")]
    ROR_B,
    #[strum(to_string = "ror.w")]
    ROR_W,
    #[strum(to_string = "ror.l")]
    ROR_L,
    #[strum(to_string = "ror.q")]
    ROR_Q,

    // Arithmetic -------------------------------------------------------------
    #[strum(to_string = "add.b")]
    ADD_B = 0xC0,
    #[strum(to_string = "add.w")]
    ADD_W,
    #[strum(to_string = "add.l")]
    ADD_L,
    #[strum(to_string = "add.q")]
    ADD_Q,
    #[strum(to_string = "sub.b")]
    SUB_B,
    #[strum(to_string = "sub.w")]
    SUB_W,
    #[strum(to_string = "sub.l")]
    SUB_L,
    #[strum(to_string = "sub.q")]
    SUB_Q,
    #[strum(to_string = "neg.b")]
    NEG_B,
    #[strum(to_string = "neg.w")]
    NEG_W,
    #[strum(to_string = "neg.l")]
    NEG_L,
    #[strum(to_string = "neg.q")]
    NEG_Q,
    #[strum(to_string = "asl.b")]
    ASL_B,
    #[strum(to_string = "asl.w")]
    ASL_W,
    #[strum(to_string = "asl.l")]
    ASL_L,
    #[strum(to_string = "asl.q")]
    ASL_Q,
    #[strum(to_string = "asr.b")]
    ASR_B,
    #[strum(to_string = "asr.w")]
    ASR_W,
    #[strum(to_string = "asr.l")]
    ASR_L,
    #[strum(to_string = "asr.q")]
    ASR_Q,
    #[strum(to_string = "muls.l")]
    MULS_L,
    #[strum(to_string = "muls.q")]
    MULS_Q,
    #[strum(to_string = "mulu.l")]
    MULU_L,
    #[strum(to_string = "mulu.q")]
    MULU_Q,
    #[strum(to_string = "divs.l")]
    DIVS_L,
    #[strum(to_string = "divs.q")]
    DIVS_Q,
    #[strum(to_string = "divu.l")]
    DIVU_L,
    #[strum(to_string = "divu.q")]
    DIVU_Q,
    #[strum(to_string = "fadd.s")]
    FADD_S,
    #[strum(to_string = "fadd.d")]
    FADD_D,
    #[strum(to_string = "fsub.s")]
    FSUB_S,
    #[strum(to_string = "fsub.d")]
    FSUB_D,
    #[strum(to_string = "fmul.s")]
    FMUL_S,
    #[strum(to_string = "fmul.d")]
    FMUL_D,
    #[strum(to_string = "fdiv.s")]
    FDIV_S,
    #[strum(to_string = "fdiv.d")]
    FDIV_D,
    #[strum(to_string = "fneg.s")]
    FNEG_S,
    #[strum(to_string = "fneg.d")]
    FNEG_D,
    #[strum(to_string = "fabs.s")]
    FABS_S,
    #[strum(to_string = "fabs.d")]
    FABS_D,
    #[strum(to_string = "fsqrt.s")]
    FSQRT_S,
    #[strum(to_string = "fsqrt.d")]
    FSQRT_D,
}

impl Opcode {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.parse::<Self>() {
            Ok(op) => Ok(op),
            Err(_) => Err(format!("Unknown mnemonic: `{s}`")),
        }
    }

    pub fn group(self) -> Group {
        Group::of(self.into())
    }

    pub fn mnemonic(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn mnemonic_lookup() {
        assert_eq!(Opcode::parse("add.l"), Ok(Opcode::ADD_L));
        assert_eq!(Opcode::parse("hcf"), Ok(Opcode::HCF));
        assert_eq!(Opcode::parse("fmovel.s"), Ok(Opcode::FMOVEL_S));
        assert!(Opcode::parse("ADD.L").is_err());
        assert!(Opcode::parse("add").is_err());
    }

    #[test]
    fn opcode_bytes_round_trip() {
        for op in Opcode::iter() {
            let byte: u8 = op.into();
            assert_eq!(Opcode::try_from(byte).ok(), Some(op));
            assert_eq!(Opcode::parse(op.mnemonic()), Ok(op));
        }
    }

    #[test]
    fn groups_follow_ranges() {
        assert_eq!(Opcode::BGE_Q.group(), Group::Control);
        assert_eq!(Opcode::BBC_Q.group(), Group::Control);
        assert_eq!(Opcode::MOVE_B.group(), Group::DataMove);
        assert_eq!(Opcode::FMOVED_S.group(), Group::DataMove);
        assert_eq!(Opcode::AND_B.group(), Group::Logical);
        assert_eq!(Opcode::ROR_Q.group(), Group::Logical);
        assert_eq!(Opcode::ADD_B.group(), Group::Arithmetic);
        assert_eq!(Opcode::FSQRT_D.group(), Group::Arithmetic);
        for op in Opcode::iter() {
            let byte: u8 = op.into();
            let range = match op.group() {
                Group::Control => Group::CONTROL,
                Group::DataMove => Group::DATA_MOVE,
                Group::Logical => Group::LOGICAL,
                Group::Arithmetic => Group::ARITHMETIC,
            };
            assert!(range.contains(&byte), "{op} out of its group range");
        }
    }
}
