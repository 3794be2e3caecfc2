// ----------------------------------------------------------------------------
// Effective address mode bytes

pub struct Mode;

impl Mode {
    // Register forms, low nibble is the register number
    pub const R_DIR: u8 = 0x00;
    pub const R_IND: u8 = 0x10;
    pub const R_IND_POST_INC: u8 = 0x20;
    pub const R_IND_POST_DEC: u8 = 0x30;
    pub const R_IND_PRE_INC: u8 = 0x40;
    pub const R_IND_PRE_DEC: u8 = 0x50;
    pub const R_IND_DSP: u8 = 0x60;
    pub const FP_DIR: u8 = 0x70;

    // Indexed forms, low two bits are the index size
    pub const R_IDX: u8 = 0x80;
    pub const R_IDX_DSP: u8 = 0x84;
    pub const PC_IDX: u8 = 0x88;
    pub const PC_IDX_DSP: u8 = 0x8C;
    pub const PC_IND_DSP: u8 = 0x90;

    // Immediates
    pub const INT_B: u8 = 0xA0;
    pub const INT_W: u8 = 0xA1;
    pub const INT_L: u8 = 0xA2;
    pub const INT_Q: u8 = 0xA3;
    pub const FLT_S: u8 = 0xA4;
    pub const FLT_D: u8 = 0xA5;

    pub const IMPORT: u8 = 0xB0;

    pub const SAME_AS_DEST: u8 = 0xFF;
}

// ----------------------------------------------------------------------------
// Decode table

/// Mode family, with the register or index size folded out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    RegDirect(u8),
    RegIndirect(u8),
    PostInc(u8),
    PostDec(u8),
    PreInc(u8),
    PreDec(u8),
    Displacement(u8),
    FloatDirect(u8),
    Indexed(u8),
    IndexedDisplacement(u8),
    PcIndexed(u8),
    PcIndexedDisplacement(u8),
    PcDisplacement,
    Immediate(usize),
    Import,
    SameAsDest,
}

impl Family {
    pub fn of(mode: u8) -> Option<Family> {
        let low = mode & 0x0F;
        let idx = mode & 0x03;
        match mode {
            0x00..=0x0F => Some(Family::RegDirect(low)),
            0x10..=0x1F => Some(Family::RegIndirect(low)),
            0x20..=0x2F => Some(Family::PostInc(low)),
            0x30..=0x3F => Some(Family::PostDec(low)),
            0x40..=0x4F => Some(Family::PreInc(low)),
            0x50..=0x5F => Some(Family::PreDec(low)),
            0x60..=0x6F => Some(Family::Displacement(low)),
            0x70..=0x7F => Some(Family::FloatDirect(low)),
            0x80..=0x83 => Some(Family::Indexed(idx)),
            0x84..=0x87 => Some(Family::IndexedDisplacement(idx)),
            0x88..=0x8B => Some(Family::PcIndexed(idx)),
            0x8C..=0x8F => Some(Family::PcIndexedDisplacement(idx)),
            Mode::PC_IND_DSP => Some(Family::PcDisplacement),
            Mode::INT_B => Some(Family::Immediate(1)),
            Mode::INT_W => Some(Family::Immediate(2)),
            Mode::INT_L | Mode::FLT_S => Some(Family::Immediate(4)),
            Mode::INT_Q | Mode::FLT_D => Some(Family::Immediate(8)),
            Mode::IMPORT => Some(Family::Import),
            Mode::SAME_AS_DEST => Some(Family::SameAsDest),
            _ => None,
        }
    }

    pub fn payload_len(self) -> usize {
        match self {
            Family::RegDirect(_)
            | Family::RegIndirect(_)
            | Family::PostInc(_)
            | Family::PostDec(_)
            | Family::PreInc(_)
            | Family::PreDec(_)
            | Family::FloatDirect(_)
            | Family::SameAsDest => 0,
            Family::Displacement(_) | Family::PcDisplacement | Family::Import => 4,
            Family::Indexed(_) | Family::PcIndexed(_) => 2,
            Family::IndexedDisplacement(_) | Family::PcIndexedDisplacement(_) => 6,
            Family::Immediate(n) => n,
        }
    }

    /// Destinations in these families may be referenced by the source
    /// through `SAME_AS_DEST`: they read memory and have no side effect.
    pub fn is_elidable(self) -> bool {
        matches!(
            self,
            Family::RegIndirect(_)
                | Family::Displacement(_)
                | Family::Indexed(_)
                | Family::IndexedDisplacement(_)
                | Family::PcIndexed(_)
                | Family::PcIndexedDisplacement(_)
                | Family::PcDisplacement
        )
    }
}

/// Payload length following a mode byte, `None` for unassigned modes.
pub fn payload_len(mode: u8) -> Option<usize> {
    Family::of(mode).map(Family::payload_len)
}
