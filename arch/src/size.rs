use strum::{Display, EnumString};

/// Operation size carried by the mnemonic suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
pub enum Size {
    #[strum(to_string = "b")]
    Byte,
    #[strum(to_string = "w")]
    Word,
    #[strum(to_string = "l")]
    Long,
    #[strum(to_string = "q")]
    Quad,
    #[strum(to_string = "s")]
    Single,
    #[strum(to_string = "d")]
    Double,
}

impl Size {
    pub fn bytes(self) -> usize {
        match self {
            Size::Byte => 1,
            Size::Word => 2,
            Size::Long | Size::Single => 4,
            Size::Quad | Size::Double => 8,
        }
    }

    pub fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }

    pub fn is_float(self) -> bool {
        matches!(self, Size::Single | Size::Double)
    }

    /// Two-bit field used by the indexed addressing modes.
    pub fn index_field(self) -> Option<u8> {
        match self {
            Size::Byte => Some(0),
            Size::Word => Some(1),
            Size::Long => Some(2),
            Size::Quad => Some(3),
            _ => None,
        }
    }

    /// Truncate to this width, then sign extend back to 64 bits.
    pub fn sign_extend(self, value: i64) -> i64 {
        match self {
            Size::Byte => value as i8 as i64,
            Size::Word => value as i16 as i64,
            Size::Long | Size::Single => value as i32 as i64,
            Size::Quad | Size::Double => value,
        }
    }
}
