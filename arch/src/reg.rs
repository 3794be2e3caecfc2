use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::{Display, EnumString};

/// General purpose registers. `d0..d7` and `a0..a7` alias the lower and
/// upper halves, `sp` is `r15`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive, EnumString, Display,
)]
#[repr(u8)]
pub enum Gpr {
    #[strum(to_string = "r0", serialize = "d0")]
    R0,
    #[strum(to_string = "r1", serialize = "d1")]
    R1,
    #[strum(to_string = "r2", serialize = "d2")]
    R2,
    #[strum(to_string = "r3", serialize = "d3")]
    R3,
    #[strum(to_string = "r4", serialize = "d4")]
    R4,
    #[strum(to_string = "r5", serialize = "d5")]
    R5,
    #[strum(to_string = "r6", serialize = "d6")]
    R6,
    #[strum(to_string = "r7", serialize = "d7")]
    R7,
    #[strum(to_string = "r8", serialize = "a0")]
    R8,
    #[strum(to_string = "r9", serialize = "a1")]
    R9,
    #[strum(to_string = "r10", serialize = "a2")]
    R10,
    #[strum(to_string = "r11", serialize = "a3")]
    R11,
    #[strum(to_string = "r12", serialize = "a4")]
    R12,
    #[strum(to_string = "r13", serialize = "a5")]
    R13,
    #[strum(to_string = "r14", serialize = "a6")]
    R14,
    #[strum(to_string = "r15", serialize = "a7", serialize = "sp")]
    R15,
}

impl Gpr {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().parse::<Self>() {
            Ok(r) => Ok(r),
            Err(_) => Err(format!("Unknown reg name: {s}")),
        }
    }

    pub fn index(self) -> u8 {
        self.into()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive, EnumString, Display,
)]
#[repr(u8)]
pub enum Fpr {
    #[strum(to_string = "fp0")]
    FP0,
    #[strum(to_string = "fp1")]
    FP1,
    #[strum(to_string = "fp2")]
    FP2,
    #[strum(to_string = "fp3")]
    FP3,
    #[strum(to_string = "fp4")]
    FP4,
    #[strum(to_string = "fp5")]
    FP5,
    #[strum(to_string = "fp6")]
    FP6,
    #[strum(to_string = "fp7")]
    FP7,
    #[strum(to_string = "fp8")]
    FP8,
    #[strum(to_string = "fp9")]
    FP9,
    #[strum(to_string = "fp10")]
    FP10,
    #[strum(to_string = "fp11")]
    FP11,
    #[strum(to_string = "fp12")]
    FP12,
    #[strum(to_string = "fp13")]
    FP13,
    #[strum(to_string = "fp14")]
    FP14,
    #[strum(to_string = "fp15")]
    FP15,
}

impl Fpr {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().parse::<Self>() {
            Ok(r) => Ok(r),
            Err(_) => Err(format!("Unknown float reg name: {s}")),
        }
    }

    pub fn index(self) -> u8 {
        self.into()
    }
}
