use crate::hardware::memory::PROGRAM_SECTION_START;
use crate::numbers;
use std::fmt::{Debug, Formatter};

/// One 16 bit register, interpreted as unsigned or two's complement depending on the operation.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub struct Register(u16);

impl Register {
    #[must_use]
    pub const fn from_binary(value: u16) -> Self {
        Self(value)
    }
    #[must_use]
    pub const fn from_decimal(value: i16) -> Self {
        Self(value.cast_unsigned())
    }
    #[must_use]
    pub const fn as_binary(self) -> u16 {
        self.0
    }
    #[must_use]
    pub const fn as_decimal(self) -> i16 {
        numbers::twos_complement_to_decimal(self.0)
    }
}

impl Debug for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06X} ({})", self.0, self.as_decimal())
    }
}

#[must_use]
pub const fn from_binary(value: u16) -> Register {
    Register::from_binary(value)
}
#[cfg(test)]
#[must_use]
pub const fn from_decimal(value: i16) -> Register {
    Register::from_decimal(value)
}

/// The LC-3 register file: `R0` to `R7`, the program counter and the condition flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    general_purpose: [Register; 8],
    pc: Register,
    cond: ConditionFlag,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            general_purpose: [Register(0); 8],
            pc: Register(PROGRAM_SECTION_START),
            cond: ConditionFlag::Zero,
        }
    }

    /// # Panics
    /// - register index greater than 7, decoded indexes are 3 bits wide
    #[must_use]
    pub fn get(&self, r: u8) -> Register {
        assert!(r <= 7, "Invalid general purpose register get");
        self.general_purpose[usize::from(r)]
    }
    /// # Panics
    /// - register index greater than 7, decoded indexes are 3 bits wide
    pub fn set(&mut self, r: u8, value: Register) {
        assert!(r <= 7, "Invalid general purpose register set");
        self.general_purpose[usize::from(r)] = value;
    }
    #[must_use]
    pub const fn pc(&self) -> Register {
        self.pc
    }
    pub const fn set_pc(&mut self, value: u16) {
        self.pc = Register(value);
    }
    /// Advances the program counter by one, wrapping at the end of the address space.
    pub const fn inc_pc(&mut self) {
        self.pc = Register(self.pc.0.wrapping_add(1));
    }

    #[must_use]
    pub const fn get_conditional_register(&self) -> ConditionFlag {
        self.cond
    }
    pub fn update_conditional_register(&mut self, r: u8) {
        let val = self.get(r).as_binary();
        self.cond = ConditionFlag::from(val);
    }
}

/// Result classification of the last value written to a general purpose register.
/// Exactly one flag is set at any time.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionFlag {
    Pos = 1 << 0, // Positive
    Zero = 1 << 1,
    Neg = 1 << 2, // Negative
}

impl ConditionFlag {
    /// Bit of this flag in the `nzp` field of a BR instruction.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self as u16
    }
}

impl From<u16> for ConditionFlag {
    fn from(value: u16) -> Self {
        if value == 0 {
            Self::Zero
        } else if value >> 15 == 1 {
            // leftmost bit is 1 for negative numbers
            Self::Neg
        } else {
            Self::Pos
        }
    }
}
