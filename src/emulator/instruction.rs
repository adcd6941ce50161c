use crate::numbers;
use std::fmt::{Debug, Formatter};

/// The sixteen LC-3 operations, selected by the top 4 bits of an instruction.
#[repr(u8)]
#[derive(enumn::N, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Opcode {
    Br = 0b0000,
    Add = 0b0001,
    Ld = 0b0010,
    St = 0b0011,
    Jsr = 0b0100,
    And = 0b0101,
    Ldr = 0b0110,
    Str = 0b0111,
    Rti = 0b1000,
    Not = 0b1001,
    Ldi = 0b1010,
    Sti = 0b1011,
    Jmp = 0b1100,
    Res = 0b1101,
    Lea = 0b1110,
    Trap = 0b1111,
}

/// Wrapper for LC-3 u16 instruction.
/// format is: `OOOO_DDD_P_PPPP_PPPP`
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Instruction(u16);

impl Instruction {
    /// Gives the value of only the specified bit range.
    ///
    /// # Parameters
    /// - `from`: starting index
    /// - `to`: end index (inclusive), mut be greater or equal to `from`
    ///
    /// # Panics
    /// - asserts that to is greater or equal from and both are valid indexes
    #[must_use]
    pub fn get_bit_range(self, from: u8, to: u8) -> u16 {
        debug_assert!(
            to >= from,
            "wrong direction of from: {from:?} and to: {to:?}"
        );
        debug_assert!(
            (0..u16::BITS).contains(&u32::from(to)),
            "index: {to:?} to u16 is greater than maximum value {:?}",
            u16::BITS - 1
        );
        let width = to - from + 1;
        if width >= 16 {
            return self.0;
        }
        (self.0 >> from) & ((0b1 << width) - 1)
    }
    /// Gives the value of a bit range of at most 8 bits as u8.
    /// See [`Instruction::get_bit_range()`]
    #[must_use]
    pub fn get_bit_range_u8(self, from: u8, to: u8) -> u8 {
        debug_assert!(to - from < 8, "bit range {from}..={to} does not fit into u8");
        self.get_bit_range(from, to).to_le_bytes()[0]
    }
    #[must_use]
    pub fn get_bit(self, index: u8) -> bool {
        self.get_bit_range(index, index) & 1 != 0
    }
    #[must_use]
    pub fn op_code(self) -> u8 {
        self.get_bit_range_u8(12, 15)
    }
    #[must_use]
    pub fn opcode(self) -> Opcode {
        // all 16 values of a 4 bit field are defined
        Opcode::n(self.op_code()).unwrap_or(Opcode::Res)
    }
    /// Destination register for loads and arithmetic, source register for stores.
    #[must_use]
    pub fn dr_number(self) -> u8 {
        self.get_bit_range_u8(9, 11)
    }
    #[must_use]
    pub fn sr1_number(self) -> u8 {
        self.get_bit_range_u8(6, 8)
    }
    #[must_use]
    pub fn base_r_number(self) -> u8 {
        self.sr1_number()
    }
    #[must_use]
    pub fn sr2_number(self) -> u8 {
        self.get_bit_range_u8(0, 2)
    }
    #[must_use]
    pub fn is_immediate(self) -> bool {
        self.get_bit(5)
    }
    /// Sign extended `imm5` field.
    #[must_use]
    pub fn get_immediate(self) -> u16 {
        numbers::sign_extend(self.get_bit_range(0, 4), 5)
    }
    /// Offset in the lowest `len` bits, sign extended to 16 bits.
    /// Added with wrapping arithmetic it acts as a signed offset.
    #[must_use]
    pub fn pc_offset(self, len: u8) -> u16 {
        numbers::sign_extend(self.get_bit_range(0, len - 1), len)
    }
    #[must_use]
    pub fn trap_vector(self) -> u8 {
        self.get_bit_range_u8(0, 7)
    }
}

impl Debug for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Op: {:?}, DR: {:03b}, PC_Off: {}",
            self.opcode(),
            self.dr_number(),
            numbers::twos_complement_to_decimal(self.pc_offset(9))
        )
    }
}

impl From<u16> for Instruction {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}

#[expect(clippy::unusual_byte_groupings)]
#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    #[gtest]
    pub fn test_instr_get_bit_range_valid() {
        let sut = Instruction::from(0b1010_101_001010101);
        expect_that!(sut.op_code(), eq(0b1010));
        expect_that!(sut.opcode(), eq(Opcode::Ldi));
        expect_that!(sut.dr_number(), eq(0b101));
        expect_that!(sut.pc_offset(9), eq(0b0_0101_0101));

        // Add: DR: 3, SR1: 2, Immediate: false, SR2: 1
        let sut = Instruction::from(0b0001_011_010_0_00_001);
        expect_that!(sut.opcode(), eq(Opcode::Add));
        expect_that!(sut.dr_number(), eq(3));
        expect_that!(sut.sr1_number(), eq(2));
        expect_that!(sut.sr2_number(), eq(1));
        expect_that!(sut.is_immediate(), eq(false));

        // Add: DR: 7, SR1: 0, Immediate: true, imm5: 14
        let sut = Instruction::from(0b0001_111_000_1_01110);
        expect_that!(sut.dr_number(), eq(7));
        expect_that!(sut.sr1_number(), eq(0));
        expect_that!(sut.is_immediate(), eq(true));
        expect_that!(sut.get_immediate(), eq(14));
    }
    #[gtest]
    pub fn test_instr_negative_offsets() {
        // imm5: -1
        expect_that!(Instruction::from(0b0001_000_001_1_11111).get_immediate(), eq(0xFFFF));
        // offset9: -0x44
        expect_that!(Instruction::from(0b0010_100_1_1011_1100).pc_offset(9), eq(0xFFBC));
        // offset11: -1
        expect_that!(Instruction::from(0b0100_1_111_1111_1111).pc_offset(11), eq(0xFFFF));
    }
    #[gtest]
    pub fn test_instr_trap_vector() {
        let sut = Instruction::from(0xF025);
        expect_that!(sut.opcode(), eq(Opcode::Trap));
        expect_that!(sut.trap_vector(), eq(0x25));
    }
    #[gtest]
    pub fn test_every_opcode_decodes() {
        for op in 0..16u16 {
            let sut = Instruction::from(op << 12);
            expect_that!(sut.opcode() as u16, eq(op));
        }
    }
    #[gtest]
    pub fn test_instr_full_range() {
        expect_that!(Instruction::from(0xBEEF).get_bit_range(0, 15), eq(0xBEEF));
    }
    #[gtest]
    #[should_panic(expected = "wrong direction of from: 2 and to: 1")]
    pub fn test_instr_get_bit_range_wrong_order() {
        let sut = Instruction::from(0b1010_101_101010101);
        let _ = sut.get_bit_range(2, 1);
    }
    #[gtest]
    #[should_panic(expected = "index: 16 to u16 is greater than maximum value 15")]
    pub fn test_instr_get_bit_range_index_too_large() {
        let sut = Instruction::from(0b1010_101_101010101);
        let _ = sut.get_bit_range(2, 16);
    }
}
