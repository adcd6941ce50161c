use crate::errors::LoadProgramError;
use crate::hardware::keyboard::KeyboardInputProvider;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

pub const PROGRAM_SECTION_START: u16 = 0x3000;
pub const MEMORY_SIZE_U16: usize = 1 << 16;

/// Memory regions mapped to IO functionality.
#[repr(u16)]
#[derive(enumn::N, Debug, Copy, Clone, PartialEq, Eq)]
pub enum MemoryMappedIOLocations {
    /// Keyboard Status Register
    Kbsr = 0xFE00,
    /// Keyboard Data Register
    Kbdr = 0xFE02,
}

/// An abstraction for the LC-3 memory including the memory mapped keyboard registers
/// but excluding registers.
///
/// Every `u16` is a valid address, so no access can be out of range.
pub struct Memory {
    /// Index equals memory address
    data: Box<[u16]>,
    keyboard: Rc<RefCell<dyn KeyboardInputProvider>>,
}

impl Debug for Memory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let used = self.data.iter().filter(|w| **w != 0).count();
        write!(
            f,
            "Memory {{ non-zero words: {used}, KBSR: {:#06X}, KBDR: {:#06X} }}",
            self.data[usize::from(MemoryMappedIOLocations::Kbsr as u16)],
            self.data[usize::from(MemoryMappedIOLocations::Kbdr as u16)]
        )
    }
}

impl Memory {
    const KEYBOARD_STATUS_REGISTER_SET: u16 = 1 << 15;
    const KEYBOARD_STATUS_REGISTER_UNSET: u16 = 0;

    pub fn new(keyboard: Rc<RefCell<dyn KeyboardInputProvider>>) -> Self {
        Self {
            data: vec![0x0u16; MEMORY_SIZE_U16].into_boxed_slice(),
            keyboard,
        }
    }

    /// Reads the word at `address`.
    ///
    /// Reading the keyboard status register polls the keyboard unless a character is already
    /// waiting: bit 15 is set and the character is placed in the keyboard data register when one
    /// is available. Reading the keyboard data register hands out the character and clears the
    /// status register.
    pub fn read(&mut self, address: u16) -> u16 {
        match MemoryMappedIOLocations::n(address) {
            Some(MemoryMappedIOLocations::Kbsr) => self.poll_keyboard(),
            Some(MemoryMappedIOLocations::Kbdr) => {
                self.store(
                    MemoryMappedIOLocations::Kbsr as u16,
                    Self::KEYBOARD_STATUS_REGISTER_UNSET,
                );
            }
            None => {}
        }
        self.data[usize::from(address)]
    }

    /// Reads the word at `address` without triggering memory mapped IO.
    #[must_use]
    pub fn peek(&self, address: u16) -> u16 {
        self.data[usize::from(address)]
    }

    pub fn write(&mut self, address: u16, value: u16) {
        self.store(address, value);
    }

    fn store(&mut self, address: u16, value: u16) {
        self.data[usize::from(address)] = value;
    }

    fn poll_keyboard(&mut self) {
        let kbsr = MemoryMappedIOLocations::Kbsr as u16;
        if self.peek(kbsr) == Self::KEYBOARD_STATUS_REGISTER_SET {
            return;
        }
        let character = {
            let mut keyboard = self.keyboard.borrow_mut();
            match keyboard.check_input_available() {
                Ok(true) => keyboard.get_input_character(),
                Ok(false) => None,
                Err(e) => {
                    tracing::warn!("Polling keyboard failed, treating as no input: {e}");
                    None
                }
            }
        };
        if let Some(c) = character {
            self.store(kbsr, Self::KEYBOARD_STATUS_REGISTER_SET);
            self.store(MemoryMappedIOLocations::Kbdr as u16, u16::from(c));
        } else {
            self.store(kbsr, Self::KEYBOARD_STATUS_REGISTER_UNSET);
        }
    }

    /// Copies a program without its `.ORIG` header into memory starting at `origin`.
    ///
    /// # Errors
    /// - Program does not fit between `origin` and the end of the address space
    pub fn load_program(&mut self, origin: u16, data: &[u16]) -> Result<(), LoadProgramError> {
        let start = usize::from(origin);
        let maximum_instructions = MEMORY_SIZE_U16 - start;
        if data.len() > maximum_instructions {
            return Err(LoadProgramError::ProgramTooLong {
                origin,
                actual_instructions: data.len(),
                maximum_instructions,
            });
        }
        self.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// The memory contents between `from` and `to` (exclusive) without memory mapped IO.
    #[must_use]
    pub fn slice(&self, from: u16, to: u16) -> &[u16] {
        &self.data[usize::from(from)..usize::from(to)]
    }
}
