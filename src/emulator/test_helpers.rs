use crate::emulator::{Emulator, EmulatorConfig};
use crate::hardware::keyboard::{KeyboardInputProvider, ScriptedInputProvider};
use crate::hardware::memory::{Memory, PROGRAM_SECTION_START};
use crate::hardware::registers::Registers;
use std::cell::Cell;
use std::io;
use std::io::Write;
use std::rc::Rc;

pub struct StringWriter {
    vec: Vec<u8>,
}
impl Write for StringWriter {
    fn write(&mut self, data: &[u8]) -> Result<usize, io::Error> {
        self.vec.write(data)
    }
    fn flush(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}
impl StringWriter {
    pub fn new() -> Self {
        let vec = Vec::<u8>::with_capacity(120);
        Self { vec }
    }
    pub fn get_string(&self) -> String {
        String::from_utf8(self.vec.clone()).unwrap()
    }
}

/// Writer whose every write fails like a closed pipe.
pub struct FailingWriter;
impl Write for FailingWriter {
    fn write(&mut self, _data: &[u8]) -> Result<usize, io::Error> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
    }
    fn flush(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}

/// Keyboard without a device behind it: every check fails, counted in `checks`.
pub struct FailingInputProvider {
    pub checks: Rc<Cell<usize>>,
}
impl KeyboardInputProvider for FailingInputProvider {
    fn check_input_available(&mut self) -> io::Result<bool> {
        self.checks.set(self.checks.get() + 1);
        Err(io::Error::other("no input device"))
    }
    fn get_input_character(&mut self) -> Option<u8> {
        None
    }
    fn read_input_character(&mut self) -> io::Result<Option<u8>> {
        Err(io::Error::other("no input device"))
    }
    fn is_interrupted(&self) -> bool {
        false
    }
}

/// Converts words into a big-endian image with `origin` as `.ORIG` header.
pub fn image_bytes(origin: u16, words: &[u16]) -> Vec<u8> {
    std::iter::once(origin)
        .chain(words.iter().copied())
        .flat_map(u16::to_be_bytes)
        .collect()
}

/// An emulator with the program loaded at `0x3000`, scripted keyboard input
/// and output captured in a [`StringWriter`].
pub struct FakeEmulator {
    pub inner: Emulator,
    stdout: StringWriter,
}
impl FakeEmulator {
    pub fn new(program_no_header: &[u16]) -> Self {
        Self::with_input(program_no_header, b"")
    }
    pub fn with_input(program_no_header: &[u16], stdin_data: &[u8]) -> Self {
        let mut emu = Emulator::with_keyboard_input_provider(ScriptedInputProvider::new(stdin_data));
        emu.load_program_bytes(&image_bytes(PROGRAM_SECTION_START, program_no_header))
            .unwrap();
        emu.set_config(EmulatorConfig::default().with_halt_notice(false));
        Self {
            inner: emu,
            stdout: StringWriter::new(),
        }
    }
    pub fn get_parts(&mut self) -> (&mut Registers, &mut Memory, &mut StringWriter) {
        (
            &mut self.inner.registers,
            &mut self.inner.memory,
            &mut self.stdout,
        )
    }
    pub fn execute(&mut self) -> Result<(), crate::errors::ExecutionError> {
        self.inner.execute_with(&mut self.stdout)
    }
    pub fn output(&self) -> String {
        self.stdout.get_string()
    }
}
