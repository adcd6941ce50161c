//! The public facing part of the emulator: loading program images and running them.
pub mod instruction;
mod opcodes;
#[cfg(test)]
mod test_helpers;
mod trap_routines;

use crate::emulator::instruction::{Instruction, Opcode};
use crate::errors::{ExecutionError, LoadProgramError};
use crate::terminal;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::io;
use std::io::{IsTerminal, Write};
use std::ops::ControlFlow;
use std::path::Path;
use std::rc::Rc;

pub use crate::hardware::keyboard::{
    KeyboardInputProvider, ReaderInputProvider, ScriptedInputProvider, TerminalInputProvider,
};
pub use crate::hardware::memory::{Memory, MemoryMappedIOLocations, PROGRAM_SECTION_START};
pub use crate::hardware::registers::{ConditionFlag, Register, Registers};
pub use trap_routines::{HALT_NOTICE, TrapVector};

/// Number of instructions between two checks of the keyboard for CTRL-C
/// while the program does not read input on its own.
const INTERRUPT_POLL_INTERVAL: u64 = 1 << 12;

/// Tunables of a run, independent of the loaded program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorConfig {
    print_halt_notice: bool,
    in_prompt: &'static str,
    max_steps: Option<u64>,
}
impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            print_halt_notice: true,
            in_prompt: "Enter a character: ",
            max_steps: None,
        }
    }
}
impl EmulatorConfig {
    /// Whether HALT writes [`HALT_NOTICE`] to the console.
    #[must_use]
    pub const fn with_halt_notice(mut self, print_halt_notice: bool) -> Self {
        self.print_halt_notice = print_halt_notice;
        self
    }
    /// Prompt written by the IN trap before it waits for a character.
    #[must_use]
    pub const fn with_in_prompt(mut self, in_prompt: &'static str) -> Self {
        self.in_prompt = in_prompt;
        self
    }
    /// Stop with [`ExecutionError::StepLimitReached`] after that many instructions.
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// State of the execution loop after one instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunState {
    Running,
    Halted,
}

/// The public facing emulator used to run LC-3 programs.
pub struct Emulator {
    pub(crate) registers: Registers,
    pub(crate) memory: Memory,
    keyboard: Rc<RefCell<dyn KeyboardInputProvider>>,
    config: EmulatorConfig,
    steps: u64,
    keyboard_poll_failed: bool,
}

impl Debug for Emulator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emulator")
            .field("registers", &self.registers)
            .field("memory", &self.memory)
            .field("config", &self.config)
            .field("steps", &self.steps)
            .field("keyboard_poll_failed", &self.keyboard_poll_failed)
            .finish_non_exhaustive()
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads the program image at `path` into a new emulator reading the terminal keyboard.
///
/// # Errors
/// See [`Emulator::load_program_bytes`], additionally the file may not be readable.
pub fn from_program(path: impl AsRef<Path>) -> Result<Emulator, LoadProgramError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| LoadProgramError::ProgramNotReadable {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    from_program_bytes(&bytes)
}

/// Loads a program image given as bytes into a new emulator reading the terminal keyboard.
///
/// # Errors
/// See [`Emulator::load_program_bytes`].
pub fn from_program_bytes(bytes: &[u8]) -> Result<Emulator, LoadProgramError> {
    let mut emu = Emulator::new();
    emu.load_program_bytes(bytes)?;
    Ok(emu)
}

impl Emulator {
    /// Emulator with empty memory, reading keyboard input from the terminal,
    /// or byte by byte from stdin when it is redirected.
    #[must_use]
    pub fn new() -> Self {
        if io::stdin().is_terminal() {
            Self::with_keyboard_input_provider(TerminalInputProvider::new())
        } else {
            tracing::debug!("Stdin is not a terminal, reading input from it directly");
            Self::with_keyboard_input_provider(ReaderInputProvider::new(io::stdin()))
        }
    }

    #[must_use]
    pub fn with_keyboard_input_provider(provider: impl KeyboardInputProvider + 'static) -> Self {
        let keyboard: Rc<RefCell<dyn KeyboardInputProvider>> = Rc::new(RefCell::new(provider));
        Self {
            registers: Registers::new(),
            memory: Memory::new(Rc::clone(&keyboard)),
            keyboard,
            config: EmulatorConfig::default(),
            steps: 0,
            keyboard_poll_failed: false,
        }
    }

    pub fn set_config(&mut self, config: EmulatorConfig) {
        self.config = config;
    }

    /// Loads a program image: big-endian `u16` words, the first one being the `.ORIG` address
    /// the remaining words are copied to.
    /// Execution starts at `0x3000` regardless of the origin.
    ///
    /// # Errors
    /// - Program is missing valid .ORIG header (because it is shorter than one `u16` instruction)
    /// - Program has a trailing half word
    /// - Program does not fit between its origin and the end of memory
    pub fn load_program_bytes(&mut self, bytes: &[u8]) -> Result<(), LoadProgramError> {
        if bytes.len() % 2 != 0 {
            return Err(LoadProgramError::ProgramOddByteCount(bytes.len()));
        }
        let words: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        self.load_program(&words)
    }

    /// Loads a program given as words, the first one being the `.ORIG` address.
    ///
    /// # Errors
    /// See [`Emulator::load_program_bytes`].
    pub fn load_program(&mut self, program: &[u16]) -> Result<(), LoadProgramError> {
        let Some((&origin, rest)) = program.split_first() else {
            return Err(LoadProgramError::ProgramMissingOrigHeader);
        };
        self.memory.load_program(origin, rest)?;
        self.reset_registers();
        tracing::debug!(
            "Loaded program with {} words at origin {origin:#06X}",
            rest.len()
        );
        Ok(())
    }

    #[must_use]
    pub const fn registers(&self) -> &Registers {
        &self.registers
    }

    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Number of instructions executed since the last reset.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Resets registers and the step counter so the loaded program can run again.
    pub fn reset_registers(&mut self) {
        self.registers = Registers::new();
        self.steps = 0;
        tracing::debug!("Registers reset");
    }

    /// Runs the loaded program on the console until it halts.
    /// An interactive terminal is in raw mode while running and restored on every way out.
    /// Redirected output receives the program's bytes unchanged.
    ///
    /// # Errors
    /// See [`Emulator::execute_with`].
    pub fn execute(&mut self) -> Result<(), ExecutionError> {
        let lock = terminal::set_terminal_raw();
        if lock.is_enabled() && io::stdout().is_terminal() {
            self.execute_with(&mut terminal::RawModeWriter::new(io::stdout()))
        } else {
            self.execute_with(&mut io::stdout())
        }
    }

    /// Runs the loaded program until it halts, writing console output to `stdout`.
    ///
    /// # Errors
    /// - RTI or the reserved opcode was executed
    /// - Execution interrupted by CTRL-C
    /// - Reading input or writing output failed
    /// - The configured step limit was reached
    pub fn execute_with(&mut self, stdout: &mut impl Write) -> Result<(), ExecutionError> {
        while self.step(stdout)? == RunState::Running {}
        tracing::info!("Program halted after {} instructions", self.steps);
        Ok(())
    }

    /// Fetches, decodes and executes one instruction.
    ///
    /// # Errors
    /// See [`Emulator::execute_with`].
    pub fn step(&mut self, stdout: &mut impl Write) -> Result<RunState, ExecutionError> {
        if let Some(max_steps) = self.config.max_steps
            && self.steps >= max_steps
        {
            tracing::info!("Step limit of {max_steps} instructions reached");
            return Err(ExecutionError::StepLimitReached(max_steps));
        }
        if self.steps % INTERRUPT_POLL_INTERVAL == INTERRUPT_POLL_INTERVAL - 1 {
            self.poll_keyboard_for_interrupt();
        }
        if self.keyboard.borrow().is_interrupted() {
            tracing::info!("Execution interrupted");
            return Err(ExecutionError::Interrupted);
        }
        let address = self.registers.pc().as_binary();
        let i = Instruction::from(self.memory.read(address));
        self.registers.inc_pc();
        self.steps += 1;
        tracing::trace!(pc = %format!("{address:#06X}"), instruction = ?i, "execute");
        match self.dispatch(i, address, stdout) {
            ControlFlow::Continue(()) => Ok(RunState::Running),
            ControlFlow::Break(Ok(())) => Ok(RunState::Halted),
            ControlFlow::Break(Err(e)) => Err(e),
        }
    }

    fn poll_keyboard_for_interrupt(&mut self) {
        if self.keyboard_poll_failed {
            return;
        }
        // an available character stays latched for the program
        if let Err(e) = self.keyboard.borrow_mut().check_input_available() {
            tracing::warn!("Polling keyboard failed, not checking for CTRL-C anymore: {e}");
            self.keyboard_poll_failed = true;
        }
    }

    fn dispatch(
        &mut self,
        i: Instruction,
        address: u16,
        stdout: &mut impl Write,
    ) -> ControlFlow<Result<(), ExecutionError>> {
        match i.opcode() {
            Opcode::Br => opcodes::br(i, &mut self.registers),
            Opcode::Add => opcodes::add(i, &mut self.registers),
            Opcode::Ld => opcodes::ld(i, &mut self.registers, &mut self.memory),
            Opcode::St => opcodes::st(i, &self.registers, &mut self.memory),
            Opcode::Jsr => opcodes::jsr(i, &mut self.registers),
            Opcode::And => opcodes::and(i, &mut self.registers),
            Opcode::Ldr => opcodes::ldr(i, &mut self.registers, &mut self.memory),
            Opcode::Str => opcodes::str(i, &self.registers, &mut self.memory),
            Opcode::Not => opcodes::not(i, &mut self.registers),
            Opcode::Ldi => opcodes::ldi(i, &mut self.registers, &mut self.memory),
            Opcode::Sti => opcodes::sti(i, &self.registers, &mut self.memory),
            Opcode::Jmp => opcodes::jmp_or_ret(i, &mut self.registers),
            Opcode::Lea => opcodes::lea(i, &mut self.registers),
            Opcode::Rti | Opcode::Res => {
                tracing::error!(
                    "Reserved opcode {:?} at {address:#06X}, stopping execution",
                    i.opcode()
                );
                return ControlFlow::Break(Err(ExecutionError::ReservedOpcode {
                    opcode: i.op_code(),
                    address,
                }));
            }
            Opcode::Trap => return self.trap(i, stdout),
        }
        ControlFlow::Continue(())
    }

    fn trap(
        &mut self,
        i: Instruction,
        stdout: &mut impl Write,
    ) -> ControlFlow<Result<(), ExecutionError>> {
        let Some(vector) = TrapVector::n(i.trap_vector()) else {
            tracing::warn!("Ignoring unknown trap vector {:#04X}", i.trap_vector());
            return ControlFlow::Continue(());
        };
        match vector {
            TrapVector::GetC => {
                trap_routines::get_c(&mut self.registers, &mut *self.keyboard.borrow_mut())
            }
            TrapVector::Out => trap_routines::out(&self.registers, stdout),
            TrapVector::PutS => trap_routines::put_s(&self.registers, &mut self.memory, stdout),
            TrapVector::In => trap_routines::in_trap(
                &mut self.registers,
                &mut *self.keyboard.borrow_mut(),
                stdout,
                self.config.in_prompt,
            ),
            TrapVector::PutSP => trap_routines::put_sp(&self.registers, &mut self.memory, stdout),
            TrapVector::Halt => trap_routines::halt(stdout, self.config.print_halt_notice),
        }
    }
}
