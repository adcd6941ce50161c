//! # LC-3 Virtual Machine.
//!
//! `lc3-vm` runs programs for the LC-3 instruction set architecture.
//! Usage starts with loading a program image via `emulator::from_program`, which is then
//! run with `Emulator::execute`.
//!
//!  # Example
//! ```
//! use lc3_vm::emulator::{Emulator, EmulatorConfig, ScriptedInputProvider};
//! // .ORIG x3000; LEA R0, #2; PUTS; HALT; "HI"
//! let image = [
//!     0x30, 0x00, 0xE0, 0x02, 0xF0, 0x22, 0xF0, 0x25, 0x00, 0x48, 0x00, 0x49, 0x00, 0x00,
//! ];
//! let mut emu = Emulator::with_keyboard_input_provider(ScriptedInputProvider::new(b""));
//! emu.load_program_bytes(&image).unwrap();
//! emu.set_config(EmulatorConfig::default().with_halt_notice(false));
//! let mut output = Vec::new();
//! emu.execute_with(&mut output).unwrap();
//! assert_eq!(output, b"HI");
//! ```
//! # Errors
//! - Program image is missing its `.ORIG` header, has a trailing half word or is too long
//! - Program executes a reserved opcode
//! - Execution is interrupted by CTRL-C

pub mod emulator;
pub mod errors;
pub(crate) mod hardware;
pub(crate) mod numbers;
pub(crate) mod terminal;
