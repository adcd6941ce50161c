use displaydoc::Display;
use std::error::Error;

/// Reasons a program image cannot be loaded into memory.
#[derive(Display, Debug, PartialEq, Eq)]
pub enum LoadProgramError {
    /// Program is missing valid .ORIG header
    ProgramMissingOrigHeader,
    /// Program has an odd number of bytes ({0}), expected whole u16 words
    ProgramOddByteCount(usize),
    /// Program too long, got {actual_instructions} u16 instructions at origin {origin:#06X} while limit is {maximum_instructions}
    ProgramTooLong {
        origin: u16,
        actual_instructions: usize,
        maximum_instructions: usize,
    },
    /// Program file {path} could not be read: {message}
    ProgramNotReadable { path: String, message: String },
}
impl Error for LoadProgramError {}

/// Reasons execution stopped other than a regular `HALT`.
#[derive(Display, Debug, PartialEq, Eq)]
pub enum ExecutionError {
    /// Reserved opcode {opcode:#06b} executed at address {address:#06X}
    ReservedOpcode { opcode: u8, address: u16 },
    /// Execution interrupted
    Interrupted,
    /// Error during reading Stdin or writing program output to Stdout: {0}
    IOInputOutputError(String),
    /// Step limit of {0} instructions reached
    StepLimitReached(u64),
}
impl Error for ExecutionError {}
