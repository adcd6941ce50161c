//! The emulated machine state: register file, memory and the keyboard device.
pub mod keyboard;
pub mod memory;
pub mod registers;
