use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, poll, read};
use std::collections::VecDeque;
use std::io;
use std::io::Read;
use std::time::Duration;

/// Providing Keyboard Input independent of an implementation.
pub trait KeyboardInputProvider {
    /// Checks if input is available, does not block.
    /// An available character is latched until fetched with `get_input_character`.
    ///
    /// # Errors
    /// - the underlying input device could not be polled
    fn check_input_available(&mut self) -> io::Result<bool>;
    /// Takes the character latched by `check_input_available`, `None` if there is none.
    fn get_input_character(&mut self) -> Option<u8>;
    /// Blocks until a character is typed.
    /// Returns `Ok(None)` once shutdown was requested instead of delivering a character.
    ///
    /// # Errors
    /// - the underlying input device could not be read
    fn read_input_character(&mut self) -> io::Result<Option<u8>>;
    /// True if CTRL-C was triggered
    fn is_interrupted(&self) -> bool;
}

/// Reads key presses from the terminal via crossterm events.
/// Expects the terminal to be in raw mode, where CTRL-C arrives as a key press.
#[derive(Debug, Default)]
pub struct TerminalInputProvider {
    available_char: Option<u8>,
    is_interrupted: bool,
}
impl TerminalInputProvider {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            available_char: None,
            is_interrupted: false,
        }
    }
    /// Translates a key press into the byte a program sees, marks CTRL-C as interruption.
    fn handle_event(&mut self, event: &Event) -> Option<u8> {
        let key = event.as_key_press_event()?;
        if is_ctrl_c(&key) {
            tracing::info!("CTRL-C pressed, requesting shutdown");
            self.is_interrupted = true;
            return None;
        }
        key_to_byte(&key)
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn key_to_byte(key: &KeyEvent) -> Option<u8> {
    match key.code {
        KeyCode::Char(c) if c.is_ascii() => u8::try_from(c).ok(),
        KeyCode::Enter => Some(b'\n'),
        KeyCode::Tab => Some(b'\t'),
        KeyCode::Backspace => Some(0x08),
        KeyCode::Esc => Some(0x1B),
        _ => None,
    }
}

impl KeyboardInputProvider for TerminalInputProvider {
    fn check_input_available(&mut self) -> io::Result<bool> {
        if self.available_char.is_some() {
            return Ok(true);
        }
        while poll(Duration::from_secs(0))? {
            if let Some(b) = self.handle_event(&read()?) {
                self.available_char = Some(b);
                return Ok(true);
            }
            if self.is_interrupted {
                break;
            }
        }
        Ok(false)
    }
    fn get_input_character(&mut self) -> Option<u8> {
        self.available_char.take()
    }
    fn read_input_character(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.available_char.take() {
            return Ok(Some(b));
        }
        while !self.is_interrupted {
            if let Some(b) = self.handle_event(&read()?) {
                return Ok(Some(b));
            }
        }
        Ok(None)
    }
    fn is_interrupted(&self) -> bool {
        self.is_interrupted
    }
}

/// Reads input byte by byte from a stream, used when stdin is redirected from a file or pipe.
/// End of input counts as a shutdown request once the program blocks for another character.
/// Checking for input reads ahead one byte and may block on a slow pipe.
#[derive(Debug)]
pub struct ReaderInputProvider<R: Read> {
    reader: R,
    available_char: Option<u8>,
    at_eof: bool,
    is_interrupted: bool,
}
impl<R: Read> ReaderInputProvider<R> {
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            available_char: None,
            at_eof: false,
            is_interrupted: false,
        }
    }
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.at_eof {
            return Ok(None);
        }
        let mut buf = [0; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => {
                    tracing::debug!("End of input reached");
                    self.at_eof = true;
                    return Ok(None);
                }
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}
impl<R: Read> KeyboardInputProvider for ReaderInputProvider<R> {
    fn check_input_available(&mut self) -> io::Result<bool> {
        if self.available_char.is_none() {
            self.available_char = self.read_byte()?;
        }
        Ok(self.available_char.is_some())
    }
    fn get_input_character(&mut self) -> Option<u8> {
        self.available_char.take()
    }
    fn read_input_character(&mut self) -> io::Result<Option<u8>> {
        let next = match self.available_char.take() {
            Some(b) => Some(b),
            None => self.read_byte()?,
        };
        if next.is_none() {
            self.is_interrupted = true;
        }
        Ok(next)
    }
    fn is_interrupted(&self) -> bool {
        self.is_interrupted
    }
}

/// Serves input from a fixed byte buffer, for tests and embedding without a terminal.
/// A blocking read on an exhausted buffer counts as a shutdown request.
#[derive(Debug, Default)]
pub struct ScriptedInputProvider {
    input: VecDeque<u8>,
    available_char: Option<u8>,
    is_interrupted: bool,
}
impl ScriptedInputProvider {
    #[must_use]
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.iter().copied().collect(),
            available_char: None,
            is_interrupted: false,
        }
    }
    /// Appends input, as if typed after the already queued characters.
    pub fn push_input(&mut self, input: &[u8]) {
        self.input.extend(input);
    }
}
impl KeyboardInputProvider for ScriptedInputProvider {
    fn check_input_available(&mut self) -> io::Result<bool> {
        if self.available_char.is_none() {
            self.available_char = self.input.pop_front();
        }
        Ok(self.available_char.is_some())
    }
    fn get_input_character(&mut self) -> Option<u8> {
        self.available_char.take()
    }
    fn read_input_character(&mut self) -> io::Result<Option<u8>> {
        let next = self.available_char.take().or_else(|| self.input.pop_front());
        if next.is_none() {
            self.is_interrupted = true;
        }
        Ok(next)
    }
    fn is_interrupted(&self) -> bool {
        self.is_interrupted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use yare::parameterized;

    #[parameterized(
        letter = { KeyCode::Char('a'), KeyModifiers::NONE, Some(b'a') },
        shifted_letter = { KeyCode::Char('A'), KeyModifiers::SHIFT, Some(b'A') },
        enter = { KeyCode::Enter, KeyModifiers::NONE, Some(b'\n') },
        backspace = { KeyCode::Backspace, KeyModifiers::NONE, Some(0x08) },
        non_ascii = { KeyCode::Char('ä'), KeyModifiers::NONE, None },
        arrow = { KeyCode::Up, KeyModifiers::NONE, None },
    )]
    fn test_key_to_byte(code: KeyCode, modifiers: KeyModifiers, expected: Option<u8>) {
        assert_that!(key_to_byte(&KeyEvent::new(code, modifiers)), eq(expected));
    }

    #[gtest]
    fn test_ctrl_c_interrupts() {
        let mut sut = TerminalInputProvider::new();
        let event = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        expect_that!(sut.handle_event(&event), none());
        expect_that!(sut.is_interrupted(), eq(true));
    }

    #[gtest]
    fn test_scripted_poll_latches_until_taken() {
        let mut sut = ScriptedInputProvider::new(b"xy");
        expect_that!(sut.check_input_available().unwrap(), eq(true));
        expect_that!(sut.check_input_available().unwrap(), eq(true));
        expect_that!(sut.get_input_character(), some(eq(b'x')));
        expect_that!(sut.get_input_character(), none());
        expect_that!(sut.read_input_character().unwrap(), some(eq(b'y')));
        expect_that!(sut.check_input_available().unwrap(), eq(false));
        expect_that!(sut.is_interrupted(), eq(false));
    }

    #[gtest]
    fn test_scripted_exhausted_read_requests_shutdown() {
        let mut sut = ScriptedInputProvider::new(b"");
        expect_that!(sut.read_input_character().unwrap(), none());
        expect_that!(sut.is_interrupted(), eq(true));
    }

    #[gtest]
    fn test_scripted_push_input_appends() {
        let mut sut = ScriptedInputProvider::new(b"a");
        sut.push_input(b"bc");
        expect_that!(sut.read_input_character().unwrap(), some(eq(b'a')));
        expect_that!(sut.read_input_character().unwrap(), some(eq(b'b')));
        sut.push_input(b"d");
        expect_that!(sut.read_input_character().unwrap(), some(eq(b'c')));
        expect_that!(sut.read_input_character().unwrap(), some(eq(b'd')));
        expect_that!(sut.is_interrupted(), eq(false));
    }

    #[gtest]
    fn test_reader_delivers_bytes_unchanged() {
        let mut sut = ReaderInputProvider::new(&b"a\n"[..]);
        expect_that!(sut.read_input_character().unwrap(), some(eq(b'a')));
        expect_that!(sut.read_input_character().unwrap(), some(eq(b'\n')));
        expect_that!(sut.is_interrupted(), eq(false));
    }

    #[gtest]
    fn test_reader_check_latches_read_ahead_byte() {
        let mut sut = ReaderInputProvider::new(&b"xy"[..]);
        expect_that!(sut.check_input_available().unwrap(), eq(true));
        expect_that!(sut.check_input_available().unwrap(), eq(true));
        expect_that!(sut.read_input_character().unwrap(), some(eq(b'x')));
        expect_that!(sut.check_input_available().unwrap(), eq(true));
        expect_that!(sut.get_input_character(), some(eq(b'y')));
        expect_that!(sut.check_input_available().unwrap(), eq(false));
        expect_that!(sut.is_interrupted(), eq(false));
    }

    #[gtest]
    fn test_reader_end_of_input_requests_shutdown() {
        let mut sut = ReaderInputProvider::new(io::empty());
        expect_that!(sut.check_input_available().unwrap(), eq(false));
        expect_that!(sut.read_input_character().unwrap(), none());
        expect_that!(sut.is_interrupted(), eq(true));
    }
}
