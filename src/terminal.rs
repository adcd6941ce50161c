use crossterm::terminal;
use std::io;
use std::io::{IsTerminal, Write};

/// Keeps the terminal in raw mode while alive, restores the previous mode on drop.
pub struct RawLock {
    enabled: bool,
}

impl RawLock {
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Drop for RawLock {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }
        // terminal stays in raw mode but no means to repair
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::error!("Error resetting terminal {e}");
        } else {
            tracing::debug!("Terminal restored from raw mode");
        }
    }
}

/// Set terminal to raw in best-effort mode, only log on failure, since there is no terminal
/// when output is redirected, e.g. in tests.
/// Redirected stdin is read as is, raw mode is left off then.
pub fn set_terminal_raw() -> RawLock {
    if !io::stdin().is_terminal() {
        tracing::debug!("Stdin is not a terminal, not switching to raw mode");
        return RawLock { enabled: false };
    }
    match terminal::enable_raw_mode() {
        Ok(()) => {
            tracing::debug!("Terminal switched to raw mode");
            RawLock { enabled: true }
        }
        Err(e) => {
            tracing::warn!("Could not set terminal to raw mode: {e}");
            RawLock { enabled: false }
        }
    }
}

/// Raw mode disables output post-processing, so a line feed alone would not return the cursor
/// to the first column. Writes `\r\n` for every `\n`.
pub struct RawModeWriter<W: Write> {
    inner: W,
}

impl<W: Write> RawModeWriter<W> {
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Write for RawModeWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for part in buf.split_inclusive(|b| *b == b'\n') {
            if let Some((b'\n', line)) = part.split_last() {
                self.inner.write_all(line)?;
                self.inner.write_all(b"\r\n")?;
            } else {
                self.inner.write_all(part)?;
            }
        }
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
