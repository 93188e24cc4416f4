//! Terminal session: raw mode, alternate screen and mouse capture.
//!
//! [`TerminalSession`] puts the terminal into the state the demo needs and
//! puts it back when dropped, including on panic unwinding.

use crate::error::Result;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io;

/// Which terminal features a session switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Report mouse motion and clicks.
    pub mouse_capture: bool,
    /// Draw on the alternate screen buffer.
    pub alternate_screen: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mouse_capture: true,
            alternate_screen: true,
        }
    }
}

/// Guard holding the terminal in raw mode.
#[derive(Debug)]
pub struct TerminalSession {
    config: SessionConfig,
    cols: u16,
    rows: u16,
}

impl TerminalSession {
    /// Enter raw mode and switch on the configured features.
    pub fn start(config: SessionConfig) -> Result<Self> {
        let (cols, rows) = terminal::size()?;
        terminal::enable_raw_mode()?;

        // From here on, Drop restores whatever was switched on.
        let session = Self { config, cols, rows };
        let mut stdout = io::stdout();
        if config.alternate_screen {
            execute!(stdout, EnterAlternateScreen)?;
        }
        if config.mouse_capture {
            execute!(stdout, EnableMouseCapture)?;
        }
        execute!(stdout, cursor::Hide)?;
        Ok(session)
    }

    /// Terminal size in cells at startup.
    pub const fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, cursor::Show);
        if self.config.mouse_capture {
            let _ = execute!(stdout, DisableMouseCapture);
        }
        if self.config.alternate_screen {
            let _ = execute!(stdout, LeaveAlternateScreen);
        }
        let _ = terminal::disable_raw_mode();
    }
}
