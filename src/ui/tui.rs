//! Terminal lifecycle wrapper: raw mode, alternate screen, panic recovery.

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

/// Tracks whether raw mode is active, for the panic handler.
static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);
static PANIC_HOOK: Once = Once::new();

/// Owns the ratatui terminal and restores the user's terminal on drop,
/// including across panics.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Whether this instance is responsible for cleanup
    active: bool,
}

impl Tui {
    /// Enter raw mode and the alternate screen, and build the terminal.
    ///
    /// # Errors
    /// Returns an error if raw mode, the alternate screen, or terminal
    /// construction fails.
    pub fn new() -> io::Result<Self> {
        install_panic_hook();

        enable_raw_mode()?;
        RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);

        let mut stdout = io::stdout();
        crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            active: true,
        })
    }

    /// Mutable access to the ratatui terminal for drawing.
    pub fn terminal(&mut self) -> &mut Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }

    /// Restore the terminal to its original state. After this, drop is a
    /// no-op.
    pub fn restore(&mut self) -> io::Result<()> {
        if self.active {
            self.active = false;
            RAW_MODE_ACTIVE.store(false, Ordering::SeqCst);
            crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
            disable_raw_mode()?;
            self.terminal.show_cursor()?;
        }
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        // Best-effort cleanup - ignore errors during drop
        let _ = self.restore();
    }
}

/// Restore terminal state before the default panic output, so the message
/// is readable instead of being swallowed by raw mode.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if RAW_MODE_ACTIVE.swap(false, Ordering::SeqCst) {
                let _ = crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen);
                let _ = disable_raw_mode();
            }
            default_hook(info);
        }));
    });
}
