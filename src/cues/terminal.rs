//! Terminal cue output.
//!
//! A terminal can only ring its bell, so phases are told apart by bell
//! count: one for inhale, two for exhale, three and four for the holds. Haptics have no
//! terminal equivalent and are only logged.

use std::io::{self, Write};
use std::sync::Mutex;

use tracing::debug;

use super::{CueError, CuePlayer};
use crate::types::Phase;

const BEL: &[u8] = b"\x07";

/// Bells rung when `phase` begins.
pub fn bell_count(phase: Phase) -> usize {
    match phase {
        Phase::Inhale => 1,
        Phase::Exhale => 2,
        Phase::Hold1 => 3,
        Phase::Hold2 => 4,
    }
}

/// [`CuePlayer`] that rings the terminal bell.
pub struct TerminalCuePlayer<W: Write = io::Stderr> {
    out: Mutex<W>,
}

impl TerminalCuePlayer<io::Stderr> {
    /// Rings the bell on standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> TerminalCuePlayer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Consumes the player and returns its writer.
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write> CuePlayer for TerminalCuePlayer<W> {
    fn tone(&self, phase: Phase) -> Result<(), CueError> {
        let bells = bell_count(phase);
        let mut out = self
            .out
            .lock()
            .map_err(|_| CueError::DeviceNotAvailable("terminal lock poisoned".to_string()))?;
        out.write_all(&BEL.repeat(bells)).map_err(CueError::Output)?;
        out.flush().map_err(CueError::Output)
    }

    fn haptic(&self) -> Result<(), CueError> {
        debug!("Haptic pulse (no terminal output)");
        Ok(())
    }
}
