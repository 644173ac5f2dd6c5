//! Foreground session loop for `breathe run`.

use std::io::{self, Write};
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use super::display::{Display, SessionEnd};
use crate::controller::BreathingController;
use crate::storage::KeyValueStore;
use crate::timer::TimerSnapshot;

/// How often the status line is redrawn.
pub const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

/// Classifies a snapshot taken after the timer stopped on its own.
pub fn session_end(snapshot: &TimerSnapshot) -> SessionEnd {
    if snapshot.session_remaining_ms == Some(0) {
        SessionEnd::Completed
    } else {
        SessionEnd::Stopped
    }
}

/// Redraws the status line until the timer stops or Ctrl-C is pressed.
///
/// Ctrl-C resets the timer. The controller must already be started.
pub async fn run_session<S: KeyValueStore>(controller: &mut BreathingController<S>) -> SessionEnd {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ctrl_c_active = true;
    let mut last_line = String::new();

    loop {
        let snapshot = controller.snapshot().await;
        if !snapshot.is_running {
            finish_line();
            return session_end(&snapshot);
        }

        let line = Display::status_line(&snapshot);
        if line != last_line {
            redraw(&line, last_line.len());
            last_line = line;
        }

        tokio::select! {
            result = &mut ctrl_c, if ctrl_c_active => match result {
                Ok(()) => {
                    controller.reset().await;
                    finish_line();
                    return SessionEnd::Interrupted;
                }
                Err(e) => {
                    warn!("Ctrl-C handler unavailable: {}", e);
                    ctrl_c_active = false;
                }
            },
            _ = sleep(REDRAW_INTERVAL) => {}
        }
    }
}

fn redraw(line: &str, previous_len: usize) {
    let mut out = io::stdout();
    let padding = previous_len.saturating_sub(line.len());
    let _ = write!(out, "\r{}{}", line, " ".repeat(padding));
    let _ = out.flush();
}

fn finish_line() {
    println!();
}
