//! Routes timer events to a cue player.

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use super::CuePlayer;
use crate::timer::TimerEvent;
use crate::types::Preferences;

/// Plays cues for timer events under the current preferences.
pub struct CueDispatcher<P> {
    player: P,
    preferences: watch::Receiver<Preferences>,
}

impl<P: CuePlayer> CueDispatcher<P> {
    pub fn new(player: P, preferences: watch::Receiver<Preferences>) -> Self {
        Self {
            player,
            preferences,
        }
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    /// Handles one event and returns how many cues were played.
    ///
    /// Only a phase starting while cycling produces cues; stopping events
    /// silence the player. Failures are logged and not retried.
    pub fn handle(&self, event: &TimerEvent) -> usize {
        match event {
            TimerEvent::PhaseStarted { phase, .. } => {
                let preferences = *self.preferences.borrow();
                let mut played = 0;
                if preferences.sound_enabled {
                    match self.player.tone(*phase) {
                        Ok(()) => played += 1,
                        Err(e) => warn!("Phase tone failed: {}", e),
                    }
                }
                if preferences.vibration_enabled {
                    match self.player.haptic() {
                        Ok(()) => played += 1,
                        Err(e) => warn!("Haptic cue failed: {}", e),
                    }
                }
                played
            }
            TimerEvent::Paused
            | TimerEvent::Reset
            | TimerEvent::SessionCompleted
            | TimerEvent::Stopped => {
                self.player.silence();
                0
            }
            TimerEvent::PreparationStarted { .. } => 0,
        }
    }

    /// Handles events until every sender is dropped.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<TimerEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(&event);
        }
        debug!("Cue dispatcher exited");
    }
}
