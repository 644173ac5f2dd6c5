//! Phase ordering.
//!
//! The cycle is a fixed array indexed modulo its length; zero-length phases
//! stay valid states but are skipped when choosing what runs next.

use crate::types::{DurationSet, Phase};

/// The phase that follows `current` in the cycle, wrapping at the end.
pub fn next_phase_in_cycle(current: Phase) -> Phase {
    Phase::ALL[(current.index() + 1) % Phase::ALL.len()]
}

/// First phase with a non-zero duration.
///
/// The walk begins at the phase after `starting_from`, or at `Inhale` when
/// `starting_from` is `None`, and visits each phase at most once. Returns
/// `None` when all four durations are zero.
pub fn first_non_zero_phase(durations: &DurationSet, starting_from: Option<Phase>) -> Option<Phase> {
    let mut candidate = match starting_from {
        Some(current) => next_phase_in_cycle(current),
        None => Phase::Inhale,
    };
    for _ in 0..Phase::ALL.len() {
        if durations.get(candidate) > 0 {
            return Some(candidate);
        }
        candidate = next_phase_in_cycle(candidate);
    }
    None
}
