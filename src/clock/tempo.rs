use super::{lock_core, SharedCore};
use crate::config::DEFAULT_BPM;
use log::info;

/// Thread-safe access to the clock tempo.
///
/// Writes are picked up by the scheduler when it computes its next
/// deadline; there is no separate notification.
pub struct TempoController<S> {
    core: SharedCore<S>,
}

impl<S> TempoController<S> {
    pub(crate) fn new(core: SharedCore<S>) -> Self {
        Self { core }
    }

    /// Clamps `bpm` into range and recomputes the pulse spacing. Returns the
    /// tempo actually applied.
    pub fn set_bpm(&self, bpm: f64) -> f64 {
        let (applied, micros_per_pulse) = {
            let mut core = lock_core(&self.core);
            let applied = core.state.set_bpm(bpm);
            (applied, core.state.micros_per_pulse())
        };
        info!(
            "Clock settings: BPM: {:.2} Micros per pulse: {}",
            applied, micros_per_pulse
        );
        applied
    }

    pub fn bpm(&self) -> f64 {
        lock_core(&self.core).state.bpm()
    }

    pub fn micros_per_pulse(&self) -> u64 {
        lock_core(&self.core).state.micros_per_pulse()
    }

    pub fn reset_bpm(&self) -> f64 {
        self.set_bpm(DEFAULT_BPM)
    }

    /// Adds `delta` to the current tempo in one locked step
    pub fn nudge_bpm(&self, delta: f64) -> f64 {
        let applied = {
            let mut core = lock_core(&self.core);
            let target = core.state.bpm() + delta;
            core.state.set_bpm(target)
        };
        info!("Tempo nudged by {:+.1} to {:.2} BPM", delta, applied);
        applied
    }
}
