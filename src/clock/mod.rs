//! MIDI clock master
//!
//! [`MidiClock`] ties together:
//! - [`TempoController`], which owns the tempo and derived pulse spacing
//! - [`TransportController`], which sends the start/stop byte sequences and
//!   owns the scheduler thread
//! - [`ClockScheduler`], the real-time loop emitting Timing Clock pulses
//!
//! All three share one [`ClockCore`] behind a single mutex. The sink sits
//! under the same lock so transport bytes and pulses can never interleave.
mod scheduler;
mod tempo;
mod transport;

pub use scheduler::{wait_until, ClockScheduler, PulseSchedule, SchedulerConfig};
pub use tempo::TempoController;
pub use transport::TransportController;

use crate::midi::MidiSink;
use crate::state::{ClockState, ClockStatus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Clock state plus the sink it drives
pub struct ClockCore<S> {
    pub state: ClockState,
    pub sink: S,
}

pub type SharedCore<S> = Arc<Mutex<ClockCore<S>>>;

/// Locks the core. Every guarded field is a scalar, so a poisoned lock is
/// still consistent and is recovered.
pub(crate) fn lock_core<S>(core: &SharedCore<S>) -> MutexGuard<'_, ClockCore<S>> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct MidiClock<S: MidiSink + 'static> {
    core: SharedCore<S>,
    tempo: TempoController<S>,
    transport: TransportController<S>,
}

impl<S: MidiSink + 'static> MidiClock<S> {
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, SchedulerConfig::default())
    }

    pub fn with_config(sink: S, config: SchedulerConfig) -> Self {
        let core = Arc::new(Mutex::new(ClockCore {
            state: ClockState::new(),
            sink,
        }));
        Self {
            tempo: TempoController::new(core.clone()),
            transport: TransportController::new(core.clone(), config),
            core,
        }
    }

    pub fn tempo(&self) -> &TempoController<S> {
        &self.tempo
    }

    pub fn transport(&self) -> &TransportController<S> {
        &self.transport
    }

    pub fn set_bpm(&self, bpm: f64) -> f64 {
        self.tempo.set_bpm(bpm)
    }

    pub fn bpm(&self) -> f64 {
        self.tempo.bpm()
    }

    pub fn reset_bpm(&self) -> f64 {
        self.tempo.reset_bpm()
    }

    pub fn nudge_bpm(&self, delta: f64) -> f64 {
        self.tempo.nudge_bpm(delta)
    }

    pub fn micros_per_pulse(&self) -> u64 {
        self.tempo.micros_per_pulse()
    }

    pub fn play(&self) {
        self.transport.play();
    }

    pub fn stop(&self) {
        self.transport.stop();
    }

    pub fn toggle(&self) {
        self.transport.toggle();
    }

    pub fn is_running(&self) -> bool {
        self.transport.is_running()
    }

    pub fn status(&self) -> ClockStatus {
        lock_core(&self.core).state.snapshot()
    }

}

impl<S: MidiSink + Clone + 'static> MidiClock<S> {
    /// Another handle to the sink the clock drives. Port lifecycle calls go
    /// through it so they never hold the clock lock.
    pub fn sink_handle(&self) -> S {
        lock_core(&self.core).sink.clone()
    }
}
