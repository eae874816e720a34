use super::{lock_core, ClockScheduler, SchedulerConfig, SharedCore};
use crate::midi::{ClockMessage, MidiSink};
use log::{debug, error, info};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// Play/stop state machine.
///
/// Transitions are serialized by the handle lock; the scheduler thread never
/// takes it, so `stop` can join while holding it.
pub struct TransportController<S: MidiSink + 'static> {
    core: SharedCore<S>,
    config: SchedulerConfig,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<S: MidiSink + 'static> TransportController<S> {
    pub(crate) fn new(core: SharedCore<S>, config: SchedulerConfig) -> Self {
        Self {
            core,
            config,
            handle: Mutex::new(None),
        }
    }

    fn lock_handle(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sends Song Position 0 and Start, then launches the scheduler.
    /// No-op while running.
    pub fn play(&self) {
        let mut handle = self.lock_handle();
        self.start_locked(&mut handle);
    }

    /// Sends Stop and waits for the scheduler thread to exit. No pulse is
    /// sent after this returns. No-op while stopped.
    pub fn stop(&self) {
        let mut handle = self.lock_handle();
        self.stop_locked(&mut handle);
    }

    pub fn toggle(&self) {
        let mut handle = self.lock_handle();
        if self.is_running() {
            self.stop_locked(&mut handle);
        } else {
            self.start_locked(&mut handle);
        }
    }

    pub fn is_running(&self) -> bool {
        lock_core(&self.core).state.is_playing()
    }

    fn start_locked(&self, handle: &mut Option<JoinHandle<()>>) {
        let bpm = {
            let mut core = lock_core(&self.core);
            if core.state.is_playing() {
                debug!("Play ignored, clock already running");
                return;
            }
            core.state.begin_run();
            send_transport(&mut core.sink, ClockMessage::SongPosition(0));
            send_transport(&mut core.sink, ClockMessage::Start);
            core.state.bpm()
        };

        // A scheduler that died on its own leaves a finished handle behind
        if let Some(stale) = handle.take() {
            if stale.join().is_err() {
                error!("Previous MIDI clock thread panicked");
            }
        }

        let scheduler = ClockScheduler::new(self.core.clone(), self.config.clone());
        match thread::Builder::new()
            .name("midi-clock".to_string())
            .spawn(move || scheduler.run())
        {
            Ok(spawned) => {
                *handle = Some(spawned);
                info!("MIDI clock started at {:.2} BPM", bpm);
            }
            Err(e) => {
                error!("Failed to spawn MIDI clock thread: {}", e);
                lock_core(&self.core).state.end_run();
            }
        }
    }

    fn stop_locked(&self, handle: &mut Option<JoinHandle<()>>) {
        {
            let mut core = lock_core(&self.core);
            if !core.state.is_playing() {
                debug!("Stop ignored, clock not running");
                return;
            }
            // Same critical section as the flag, so no pulse can follow
            send_transport(&mut core.sink, ClockMessage::Stop);
            core.state.end_run();
        }

        if let Some(running) = handle.take() {
            if running.join().is_err() {
                error!("MIDI clock thread panicked");
            }
        }

        let pulses = lock_core(&self.core).state.pulse_count();
        info!("MIDI clock stopped after {} pulses", pulses);
    }
}

impl<S: MidiSink + 'static> Drop for TransportController<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn send_transport<S: MidiSink>(sink: &mut S, message: ClockMessage) {
    if let Err(e) = sink.send_message(&message.to_bytes()) {
        debug!("Dropped {:?}: {}", message, e);
    }
}
