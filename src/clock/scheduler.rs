use super::{lock_core, SharedCore};
use crate::config::{DEFAULT_DRIFT_THRESHOLD_PULSES, DEFAULT_GUARD_BAND};
use crate::midi::message::TIMING_CLOCK;
use crate::midi::MidiSink;
use log::{debug, info, trace, warn};
use std::thread;
use std::time::{Duration, Instant};

/// Tuning for the pulse loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Portion of each wait done by spinning instead of sleeping
    pub guard_band: Duration,
    /// How many intervals the loop may lag before it resynchronizes
    pub drift_threshold_pulses: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            guard_band: DEFAULT_GUARD_BAND,
            drift_threshold_pulses: DEFAULT_DRIFT_THRESHOLD_PULSES,
        }
    }
}

/// Absolute-deadline pulse timing.
///
/// Each deadline is the previous deadline plus the interval in force when
/// the pulse fired, so rounding and wake-up latency do not accumulate.
#[derive(Debug, Clone)]
pub struct PulseSchedule {
    next_deadline: Instant,
    drift_threshold_pulses: u32,
    resyncs: u64,
}

impl PulseSchedule {
    /// The first pulse is due at `start`
    pub fn new(start: Instant, drift_threshold_pulses: u32) -> Self {
        Self {
            next_deadline: start,
            drift_threshold_pulses,
            resyncs: 0,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_deadline
    }

    /// Moves the deadline past a pulse fired at `now`. Returns true when the
    /// loop had fallen too far behind and the schedule was reset to
    /// `now + interval` instead of catching up.
    pub fn advance(&mut self, now: Instant, interval: Duration) -> bool {
        self.next_deadline += interval;

        let allowed_lag = interval * self.drift_threshold_pulses;
        if now > self.next_deadline + allowed_lag {
            self.next_deadline = now + interval;
            self.resyncs += 1;
            return true;
        }
        false
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    pub fn resync_count(&self) -> u64 {
        self.resyncs
    }
}

/// Sleeps until shortly before `deadline`, then spins (yielding) until it
/// has passed. The spin covers at most `guard_band`.
pub fn wait_until(deadline: Instant, guard_band: Duration) {
    let time_to_next = deadline.saturating_duration_since(Instant::now());
    if time_to_next > guard_band {
        thread::sleep(time_to_next - guard_band);
    }
    while Instant::now() < deadline {
        thread::yield_now();
    }
}

/// The pulse loop run on the dedicated clock thread
pub struct ClockScheduler<S> {
    core: SharedCore<S>,
    config: SchedulerConfig,
}

impl<S: MidiSink> ClockScheduler<S> {
    pub fn new(core: SharedCore<S>, config: SchedulerConfig) -> Self {
        Self { core, config }
    }

    /// Emits pulses until the transport is observed stopped
    pub fn run(self) {
        let mut schedule = PulseSchedule::new(Instant::now(), self.config.drift_threshold_pulses);
        info!("MIDI clock thread started");

        loop {
            let now = Instant::now();
            if schedule.is_due(now) {
                let interval = match self.pulse() {
                    Some(interval) => interval,
                    None => break,
                };
                if schedule.advance(now, interval) {
                    warn!("MIDI clock drift detected, resetting schedule");
                }
            }
            wait_until(schedule.next_deadline(), self.config.guard_band);
        }

        debug!(
            "MIDI clock thread exiting after {} resyncs",
            schedule.resync_count()
        );
    }

    /// Sends one Timing Clock byte if still playing and returns the interval
    /// to the next pulse, read fresh so tempo changes apply from here on
    fn pulse(&self) -> Option<Duration> {
        let mut core = lock_core(&self.core);
        if !core.state.is_playing() {
            return None;
        }
        if let Err(e) = core.sink.send_byte(TIMING_CLOCK) {
            trace!("Dropped clock pulse: {}", e);
        }
        core.state.record_pulse();
        Some(core.state.pulse_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_micros(20_833);

    /// Drives a schedule over virtual time the way the loop does, waking
    /// exactly on each deadline, and returns the pulse times.
    fn simulate(
        schedule: &mut PulseSchedule,
        mut now: Instant,
        until: Instant,
        interval: Duration,
    ) -> Vec<Instant> {
        let mut pulses = Vec::new();
        while now < until {
            if schedule.is_due(now) {
                pulses.push(now);
                schedule.advance(now, interval);
            }
            now = now.max(schedule.next_deadline());
        }
        pulses
    }

    #[test]
    fn test_first_pulse_is_due_immediately() {
        let start = Instant::now();
        let schedule = PulseSchedule::new(start, 4);
        assert!(schedule.is_due(start));
    }

    #[test]
    fn test_deadlines_accumulate_without_drift() {
        let start = Instant::now();
        let mut schedule = PulseSchedule::new(start, 4);

        // Wake late on every pulse; deadlines still land on the grid
        for n in 1..=1000u32 {
            let late_wakeup = schedule.next_deadline() + Duration::from_micros(300);
            assert!(!schedule.advance(late_wakeup, INTERVAL));
            assert_eq!(schedule.next_deadline(), start + INTERVAL * n);
        }
        assert_eq!(schedule.resync_count(), 0);
    }

    #[test]
    fn test_stall_causes_single_resync() {
        let start = Instant::now();
        let mut schedule = PulseSchedule::new(start, 4);
        assert!(!schedule.advance(start, INTERVAL));

        // The thread is preempted for ten intervals past its deadline
        let stall_end = schedule.next_deadline() + INTERVAL * 10;
        assert!(schedule.is_due(stall_end));
        assert!(schedule.advance(stall_end, INTERVAL));
        assert_eq!(schedule.next_deadline(), stall_end + INTERVAL);
        assert_eq!(schedule.resync_count(), 1);

        // No catch-up burst: nothing else is due until one interval later
        assert!(!schedule.is_due(stall_end));
        assert!(!schedule.is_due(stall_end + INTERVAL / 2));

        let pulses = simulate(
            &mut schedule,
            stall_end + INTERVAL,
            stall_end + INTERVAL * 5,
            INTERVAL,
        );
        assert_eq!(pulses.len(), 4);
        assert_eq!(schedule.resync_count(), 1);
        for pair in pulses.windows(2) {
            assert_eq!(pair[1] - pair[0], INTERVAL);
        }
    }

    #[test]
    fn test_small_lag_is_caught_up() {
        let start = Instant::now();
        let mut schedule = PulseSchedule::new(start, 4);

        // Two intervals late is inside the threshold, so missed pulses follow
        let late = start + INTERVAL * 2;
        assert!(!schedule.advance(late, INTERVAL));
        assert!(schedule.is_due(late));
        assert!(!schedule.advance(late, INTERVAL));
        assert!(schedule.is_due(late));
        assert!(!schedule.advance(late, INTERVAL));
        assert!(!schedule.is_due(late));
        assert_eq!(schedule.resync_count(), 0);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let start = Instant::now();
        let mut strict = PulseSchedule::new(start, 1);
        let mut lenient = PulseSchedule::new(start, 8);

        let late = start + INTERVAL * 3;
        assert!(strict.advance(late, INTERVAL));
        assert!(!lenient.advance(late, INTERVAL));
    }

    #[test]
    fn test_tempo_change_applies_from_next_interval() {
        let start = Instant::now();
        let mut schedule = PulseSchedule::new(start, 4);
        let slow = Duration::from_micros(41_667);

        schedule.advance(start, INTERVAL);
        let already_scheduled = schedule.next_deadline();
        assert_eq!(already_scheduled, start + INTERVAL);

        // Tempo halves; the pending deadline is untouched
        let fired = already_scheduled;
        schedule.advance(fired, slow);
        assert_eq!(schedule.next_deadline(), fired + slow);
    }

    #[test]
    fn test_wait_until_reaches_deadline() {
        let deadline = Instant::now() + Duration::from_millis(5);
        wait_until(deadline, Duration::from_micros(100));
        assert!(Instant::now() >= deadline);
    }

    #[test]
    fn test_wait_until_past_deadline_returns() {
        let deadline = Instant::now();
        wait_until(deadline, Duration::from_micros(100));
        assert!(Instant::now() >= deadline);
    }
}
