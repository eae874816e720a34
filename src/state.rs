use crate::config::{BEATS_PER_BAR, DEFAULT_BPM, MAX_BPM, MIN_BPM, PULSES_PER_QUARTER_NOTE};
use chrono::{DateTime, Local};
use log::warn;
use std::time::Duration;

/// Pulse spacing for a tempo, rounded to the nearest microsecond
pub fn micros_per_pulse(bpm: f64) -> u64 {
    let microseconds_per_minute = 60.0 * 1_000_000.0;
    let pulses_per_minute = bpm * PULSES_PER_QUARTER_NOTE as f64;
    (microseconds_per_minute / pulses_per_minute).round() as u64
}

pub fn clamp_bpm(bpm: f64) -> f64 {
    bpm.clamp(MIN_BPM, MAX_BPM)
}

/// Tempo and transport state shared between callers and the scheduler thread
#[derive(Debug, Clone)]
pub struct ClockState {
    bpm: f64,
    micros_per_pulse: u64,
    is_playing: bool,
    pulse_count: u64,
    started_at: Option<DateTime<Local>>,
}

impl Default for ClockState {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            micros_per_pulse: micros_per_pulse(DEFAULT_BPM),
            is_playing: false,
            pulse_count: 0,
            started_at: None,
        }
    }
}

impl ClockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamps and stores the tempo, returning the value applied.
    /// NaN leaves the tempo unchanged.
    pub fn set_bpm(&mut self, bpm: f64) -> f64 {
        if bpm.is_nan() {
            warn!("Ignoring NaN tempo, keeping {} BPM", self.bpm);
            return self.bpm;
        }
        self.bpm = clamp_bpm(bpm);
        self.micros_per_pulse = micros_per_pulse(self.bpm);
        self.bpm
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn micros_per_pulse(&self) -> u64 {
        self.micros_per_pulse
    }

    pub fn pulse_interval(&self) -> Duration {
        Duration::from_micros(self.micros_per_pulse)
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn pulse_count(&self) -> u64 {
        self.pulse_count
    }

    pub fn song_position_beats(&self) -> u64 {
        self.pulse_count / PULSES_PER_QUARTER_NOTE
    }

    pub(crate) fn begin_run(&mut self) {
        self.pulse_count = 0;
        self.is_playing = true;
        self.started_at = Some(Local::now());
    }

    pub(crate) fn end_run(&mut self) {
        self.is_playing = false;
    }

    pub(crate) fn record_pulse(&mut self) -> u64 {
        self.pulse_count += 1;
        self.pulse_count
    }

    pub fn snapshot(&self) -> ClockStatus {
        ClockStatus {
            bpm: self.bpm,
            micros_per_pulse: self.micros_per_pulse,
            is_playing: self.is_playing,
            pulse_count: self.pulse_count,
            started_at: self.started_at,
        }
    }
}

/// Point-in-time copy of [`ClockState`] for display
#[derive(Debug, Clone, PartialEq)]
pub struct ClockStatus {
    pub bpm: f64,
    pub micros_per_pulse: u64,
    pub is_playing: bool,
    pub pulse_count: u64,
    pub started_at: Option<DateTime<Local>>,
}

impl ClockStatus {
    pub fn song_position_beats(&self) -> u64 {
        self.pulse_count / PULSES_PER_QUARTER_NOTE
    }

    /// 1-based beat within the bar (4/4)
    pub fn beat(&self) -> u64 {
        self.song_position_beats() % BEATS_PER_BAR + 1
    }

    /// 1-based bar number
    pub fn bar(&self) -> u64 {
        self.song_position_beats() / BEATS_PER_BAR + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_initialization() {
        let state = ClockState::new();
        assert_eq!(state.bpm(), 120.0);
        assert_eq!(state.micros_per_pulse(), 20_833);
        assert_eq!(state.pulse_count(), 0);
        assert!(!state.is_playing());
    }

    #[test]
    fn test_begin_run_resets_pulse_count() {
        let mut state = ClockState::new();
        state.begin_run();
        for _ in 0..30 {
            state.record_pulse();
        }
        assert_eq!(state.song_position_beats(), 1);
        state.end_run();
        assert!(!state.is_playing());
        assert_eq!(state.pulse_count(), 30);

        state.begin_run();
        assert_eq!(state.pulse_count(), 0);
        assert!(state.is_playing());
        assert!(state.snapshot().started_at.is_some());
    }

    #[test]
    fn test_nan_tempo_is_ignored() {
        let mut state = ClockState::new();
        state.set_bpm(90.0);
        assert_eq!(state.set_bpm(f64::NAN), 90.0);
        assert_eq!(state.bpm(), 90.0);
    }

    #[test]
    fn test_infinite_tempo_clamps() {
        let mut state = ClockState::new();
        assert_eq!(state.set_bpm(f64::INFINITY), MAX_BPM);
        assert_eq!(state.set_bpm(f64::NEG_INFINITY), MIN_BPM);
    }

    #[test]
    fn test_beat_and_bar_counting() {
        let mut state = ClockState::new();
        state.begin_run();

        // 23 pulses stay on the first beat
        for _ in 0..23 {
            state.record_pulse();
        }
        assert_eq!(state.snapshot().beat(), 1);
        assert_eq!(state.snapshot().bar(), 1);

        state.record_pulse();
        assert_eq!(state.snapshot().beat(), 2);

        // Complete the bar: 4 beats * 24 pulses = 96
        for _ in 0..72 {
            state.record_pulse();
        }
        let status = state.snapshot();
        assert_eq!(status.bar(), 2);
        assert_eq!(status.beat(), 1);
    }
}
