// ui.rs

use crate::config::BEATS_PER_BAR;
use crate::state::ClockStatus;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Connection details shown next to the clock state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortStatus {
    pub index: Option<usize>,
    pub name: Option<String>,
    pub connected: bool,
}

fn create_clock_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{prefix:.bold.dim} {spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_prefix("MIDI Clock");
    pb
}

/// Single-line status readout. Stays on one line so it renders correctly
/// while the terminal is in raw mode.
pub struct StatusDisplay {
    spinner: ProgressBar,
    visible: bool,
}

impl StatusDisplay {
    pub fn new(visible: bool) -> Self {
        let mut display = StatusDisplay {
            spinner: create_clock_spinner(),
            visible: false,
        };
        display.set_visible(visible);
        display
    }

    pub fn hidden() -> Self {
        Self::new(false)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if visible {
            self.spinner
                .set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        } else {
            self.spinner.set_draw_target(ProgressDrawTarget::hidden());
        }
    }

    pub fn update(&self, status: &ClockStatus, port: &PortStatus) {
        self.spinner.set_message(format_status(status, port));
        if status.is_playing {
            self.spinner.tick();
        }
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

pub fn format_port(port: &PortStatus) -> String {
    match (port.connected, port.index) {
        (true, Some(index)) => format!(
            "Port {} \"{}\"",
            index,
            port.name.as_deref().unwrap_or("unnamed")
        ),
        _ => "Port: no connection".to_string(),
    }
}

pub fn format_status(status: &ClockStatus, port: &PortStatus) -> String {
    let clock = if status.is_playing { "ON" } else { "OFF" };
    let since = status
        .started_at
        .filter(|_| status.is_playing)
        .map(|t| format!(" | since {}", t.format("%H:%M:%S")))
        .unwrap_or_default();

    format!(
        "CLOCK: {} | BPM: {:.2} | Bar {} Beat {}/{} | Pulses: {}{} | {}",
        clock,
        status.bpm,
        status.bar(),
        status.beat(),
        BEATS_PER_BAR,
        status.pulse_count,
        since,
        format_port(port)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ClockState;

    fn connected(index: usize, name: &str) -> PortStatus {
        PortStatus {
            index: Some(index),
            name: Some(name.to_string()),
            connected: true,
        }
    }

    #[test]
    fn test_stopped_clock_readout() {
        let status = ClockState::new().snapshot();
        let text = format_status(&status, &connected(1, "IAC Driver Bus 1"));
        assert_eq!(
            text,
            "CLOCK: OFF | BPM: 120.00 | Bar 1 Beat 1/4 | Pulses: 0 | Port 1 \"IAC Driver Bus 1\""
        );
    }

    #[test]
    fn test_no_connection_readout() {
        let port = PortStatus {
            index: Some(0),
            name: Some("gone".to_string()),
            connected: false,
        };
        assert_eq!(format_port(&port), "Port: no connection");
    }

    #[test]
    fn test_running_clock_shows_position() {
        let mut state = ClockState::new();
        state.set_bpm(97.5);
        state.begin_run();
        for _ in 0..(24 * 5) {
            state.record_pulse();
        }
        let text = format_status(&state.snapshot(), &connected(0, "Out"));
        assert!(text.starts_with("CLOCK: ON | BPM: 97.50 | Bar 2 Beat 2/4 | Pulses: 120 | since "));
        assert!(text.ends_with("Port 0 \"Out\""));
    }

    #[test]
    fn test_hidden_display_can_be_toggled() {
        let mut display = StatusDisplay::hidden();
        assert!(!display.is_visible());
        display.set_visible(false);
        display.update(&ClockState::new().snapshot(), &connected(0, "Out"));
        display.finish();
    }
}
