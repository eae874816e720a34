//! MIDI output for the clock
//!
//! This module provides:
//! - Protocol byte constants and [`ClockMessage`] encoding
//! - The [`MidiSink`] capability consumed by the clock core, and
//!   [`OutputPort`] for sinks with a selectable port
//! - [`MidirSink`] for real MIDI devices via midir
//! - [`RecordingSink`] for tests
//!
mod error;
pub mod message;
pub mod midir_sink; // Make the module public
pub mod mock_sink; // Make the module public
mod sink;

pub use error::{MidiError, Result};
pub use message::ClockMessage;
pub use midir_sink::MidirSink;
pub use mock_sink::{RecordingSink, SentByte};
pub use sink::{MidiSink, OutputPort};

#[cfg(not(feature = "test-mock"))]
pub fn list_output_ports() -> Vec<String> {
    match MidirSink::list_ports() {
        Ok(ports) => ports,
        Err(e) => {
            log::error!("Failed to list MIDI output ports: {}", e);
            vec![]
        }
    }
}

#[cfg(feature = "test-mock")]
pub fn list_output_ports() -> Vec<String> {
    // Mock implementation for tests
    vec!["Mock Output 1".to_string(), "Mock Output 2".to_string()]
}

// Set default sink type
pub type DefaultSink = MidirSink;
