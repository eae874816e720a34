use midir::{ConnectError, InitError, MidiOutput, PortInfoError, SendError};
use std::error::Error;
use std::fmt;

/// Custom error type for MIDI output operations
#[derive(Debug)]
pub enum MidiError {
    /// Error when sending bytes to an open connection
    SendError(String),
    /// Error when opening or enumerating a MIDI output
    ConnectionError(String),
    /// No output connection is open
    NotConnected,
    /// The system reports no MIDI output ports
    NoOutputPorts,
}

impl fmt::Display for MidiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidiError::SendError(msg) => write!(f, "MIDI send error: {}", msg),
            MidiError::ConnectionError(msg) => write!(f, "MIDI connection error: {}", msg),
            MidiError::NotConnected => write!(f, "MIDI output not connected"),
            MidiError::NoOutputPorts => write!(f, "No MIDI output ports available"),
        }
    }
}

impl Error for MidiError {}

impl From<InitError> for MidiError {
    fn from(err: InitError) -> Self {
        MidiError::ConnectionError(err.to_string())
    }
}

impl From<PortInfoError> for MidiError {
    fn from(err: PortInfoError) -> Self {
        MidiError::ConnectionError(err.to_string())
    }
}

impl From<ConnectError<MidiOutput>> for MidiError {
    fn from(err: ConnectError<MidiOutput>) -> Self {
        MidiError::ConnectionError(err.to_string())
    }
}

impl From<SendError> for MidiError {
    fn from(err: SendError) -> Self {
        MidiError::SendError(err.to_string())
    }
}

/// Result type for MIDI operations
pub type Result<T> = std::result::Result<T, MidiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_error_display() {
        let send_error = MidiError::SendError("Failed to send".to_string());
        let conn_error = MidiError::ConnectionError("Failed to connect".to_string());

        assert_eq!(send_error.to_string(), "MIDI send error: Failed to send");
        assert_eq!(
            conn_error.to_string(),
            "MIDI connection error: Failed to connect"
        );
        assert_eq!(
            MidiError::NotConnected.to_string(),
            "MIDI output not connected"
        );
        assert_eq!(
            MidiError::NoOutputPorts.to_string(),
            "No MIDI output ports available"
        );
    }

    #[test]
    fn test_midi_error_as_error() {
        let error = MidiError::NotConnected;
        let _: &dyn Error = &error;
    }
}
