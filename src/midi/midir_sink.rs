use crate::config::DEFAULT_PORT_INDEX;
use crate::midi::{MidiError, MidiSink, OutputPort, Result};
use log::{debug, info, warn};
use midir::{MidiOutput, MidiOutputConnection};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const CONNECTION_NAME: &str = "midiclockrs-output-conn";

#[derive(Default)]
struct Connection {
    output: Option<MidiOutputConnection>,
    port_index: Option<usize>,
    port_name: Option<String>,
}

/// Output sink backed by a midir connection.
///
/// Clones share one connection. Opening a port connects without holding the
/// shared lock and only swaps the finished connection in, so a handle owned
/// by the clock keeps sending while another handle reconnects.
#[derive(Clone)]
pub struct MidirSink {
    client_name: String,
    shared: Arc<Mutex<Connection>>,
}

impl MidirSink {
    /// Creates a sink with no open connection
    pub fn new(client_name: &str) -> Self {
        Self {
            client_name: client_name.to_string(),
            shared: Arc::new(Mutex::new(Connection::default())),
        }
    }

    /// Lists the names of all MIDI output ports, in index order
    pub fn list_ports() -> Result<Vec<String>> {
        let midi_out = MidiOutput::new("midiclockrs-port-lister")?;
        let ports = midi_out.ports();
        Ok(ports
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn connect(&self, index: usize) -> Result<(usize, String, MidiOutputConnection)> {
        let midi_out = MidiOutput::new(&self.client_name)?;
        let out_ports = midi_out.ports();
        let available: Vec<String> = out_ports
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect();
        debug!("Available MIDI output ports: {:?}", available);

        let index = resolve_port_index(index, out_ports.len()).ok_or(MidiError::NoOutputPorts)?;
        let port = &out_ports[index];
        let port_name = midi_out.port_name(port)?;

        info!("Connecting to MIDI output port {}: {}", index, port_name);
        let output = midi_out.connect(port, CONNECTION_NAME)?;
        Ok((index, port_name, output))
    }
}

/// Maps a requested index onto the available ports. Out-of-range requests
/// fall back to the default index.
pub fn resolve_port_index(requested: usize, available: usize) -> Option<usize> {
    if available == 0 {
        return None;
    }
    if requested < available {
        Some(requested)
    } else {
        let fallback = DEFAULT_PORT_INDEX.min(available - 1);
        warn!(
            "Port index {} out of range ({} ports), using port {}",
            requested, available, fallback
        );
        Some(fallback)
    }
}

impl MidiSink for MidirSink {
    fn send_byte(&mut self, byte: u8) -> Result<()> {
        self.send_message(&[byte])
    }

    fn send_message(&mut self, bytes: &[u8]) -> Result<()> {
        let mut conn = self.lock();
        let output = conn.output.as_mut().ok_or(MidiError::NotConnected)?;
        output.send(bytes)?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.lock().output.is_some()
    }
}

impl OutputPort for MidirSink {
    fn open_port(&mut self, index: usize) -> Result<()> {
        let (index, port_name, output) = match self.connect(index) {
            Ok(connected) => connected,
            Err(e) => {
                self.close_port();
                return Err(e);
            }
        };

        let previous = {
            let mut conn = self.lock();
            conn.port_index = Some(index);
            conn.port_name = Some(port_name);
            conn.output.replace(output)
        };
        if let Some(previous) = previous {
            previous.close();
            debug!("Closed previous MIDI output connection");
        }
        Ok(())
    }

    fn close_port(&mut self) {
        let (previous, name) = {
            let mut conn = self.lock();
            (conn.output.take(), conn.port_name.clone())
        };
        if let Some(previous) = previous {
            previous.close();
            info!(
                "Closed MIDI output port {}",
                name.as_deref().unwrap_or("<unnamed>")
            );
        }
    }

    fn reconnect(&mut self) -> Result<()> {
        let index = self.port_index().unwrap_or(DEFAULT_PORT_INDEX);
        info!("Reconnecting MIDI output on port {}", index);
        self.open_port(index)
    }

    fn port_index(&self) -> Option<usize> {
        self.lock().port_index
    }

    fn port_name(&self) -> Option<String> {
        self.lock().port_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_index_is_kept() {
        assert_eq!(resolve_port_index(2, 3), Some(2));
        assert_eq!(resolve_port_index(0, 1), Some(0));
    }

    #[test]
    fn test_out_of_range_index_resets_to_default() {
        assert_eq!(resolve_port_index(7, 3), Some(DEFAULT_PORT_INDEX));
    }

    #[test]
    fn test_no_ports_resolves_to_none() {
        assert_eq!(resolve_port_index(0, 0), None);
    }

    #[test]
    fn test_unopened_sink_drops_bytes() {
        let mut sink = MidirSink::new("midiclockrs-test");
        assert!(!sink.is_open());
        assert!(matches!(sink.send_byte(0xF8), Err(MidiError::NotConnected)));
        assert_eq!(sink.port_index(), None);
    }

    #[test]
    fn test_clones_share_connection_state() {
        let sink = MidirSink::new("midiclockrs-test");
        let mut handle = sink.clone();
        handle.close_port();
        assert!(!sink.is_open());
        assert!(Arc::ptr_eq(&sink.shared, &handle.shared));
    }
}
