use crate::midi::Result;

/// Capability to push raw protocol bytes to an output connection.
///
/// Implementations may fail or do nothing while no destination is open;
/// the clock treats every error as a dropped byte.
pub trait MidiSink: Send {
    /// Transmits one raw byte
    fn send_byte(&mut self, byte: u8) -> Result<()>;

    /// Transmits a complete message. Backends that need whole messages
    /// should override this; the default sends byte by byte.
    fn send_message(&mut self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.send_byte(byte)?;
        }
        Ok(())
    }

    /// Whether a destination is currently connected
    fn is_open(&self) -> bool;
}

/// Connection lifecycle for sinks that sit on a selectable port.
///
/// Clones are handles to the same connection. Lifecycle calls must not
/// block senders on another handle for longer than the final swap.
pub trait OutputPort: MidiSink + Clone {
    /// Opens the port at `index`, closing any previous connection first
    fn open_port(&mut self, index: usize) -> Result<()>;

    fn close_port(&mut self);

    /// Closes and reopens the currently selected port
    fn reconnect(&mut self) -> Result<()>;

    fn port_index(&self) -> Option<usize>;

    fn port_name(&self) -> Option<String>;
}
