use crate::midi::{MidiError, MidiSink, OutputPort, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// A byte captured by [`RecordingSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentByte {
    pub byte: u8,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct Recording {
    sent: Vec<SentByte>,
    open: bool,
    port_index: Option<usize>,
    reconnects: u32,
    reconnect_delay: Duration,
}

/// In-memory sink that records every byte with its send time.
///
/// Clones share the same recording, so a test can hand one clone to the
/// clock and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingSink {
    /// A sink connected on port 0
    pub fn new() -> Self {
        let sink = Self::default();
        {
            let mut rec = sink.lock();
            rec.open = true;
            rec.port_index = Some(0);
        }
        sink
    }

    /// A sink with no destination; every send fails
    pub fn disconnected() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.lock().sent.iter().map(|s| s.byte).collect()
    }

    pub fn sent(&self) -> Vec<SentByte> {
        self.lock().sent.clone()
    }

    pub fn count(&self, byte: u8) -> usize {
        self.lock().sent.iter().filter(|s| s.byte == byte).count()
    }

    pub fn reconnects(&self) -> u32 {
        self.lock().reconnects
    }

    pub fn set_open(&self, open: bool) {
        self.lock().open = open;
    }

    /// Makes every reconnect take `delay`, spent outside the recording lock
    /// the way a real device connect is
    pub fn set_reconnect_delay(&self, delay: Duration) {
        self.lock().reconnect_delay = delay;
    }

    pub fn clear(&self) {
        self.lock().sent.clear();
    }
}

impl MidiSink for RecordingSink {
    fn send_byte(&mut self, byte: u8) -> Result<()> {
        let mut rec = self.lock();
        if !rec.open {
            return Err(MidiError::NotConnected);
        }
        rec.sent.push(SentByte {
            byte,
            at: Instant::now(),
        });
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.lock().open
    }
}

impl OutputPort for RecordingSink {
    fn open_port(&mut self, index: usize) -> Result<()> {
        let mut rec = self.lock();
        rec.open = true;
        rec.port_index = Some(index);
        Ok(())
    }

    fn close_port(&mut self) {
        self.lock().open = false;
    }

    fn reconnect(&mut self) -> Result<()> {
        let delay = self.lock().reconnect_delay;
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        let mut rec = self.lock();
        rec.reconnects += 1;
        rec.open = true;
        if rec.port_index.is_none() {
            rec.port_index = Some(0);
        }
        Ok(())
    }

    fn port_index(&self) -> Option<usize> {
        self.lock().port_index
    }

    fn port_name(&self) -> Option<String> {
        self.lock()
            .port_index
            .map(|index| format!("Recording Sink {}", index))
    }
}
