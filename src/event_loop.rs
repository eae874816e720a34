// event_loop.rs

use crate::clock::MidiClock;
use crate::config::BPM_NUDGE;
use crate::midi::OutputPort;
use crate::ui::{PortStatus, StatusDisplay};
use crossbeam::channel::{Receiver, RecvTimeoutError};
use log::{error, info, warn};
use std::ops::ControlFlow;
use std::time::Duration;

pub const DISPLAY_REFRESH: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportAction {
    Play,
    Stop,
    Toggle,
}

/// Commands from the control surface
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    TransportCommand(TransportAction),
    SetBpm(f64),
    NudgeBpm(f64),
    ResetBpm,
    Reconnect,
    SelectPort(usize),
    ToggleDebug,
    Quit,
}

impl EngineMessage {
    pub fn tempo_up() -> Self {
        EngineMessage::NudgeBpm(BPM_NUDGE)
    }

    pub fn tempo_down() -> Self {
        EngineMessage::NudgeBpm(-BPM_NUDGE)
    }
}

/// Applies control messages to the clock and keeps the readout fresh
pub struct EventLoop<S: OutputPort + 'static> {
    clock: MidiClock<S>,
    port: S,
    message_rx: Receiver<EngineMessage>,
    display: StatusDisplay,
}

impl<S: OutputPort + 'static> EventLoop<S> {
    pub fn new(
        clock: MidiClock<S>,
        message_rx: Receiver<EngineMessage>,
        display: StatusDisplay,
    ) -> Self {
        let port = clock.sink_handle();
        EventLoop {
            clock,
            port,
            message_rx,
            display,
        }
    }

    pub fn clock(&self) -> &MidiClock<S> {
        &self.clock
    }

    pub fn display(&self) -> &StatusDisplay {
        &self.display
    }

    /// Runs until `Quit` or until every sender is gone, then stops the clock
    pub fn run(&mut self) {
        info!("Event loop started");
        loop {
            match self.message_rx.recv_timeout(DISPLAY_REFRESH) {
                Ok(message) => {
                    if self.handle_message(message).is_break() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("Control channel closed, leaving event loop");
                    break;
                }
            }
            self.refresh_display();
        }

        self.clock.stop();
        self.display.finish();
        info!("Event loop stopped");
    }

    pub fn handle_message(&mut self, message: EngineMessage) -> ControlFlow<()> {
        info!("Handling message: {:?}", message);
        match message {
            EngineMessage::TransportCommand(TransportAction::Play) => self.clock.play(),
            EngineMessage::TransportCommand(TransportAction::Stop) => self.clock.stop(),
            EngineMessage::TransportCommand(TransportAction::Toggle) => self.clock.toggle(),
            EngineMessage::SetBpm(bpm) => {
                self.clock.set_bpm(bpm);
            }
            EngineMessage::NudgeBpm(delta) => {
                self.clock.nudge_bpm(delta);
            }
            EngineMessage::ResetBpm => {
                self.clock.reset_bpm();
            }
            EngineMessage::Reconnect => {
                if let Err(e) = self.port.reconnect() {
                    error!("Reconnect failed: {}", e);
                }
            }
            EngineMessage::SelectPort(index) => {
                if let Err(e) = self.port.open_port(index) {
                    error!("Failed to open MIDI output port {}: {}", index, e);
                }
            }
            EngineMessage::ToggleDebug => {
                let visible = !self.display.is_visible();
                self.display.set_visible(visible);
            }
            EngineMessage::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    pub fn port_status(&self) -> PortStatus {
        PortStatus {
            index: self.port.port_index(),
            name: self.port.port_name(),
            connected: self.port.is_open(),
        }
    }

    fn refresh_display(&self) {
        if self.display.is_visible() {
            self.display.update(&self.clock.status(), &self.port_status());
        }
    }
}
