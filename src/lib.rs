pub mod cli;
pub mod clock;
pub mod config;
pub mod event_loop;
pub mod logging;
pub mod midi;
pub mod state;
pub mod tui;
pub mod ui;

pub use cli::{format_port_list, handle_port_list, Args};
pub use clock::{MidiClock, SchedulerConfig};
pub use config::Settings;
pub use event_loop::{EngineMessage, EventLoop, TransportAction};
pub use midi::{MidiSink, OutputPort};
pub use state::{ClockState, ClockStatus};
