mod input;

pub use input::{column_to_bpm, map_key_event, map_mouse_event};

use crate::event_loop::EngineMessage;
use crossbeam::channel::Sender;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode},
};
use std::io;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub const CONTROLS_HELP: &str = "\
KEYS
Space:      Start/Stop
Up/Down:    Tempo +/-
Mouse drag: Tempo across the window width
Backspace:  Reset tempo to 120
0-9:        Select output port
r:          Reconnect output
d:          Show/hide status
q:          Quit";

/// Raw mode and mouse capture for as long as it lives
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), EnableMouseCapture) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        Ok(TerminalGuard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), DisableMouseCapture);
        if let Err(e) = disable_raw_mode() {
            log::error!("Failed to restore terminal: {}", e);
        }
        log::info!("Terminal restored");
    }
}

fn map_event(event: Event) -> io::Result<Option<EngineMessage>> {
    Ok(match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => map_key_event(key),
        Event::Mouse(mouse) => {
            let (width, _) = terminal::size()?;
            map_mouse_event(mouse, width)
        }
        _ => None,
    })
}

/// Reads keyboard and mouse input and forwards mapped messages until `Quit`
/// is sent or the event loop goes away.
pub fn run_input_loop(message_tx: Sender<EngineMessage>) -> io::Result<()> {
    log::info!("Starting input loop");
    let _guard = TerminalGuard::enter()?;

    loop {
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Some(message) = map_event(event::read()?)? else {
            continue;
        };

        log::info!("Sending message to event loop: {:?}", message);
        let quit = message == EngineMessage::Quit;
        if message_tx.send(message).is_err() {
            log::warn!("Event loop gone, leaving input loop");
            break;
        }
        if quit {
            break;
        }
    }
    Ok(())
}
