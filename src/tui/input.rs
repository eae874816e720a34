use crate::config::{MAX_BPM, MIN_BPM};
use crate::event_loop::{EngineMessage, TransportAction};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

pub fn map_key_event(key: KeyEvent) -> Option<EngineMessage> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(EngineMessage::Quit)
        }
        KeyCode::Char(' ') => Some(EngineMessage::TransportCommand(TransportAction::Toggle)),
        KeyCode::Up => Some(EngineMessage::tempo_up()),
        KeyCode::Down => Some(EngineMessage::tempo_down()),
        KeyCode::Backspace => Some(EngineMessage::ResetBpm),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(EngineMessage::Reconnect),
        KeyCode::Char('d') | KeyCode::Char('D') => Some(EngineMessage::ToggleDebug),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(EngineMessage::Quit),
        KeyCode::Char(c) if c.is_ascii_digit() => c
            .to_digit(10)
            .map(|digit| EngineMessage::SelectPort(digit as usize)),
        _ => None,
    }
}

/// Left-button drags set the tempo from the pointer column, slowest at the
/// left edge and fastest at the right.
pub fn map_mouse_event(event: MouseEvent, width: u16) -> Option<EngineMessage> {
    match event.kind {
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Down(MouseButton::Left) => {
            Some(EngineMessage::SetBpm(column_to_bpm(event.column, width)))
        }
        _ => None,
    }
}

pub fn column_to_bpm(column: u16, width: u16) -> f64 {
    if width <= 1 {
        return MIN_BPM;
    }
    let position = f64::from(column.min(width - 1)) / f64::from(width - 1);
    MIN_BPM + position * (MAX_BPM - MIN_BPM)
}
