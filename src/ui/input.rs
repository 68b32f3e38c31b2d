/// Terminal input tracker.
///
/// Collects everything the terminal reported since the last frame:
///   - Key presses (Press and Repeat, so a held arrow keeps moving the cursor)
///   - Left mouse clicks, as raw terminal cell coordinates
///
/// Mapping clicks to grid cells is the renderer's job; this module only
/// knows about the terminal.

use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
    MouseEventKind,
};
use log::warn;

pub struct InputState {
    /// Keys pressed or auto-repeated during the last drain.
    presses: Vec<KeyEvent>,

    /// Left-button presses as terminal `(col, row)`.
    pub clicks: Vec<(u16, u16)>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
            clicks: Vec::with_capacity(4),
        }
    }

    /// Drain all pending terminal events. Call once per frame, before the
    /// simulation step.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        self.clicks.clear();

        loop {
            match poll(Duration::ZERO) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    warn!("terminal poll failed: {e}");
                    break;
                }
            }
            match event::read() {
                Ok(ev) => self.record(ev),
                Err(e) => {
                    warn!("terminal read failed: {e}");
                    break;
                }
            }
        }
    }

    fn record(&mut self, ev: Event) {
        match ev {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.presses.push(key),
            Event::Mouse(m) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
                self.clicks.push((m.column, m.row));
            }
            _ => {}
        }
    }

    /// Was this key pressed this frame? Letters match either case.
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.presses.iter().any(|k| same_key(k.code, code))
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.presses.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL) && same_key(k.code, KeyCode::Char('c'))
        })
    }

    /// Cursor step from arrows or WASD, first match wins.
    pub fn cursor_step(&self) -> Option<(i32, i32)> {
        const MOVES: [(KeyCode, KeyCode, (i32, i32)); 4] = [
            (KeyCode::Up, KeyCode::Char('w'), (0, -1)),
            (KeyCode::Down, KeyCode::Char('s'), (0, 1)),
            (KeyCode::Left, KeyCode::Char('a'), (-1, 0)),
            (KeyCode::Right, KeyCode::Char('d'), (1, 0)),
        ];
        MOVES
            .iter()
            .find(|(arrow, letter, _)| self.any_pressed(&[*arrow, *letter]))
            .map(|&(_, _, step)| step)
    }
}

fn same_key(a: KeyCode, b: KeyCode) -> bool {
    match (a, b) {
        (KeyCode::Char(x), KeyCode::Char(y)) => x.eq_ignore_ascii_case(&y),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseEvent};

    fn key(code: KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE })
    }

    #[test]
    fn release_events_are_ignored() {
        let mut input = InputState::new();
        input.record(key(KeyCode::Char('h'), KeyEventKind::Release));
        assert!(!input.was_pressed(KeyCode::Char('h')));
        input.record(key(KeyCode::Char('H'), KeyEventKind::Press));
        assert!(input.was_pressed(KeyCode::Char('h')));
    }

    #[test]
    fn only_left_button_down_counts_as_click() {
        let mut input = InputState::new();
        input.record(mouse(MouseEventKind::Down(MouseButton::Right), 1, 1));
        input.record(mouse(MouseEventKind::Up(MouseButton::Left), 2, 2));
        input.record(mouse(MouseEventKind::Moved, 3, 3));
        input.record(mouse(MouseEventKind::Down(MouseButton::Left), 14, 6));
        assert_eq!(input.clicks, vec![(14, 6)]);
    }

    #[test]
    fn arrows_and_wasd_move_cursor() {
        let mut input = InputState::new();
        assert_eq!(input.cursor_step(), None);
        input.record(key(KeyCode::Char('A'), KeyEventKind::Repeat));
        assert_eq!(input.cursor_step(), Some((-1, 0)));
        input.presses.clear();
        input.record(key(KeyCode::Down, KeyEventKind::Press));
        assert_eq!(input.cursor_step(), Some((0, 1)));
    }

    #[test]
    fn ctrl_c_detected() {
        let mut input = InputState::new();
        input.record(Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(input.ctrl_c_pressed());
    }
}
