//! Terminal input source built on crossterm's event polling.

use super::{EventSource, InputEvent, KeyCode, MouseButton};
use crate::error::Result;
use crossterm::event::{self, Event, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

/// Converts crossterm events into [`InputEvent`]s in pixel space.
///
/// Terminal cells are mapped to pixels with a fixed cell size; a mouse
/// event lands at the centre of its cell.
///
/// Most terminals never report key releases. With a hold time set, a key
/// stays down until it has gone that long without a press or auto-repeat,
/// and then a `KeyUp` is emitted for it.
#[derive(Debug)]
pub struct CrosstermSource {
    cell_width: i32,
    cell_height: i32,
    hold: Option<Duration>,
    held: Vec<(KeyCode, Instant)>,
}

impl CrosstermSource {
    /// Create a source with the given cell size in pixels.
    ///
    /// Pass `hold` on terminals without release reports.
    pub const fn new(cell_width: i32, cell_height: i32, hold: Option<Duration>) -> Self {
        Self {
            cell_width,
            cell_height,
            hold,
            held: Vec::new(),
        }
    }

    /// Convert a crossterm event. Returns nothing for events the game ignores.
    fn convert_event(&mut self, event: Event, now: Instant) -> Option<InputEvent> {
        match event {
            Event::Key(key) => {
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == event::KeyCode::Char('c')
                {
                    return Some(InputEvent::Quit);
                }
                let code = Self::convert_key_code(key.code)?;
                match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => self.press(code, key.kind, now),
                    KeyEventKind::Release => {
                        self.held.retain(|&(held, _)| held != code);
                        Some(InputEvent::KeyUp(code))
                    }
                }
            }
            Event::Mouse(mouse) => self.convert_mouse_event(mouse),
            _ => None,
        }
    }

    fn press(&mut self, code: KeyCode, kind: KeyEventKind, now: Instant) -> Option<InputEvent> {
        let Some(hold) = self.hold else {
            return (kind == KeyEventKind::Press).then_some(InputEvent::KeyDown(code));
        };
        let deadline = now + hold;
        if let Some(entry) = self.held.iter_mut().find(|(held, _)| *held == code) {
            entry.1 = deadline;
            return None;
        }
        self.held.push((code, deadline));
        Some(InputEvent::KeyDown(code))
    }

    /// Release the first held key whose hold ran out by `now`.
    fn expire(&mut self, now: Instant) -> Option<InputEvent> {
        let index = self.held.iter().position(|&(_, deadline)| deadline <= now)?;
        let (code, _) = self.held.remove(index);
        Some(InputEvent::KeyUp(code))
    }

    fn convert_key_code(code: event::KeyCode) -> Option<KeyCode> {
        Some(match code {
            event::KeyCode::Char(c) => KeyCode::Char(c),
            event::KeyCode::Left => KeyCode::Left,
            event::KeyCode::Right => KeyCode::Right,
            event::KeyCode::Up => KeyCode::Up,
            event::KeyCode::Down => KeyCode::Down,
            event::KeyCode::Enter => KeyCode::Enter,
            event::KeyCode::Esc => KeyCode::Esc,
            _ => return None,
        })
    }

    fn convert_mouse_button(button: event::MouseButton) -> MouseButton {
        match button {
            event::MouseButton::Left => MouseButton::Left,
            event::MouseButton::Right => MouseButton::Right,
            event::MouseButton::Middle => MouseButton::Middle,
        }
    }

    fn convert_mouse_event(&self, mouse: event::MouseEvent) -> Option<InputEvent> {
        let x = i32::from(mouse.column) * self.cell_width + self.cell_width / 2;
        let y = i32::from(mouse.row) * self.cell_height + self.cell_height / 2;

        match mouse.kind {
            event::MouseEventKind::Down(button) => Some(InputEvent::MouseDown {
                x,
                y,
                button: Self::convert_mouse_button(button),
            }),
            event::MouseEventKind::Up(button) => Some(InputEvent::MouseUp {
                x,
                y,
                button: Self::convert_mouse_button(button),
            }),
            event::MouseEventKind::Moved | event::MouseEventKind::Drag(_) => {
                Some(InputEvent::MouseMove { x, y })
            }
            _ => None,
        }
    }
}

impl EventSource for CrosstermSource {
    fn next_event(&mut self, timeout: Duration) -> Result<Option<InputEvent>> {
        let now = Instant::now();
        if let Some(release) = self.expire(now) {
            return Ok(Some(release));
        }
        let wait = self
            .held
            .iter()
            .map(|&(_, deadline)| deadline.saturating_duration_since(now))
            .fold(timeout, Duration::min);
        if !event::poll(wait)? {
            return Ok(self.expire(Instant::now()));
        }
        let event = event::read()?;
        Ok(self.convert_event(event, Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyEventState, MouseEvent, MouseEventKind};

    fn key(code: event::KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn test_key_press_and_release() {
        let mut source = CrosstermSource::new(8, 16, None);
        let now = Instant::now();
        assert_eq!(
            source.convert_event(key(event::KeyCode::Left, KeyEventKind::Press), now),
            Some(InputEvent::KeyDown(KeyCode::Left))
        );
        assert_eq!(
            source.convert_event(key(event::KeyCode::Left, KeyEventKind::Release), now),
            Some(InputEvent::KeyUp(KeyCode::Left))
        );
        assert_eq!(
            source.convert_event(key(event::KeyCode::Left, KeyEventKind::Repeat), now),
            None
        );
        assert!(source.held.is_empty());
    }

    #[test]
    fn test_held_key_releases_after_hold_time() {
        let hold = Duration::from_millis(500);
        let mut source = CrosstermSource::new(8, 16, Some(hold));
        let t0 = Instant::now();
        let press = key(event::KeyCode::Right, KeyEventKind::Press);

        assert_eq!(source.convert_event(press.clone(), t0), Some(InputEvent::KeyDown(KeyCode::Right)));
        assert_eq!(source.expire(t0 + Duration::from_millis(100)), None);

        // Auto-repeat keeps the key down without a second KeyDown.
        let t1 = t0 + Duration::from_millis(400);
        assert_eq!(source.convert_event(press, t1), None);
        assert_eq!(source.expire(t0 + hold), None);

        assert_eq!(source.expire(t1 + hold), Some(InputEvent::KeyUp(KeyCode::Right)));
        assert_eq!(source.expire(t1 + hold * 2), None);
    }

    #[test]
    fn test_reported_release_ends_hold() {
        let mut source = CrosstermSource::new(8, 16, Some(Duration::from_millis(500)));
        let now = Instant::now();
        source.convert_event(key(event::KeyCode::Char(' '), KeyEventKind::Press), now);
        assert_eq!(
            source.convert_event(key(event::KeyCode::Char(' '), KeyEventKind::Release), now),
            Some(InputEvent::KeyUp(KeyCode::Char(' ')))
        );
        assert_eq!(source.expire(now + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_ctrl_c_is_quit() {
        let mut source = CrosstermSource::new(8, 16, None);
        let event = Event::Key(KeyEvent {
            code: event::KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        });
        assert_eq!(source.convert_event(event, Instant::now()), Some(InputEvent::Quit));
    }

    #[test]
    fn test_mouse_maps_to_cell_centre() {
        let mut source = CrosstermSource::new(8, 16, None);
        let event = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(event::MouseButton::Left),
            column: 2,
            row: 3,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(
            source.convert_event(event, Instant::now()),
            Some(InputEvent::MouseDown { x: 20, y: 56, button: MouseButton::Left })
        );
    }
}
