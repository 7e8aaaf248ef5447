//! Raw terminal events to semantic input actions.
//!
//! The mapping is pure; all state-dependent interpretation (crashed,
//! paused, cooldowns) lives in the runner's dispatcher.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};

/// Where an action originated. Pointer actions carry touch semantics,
/// e.g. a press restarts a crashed game immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Key,
    Pointer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    JumpStart(Source),
    JumpEnd(Source),
    DuckStart,
    DuckEnd,
    Restart,
}

pub struct InputRouter {
    /// Whether the terminal reports key release events. Without them there
    /// is no variable jump height, and restart acts on Enter press.
    key_release: bool,
}

impl InputRouter {
    pub fn new(key_release: bool) -> Self {
        Self { key_release }
    }

    pub fn map(&self, event: &Event) -> Option<InputAction> {
        match event {
            Event::Key(key) => self.map_key(key),
            Event::Mouse(mouse) => map_mouse(mouse),
            _ => None,
        }
    }

    fn map_key(&self, key: &KeyEvent) -> Option<InputAction> {
        let jump = matches!(key.code, KeyCode::Up | KeyCode::Char(' '));
        let duck = key.code == KeyCode::Down;
        let restart = key.code == KeyCode::Enter;

        match key.kind {
            KeyEventKind::Press if jump => Some(InputAction::JumpStart(Source::Key)),
            KeyEventKind::Press if duck => Some(InputAction::DuckStart),
            KeyEventKind::Press if restart && !self.key_release => Some(InputAction::Restart),
            KeyEventKind::Release if jump => Some(InputAction::JumpEnd(Source::Key)),
            KeyEventKind::Release if duck => Some(InputAction::DuckEnd),
            KeyEventKind::Release if restart => Some(InputAction::Restart),
            _ => None,
        }
    }
}

fn map_mouse(mouse: &MouseEvent) -> Option<InputAction> {
    match mouse.kind {
        MouseEventKind::Down(_) => Some(InputAction::JumpStart(Source::Pointer)),
        MouseEventKind::Up(_) => Some(InputAction::JumpEnd(Source::Pointer)),
        _ => None,
    }
}
