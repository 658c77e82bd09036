//! Key binding dispatch for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::app::Screen;

/// Rows skipped by PageUp/PageDown.
pub const PAGE_SIZE: usize = 10;

/// What a key press means on the current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
    Select,
    Back,
    Copy,
    Quit,
}

/// Map a key event to an action. `None` for unbound keys.
pub fn action_for(screen: &Screen, key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    // Global bindings
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(Action::Quit);
        }
        KeyCode::Char('q') => return Some(Action::Quit),
        KeyCode::Char('j') | KeyCode::Down => return Some(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => return Some(Action::Up),
        KeyCode::PageDown => return Some(Action::PageDown),
        KeyCode::PageUp => return Some(Action::PageUp),
        KeyCode::Char('g') | KeyCode::Home => return Some(Action::Top),
        KeyCode::Char('G') | KeyCode::End => return Some(Action::Bottom),
        _ => {}
    }

    // Screen-specific bindings
    match screen {
        Screen::Topics => match key.code {
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => Some(Action::Select),
            _ => None,
        },
        Screen::Messages { .. } => match key.code {
            KeyCode::Char('o') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Back)
            }
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left => Some(Action::Back),
            KeyCode::Char('y') => Some(Action::Copy),
            _ => None,
        },
    }
}
