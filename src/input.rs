//! Key mapping from terminal events to game commands.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::game::Command;

/// Map a key press to a game command. Releases and repeats are ignored.
pub fn command_for_key(key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Right => Some(Command::MoveRight),
        KeyCode::Left => Some(Command::MoveLeft),
        KeyCode::Char(' ') => Some(Command::Rotate),
        KeyCode::Up | KeyCode::Down => Some(Command::SoftDrop),
        _ => None,
    }
}

pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q'))
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    #[test]
    fn arrow_keys_map_to_movement() {
        assert_eq!(
            command_for_key(KeyEvent::from(KeyCode::Right)),
            Some(Command::MoveRight)
        );
        assert_eq!(
            command_for_key(KeyEvent::from(KeyCode::Left)),
            Some(Command::MoveLeft)
        );
        assert_eq!(
            command_for_key(KeyEvent::from(KeyCode::Up)),
            Some(Command::SoftDrop)
        );
        assert_eq!(
            command_for_key(KeyEvent::from(KeyCode::Down)),
            Some(Command::SoftDrop)
        );
    }

    #[test]
    fn space_rotates() {
        assert_eq!(
            command_for_key(KeyEvent::from(KeyCode::Char(' '))),
            Some(Command::Rotate)
        );
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        assert_eq!(command_for_key(KeyEvent::from(KeyCode::Char('x'))), None);
        assert_eq!(command_for_key(KeyEvent::from(KeyCode::Enter)), None);
    }

    #[test]
    fn key_release_is_ignored() {
        let release = KeyEvent {
            code: KeyCode::Right,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(command_for_key(release), None);
    }

    #[test]
    fn quit_keys() {
        assert!(should_quit(KeyEvent::from(KeyCode::Char('q'))));
        assert!(should_quit(KeyEvent::from(KeyCode::Esc)));
        assert!(should_quit(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!should_quit(KeyEvent::from(KeyCode::Char('c'))));
        assert!(!should_quit(KeyEvent::from(KeyCode::Right)));
    }
}
