use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::App;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        // The next draw picks up the new size
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(),
        AppEvent::Stream(event) => app.on_stream_event(event),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => {
                app.cancel_request();
                app.should_quit = true;
            }
            KeyCode::Char('u') => app.scroll(-(app.page() / 2)),
            KeyCode::Char('d') => app.scroll(app.page() / 2),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Enter => app.submit(),

        // Esc stops a running request, otherwise clears the input
        KeyCode::Esc => {
            if app.state.is_busy() {
                app.cancel_request();
            } else {
                app.state.input.clear();
                app.state.cursor = 0;
            }
        }

        // Direction is part of the form, so it's fixed while a request runs
        KeyCode::Tab | KeyCode::BackTab => {
            if !app.state.is_busy() {
                app.toggle_direction();
            }
        }

        // Log scrolling
        KeyCode::Up => app.scroll(-1),
        KeyCode::Down => app.scroll(1),
        KeyCode::PageUp => app.scroll(-app.page()),
        KeyCode::PageDown => app.scroll(app.page()),

        // Input editing
        KeyCode::Backspace => app.state.backspace(),
        KeyCode::Delete => app.state.delete(),
        KeyCode::Left => app.state.cursor_left(),
        KeyCode::Right => app.state.cursor_right(),
        KeyCode::Home => app.state.cursor_home(),
        KeyCode::End => app.state.cursor_end(),
        KeyCode::Char(c) => app.state.insert_char(c),

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doggo_core::{Config, Direction};
    use tokio::sync::mpsc;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn test_app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(Config::new(), tx)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c))).unwrap();
        }
    }

    #[tokio::test]
    async fn test_typing_and_editing() {
        let mut app = test_app();
        type_text(&mut app, "bork");
        handle_event(&mut app, key(KeyCode::Left)).unwrap();
        handle_event(&mut app, key(KeyCode::Backspace)).unwrap();
        assert_eq!(app.state.input, "bok");

        handle_event(&mut app, key(KeyCode::Esc)).unwrap();
        assert!(app.state.input.is_empty());
        assert_eq!(app.state.cursor, 0);
    }

    #[tokio::test]
    async fn test_enter_on_empty_input_shows_alert() {
        let mut app = test_app();
        handle_event(&mut app, key(KeyCode::Enter)).unwrap();

        assert!(!app.state.is_busy());
        assert!(app.state.alert.is_shown());
    }

    #[tokio::test]
    async fn test_ctrl_c_quits() {
        let mut app = test_app();
        let event = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        handle_event(&mut app, event).unwrap();

        assert!(app.should_quit);
        assert!(app.state.input.is_empty());
    }

    #[tokio::test]
    async fn test_tab_blocked_while_busy() {
        let mut app = test_app();
        assert_eq!(app.state.direction, Direction::EngToDoggo);

        app.state.begin_request(&doggo_core::ChatRequest {
            message: "hi".to_string(),
            direction: Direction::EngToDoggo,
        });
        handle_event(&mut app, key(KeyCode::Tab)).unwrap();
        assert_eq!(app.state.direction, Direction::EngToDoggo);
    }
}
