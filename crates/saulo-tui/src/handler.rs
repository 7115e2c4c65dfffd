use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::App;
use crate::tui::AppEvent;

const WHEEL_LINES: u16 = 3;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }

    app.poll_send().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('d') => app.scroll_half_page_down(),
            KeyCode::Char('u') => app.scroll_half_page_up(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => app.submit(),

        // Transcript scrolling
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::PageDown => app.scroll_half_page_down(),

        // Line editing
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(WHEEL_LINES),
        MouseEventKind::ScrollUp => app.scroll_up(WHEEL_LINES),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use saulo_core::{Connectivity, Conversation, MessageDispatcher};

    fn app() -> App {
        let dispatcher = MessageDispatcher::new("http://127.0.0.1:1");
        App::with_conversation(Conversation::new("u1", dispatcher), Connectivity::new())
    }

    fn key(code: KeyCode) -> AppEvent {
        key_with(code, KeyModifiers::NONE)
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        assert_eq!(char_to_byte_index("año", 0), 0);
        assert_eq!(char_to_byte_index("año", 2), 3);
        assert_eq!(char_to_byte_index("año", 3), 4);
        assert_eq!(char_to_byte_index("año", 10), 4);
    }

    #[tokio::test]
    async fn test_typing_and_editing_accented_text() {
        let mut app = app();
        type_text(&mut app, "canción").await;
        assert_eq!(app.input, "canción");
        assert_eq!(app.cursor, 7);

        handle_event(&mut app, key(KeyCode::Left)).await.unwrap();
        handle_event(&mut app, key(KeyCode::Backspace)).await.unwrap();
        assert_eq!(app.input, "cancin");

        handle_event(&mut app, key(KeyCode::Home)).await.unwrap();
        handle_event(&mut app, key(KeyCode::Delete)).await.unwrap();
        assert_eq!(app.input, "ancin");
        assert_eq!(app.cursor, 0);

        handle_event(&mut app, key(KeyCode::End)).await.unwrap();
        assert_eq!(app.cursor, 5);
    }

    #[tokio::test]
    async fn test_enter_submits_input() {
        let mut app = app();
        type_text(&mut app, "hola").await;
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert!(app.input.is_empty());
        assert!(app.is_sending());
        assert_eq!(app.conversation.transcript().last().unwrap().raw_text(), "hola");
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = app();
        handle_event(&mut app, key_with(KeyCode::Char('c'), KeyModifiers::CONTROL))
            .await
            .unwrap();
        assert!(app.should_quit);
        assert!(app.input.is_empty());

        let mut other = self::app();
        handle_event(&mut other, key(KeyCode::Esc)).await.unwrap();
        assert!(other.should_quit);
    }

    #[tokio::test]
    async fn test_wheel_scrolls_transcript() {
        let mut app = app();
        app.max_scroll = 20;
        app.chat_scroll = 20;

        let wheel = |kind| {
            AppEvent::Mouse(MouseEvent {
                kind,
                column: 0,
                row: 0,
                modifiers: KeyModifiers::NONE,
            })
        };

        handle_event(&mut app, wheel(MouseEventKind::ScrollUp)).await.unwrap();
        assert_eq!(app.chat_scroll, 17);
        assert!(!app.follow_tail);

        handle_event(&mut app, wheel(MouseEventKind::ScrollDown)).await.unwrap();
        assert_eq!(app.chat_scroll, 20);
        assert!(app.follow_tail);
    }
}
