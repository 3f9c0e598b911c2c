use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key)?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    // Popups swallow keys while open
    if app.show_style_picker {
        handle_style_picker(app, key);
        return Ok(());
    }
    if app.show_preset_picker {
        handle_preset_picker(app, key);
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }

    Ok(())
}

fn handle_style_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_style_picker = false;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.style_picker_nav_down();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.style_picker_nav_up();
        }
        KeyCode::Enter => {
            app.select_style();
        }
        _ => {}
    }
}

fn handle_preset_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_preset_picker = false;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.preset_picker_nav_down();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.preset_picker_nav_up();
        }
        KeyCode::Enter => {
            app.apply_selected_preset();
        }
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') => app.chat_scroll = 0,
        KeyCode::Char('G') => app.scroll_to_bottom(),

        // Style picker
        KeyCode::Char('S') => app.open_style_picker(),

        // Time-window presets
        KeyCode::Char('t') => app.open_preset_picker(),
        KeyCode::Char('x') => app.clear_time_window(),

        // Back to typing
        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
            app.input_cursor = app.session.pending_input.chars().count();
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            // Guards live in the session: no-op when empty or waiting
            app.submit();
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.session.pending_input, app.input_cursor);
                app.session.pending_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.session.pending_input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.session.pending_input, app.input_cursor);
                app.session.pending_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.session.pending_input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.session.pending_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.session.pending_input, app.input_cursor);
            app.session.pending_input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: ratatui::layout::Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            app.scroll_down();
            app.scroll_down();
            app.scroll_down();
        }
        MouseEventKind::ScrollUp => {
            app.scroll_up();
            app.scroll_up();
            app.scroll_up();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendClient;
    use crate::session::ChatSession;
    use crate::style::ResponseStyle;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        let session = ChatSession::new("t".to_string(), ResponseStyle::Default);
        App::new(session, BackendClient::new("http://localhost:8000"))
    }

    #[test]
    fn test_char_to_byte_index_handles_multibyte() {
        let s = "héllo";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3); // past the two-byte é
        assert_eq!(char_to_byte_index(s, 99), s.len());
    }

    #[test]
    fn test_editing_inserts_at_cursor() {
        let mut app = app();
        for c in "héllo".chars() {
            handle_key(&mut app, key(KeyCode::Char(c))).unwrap();
        }
        handle_key(&mut app, key(KeyCode::Left)).unwrap();
        handle_key(&mut app, key(KeyCode::Left)).unwrap();
        handle_key(&mut app, key(KeyCode::Char('x'))).unwrap();
        assert_eq!(app.session.pending_input, "hélxlo");

        handle_key(&mut app, key(KeyCode::Backspace)).unwrap();
        assert_eq!(app.session.pending_input, "héllo");
    }

    #[tokio::test]
    async fn test_enter_sends_once_and_gates_reentry() {
        let mut app = app();
        for c in "hello".chars() {
            handle_key(&mut app, key(KeyCode::Char(c))).unwrap();
        }
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();
        assert!(app.session.is_waiting());
        assert!(app.reply_task.is_some());
        assert_eq!(app.session.messages().len(), 2);

        // A second Enter while waiting must not start another request
        for c in "again".chars() {
            handle_key(&mut app, key(KeyCode::Char(c))).unwrap();
        }
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.session.messages().len(), 2);
        assert_eq!(app.session.pending_input, "again");

        app.abort_pending();
    }

    #[tokio::test]
    async fn test_enter_on_empty_input_is_a_no_op() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();
        assert!(!app.session.is_waiting());
        assert!(app.reply_task.is_none());
        assert_eq!(app.session.messages().len(), 1);
    }

    #[test]
    fn test_picker_keys_are_swallowed_while_open() {
        let mut app = app();
        app.open_preset_picker();
        handle_key(&mut app, key(KeyCode::Char('q'))).unwrap();
        assert!(!app.should_quit);
        handle_key(&mut app, key(KeyCode::Esc)).unwrap();
        assert!(!app.show_preset_picker);
    }
}
