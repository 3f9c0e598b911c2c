use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

use crate::backend::BackendClient;
use crate::config::Config;
use crate::session::{ChatSession, Preset, Role, TurnOutcome};
use crate::style::ResponseStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation
    pub session: ChatSession,
    pub backend: BackendClient,
    pub reply_task: Option<JoinHandle<TurnOutcome>>,

    // Input editing
    pub input_cursor: usize, // cursor position in session.pending_input, in chars

    // Transcript scroll
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of chat area, set during render
    pub chat_width: u16,  // inner width of chat area, for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Style picker state
    pub show_style_picker: bool,
    pub style_picker_state: ListState,

    // Time-window preset picker state
    pub show_preset_picker: bool,
    pub preset_picker_state: ListState,

    // Chat area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
}

impl App {
    pub fn new(session: ChatSession, backend: BackendClient) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            session,
            backend,
            reply_task: None,

            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            show_style_picker: false,
            style_picker_state: ListState::default(),

            show_preset_picker: false,
            preset_picker_state: ListState::default(),

            chat_area: None,
        }
    }

    /// Accept the pending input and spawn the backend request.
    ///
    /// The session enforces the guards (trimmed non-empty input, single
    /// outstanding request); a rejected send changes nothing.
    pub fn submit(&mut self) {
        let turn = match self.session.begin_send() {
            Some(turn) => turn,
            None => return,
        };
        self.input_cursor = 0;
        self.scroll_to_bottom();

        tracing::info!(style = turn.style.as_str(), "sending message");
        let backend = self.backend.clone();
        self.reply_task = Some(tokio::spawn(async move { backend.send(&turn).await }));
    }

    /// Resolve the outstanding turn if its task has finished
    pub async fn poll_reply(&mut self) {
        let finished = self
            .reply_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.reply_task.take() {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(error = %e, "reply task failed");
                    TurnOutcome::Unreachable
                }
            };
            self.session.resolve(outcome);
            if let Some(msg) = self.session.last_message() {
                tracing::debug!(text = %msg.text, "turn resolved");
            }
            self.scroll_to_bottom();
        }
    }

    /// Abort the in-flight request so nothing resolves after teardown
    pub fn abort_pending(&mut self) {
        if let Some(task) = self.reply_task.take() {
            task.abort();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_waiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Scroll the transcript so the newest message (or the "Thinking..."
    /// indicator) is visible.
    pub fn scroll_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.session.messages() {
            total_lines += 1; // Role line ("You:" or "Bot:")
            for line in msg.text.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.session.is_waiting() {
            total_lines += 2; // "Bot:" + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }

    // Style picker methods
    pub fn open_style_picker(&mut self) {
        let current_idx = ResponseStyle::all()
            .iter()
            .position(|s| *s == self.session.style)
            .unwrap_or(0);
        self.style_picker_state.select(Some(current_idx));
        self.show_style_picker = true;
    }

    pub fn style_picker_nav_down(&mut self) {
        let len = ResponseStyle::all().len();
        if len > 0 {
            let i = self.style_picker_state.selected().unwrap_or(0);
            self.style_picker_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn style_picker_nav_up(&mut self) {
        let i = self.style_picker_state.selected().unwrap_or(0);
        self.style_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_style(&mut self) {
        if let Some(i) = self.style_picker_state.selected() {
            if let Some(&style) = ResponseStyle::all().get(i) {
                self.session.style = style;
                self.show_style_picker = false;
                // Save to config
                let _ = Config::save_style(style);
            }
        }
    }

    // Preset picker methods
    pub fn open_preset_picker(&mut self) {
        self.preset_picker_state.select(Some(0));
        self.show_preset_picker = true;
    }

    pub fn preset_picker_nav_down(&mut self) {
        let len = Preset::all().len();
        if len > 0 {
            let i = self.preset_picker_state.selected().unwrap_or(0);
            self.preset_picker_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn preset_picker_nav_up(&mut self) {
        let i = self.preset_picker_state.selected().unwrap_or(0);
        self.preset_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn apply_selected_preset(&mut self) {
        if let Some(i) = self.preset_picker_state.selected() {
            if let Some(preset) = Preset::all().get(i) {
                self.session.window = preset.window();
                self.show_preset_picker = false;
            }
        }
    }

    pub fn clear_time_window(&mut self) {
        self.session.window.clear();
    }

    /// Count of bot replies received this session, shown in the header
    pub fn bot_reply_count(&self) -> usize {
        self.session
            .messages()
            .iter()
            .filter(|m| m.role == Role::Bot)
            .count()
            .saturating_sub(1) // welcome message doesn't count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let session = ChatSession::new("t".to_string(), ResponseStyle::Default);
        App::new(session, BackendClient::new("http://localhost:8000"))
    }

    #[test]
    fn test_animation_only_advances_while_waiting() {
        let mut app = app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.session.pending_input = "hi".to_string();
        app.session.begin_send().unwrap();
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 2);
    }

    #[test]
    fn test_preset_picker_applies_window() {
        let mut app = app();
        app.open_preset_picker();
        app.preset_picker_nav_down();
        app.apply_selected_preset();
        assert!(!app.show_preset_picker);
        assert_eq!(app.session.window, Preset::all()[1].window());

        app.clear_time_window();
        assert!(!app.session.window.is_set());
    }

    #[test]
    fn test_style_picker_opens_on_current_style_and_clamps() {
        let mut app = app();
        app.session.style = ResponseStyle::Friendly;
        app.open_style_picker();
        let friendly_idx = ResponseStyle::all()
            .iter()
            .position(|s| *s == ResponseStyle::Friendly)
            .unwrap();
        assert_eq!(app.style_picker_state.selected(), Some(friendly_idx));

        for _ in 0..10 {
            app.style_picker_nav_down();
        }
        assert_eq!(
            app.style_picker_state.selected(),
            Some(ResponseStyle::all().len() - 1)
        );
        for _ in 0..10 {
            app.style_picker_nav_up();
        }
        assert_eq!(app.style_picker_state.selected(), Some(0));
    }

    #[test]
    fn test_bot_reply_count_excludes_welcome() {
        let mut app = app();
        assert_eq!(app.bot_reply_count(), 0);
        app.session.pending_input = "hi".to_string();
        app.session.begin_send().unwrap();
        app.session.resolve(TurnOutcome::Reply("hello".to_string()));
        assert_eq!(app.bot_reply_count(), 1);
    }
}
