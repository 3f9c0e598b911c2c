//! UI-agnostic conversation state
//!
//! This module contains the transcript and the per-turn send/resolve logic,
//! independent of any UI framework or network client. The TUI drives it
//! through `begin_send` and `resolve`; tests drive it the same way.

use serde::{Deserialize, Serialize};

use crate::style::ResponseStyle;

pub const WELCOME_TEXT: &str = "Hello! Ask me about the event weekend.";
pub const UNREACHABLE_TEXT: &str = "Error: could not reach the backend (is it running?).";
pub const NO_REPLY_TEXT: &str = "No reply received.";

/// A chat message in the conversation transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub text: String,
}

/// The role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Bot,
}

/// Optional event-time filter forwarded with each request.
///
/// Values stay opaque `YYYY-MM-DDTHH:MM` strings; the backend parses them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl TimeWindow {
    pub fn is_set(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
    }
}

/// A fixed time-window shortcut shown in the preset picker
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub label: &'static str,
    pub start: &'static str,
    pub end: &'static str,
}

impl Preset {
    pub fn all() -> Vec<Preset> {
        vec![
            Preset { label: "Saturday Morning", start: "2025-10-04T09:00", end: "2025-10-04T12:00" },
            Preset { label: "Saturday Afternoon", start: "2025-10-04T12:00", end: "2025-10-04T17:00" },
            Preset { label: "Sunday Morning", start: "2025-10-05T09:00", end: "2025-10-05T12:00" },
            Preset { label: "Sunday Afternoon", start: "2025-10-05T12:00", end: "2025-10-05T17:00" },
        ]
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: Some(self.start.to_string()),
            end: Some(self.end.to_string()),
        }
    }
}

/// Payload for one accepted send, handed to the backend client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub session_id: String,
    pub message: String,
    pub style: ResponseStyle,
    pub window: TimeWindow,
}

/// How a turn resolved. Every variant appends one bot message and clears
/// the waiting flag; nothing here is fatal to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// 2xx response carrying a reply text
    Reply(String),
    /// Non-2xx response; body falls back to the status reason when empty
    ServerError { status: u16, body: String },
    /// Request could not be completed (connect failure, invalid body)
    Unreachable,
    /// 2xx response whose JSON carried no reply field
    NoReply,
}

/// One conversation: transcript, pending input, and the single-turn
/// request gate.
pub struct ChatSession {
    session_id: String,
    messages: Vec<Message>,
    pub pending_input: String,
    pub style: ResponseStyle,
    pub window: TimeWindow,
    waiting: bool,
    next_id: u64,
}

impl ChatSession {
    pub fn new(session_id: String, style: ResponseStyle) -> Self {
        let mut session = Self {
            session_id,
            messages: Vec::new(),
            pending_input: String::new(),
            style,
            window: TimeWindow::default(),
            waiting: false,
            next_id: 0,
        };
        session.push(Role::Bot, WELCOME_TEXT.to_string());
        session
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// Accept the pending input as a new turn.
    ///
    /// Returns the request payload, or `None` when the trimmed input is
    /// empty or a request is already outstanding. The guard runs before
    /// any mutation, so a rejected send leaves the transcript and the
    /// input buffer untouched.
    pub fn begin_send(&mut self) -> Option<Outbound> {
        if self.waiting {
            return None;
        }
        let text = self.pending_input.trim();
        if text.is_empty() {
            return None;
        }

        let text = text.to_string();
        self.pending_input.clear();
        self.push(Role::User, text.clone());
        self.waiting = true;

        Some(Outbound {
            session_id: self.session_id.clone(),
            message: text,
            style: self.style,
            window: self.window.clone(),
        })
    }

    /// Finish the outstanding turn. Appends exactly one bot message and
    /// clears the waiting flag on every path.
    pub fn resolve(&mut self, outcome: TurnOutcome) {
        let text = match outcome {
            TurnOutcome::Reply(text) => text,
            TurnOutcome::ServerError { status, body } => format!("Error {}: {}", status, body),
            TurnOutcome::Unreachable => UNREACHABLE_TEXT.to_string(),
            TurnOutcome::NoReply => NO_REPLY_TEXT.to_string(),
        };
        self.push(Role::Bot, text);
        self.waiting = false;
    }

    fn push(&mut self, role: Role, text: String) {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message { id, role, text });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ChatSession {
        ChatSession::new("test-session".to_string(), ResponseStyle::Default)
    }

    #[test]
    fn test_starts_with_welcome_message() {
        let session = session();
        assert_eq!(session.messages().len(), 1);
        let first = &session.messages()[0];
        assert_eq!(first.role, Role::Bot);
        assert_eq!(first.text, WELCOME_TEXT);
        assert!(!session.is_waiting());
    }

    #[test]
    fn test_send_appends_one_user_then_one_bot_message() {
        let mut session = session();
        session.pending_input = "what's on saturday?".to_string();

        let turn = session.begin_send().expect("send should be accepted");
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.last_message().unwrap().role, Role::User);
        assert_eq!(session.last_message().unwrap().text, "what's on saturday?");
        assert_eq!(turn.message, "what's on saturday?");
        assert!(session.pending_input.is_empty());

        session.resolve(TurnOutcome::Reply("Lots!".to_string()));
        assert_eq!(session.messages().len(), 3);
    }

    #[test]
    fn test_empty_input_is_a_no_op() {
        let mut session = session();
        assert!(session.begin_send().is_none());
        assert_eq!(session.messages().len(), 1);
        assert!(!session.is_waiting());
    }

    #[test]
    fn test_whitespace_only_input_is_a_no_op() {
        let mut session = session();
        session.pending_input = "   \t  ".to_string();
        assert!(session.begin_send().is_none());
        assert_eq!(session.messages().len(), 1);
        assert!(!session.is_waiting());
        // A rejected send must not clear what the user typed
        assert_eq!(session.pending_input, "   \t  ");
    }

    #[test]
    fn test_input_is_trimmed_before_sending() {
        let mut session = session();
        session.pending_input = "  hello  ".to_string();
        let turn = session.begin_send().unwrap();
        assert_eq!(turn.message, "hello");
        assert_eq!(session.last_message().unwrap().text, "hello");
    }

    #[test]
    fn test_second_send_while_waiting_is_rejected() {
        let mut session = session();
        session.pending_input = "first".to_string();
        assert!(session.begin_send().is_some());

        session.pending_input = "second".to_string();
        assert!(session.begin_send().is_none());
        // Nothing appended, input untouched
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.pending_input, "second");
    }

    #[test]
    fn test_reply_becomes_last_bot_message() {
        let mut session = session();
        session.pending_input = "hi".to_string();
        session.begin_send().unwrap();

        session.resolve(TurnOutcome::Reply("X".to_string()));
        let last = session.last_message().unwrap();
        assert_eq!(last.role, Role::Bot);
        assert_eq!(last.text, "X");
    }

    #[test]
    fn test_server_error_surfaces_status_and_body() {
        let mut session = session();
        session.pending_input = "hi".to_string();
        session.begin_send().unwrap();

        session.resolve(TurnOutcome::ServerError { status: 500, body: "oops".to_string() });
        let last = session.last_message().unwrap();
        assert_eq!(last.role, Role::Bot);
        assert!(last.text.contains("500"));
        assert!(last.text.contains("oops"));
    }

    #[test]
    fn test_unreachable_surfaces_generic_connectivity_text() {
        let mut session = session();
        session.pending_input = "hi".to_string();
        session.begin_send().unwrap();

        session.resolve(TurnOutcome::Unreachable);
        assert_eq!(session.last_message().unwrap().text, UNREACHABLE_TEXT);
    }

    #[test]
    fn test_missing_reply_field_surfaces_placeholder() {
        let mut session = session();
        session.pending_input = "hi".to_string();
        session.begin_send().unwrap();

        session.resolve(TurnOutcome::NoReply);
        assert_eq!(session.last_message().unwrap().text, NO_REPLY_TEXT);
    }

    #[test]
    fn test_waiting_flag_spans_send_to_resolution_on_every_path() {
        let outcomes = vec![
            TurnOutcome::Reply("ok".to_string()),
            TurnOutcome::ServerError { status: 502, body: "bad gateway".to_string() },
            TurnOutcome::Unreachable,
            TurnOutcome::NoReply,
        ];
        for outcome in outcomes {
            let mut session = session();
            assert!(!session.is_waiting());
            session.pending_input = "hi".to_string();
            session.begin_send().unwrap();
            assert!(session.is_waiting());
            session.resolve(outcome);
            assert!(!session.is_waiting());
        }
    }

    #[test]
    fn test_message_ids_are_strictly_increasing() {
        let mut session = session();
        for text in ["one", "two", "three"] {
            session.pending_input = text.to_string();
            session.begin_send().unwrap();
            session.resolve(TurnOutcome::Reply(format!("re: {}", text)));
        }
        let ids: Vec<u64> = session.messages().iter().map(|m| m.id).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1], "ids not increasing: {:?}", ids);
        }
    }

    #[test]
    fn test_style_and_window_pass_through_unaltered() {
        let mut session = ChatSession::new("s-1".to_string(), ResponseStyle::TourGuide);
        session.window = Preset::all()[0].window();
        session.pending_input = "anything outdoors?".to_string();

        let turn = session.begin_send().unwrap();
        assert_eq!(turn.session_id, "s-1");
        assert_eq!(turn.style, ResponseStyle::TourGuide);
        assert_eq!(turn.window.start.as_deref(), Some("2025-10-04T09:00"));
        assert_eq!(turn.window.end.as_deref(), Some("2025-10-04T12:00"));
    }

    #[test]
    fn test_time_window_set_and_clear() {
        let mut window = TimeWindow::default();
        assert!(!window.is_set());
        window.start = Some("2025-10-05T09:00".to_string());
        assert!(window.is_set());
        window.clear();
        assert!(!window.is_set());
    }
}
