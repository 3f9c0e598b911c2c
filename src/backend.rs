use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::session::{Outbound, TimeWindow, TurnOutcome};

#[derive(Serialize)]
struct MessageRequest<'a> {
    session_id: &'a str,
    message: &'a str,
    style: &'a str,
}

#[derive(Deserialize)]
struct MessageReply {
    reply: Option<String>,
    message: Option<String>,
}

/// Extract the reply text from a 2xx response body.
///
/// The backend answers with `reply`; older deployments used `message`.
/// `None` means the body was valid JSON with neither field.
fn reply_text(body: &str) -> Result<Option<String>, serde_json::Error> {
    let parsed: MessageReply = serde_json::from_str(body)?;
    Ok(parsed.reply.or(parsed.message))
}

/// Time-window values become query parameters, matching the backend's
/// `start_time` / `end_time` filter.
fn window_query(window: &TimeWindow) -> Vec<(&'static str, &str)> {
    let mut query = Vec::new();
    if let Some(start) = window.start.as_deref() {
        query.push(("start_time", start));
    }
    if let Some(end) = window.end.as_deref() {
        query.push(("end_time", end));
    }
    query
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one turn to the concierge backend.
    ///
    /// Never fails: every network outcome is folded into a `TurnOutcome`
    /// so the caller always resolves the turn. No timeout and no retry,
    /// one request per accepted send.
    pub async fn send(&self, turn: &Outbound) -> TurnOutcome {
        let url = format!("{}/v1/message", self.base_url);

        let request = MessageRequest {
            session_id: &turn.session_id,
            message: &turn.message,
            style: turn.style.as_str(),
        };

        let query = window_query(&turn.window);
        let mut builder = self.client.post(&url).json(&request);
        if !query.is_empty() {
            builder = builder.query(&query);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, url = %url, "backend unreachable");
                return TurnOutcome::Unreachable;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            };
            tracing::warn!(status = status.as_u16(), "backend returned error status");
            return TurnOutcome::ServerError { status: status.as_u16(), body };
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read response body");
                return TurnOutcome::Unreachable;
            }
        };

        match reply_text(&body) {
            Ok(Some(text)) => TurnOutcome::Reply(text),
            Ok(None) => {
                tracing::warn!("response carried no reply field");
                TurnOutcome::NoReply
            }
            Err(e) => {
                tracing::warn!(error = %e, "response body was not valid JSON");
                TurnOutcome::Unreachable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::ResponseStyle;

    #[test]
    fn test_reply_field_is_extracted() {
        let text = reply_text(r#"{"reply": "X"}"#).unwrap();
        assert_eq!(text.as_deref(), Some("X"));
    }

    #[test]
    fn test_message_field_is_accepted_as_fallback() {
        let text = reply_text(r#"{"message": "hello"}"#).unwrap();
        assert_eq!(text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_reply_wins_over_message() {
        let text = reply_text(r#"{"reply": "a", "message": "b"}"#).unwrap();
        assert_eq!(text.as_deref(), Some("a"));
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        // The backend also returns a context array; the client ignores it
        let text = reply_text(r#"{"reply": "ok", "context": [{"id": 3}]}"#).unwrap();
        assert_eq!(text.as_deref(), Some("ok"));
    }

    #[test]
    fn test_missing_reply_field_yields_none() {
        let text = reply_text(r#"{"status": "ok"}"#).unwrap();
        assert!(text.is_none());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(reply_text("<html>502</html>").is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let client = BackendClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_request_body_shape() {
        let request = MessageRequest {
            session_id: "s-1",
            message: "hi",
            style: ResponseStyle::Concierge.as_str(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["session_id"], "s-1");
        assert_eq!(json["message"], "hi");
        assert_eq!(json["style"], "concierge");
    }

    #[test]
    fn test_window_maps_to_query_pairs() {
        let window = TimeWindow {
            start: Some("2025-10-04T09:00".to_string()),
            end: None,
        };
        assert_eq!(window_query(&window), vec![("start_time", "2025-10-04T09:00")]);

        let empty = TimeWindow::default();
        assert!(window_query(&empty).is_empty());
    }
}
