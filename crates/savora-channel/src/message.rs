//! Wire types for the notification channel.
//!
//! All frames are JSON text. The client sends exactly one message shape (the
//! authenticate frame); everything inbound is classified by sniffing fields
//! rather than deserializing into a closed enum, because the server is free
//! to introduce new message types the client should still surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound frame type that is consumed internally and never surfaced.
const AUTH_ACK_TYPE: &str = "authentication_success";

/// Fallback notification kind when the server omits `type`.
const DEFAULT_KIND: &str = "info";

/// Identity fields announced to the server once the transport opens.
///
/// The authenticate frame is sent only when at least one field is present;
/// an anonymous session skips authentication entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Consumer account id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Role of this session (e.g. "customer", "rider", "admin").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    /// Restaurant scope, for restaurant-dashboard sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<u64>,
}

impl Identity {
    /// Whether no identity field is set.
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none() && self.user_type.is_none() && self.restaurant_id.is_none()
    }

    /// Serialized authenticate frame for this identity. `None` for an
    /// anonymous session.
    pub fn authenticate_frame(&self) -> Option<String> {
        if self.is_anonymous() {
            return None;
        }

        #[derive(Serialize)]
        struct AuthFrame<'a> {
            r#type: &'static str,
            #[serde(flatten)]
            identity: &'a Identity,
        }

        serde_json::to_string(&AuthFrame { r#type: "authenticate", identity: self }).ok()
    }
}

/// One entry of the notification feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// Dismissal key. Taken from the frame; synthesized locally if absent.
    pub id: String,
    /// Notification category (e.g. "order_update").
    pub kind: String,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Server timestamp, verbatim. `None` if the frame carried none.
    pub timestamp: Option<String>,
}

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// `{"type":"authentication_success"}`; logged, never surfaced.
    AuthAck,
    /// Carries both `title` and `message`: joins the notification feed in
    /// addition to becoming the last message.
    Notification {
        /// The feed entry. Its id may still be empty if the frame carried
        /// none; the channel fills in a local one.
        message: NotificationMessage,
        /// The raw frame, kept for the last-message surface.
        raw: Value,
    },
    /// Any other JSON object; surfaced as the last message only.
    Other(Value),
}

impl Inbound {
    /// Classify a raw text frame. `None` if the text is not valid JSON.
    pub fn parse(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;

        if value.get("type").and_then(Value::as_str) == Some(AUTH_ACK_TYPE) {
            return Some(Self::AuthAck);
        }

        let title = field_string(&value, "title");
        let body = field_string(&value, "message");
        match (title, body) {
            (Some(title), Some(body)) => {
                let message = NotificationMessage {
                    id: field_string(&value, "id").unwrap_or_default(),
                    kind: field_string(&value, "type")
                        .unwrap_or_else(|| DEFAULT_KIND.to_string()),
                    title,
                    body,
                    timestamp: field_string(&value, "timestamp"),
                };
                Some(Self::Notification { message, raw: value })
            },
            _ => Some(Self::Other(value)),
        }
    }
}

/// String view of a field, accepting JSON strings and numbers (the server
/// sends numeric ids and epoch timestamps in some messages).
fn field_string(value: &Value, field: &str) -> Option<String> {
    match value.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
