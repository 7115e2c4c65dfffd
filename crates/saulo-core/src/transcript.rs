//! UI-agnostic transcript types
//!
//! The transcript is the ordered list of messages a front-end displays. Each
//! message carries its HTML rendering, computed once when it is appended.

use chrono::Local;

use crate::dispatcher::Reply;
use crate::escape::escape_html;
use crate::markdown::render_markdown;

pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Who a transcript entry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Assistant,
    System,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::User => "user",
            Origin::Assistant => "assistant",
            Origin::System => "system",
        }
    }

    pub fn default_label(&self) -> &'static str {
        match self {
            Origin::User => "Tú",
            Origin::Assistant => "Saulo",
            Origin::System => "Sistema",
        }
    }
}

/// A single transcript entry. Immutable once created.
#[derive(Debug, Clone)]
pub struct Message {
    origin: Origin,
    sender_label: String,
    raw_text: String,
    rendered_html: String,
    timestamp: String,
    simulated: bool,
}

impl Message {
    fn new(origin: Origin, raw_text: String, sender_label: Option<&str>) -> Self {
        // User text is never markdown-rendered, only escaped.
        let rendered_html = match origin {
            Origin::User => escape_html(&raw_text),
            Origin::Assistant | Origin::System => render_markdown(&raw_text),
        };

        Self {
            origin,
            sender_label: sender_label
                .unwrap_or_else(|| origin.default_label())
                .to_string(),
            raw_text,
            rendered_html,
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            simulated: false,
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn sender_label(&self) -> &str {
        &self.sender_label
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn rendered_html(&self) -> &str {
        &self.rendered_html
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// True when the text was generated locally instead of by the endpoint.
    pub fn simulated(&self) -> bool {
        self.simulated
    }
}

/// Append-only, insertion-ordered list of messages.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        origin: Origin,
        raw_text: impl Into<String>,
        sender_label: Option<&str>,
    ) -> &Message {
        self.push(Message::new(origin, raw_text.into(), sender_label))
    }

    /// Append a dispatcher reply as an assistant message.
    pub fn append_reply(&mut self, reply: &Reply) -> &Message {
        let mut message = Message::new(
            Origin::Assistant,
            reply.display_text.clone(),
            Some(reply.sender_label.as_str()),
        );
        message.simulated = reply.simulated();
        self.push(message)
    }

    fn push(&mut self, message: Message) -> &Message {
        let index = self.messages.len();
        self.messages.push(message);
        &self.messages[index]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
