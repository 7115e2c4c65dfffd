use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{truncate_chars, ExchangeError};
use crate::fallback::FallbackResponder;
use crate::monitor::{endpoint, Connectivity};

pub const CONVERSATION_PATH: &str = "/conversar";

pub const ASSISTANT_LABEL: &str = "Saulo";
pub const SIMULATED_LABEL: &str = "Saulo (simulado)";
pub const BLOCKED_LABEL: &str = "Saulo (bloqueado)";

/// Characters of an unexpected payload shown in a degraded reply.
pub const DUMP_LIMIT: usize = 300;

#[derive(Serialize, Debug, PartialEq, Eq)]
struct ConversationRequest<'a> {
    user_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    comando_especial: Option<&'a str>,
}

impl<'a> ConversationRequest<'a> {
    fn new(user_id: &'a str, input: &'a str) -> Self {
        match split_command(input) {
            Some((command, rest)) => Self {
                user_id,
                text: rest,
                comando_especial: Some(command),
            },
            None => Self {
                user_id,
                text: input,
                comando_especial: None,
            },
        }
    }
}

/// Split `/estado melancolico` into (`/estado`, `melancolico`).
fn split_command(input: &str) -> Option<(&str, &str)> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    let (command, rest) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    if command.len() < 2 {
        return None;
    }
    Some((command, rest.trim()))
}

/// Extra fields the agent reports alongside its reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentStatus {
    pub state: Option<String>,
    pub ontological: Option<bool>,
    pub counter: Option<u64>,
    pub blocked: Option<bool>,
}

impl AgentStatus {
    /// Read whatever extras are present; ill-typed ones are skipped.
    fn from_value(value: &Value) -> Self {
        Self {
            state: value
                .get("estado_actual")
                .and_then(Value::as_str)
                .map(str::to_string),
            ontological: value.get("es_ontologico").and_then(Value::as_bool),
            counter: value.get("contador_estado").and_then(Value::as_u64),
            blocked: value.get("bloqueado").and_then(Value::as_bool),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.unwrap_or(false)
    }
}

/// How a reply was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The endpoint answered with a `text` field.
    Delivered,
    /// The endpoint answered, but the payload lacked a usable `text` field.
    Degraded,
    /// The endpoint could not be used; the reply was generated locally.
    Simulated { cause: String },
}

/// Something displayable, whatever happened on the wire.
#[derive(Debug, Clone)]
pub struct Reply {
    pub sender_label: String,
    pub display_text: String,
    pub outcome: Outcome,
    pub status: Option<AgentStatus>,
}

impl Reply {
    pub fn simulated(&self) -> bool {
        matches!(self.outcome, Outcome::Simulated { .. })
    }
}

enum Answer {
    Text { text: String, status: AgentStatus },
    Unexpected(Value),
}

#[derive(Clone)]
pub struct MessageDispatcher {
    client: Client,
    base_url: String,
    fallback: FallbackResponder,
    connectivity: Option<Connectivity>,
}

impl MessageDispatcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
            fallback: FallbackResponder::new(),
            connectivity: None,
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackResponder) -> Self {
        self.fallback = fallback;
        self
    }

    /// Attach the shared connectivity flag. It is only logged; sends are
    /// attempted regardless of its value.
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Send `text` on behalf of `user_id`. Never fails: transport, status and
    /// parse errors produce a simulated reply, a payload without `text`
    /// produces a degraded one.
    pub async fn send(&self, user_id: &str, text: &str) -> Reply {
        if let Some(connectivity) = &self.connectivity {
            debug!(connectivity = connectivity.current().as_str(), "dispatching message");
        }

        match self.exchange(user_id, text).await {
            Ok(Answer::Text { text, status }) => {
                let sender_label = if status.is_blocked() {
                    BLOCKED_LABEL
                } else {
                    ASSISTANT_LABEL
                };
                Reply {
                    sender_label: sender_label.to_string(),
                    display_text: text,
                    outcome: Outcome::Delivered,
                    status: Some(status),
                }
            }
            Ok(Answer::Unexpected(value)) => {
                let status = AgentStatus::from_value(&value);
                let dump = truncate_chars(&value.to_string(), DUMP_LIMIT);
                warn!(payload = %dump, "reply is missing the text field");
                Reply {
                    sender_label: ASSISTANT_LABEL.to_string(),
                    display_text: format!(
                        "Respuesta inesperada del servidor:\n```\n{dump}\n```"
                    ),
                    outcome: Outcome::Degraded,
                    status: Some(status),
                }
            }
            Err(err) => {
                warn!(kind = err.kind(), error = %err, "exchange failed, simulating reply");
                let display_text = self.fallback.simulate(text).await;
                Reply {
                    sender_label: SIMULATED_LABEL.to_string(),
                    display_text,
                    outcome: Outcome::Simulated {
                        cause: err.to_string(),
                    },
                    status: None,
                }
            }
        }
    }

    async fn exchange(&self, user_id: &str, text: &str) -> Result<Answer, ExchangeError> {
        let url = endpoint(&self.base_url, CONVERSATION_PATH);
        let request = ConversationRequest::new(user_id, text);
        if let Some(command) = request.comando_especial {
            info!(command, "sending special command");
        }

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        // Read as text first so an unparsable body can be reported verbatim.
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ExchangeError::remote(status.as_u16(), &body));
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|source| ExchangeError::malformed(&body, source))?;

        Ok(match value.get("text").and_then(Value::as_str) {
            Some(reply) => Answer::Text {
                text: reply.to_string(),
                status: AgentStatus::from_value(&value),
            },
            None => Answer::Unexpected(value),
        })
    }
}
