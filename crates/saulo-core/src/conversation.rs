use crate::dispatcher::{MessageDispatcher, Reply};
use crate::transcript::{Message, Origin, Transcript};

/// A transcript bound to one user and one dispatcher.
///
/// `submit` takes `&mut self`, so a caller holding the conversation can never
/// have two sends in flight. Front-ends that run the send in a background task
/// use `push_user` / `push_reply` around it instead.
pub struct Conversation {
    user_id: String,
    dispatcher: MessageDispatcher,
    transcript: Transcript,
}

impl Conversation {
    pub fn new(user_id: &str, dispatcher: MessageDispatcher) -> Self {
        Self {
            user_id: user_id.to_string(),
            dispatcher,
            transcript: Transcript::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn dispatcher(&self) -> &MessageDispatcher {
        &self.dispatcher
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn push_user(&mut self, text: &str) -> &Message {
        self.transcript.append(Origin::User, text, None)
    }

    pub fn push_reply(&mut self, reply: &Reply) -> &Message {
        self.transcript.append_reply(reply)
    }

    pub fn push_system(&mut self, text: &str) -> &Message {
        self.transcript.append(Origin::System, text, None)
    }

    /// Append the user's message, send it, and append whatever comes back.
    pub async fn submit(&mut self, text: &str) -> &Message {
        self.push_user(text);
        let reply = self.dispatcher.send(&self.user_id, text).await;
        self.push_reply(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FallbackResponder;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn instant_fallback() -> FallbackResponder {
        FallbackResponder::seeded(11).with_delay(Duration::ZERO..Duration::ZERO)
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_adds_user_then_simulated_reply() {
        let dispatcher =
            MessageDispatcher::new("http://127.0.0.1:1").with_fallback(instant_fallback());
        let mut conversation = Conversation::new("pablo_main", dispatcher);

        conversation.submit("hello").await;

        let messages = conversation.transcript().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].origin(), Origin::User);
        assert_eq!(messages[0].raw_text(), "hello");
        assert_eq!(messages[1].origin(), Origin::Assistant);
        assert!(messages[1].simulated());
        assert!(messages[1].raw_text().contains("hello"));
    }

    #[tokio::test]
    async fn test_delivered_reply_is_rendered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/conversar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "La **esencia** precede\n\n* al ser\n* al ente"
            })))
            .mount(&server)
            .await;

        let dispatcher = MessageDispatcher::new(&server.uri()).with_fallback(instant_fallback());
        let mut conversation = Conversation::new("u1", dispatcher);

        let reply = conversation.submit("¿qué es la esencia?").await;
        assert!(!reply.simulated());
        assert_eq!(
            reply.rendered_html(),
            concat!(
                "<p>La <strong>esencia</strong> precede</p>",
                "<p><ul><li>al ser</li>\n<li>al ente</li></ul></p>"
            )
        );
    }

    #[tokio::test]
    async fn test_every_failure_adds_exactly_one_assistant_entry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/conversar"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let dispatcher = MessageDispatcher::new(&server.uri()).with_fallback(instant_fallback());
        let mut conversation = Conversation::new("u1", dispatcher);

        conversation.submit("uno").await;
        conversation.submit("dos").await;

        let origins: Vec<Origin> = conversation
            .transcript()
            .messages()
            .iter()
            .map(|m| m.origin())
            .collect();
        assert_eq!(
            origins,
            vec![Origin::User, Origin::Assistant, Origin::User, Origin::Assistant]
        );
    }

    #[test]
    fn test_push_system_uses_system_label() {
        let mut conversation = Conversation::new("u1", MessageDispatcher::new("http://localhost"));
        let message = conversation.push_system("Conectado");
        assert_eq!(message.origin(), Origin::System);
        assert_eq!(message.sender_label(), "Sistema");
    }
}
