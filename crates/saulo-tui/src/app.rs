use saulo_core::{
    Config, ConnectivityState, Connectivity, Conversation, MessageDispatcher, Reply,
};
use tokio::task::JoinHandle;
use tracing::error;

const WELCOME: &str = "Escribe un mensaje para conversar con **Saulo**.\n\n\
Comandos:\n\
* `/reset` vuelve al estado base\n\
* `/estado base|melancolico|oposicion` cambia el estado\n\
* `/debug` muestra el estado interno";

pub struct App {
    pub should_quit: bool,

    // Input line
    pub input: String,
    pub cursor: usize, // cursor position in input, in characters

    // Conversation state
    pub conversation: Conversation,
    pub connectivity: Connectivity,
    pub agent_state: Option<String>,
    pub send_task: Option<JoinHandle<Reply>>,

    // Chat view
    pub chat_scroll: u16,
    pub max_scroll: u16,
    pub follow_tail: bool,
    pub chat_height: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(config: &Config, connectivity: Connectivity) -> Self {
        let dispatcher =
            MessageDispatcher::new(&config.base_url).with_connectivity(connectivity.clone());
        Self::with_conversation(Conversation::new(&config.user_id, dispatcher), connectivity)
    }

    pub fn with_conversation(mut conversation: Conversation, connectivity: Connectivity) -> Self {
        conversation.push_system(WELCOME);

        Self {
            should_quit: false,
            input: String::new(),
            cursor: 0,
            conversation,
            connectivity,
            agent_state: None,
            send_task: None,
            chat_scroll: 0,
            max_scroll: 0,
            follow_tail: true,
            chat_height: 0,
            animation_frame: 0,
        }
    }

    /// The send affordance is disabled while a send, real or simulated, runs.
    pub fn is_sending(&self) -> bool {
        self.send_task.is_some()
    }

    pub fn connectivity_state(&self) -> ConnectivityState {
        self.connectivity.current()
    }

    /// Move the input into the transcript and start sending it in the background.
    pub fn submit(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() || self.is_sending() {
            return;
        }

        self.input.clear();
        self.cursor = 0;
        self.conversation.push_user(&text);
        self.follow_tail = true;

        let dispatcher = self.conversation.dispatcher().clone();
        let user_id = self.conversation.user_id().to_string();
        self.send_task = Some(tokio::spawn(async move {
            dispatcher.send(&user_id, &text).await
        }));
    }

    /// Append the reply once the background send has settled.
    pub async fn poll_send(&mut self) {
        let finished = self
            .send_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        if let Some(task) = self.send_task.take() {
            match task.await {
                Ok(reply) => {
                    if let Some(state) = reply.status.as_ref().and_then(|s| s.state.clone()) {
                        self.agent_state = Some(state);
                    }
                    self.conversation.push_reply(&reply);
                }
                Err(err) => {
                    error!(error = %err, "send task did not complete");
                    self.conversation
                        .push_system(&format!("Error interno al enviar: {err}"));
                }
            }
            self.follow_tail = true;
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.min(self.max_scroll).saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll);
        self.follow_tail = self.chat_scroll >= self.max_scroll;
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }
}
