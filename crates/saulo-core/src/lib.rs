pub mod config;
pub mod conversation;
pub mod dispatcher;
pub mod error;
pub mod escape;
pub mod fallback;
pub mod markdown;
pub mod monitor;
pub mod transcript;

// Re-export main types for convenience
pub use config::Config;
pub use conversation::Conversation;
pub use dispatcher::{AgentStatus, MessageDispatcher, Outcome, Reply};
pub use error::ExchangeError;
pub use escape::escape_html;
pub use fallback::FallbackResponder;
pub use markdown::{render_markdown, MarkdownRenderer};
pub use monitor::{ConnectionMonitor, Connectivity, ConnectivityState};
pub use transcript::{Message, Origin, Transcript};
