//! Sending messages and starting over

use std::rc::Rc;

use crate::api::ChatBackend;
use crate::error::TransportError;
use crate::persistence::PersistenceManager;
use crate::ui::{ChatView, Role};

/// Shown in place of a reply when the chat request fails
pub const CHAT_ERROR_REPLY: &str = "Sorry, there was an error processing your message.";

/// Display label for a backend phase id: `deep_dive` → `Deep Dive`
pub fn format_phase(phase: &str) -> String {
    if phase.is_empty() {
        return "Initial Data Collection".to_string();
    }
    phase
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct ChatSession<B, V> {
    backend: Rc<B>,
    view: Rc<V>,
    persistence: Rc<PersistenceManager>,
    greeting: String,
}

impl<B: ChatBackend, V: ChatView> ChatSession<B, V> {
    pub fn new(
        backend: Rc<B>,
        view: Rc<V>,
        persistence: Rc<PersistenceManager>,
        greeting: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            view,
            persistence,
            greeting: greeting.into(),
        }
    }

    /// Render the user's message and the backend's reply. Returns the reply,
    /// or `None` for blank input.
    pub async fn send(&self, text: &str) -> Option<String> {
        let message = text.trim();
        if message.is_empty() {
            return None;
        }
        self.view.show_message(Role::User, message);

        let reply = match self.backend.chat(message).await {
            Ok(resp) => {
                if let Some(phase) = &resp.phase {
                    self.view.show_phase(&format_phase(phase));
                }
                resp.response
            }
            Err(e) => {
                log::error!("Chat request failed: {}", e);
                CHAT_ERROR_REPLY.to_string()
            }
        };
        self.view.show_message(Role::Assistant, &reply);
        Some(reply)
    }

    /// Delete saved data, reset the backend conversation and greet again.
    ///
    /// Local data is cleared even if the reset request fails; the transcript
    /// is only replaced once the backend confirms.
    pub async fn start_new_conversation(&self) -> Result<(), TransportError> {
        self.persistence.clear();
        self.backend.reset().await?;
        self.view.clear();
        self.view.show_phase(&format_phase(""));
        self.view.show_message(Role::Assistant, &self.greeting);
        log::info!("Started a new conversation");
        Ok(())
    }
}
