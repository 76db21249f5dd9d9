//! Startup restore flow
//!
//! On page load: if a record was saved earlier, ask the user whether to pick
//! up where they left off and replay the record to the backend; otherwise (or
//! on any failure) show the canned greeting. Exactly one first assistant
//! message is rendered.

use crate::api::ChatBackend;
use crate::chat::format_phase;
use crate::persistence::PersistenceManager;
use crate::ui::{ChatView, RestoreChoice, RestorePrompt, Role};

/// Coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreState {
    Checking,
    /// Waiting on the user
    Prompting,
    /// Canned greeting shown
    Greeting,
    /// Backend accepted the saved context and greeted
    Restored,
}

impl RestoreState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RestoreState::Greeting | RestoreState::Restored)
    }
}

pub struct RestoreCoordinator<'a, B, V, P> {
    persistence: &'a PersistenceManager,
    backend: &'a B,
    view: &'a V,
    prompt: &'a P,
    greeting: &'a str,
    state: RestoreState,
}

impl<'a, B, V, P> RestoreCoordinator<'a, B, V, P>
where
    B: ChatBackend,
    V: ChatView,
    P: RestorePrompt,
{
    pub fn new(
        persistence: &'a PersistenceManager,
        backend: &'a B,
        view: &'a V,
        prompt: &'a P,
        greeting: &'a str,
    ) -> Self {
        Self {
            persistence,
            backend,
            view,
            prompt,
            greeting,
            state: RestoreState::Checking,
        }
    }

    pub fn state(&self) -> RestoreState {
        self.state
    }

    /// Drive the flow to a terminal state. Runs once; later calls return the
    /// state reached the first time without rendering anything.
    pub async fn run(&mut self) -> RestoreState {
        if self.state != RestoreState::Checking {
            return self.state;
        }

        if !self.persistence.has_record() {
            self.greet();
            return self.state;
        }

        log::info!("Found saved conversation data");
        self.state = RestoreState::Prompting;
        match self.prompt.ask().await {
            RestoreChoice::Continue => {
                match self.handshake().await {
                    Some((greeting, phase)) => {
                        self.view.show_phase(&format_phase(&phase));
                        self.view.show_message(Role::Assistant, &greeting);
                        self.state = RestoreState::Restored;
                    }
                    None => self.greet(),
                }
            }
            RestoreChoice::StartNew => {
                // Saved data stays on disk; it is only bypassed for this session
                log::info!("User chose to start a new conversation");
                self.greet();
            }
        }
        self.state
    }

    /// Replay the saved record to the backend and return its greeting.
    ///
    /// Read-only on the client side: safe to call repeatedly, and `None` on
    /// a missing record or any backend failure.
    pub async fn continue_session(&self) -> Option<String> {
        self.handshake().await.map(|(greeting, _)| greeting)
    }

    /// Greeting plus the phase to resume in: the backend's if it names one,
    /// else the saved record's
    async fn handshake(&self) -> Option<(String, String)> {
        let Some(loaded) = self.persistence.load() else {
            log::error!("Saved data vanished between check and load");
            return None;
        };

        match self.backend.load_context(&loaded.record).await {
            Ok(resp) => match resp.greeting() {
                Some(greeting) => {
                    let phase = resp
                        .phase
                        .clone()
                        .filter(|p| !p.is_empty())
                        .unwrap_or_else(|| loaded.record.phase.clone());
                    log::info!("Restored context (phase '{}')", phase);
                    Some((greeting.to_string(), phase))
                }
                None => {
                    log::warn!(
                        "Backend did not restore context: {}",
                        resp.error.as_deref().unwrap_or("no greeting returned")
                    );
                    None
                }
            },
            Err(e) => {
                log::error!("Error loading saved context: {}", e);
                None
            }
        }
    }

    fn greet(&mut self) {
        self.view.show_message(Role::Assistant, self.greeting);
        self.state = RestoreState::Greeting;
    }
}
