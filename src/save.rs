//! User-triggered save
//!
//! Both modes first ask the backend to extract the current session. In
//! client-local mode the returned snapshot is written to browser storage; in
//! server-authoritative mode the backend's own completion flag is the result
//! and nothing is written locally.
//!
//! Status goes idle → saving → success/error and drifts back to idle after a
//! fixed delay. While saving, further save requests are refused.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;

use crate::api::ChatBackend;
use crate::error::SaveError;
use crate::persistence::{PersistedRecord, PersistenceManager};
use crate::platform::Scheduler;
use crate::settings::StorageMode;
use crate::ui::{SaveStatus, SaveStatusView};

/// What a successful save produced
#[derive(Debug, Clone, PartialEq)]
pub enum SaveReport {
    StoredLocally(PersistedRecord),
    StoredOnServer { summary: Option<Value> },
}

impl SaveReport {
    pub fn message(&self) -> &'static str {
        match self {
            SaveReport::StoredLocally(_) => "Conversation saved",
            SaveReport::StoredOnServer { .. } => "Conversation saved to server",
        }
    }
}

struct IndicatorState {
    status: RefCell<SaveStatus>,
    /// Bumped per save cycle so stale revert timers do nothing
    cycle: Cell<u64>,
    view: Rc<dyn SaveStatusView>,
}

impl IndicatorState {
    fn show(&self, status: SaveStatus) {
        self.view.show_status(&status);
        *self.status.borrow_mut() = status;
    }
}

/// Save status shown to the user, with timed revert to idle
struct StatusIndicator {
    state: Rc<IndicatorState>,
    scheduler: Rc<dyn Scheduler>,
    revert_ms: u32,
}

impl StatusIndicator {
    fn status(&self) -> SaveStatus {
        self.state.status.borrow().clone()
    }

    fn begin(&self, message: &str) {
        self.state.cycle.set(self.state.cycle.get() + 1);
        self.state.show(SaveStatus::Saving(message.to_string()));
    }

    fn progress(&self, message: &str) {
        self.state.show(SaveStatus::Saving(message.to_string()));
    }

    fn finish(&self, status: SaveStatus) {
        self.state.show(status);

        let state = Rc::clone(&self.state);
        let cycle = state.cycle.get();
        self.scheduler.after(
            self.revert_ms,
            Box::new(move || {
                if state.cycle.get() == cycle {
                    state.show(SaveStatus::Idle);
                }
            }),
        );
    }
}

pub struct SaveOrchestrator<B> {
    mode: Cell<StorageMode>,
    persistence: Rc<PersistenceManager>,
    backend: Rc<B>,
    indicator: StatusIndicator,
}

impl<B: ChatBackend> SaveOrchestrator<B> {
    pub fn new(
        mode: StorageMode,
        persistence: Rc<PersistenceManager>,
        backend: Rc<B>,
        view: Rc<dyn SaveStatusView>,
        scheduler: Rc<dyn Scheduler>,
        revert_ms: u32,
    ) -> Self {
        Self {
            mode: Cell::new(mode),
            persistence,
            backend,
            indicator: StatusIndicator {
                state: Rc::new(IndicatorState {
                    status: RefCell::new(SaveStatus::Idle),
                    cycle: Cell::new(0),
                    view,
                }),
                scheduler,
                revert_ms,
            },
        }
    }

    pub fn mode(&self) -> StorageMode {
        self.mode.get()
    }

    pub fn set_mode(&self, mode: StorageMode) {
        log::info!("Storage mode set to {}", mode.as_str());
        self.mode.set(mode);
    }

    pub fn status(&self) -> SaveStatus {
        self.indicator.status()
    }

    /// Run one save cycle. The outcome is also shown on the status view.
    pub async fn save(&self) -> Result<SaveReport, SaveError> {
        if self.indicator.status().is_busy() {
            log::warn!("Save requested while another is in flight");
            return Err(SaveError::InProgress);
        }
        self.indicator.begin("Saving...");

        let result = match self.mode.get() {
            StorageMode::ClientLocal => self.save_client_local().await,
            StorageMode::ServerAuthoritative => self.save_on_server().await,
        };

        match &result {
            Ok(report) => {
                log::info!("{}", report.message());
                self.indicator
                    .finish(SaveStatus::Success(report.message().to_string()));
            }
            Err(e) => {
                log::error!("Save failed: {}", e);
                self.indicator.finish(SaveStatus::Error(e.to_string()));
            }
        }
        result
    }

    async fn save_client_local(&self) -> Result<SaveReport, SaveError> {
        self.indicator.progress("Fetching data...");
        let resp = self.backend.request_save().await?;
        if !resp.is_complete() {
            return Err(SaveError::ExtractionIncomplete(resp.error_message()));
        }

        let phase = resp.phase.as_deref().unwrap_or_default();
        let record = self
            .persistence
            .save(resp.extracted_data.unwrap_or_default(), phase)?;
        Ok(SaveReport::StoredLocally(record))
    }

    async fn save_on_server(&self) -> Result<SaveReport, SaveError> {
        let resp = self.backend.request_save().await?;
        if !resp.is_complete() {
            return Err(SaveError::ExtractionIncomplete(resp.error_message()));
        }
        Ok(SaveReport::StoredOnServer {
            summary: resp.summary,
        })
    }
}
