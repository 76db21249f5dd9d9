//! Error types
//!
//! Nothing here is allowed to take the page down. Storage failures are absorbed
//! by the tier chain; everything else ends up as status text.

use thiserror::Error;

use crate::platform::TierKind;

/// A physical storage tier refused an operation.
///
/// Only tiers produce this. `TieredStorage` logs it and moves on to the next
/// tier, so callers above the persistence layer never see it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{tier} storage unavailable: {reason}")]
pub struct StorageUnavailable {
    pub tier: TierKind,
    pub reason: String,
}

impl StorageUnavailable {
    pub fn new(tier: TierKind, reason: impl Into<String>) -> Self {
        Self {
            tier,
            reason: reason.into(),
        }
    }
}

/// Network or backend failure talking to the chat service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Request never produced a response (offline, CORS, aborted)
    #[error("network error: {0}")]
    Network(String),

    /// Response arrived with a non-2xx status
    #[error("Server responded with status: {0}")]
    Status(u16),

    /// Request body could not be built
    #[error("could not encode request: {0}")]
    Encode(String),

    /// Response body did not match the expected contract
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Persistence-level failures surfaced to the UI.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Export or restore attempted with nothing persisted
    #[error("No data to export")]
    NoData,

    /// Every tier refused the write
    #[error("could not store {key} in any browser storage")]
    NotStored { key: String },

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Why a save cycle did not complete.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Another save cycle is still in flight
    #[error("a save is already in progress")]
    InProgress,

    /// Backend declined to produce a clean record; carries its message verbatim
    #[error("{0}")]
    ExtractionIncomplete(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
