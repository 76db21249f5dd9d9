//! Family Chat Client - browser glue for the family dynamics conversation
//!
//! Core modules:
//! - `persistence`: Tiered browser storage, client identity, the saved record
//! - `restore`: Startup "continue where you left off?" handshake
//! - `save`: User-triggered save with status indicator
//! - `chat`: Sending messages, starting over
//! - `api`: Backend HTTP contract
//! - `platform`: Browser/native platform abstraction
//! - `settings`: Client configuration

pub mod api;
pub mod chat;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod restore;
pub mod save;
pub mod settings;
pub mod ui;

pub use error::{PersistenceError, SaveError, StorageUnavailable, TransportError};
pub use persistence::{PersistedRecord, PersistenceManager, StorageKeys, TieredStorage};
pub use restore::{RestoreCoordinator, RestoreState};
pub use save::{SaveOrchestrator, SaveReport};
pub use settings::{ClientConfig, StorageMode};

/// Client configuration constants
pub mod consts {
    /// Namespace for storage keys and cookies
    pub const KEY_PREFIX: &str = "fda_";

    /// Save indicator returns to idle after this long (ms)
    pub const STATUS_REVERT_MS: u32 = 5000;

    /// Lifetime of identity and marker cookies (days)
    pub const COOKIE_DAYS: u32 = 30;

    /// First assistant message of a fresh conversation
    pub const GREETING: &str = "Hello! I'm here to help you explore and understand your family dynamics. Let's start by learning about your family members. Could you tell me who makes up your immediate family?";
}
