//! Client-side persistence of the family data record
//!
//! Features:
//! - Tiered storage (LocalStorage → memory → SessionStorage) with cached probes
//! - Cookie markers so saved data is detectable when LocalStorage is off
//! - Stable per-browser client identity
//! - JSON export of the current record

pub mod identity;
pub mod manager;
pub mod record;
pub mod tiered;

pub use identity::ClientIdentity;
pub use manager::{LoadedRecord, PersistenceManager, StorageKeys};
pub use record::{ExportArtifact, KNOWN_PHASES, PersistedRecord, export_file_name};
pub use tiered::TieredStorage;
