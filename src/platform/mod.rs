//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Storage tiers (LocalStorage, SessionStorage on web; in-memory everywhere)
//! - Cookies (presence markers, identity fallback)
//! - Deferred tasks (status revert timer)
//! - HTTP and DOM adapters (web only)

pub mod cookie;
pub mod timer;

#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
pub mod http;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use cookie::{CookieJar, MemoryCookieJar};
pub use timer::{ManualScheduler, Scheduler};

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::StorageUnavailable;

/// Key written and immediately removed when probing a tier
pub const PROBE_KEY: &str = "__storage_test__";

/// Physical storage mechanism in the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierKind {
    /// Survives browser restarts (LocalStorage)
    Durable,
    /// Lives as long as the page
    Memory,
    /// Lives as long as the tab (SessionStorage)
    Session,
}

impl TierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierKind::Durable => "local",
            TierKind::Memory => "memory",
            TierKind::Session => "session",
        }
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One string-valued key/value store.
///
/// Every method may fail; the browser can throw on any access when storage is
/// disabled, sandboxed or over quota.
pub trait StorageTier {
    fn kind(&self) -> TierKind;

    fn get(&self, key: &str) -> Result<Option<String>, StorageUnavailable>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageUnavailable>;

    fn remove(&self, key: &str) -> Result<(), StorageUnavailable>;

    /// Trivial write + delete. Errors are swallowed.
    fn probe(&self) -> bool {
        match self
            .set(PROBE_KEY, PROBE_KEY)
            .and_then(|_| self.remove(PROBE_KEY))
        {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }
}

/// HashMap-backed tier.
///
/// Clones share the same map, so a clone handed to one `TieredStorage` can be
/// inspected or reused by another (e.g. to model a page reload over the same
/// LocalStorage).
#[derive(Debug, Clone)]
pub struct MemoryTier {
    kind: TierKind,
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryTier {
    pub fn new(kind: TierKind) -> Self {
        Self {
            kind,
            entries: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

impl Default for MemoryTier {
    fn default() -> Self {
        Self::new(TierKind::Memory)
    }
}

impl StorageTier for MemoryTier {
    fn kind(&self) -> TierKind {
        self.kind
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageUnavailable> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageUnavailable> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageUnavailable> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
