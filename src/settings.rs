//! Client configuration
//!
//! Persisted separately from the family data record in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::platform::StorageTier;

/// Where a save ends up. Stored as its `as_str` name; any name `from_str`
/// accepts loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "&'static str")]
pub enum StorageMode {
    /// Backend extracts, the browser keeps the record
    #[default]
    ClientLocal,
    /// Backend extracts and keeps the record; nothing is written locally
    ServerAuthoritative,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::ClientLocal => "client-local",
            StorageMode::ServerAuthoritative => "server-authoritative",
        }
    }

    /// `session` has no separate implementation and maps to client-local
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "client-local" | "session" => Some(StorageMode::ClientLocal),
            "cloud" | "server" | "server-authoritative" => Some(StorageMode::ServerAuthoritative),
            _ => None,
        }
    }
}

impl TryFrom<String> for StorageMode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_str(&s).ok_or_else(|| format!("unknown storage mode '{s}'"))
    }
}

impl From<StorageMode> for &'static str {
    fn from(mode: StorageMode) -> Self {
        mode.as_str()
    }
}

/// Client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Save flow selection
    pub storage_mode: StorageMode,
    /// Prefix for API paths ("" = same origin)
    pub api_base: String,
    /// Namespace for every storage key and cookie
    pub key_prefix: String,
    /// Delay before the save indicator returns to idle (ms)
    pub status_revert_ms: u32,
    /// Lifetime of identity and marker cookies (days)
    pub cookie_days: u32,
    /// First assistant message when nothing is restored
    pub greeting: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::ClientLocal,
            api_base: String::new(),
            key_prefix: crate::consts::KEY_PREFIX.to_string(),
            status_revert_ms: crate::consts::STATUS_REVERT_MS,
            cookie_days: crate::consts::COOKIE_DAYS,
            greeting: crate::consts::GREETING.to_string(),
        }
    }
}

impl ClientConfig {
    /// Storage key
    pub fn storage_key(&self) -> String {
        format!("{}settings", self.key_prefix)
    }

    /// Full URL for an API path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }

    /// Load settings from a tier, falling back to defaults on a miss or a
    /// corrupt value
    pub fn load_from(tier: &dyn StorageTier) -> Self {
        let key = Self::default().storage_key();
        match tier.get(&key) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(config) => {
                    log::info!("Loaded settings from {} storage", tier.kind());
                    return config;
                }
                Err(e) => log::warn!("Ignoring corrupt settings: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("{}", e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        match crate::platform::web::WebStorageTier::local() {
            Some(tier) => Self::load_from(&tier),
            None => Self::default(),
        }
    }

    /// Native builds have no LocalStorage
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
