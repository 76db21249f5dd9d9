//! Save/load/clear/export of the single family data record

use std::cell::OnceCell;

use chrono::Utc;
use serde_json::{Map, Value};

use super::identity::ClientIdentity;
use super::record::{ExportArtifact, PersistedRecord};
use super::tiered::TieredStorage;
use crate::error::PersistenceError;
use crate::platform::TierKind;

/// Logical storage keys, namespaced under an application prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub record: String,
    pub phase: String,
    pub client_id: String,
    /// Cookie flagging that `record` holds data
    pub has_data: String,
}

impl StorageKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            record: format!("{prefix}family_data"),
            phase: format!("{prefix}conversation_phase"),
            client_id: format!("{prefix}client_id"),
            has_data: format!("{prefix}has_data"),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix(crate::consts::KEY_PREFIX)
    }
}

/// A record read back from storage
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRecord {
    pub record: PersistedRecord,
    /// Tier that answered (diagnostics only)
    pub source: TierKind,
}

/// Owns the tier chain and the client identity.
pub struct PersistenceManager {
    storage: TieredStorage,
    keys: StorageKeys,
    cookie_days: u32,
    client_id: OnceCell<ClientIdentity>,
}

impl PersistenceManager {
    pub fn new(storage: TieredStorage, keys: StorageKeys, cookie_days: u32) -> Self {
        let storage = storage
            .with_marker(keys.record.clone(), keys.has_data.clone())
            .with_marker_days(cookie_days);
        Self {
            storage,
            keys,
            cookie_days,
            client_id: OnceCell::new(),
        }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn storage(&self) -> &TieredStorage {
        &self.storage
    }

    /// This browser's identity, resolved on first use
    pub fn client_id(&self) -> &ClientIdentity {
        self.client_id.get_or_init(|| {
            ClientIdentity::resolve(
                &self.storage,
                &self.keys.client_id,
                self.cookie_days,
                &mut rand::rng(),
            )
        })
    }

    /// Overwrite the record. Fails if it cannot be serialized or no tier
    /// accepts it.
    pub fn save(
        &self,
        extracted_data: Map<String, Value>,
        phase: &str,
    ) -> Result<PersistedRecord, PersistenceError> {
        let record = PersistedRecord::new(
            extracted_data,
            phase,
            self.client_id().clone(),
            Utc::now(),
        );
        if !phase.is_empty() && !record.has_known_phase() {
            log::warn!("Saving unrecognized phase '{}'", phase);
        }

        let json = serde_json::to_string(&record)?;
        if !self.storage.write(&self.keys.record, &json) {
            return Err(PersistenceError::NotStored {
                key: self.keys.record.clone(),
            });
        }

        if phase.is_empty() {
            self.storage.remove(&self.keys.phase);
        } else if !self.storage.write(&self.keys.phase, phase) {
            log::warn!("Phase not stored; it can still be read from the record");
        }

        log::info!(
            "Saved family data ({} fields, phase '{}')",
            record.extracted_data.len(),
            record.phase
        );
        Ok(record)
    }

    pub fn load(&self) -> Option<LoadedRecord> {
        let loaded = self
            .storage
            .read_valid(&self.keys.record, |raw| {
                serde_json::from_str::<PersistedRecord>(raw).ok()
            })
            .map(|(record, source)| LoadedRecord { record, source });

        match &loaded {
            Some(l) => log::info!("Loaded family data from {} storage", l.source),
            None => log::info!("No family data found"),
        }
        loaded
    }

    /// Phase from its dedicated key, without parsing the record
    pub fn stored_phase(&self) -> Option<String> {
        self.storage.read(&self.keys.phase).map(|(phase, _)| phase)
    }

    /// Remove record and phase from every tier. The client id is kept.
    pub fn clear(&self) {
        self.storage.remove(&self.keys.record);
        self.storage.remove(&self.keys.phase);
        log::info!("Family data cleared");
    }

    pub fn has_record(&self) -> bool {
        self.storage.has_any(&self.keys.record)
    }

    pub fn export_as_file(&self) -> Result<ExportArtifact, PersistenceError> {
        let loaded = self.load().ok_or(PersistenceError::NoData)?;
        Ok(ExportArtifact::from_record(
            &loaded.record,
            Utc::now().date_naive(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageUnavailable;
    use crate::platform::{CookieJar, MemoryCookieJar, MemoryTier, StorageTier};
    use serde_json::json;

    struct Fixture {
        durable: MemoryTier,
        session: MemoryTier,
        cookies: MemoryCookieJar,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                durable: MemoryTier::new(TierKind::Durable),
                session: MemoryTier::new(TierKind::Session),
                cookies: MemoryCookieJar::new(),
            }
        }

        /// A manager over the shared stores, as on a fresh page load
        fn manager(&self) -> PersistenceManager {
            let storage = TieredStorage::new(
                Some(Box::new(self.durable.clone())),
                Some(Box::new(self.session.clone())),
                Box::new(self.cookies.clone()),
            );
            PersistenceManager::new(storage, StorageKeys::default(), 30)
        }
    }

    fn data(value: serde_json::Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_save_injects_identity_and_timestamp() {
        let fx = Fixture::new();
        let pm = fx.manager();
        let before = Utc::now();
        let record = pm.save(data(json!({"members": 3})), "discovery").unwrap();

        assert_eq!(&record.client_id, pm.client_id());
        assert!(record.saved_at >= before);
        assert_eq!(pm.stored_phase().as_deref(), Some("discovery"));
    }

    #[test]
    fn test_load_after_save() {
        let fx = Fixture::new();
        let pm = fx.manager();
        pm.save(data(json!({"members": 3})), "discovery").unwrap();

        let loaded = pm.load().unwrap();
        assert_eq!(loaded.record.extracted_data["members"], 3);
        assert_eq!(loaded.record.phase, "discovery");
        assert_eq!(loaded.source, TierKind::Durable);
    }

    #[test]
    fn test_second_save_overwrites() {
        let fx = Fixture::new();
        let pm = fx.manager();
        pm.save(data(json!({"members": 3, "pets": 1})), "deep_dive")
            .unwrap();
        pm.save(data(json!({"members": 4})), "analysis").unwrap();

        let loaded = pm.load().unwrap().record;
        assert_eq!(loaded.extracted_data.len(), 1);
        assert_eq!(loaded.extracted_data["members"], 4);
        assert_eq!(loaded.phase, "analysis");
    }

    #[test]
    fn test_empty_phase_drops_phase_key() {
        let fx = Fixture::new();
        let pm = fx.manager();
        pm.save(Map::new(), "deep_dive").unwrap();
        pm.save(Map::new(), "").unwrap();
        assert_eq!(pm.stored_phase(), None);
    }

    #[test]
    fn test_clear_keeps_client_id() {
        let fx = Fixture::new();
        let pm = fx.manager();
        pm.save(data(json!({"members": 3})), "deep_dive").unwrap();
        let id_key = pm.keys().client_id.clone();
        let id_before = pm.storage().read(&id_key).map(|(v, _)| v);

        pm.clear();

        assert!(!pm.has_record());
        assert!(pm.load().is_none());
        assert_eq!(pm.stored_phase(), None);
        for tier in [&fx.durable, &fx.session] {
            assert!(!tier.contains(&pm.keys().record));
            assert!(!tier.contains(&pm.keys().phase));
        }
        assert!(id_before.is_some());
        assert_eq!(pm.storage().read(&id_key).map(|(v, _)| v), id_before);
    }

    #[test]
    fn test_has_record_tracks_save_and_clear() {
        let fx = Fixture::new();
        let pm = fx.manager();
        assert!(!pm.has_record());
        pm.save(Map::new(), "").unwrap();
        assert!(pm.has_record());
        assert_eq!(fx.cookies.get("fda_has_data").as_deref(), Some("1"));
        pm.clear();
        assert!(!pm.has_record());
        assert_eq!(fx.cookies.get("fda_has_data"), None);
    }

    #[test]
    fn test_identity_survives_reload() {
        let fx = Fixture::new();
        let first = fx.manager().client_id().clone();
        let second = fx.manager().client_id().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_corrupt_durable_record_falls_back() {
        let fx = Fixture::new();
        let pm = fx.manager();
        pm.save(data(json!({"members": 2})), "").unwrap();
        fx.durable.set(&pm.keys().record, "{truncated").unwrap();

        let loaded = pm.load().unwrap();
        assert_eq!(loaded.source, TierKind::Memory);
        assert_eq!(loaded.record.extracted_data["members"], 2);
    }

    /// LocalStorage that reads fine but rejects every write
    struct ReadOnlyTier;

    impl StorageTier for ReadOnlyTier {
        fn kind(&self) -> TierKind {
            TierKind::Durable
        }
        fn get(&self, _key: &str) -> Result<Option<String>, StorageUnavailable> {
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageUnavailable> {
            Err(StorageUnavailable::new(TierKind::Durable, "QuotaExceededError"))
        }
        fn remove(&self, _key: &str) -> Result<(), StorageUnavailable> {
            Ok(())
        }
    }

    #[test]
    fn test_save_fails_when_no_tier_accepts_the_record() {
        let storage = TieredStorage::from_tiers(
            vec![Box::new(ReadOnlyTier)],
            Box::new(MemoryCookieJar::new()),
        );
        let pm = PersistenceManager::new(storage, StorageKeys::default(), 30);

        let err = pm.save(data(json!({"members": 3})), "deep_dive").unwrap_err();
        assert!(matches!(err, PersistenceError::NotStored { ref key } if key == "fda_family_data"));
        assert!(!pm.has_record());
    }

    #[test]
    fn test_blank_stored_identity_is_replaced() {
        let fx = Fixture::new();
        fx.durable.set("fda_client_id", "").unwrap();

        let pm = fx.manager();
        assert!(uuid::Uuid::parse_str(pm.client_id().as_str()).is_ok());
        let record = pm.save(Map::new(), "").unwrap();
        assert_eq!(&record.client_id, pm.client_id());
    }

    #[test]
    fn test_export_without_data() {
        let fx = Fixture::new();
        let err = fx.manager().export_as_file().unwrap_err();
        assert!(matches!(err, PersistenceError::NoData));
    }

    #[test]
    fn test_export_with_data() {
        let fx = Fixture::new();
        let pm = fx.manager();
        let saved = pm.save(data(json!({"members": 3})), "analysis").unwrap();

        let artifact = pm.export_as_file().unwrap();
        assert!(artifact.file_name.starts_with("family_data_"));
        assert!(artifact.file_name.ends_with(".json"));
        let back: PersistedRecord = serde_json::from_str(&artifact.contents).unwrap();
        assert_eq!(back, saved);
    }
}
