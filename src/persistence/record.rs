//! The persisted "family data" record and its export artifact

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::identity::ClientIdentity;

/// Conversation phases the backend currently emits. The set is owned by the
/// backend; unknown values are stored as-is.
pub const KNOWN_PHASES: &[&str] = &["initial_data_collection", "deep_dive", "analysis"];

/// Snapshot of extracted conversation data plus phase and identity metadata.
///
/// Always built by `PersistenceManager`, which injects the client id and the
/// write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    #[serde(default)]
    pub extracted_data: Map<String, Value>,
    #[serde(default)]
    pub phase: String,
    #[serde(alias = "clientId")]
    pub client_id: ClientIdentity,
    #[serde(alias = "timestamp")]
    pub saved_at: DateTime<Utc>,
}

impl PersistedRecord {
    pub(crate) fn new(
        extracted_data: Map<String, Value>,
        phase: impl Into<String>,
        client_id: ClientIdentity,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            extracted_data,
            phase: phase.into(),
            client_id,
            saved_at,
        }
    }

    pub fn has_known_phase(&self) -> bool {
        KNOWN_PHASES.contains(&self.phase.as_str())
    }
}

/// Downloadable JSON file holding a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub contents: String,
}

impl ExportArtifact {
    pub const MIME_TYPE: &'static str = "application/json";

    pub fn from_record(record: &PersistedRecord, today: NaiveDate) -> serde_json::Result<Self> {
        Ok(Self {
            file_name: export_file_name(today),
            contents: serde_json::to_string_pretty(record)?,
        })
    }
}

/// `family_data_<YYYY-MM-DD>.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("family_data_{}.json", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record() -> PersistedRecord {
        let data = json!({"members": 3}).as_object().cloned().unwrap();
        PersistedRecord::new(
            data,
            "deep_dive",
            ClientIdentity::generate(&mut rand::rng()),
            Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(export_file_name(date), "family_data_2025-03-09.json");
    }

    #[test]
    fn test_export_contains_full_record() {
        let rec = record();
        let date = rec.saved_at.date_naive();
        let artifact = ExportArtifact::from_record(&rec, date).unwrap();
        let back: PersistedRecord = serde_json::from_str(&artifact.contents).unwrap();
        assert_eq!(back, rec);
        assert!(artifact.contents.contains("\n  \"extracted_data\""));
    }

    #[test]
    fn test_reads_legacy_field_names() {
        let legacy = r#"{
            "extracted_data": {"members": 2},
            "phase": "analysis",
            "clientId": "0b6c2b1e-8d7a-4c44-9a55-3f1e2d9b7c10",
            "timestamp": "2025-01-02T03:04:05.000Z"
        }"#;
        let rec: PersistedRecord = serde_json::from_str(legacy).unwrap();
        assert_eq!(rec.client_id.as_str(), "0b6c2b1e-8d7a-4c44-9a55-3f1e2d9b7c10");
        assert_eq!(rec.extracted_data["members"], 2);
        assert!(rec.has_known_phase());
    }

    #[test]
    fn test_phase_is_optional() {
        let raw = r#"{"client_id":"x","saved_at":"2025-01-02T03:04:05Z"}"#;
        let rec: PersistedRecord = serde_json::from_str(raw).unwrap();
        assert!(rec.phase.is_empty());
        assert!(rec.extracted_data.is_empty());
        assert!(!rec.has_known_phase());
    }
}
