//! Stable per-browser client identifier

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::tiered::TieredStorage;

/// Opaque UUID-v4 token identifying this browser profile
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Fresh random identity
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 16];
        rng.fill(&mut bytes);
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
    }

    /// Look up the identity in storage, then the cookie; create and persist a
    /// new one if neither has it.
    pub fn resolve<R: Rng + ?Sized>(
        storage: &TieredStorage,
        key: &str,
        cookie_days: u32,
        rng: &mut R,
    ) -> Self {
        // A blank value is as good as none
        let non_blank = |raw: &str| (!raw.trim().is_empty()).then(|| raw.to_string());

        if let Some((id, tier)) = storage.read_valid(key, non_blank) {
            log::info!("Client id found in {} storage", tier);
            return Self(id);
        }

        if let Some(id) = storage.cookie(key).as_deref().and_then(non_blank) {
            log::info!("Client id recovered from cookie");
            // Re-seed the tiers so later reads don't depend on the cookie
            storage.write(key, &id);
            return Self(id);
        }

        let identity = Self::generate(rng);
        storage.write(key, identity.as_str());
        storage.set_cookie(key, identity.as_str(), cookie_days);
        log::info!("Created client id {}", identity);
        identity
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{CookieJar, MemoryCookieJar, MemoryTier, StorageTier, TierKind};
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    const KEY: &str = "fda_client_id";

    fn storage(durable: &MemoryTier, cookies: &MemoryCookieJar) -> TieredStorage {
        TieredStorage::new(
            Some(Box::new(durable.clone())),
            None,
            Box::new(cookies.clone()),
        )
    }

    #[test]
    fn test_generated_id_is_uuid_v4() {
        let mut rng = Pcg64::seed_from_u64(7);
        let id = ClientIdentity::generate(&mut rng);
        let parsed = uuid::Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(id.as_str().len(), 36);
    }

    #[test]
    fn test_generation_is_seed_deterministic() {
        let a = ClientIdentity::generate(&mut Pcg64::seed_from_u64(1));
        let b = ClientIdentity::generate(&mut Pcg64::seed_from_u64(1));
        let c = ClientIdentity::generate(&mut Pcg64::seed_from_u64(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_resolve_is_stable_across_reloads() {
        let durable = MemoryTier::new(TierKind::Durable);
        let cookies = MemoryCookieJar::new();
        let mut rng = Pcg64::seed_from_u64(3);

        let first = ClientIdentity::resolve(&storage(&durable, &cookies), KEY, 30, &mut rng);
        let second = ClientIdentity::resolve(&storage(&durable, &cookies), KEY, 30, &mut rng);
        assert_eq!(first, second);
        assert_eq!(cookies.get(KEY).as_deref(), Some(first.as_str()));
    }

    #[test]
    fn test_resolve_falls_back_to_cookie() {
        let cookies = MemoryCookieJar::new();
        cookies.set(KEY, "from-cookie", 30);

        let durable = MemoryTier::new(TierKind::Durable);
        let s = storage(&durable, &cookies);
        let id = ClientIdentity::resolve(&s, KEY, 30, &mut Pcg64::seed_from_u64(0));
        assert_eq!(id.as_str(), "from-cookie");
        assert!(durable.contains(KEY));
    }

    #[test]
    fn test_blank_values_are_treated_as_missing() {
        let durable = MemoryTier::new(TierKind::Durable);
        durable.set(KEY, "").unwrap();
        let cookies = MemoryCookieJar::new();
        cookies.set(KEY, "  ", 30);

        let s = storage(&durable, &cookies);
        let id = ClientIdentity::resolve(&s, KEY, 30, &mut Pcg64::seed_from_u64(4));
        assert_eq!(id, ClientIdentity::generate(&mut Pcg64::seed_from_u64(4)));
        assert_eq!(durable.get(KEY).unwrap().as_deref(), Some(id.as_str()));
    }
}
