//! Tiered key/value storage
//!
//! One logical string store backed by an ordered chain of physical tiers:
//! durable (LocalStorage) → memory → session (SessionStorage). Writes go to
//! every usable tier, reads take the first hit, and keys registered with a
//! cookie marker keep reporting that they hold data when LocalStorage is
//! disabled.
//!
//! No method here returns an error. A failing tier is logged and skipped.

use std::collections::HashMap;

use crate::platform::{CookieJar, MemoryTier, StorageTier, TierKind};

/// Default marker lifetime
pub const DEFAULT_MARKER_DAYS: u32 = 30;

struct ProbedTier {
    tier: Box<dyn StorageTier>,
    available: bool,
}

/// Preference-ordered storage chain with cached availability.
pub struct TieredStorage {
    tiers: Vec<ProbedTier>,
    cookies: Box<dyn CookieJar>,
    markers: HashMap<String, String>,
    marker_days: u32,
}

impl TieredStorage {
    /// Build the chain. The memory tier is always present; durable and
    /// session tiers are optional (the browser may not hand them out at all).
    ///
    /// Each tier is probed exactly once here.
    pub fn new(
        durable: Option<Box<dyn StorageTier>>,
        session: Option<Box<dyn StorageTier>>,
        cookies: Box<dyn CookieJar>,
    ) -> Self {
        let memory: Box<dyn StorageTier> = Box::new(MemoryTier::new(TierKind::Memory));
        let tiers = [durable, Some(memory), session].into_iter().flatten().collect();
        Self::from_tiers(tiers, cookies)
    }

    /// Chain over exactly `tiers`, in preference order, with no implicit
    /// memory tier.
    pub fn from_tiers(tiers: Vec<Box<dyn StorageTier>>, cookies: Box<dyn CookieJar>) -> Self {
        let tiers = tiers
            .into_iter()
            .map(|tier| {
                let available = tier.probe();
                if available {
                    log::info!("{} storage available", tier.kind());
                } else {
                    log::warn!("{} storage unavailable, falling back", tier.kind());
                }
                ProbedTier { tier, available }
            })
            .collect();

        Self {
            tiers,
            cookies,
            markers: HashMap::new(),
            marker_days: DEFAULT_MARKER_DAYS,
        }
    }

    /// Flag with a `marker` cookie whenever `key` holds data. Keys without a
    /// marker set no cookie.
    pub fn with_marker(mut self, key: impl Into<String>, marker: impl Into<String>) -> Self {
        self.markers.insert(key.into(), marker.into());
        self
    }

    pub fn with_marker_days(mut self, days: u32) -> Self {
        self.marker_days = days;
        self
    }

    /// Cached probe result for a tier kind (false if the tier is absent)
    pub fn is_available(&self, kind: TierKind) -> bool {
        self.tiers
            .iter()
            .any(|t| t.tier.kind() == kind && t.available)
    }

    /// Cookie flagging that `key` holds data, if one was registered
    pub fn marker_name(&self, key: &str) -> Option<&str> {
        self.markers.get(key).map(String::as_str)
    }

    fn usable(&self) -> impl Iterator<Item = &dyn StorageTier> {
        self.tiers
            .iter()
            .filter(|t| t.available)
            .map(|t| t.tier.as_ref())
    }

    /// Write to every available tier. Returns true if any tier took the value;
    /// a chain built with `new` always has the memory tier to take it.
    pub fn write(&self, key: &str, value: &str) -> bool {
        let mut stored = false;
        for tier in self.usable() {
            match tier.set(key, value) {
                Ok(()) => stored = true,
                Err(e) => log::warn!("write {}: {}", key, e),
            }
        }
        if stored {
            if let Some(marker) = self.marker_name(key) {
                self.cookies.set(marker, "1", self.marker_days);
            }
        }
        stored
    }

    /// First hit in preference order, with the tier that answered.
    pub fn read(&self, key: &str) -> Option<(String, TierKind)> {
        self.read_valid(key, |raw| Some(raw.to_string()))
    }

    /// Like `read`, but a value `parse` rejects counts as a miss and the next
    /// tier is consulted.
    pub fn read_valid<T>(
        &self,
        key: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<(T, TierKind)> {
        for tier in self.usable() {
            match tier.get(key) {
                Ok(Some(raw)) => match parse(&raw) {
                    Some(value) => return Some((value, tier.kind())),
                    None => log::warn!("discarding unreadable {} in {} storage", key, tier.kind()),
                },
                Ok(None) => {}
                Err(e) => log::warn!("read {}: {}", key, e),
            }
        }
        None
    }

    /// Delete from every tier and drop the marker. Never fails.
    pub fn remove(&self, key: &str) {
        // Every tier, not just usable ones: a tier that failed its probe on a
        // full quota can still hold a record from an earlier page load
        for probed in &self.tiers {
            match probed.tier.remove(key) {
                Ok(()) => {}
                Err(e) if probed.available => log::warn!("remove {}: {}", key, e),
                Err(e) => log::debug!("remove {}: {}", key, e),
            }
        }
        if let Some(marker) = self.marker_name(key) {
            self.cookies.remove(marker);
        }
    }

    /// Cheap existence check: any tier holds the key, or its marker is set.
    pub fn has_any(&self, key: &str) -> bool {
        let in_tier = self
            .usable()
            .any(|tier| matches!(tier.get(key), Ok(Some(_))));
        in_tier
            || self
                .marker_name(key)
                .is_some_and(|marker| self.cookies.get(marker).is_some())
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name)
    }

    pub fn set_cookie(&self, name: &str, value: &str, days: u32) {
        self.cookies.set(name, value, days);
    }
}
