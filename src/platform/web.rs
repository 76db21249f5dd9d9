//! Browser implementations of the platform seams

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, HtmlDocument, Storage, Url};

use super::cookie::{CookieJar, MemoryCookieJar, find_cookie, set_cookie_string};
use super::timer::Scheduler;
use super::{StorageTier, TierKind};
use crate::error::StorageUnavailable;
use crate::persistence::{ExportArtifact, PersistenceManager, StorageKeys, TieredStorage};
use crate::settings::ClientConfig;

/// Human-readable text for a thrown JS value
pub(crate) fn js_reason(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{:?}", value)
}

/// LocalStorage or SessionStorage
pub struct WebStorageTier {
    storage: Storage,
    kind: TierKind,
}

impl WebStorageTier {
    /// `window.localStorage`; `None` if the browser refuses to hand it out
    pub fn local() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok().flatten()?;
        Some(Self {
            storage,
            kind: TierKind::Durable,
        })
    }

    /// `window.sessionStorage`
    pub fn session() -> Option<Self> {
        let storage = web_sys::window()?.session_storage().ok().flatten()?;
        Some(Self {
            storage,
            kind: TierKind::Session,
        })
    }

    fn unavailable(&self, err: JsValue) -> StorageUnavailable {
        StorageUnavailable::new(self.kind, js_reason(&err))
    }
}

impl StorageTier for WebStorageTier {
    fn kind(&self) -> TierKind {
        self.kind
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageUnavailable> {
        self.storage.get_item(key).map_err(|e| self.unavailable(e))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageUnavailable> {
        self.storage
            .set_item(key, value)
            .map_err(|e| self.unavailable(e))
    }

    fn remove(&self, key: &str) -> Result<(), StorageUnavailable> {
        self.storage.remove_item(key).map_err(|e| self.unavailable(e))
    }
}

/// `document.cookie`, URI-encoding values
pub struct DocumentCookieJar {
    document: HtmlDocument,
}

impl DocumentCookieJar {
    pub fn new() -> Option<Self> {
        let document = web_sys::window()?
            .document()?
            .dyn_into::<HtmlDocument>()
            .ok()?;
        Some(Self { document })
    }
}

impl CookieJar for DocumentCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        let header = self.document.cookie().ok()?;
        let raw = find_cookie(&header, name)?;
        js_sys::decode_uri_component(raw).ok().map(String::from)
    }

    fn set(&self, name: &str, value: &str, days: u32) {
        let encoded = String::from(js_sys::encode_uri_component(value));
        if let Err(e) = self
            .document
            .set_cookie(&set_cookie_string(name, &encoded, days))
        {
            log::warn!("Cookie {} not set: {}", name, js_reason(&e));
        }
    }

    fn remove(&self, name: &str) {
        self.set(name, "", 0);
    }
}

/// `window.setTimeout`
pub struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
    fn after(&self, delay_ms: u32, task: Box<dyn FnOnce()>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        // once_into_js frees the closure after it runs
        let callback = Closure::once_into_js(move || task());
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        if let Err(e) = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)
        {
            log::warn!("setTimeout failed: {}", js_reason(&e));
        }
    }
}

/// Persistence over LocalStorage → memory → SessionStorage with cookie markers
pub fn browser_persistence(config: &ClientConfig) -> PersistenceManager {
    let durable = WebStorageTier::local().map(|t| Box::new(t) as Box<dyn StorageTier>);
    let session = WebStorageTier::session().map(|t| Box::new(t) as Box<dyn StorageTier>);
    let cookies: Box<dyn CookieJar> = match DocumentCookieJar::new() {
        Some(jar) => Box::new(jar),
        None => {
            log::warn!("document.cookie unavailable, markers kept in memory");
            Box::new(MemoryCookieJar::new())
        }
    };

    PersistenceManager::new(
        TieredStorage::new(durable, session, cookies),
        StorageKeys::with_prefix(&config.key_prefix),
        config.cookie_days,
    )
}

/// Hand an export artifact to the browser as a file download
pub fn download(artifact: &ExportArtifact) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("no body"))?;

    let parts = js_sys::Array::of1(&JsValue::from_str(&artifact.contents));
    let options = BlobPropertyBag::new();
    options.set_type(ExportArtifact::MIME_TYPE);
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(&artifact.file_name);
    body.append_child(&anchor)?;
    anchor.click();
    body.remove_child(&anchor)?;
    Url::revoke_object_url(&url)?;

    log::info!("Exported {}", artifact.file_name);
    Ok(())
}
