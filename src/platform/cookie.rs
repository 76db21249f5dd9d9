//! Cookie access
//!
//! Cookies are the last-resort channel: they carry the client identity and the
//! small "has data" markers that let us detect a saved record even when
//! LocalStorage is disabled.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Seconds in a day, for `max-age`
const SECS_PER_DAY: u32 = 24 * 60 * 60;

/// Minimal cookie store. Failures are swallowed by implementations.
pub trait CookieJar {
    fn get(&self, name: &str) -> Option<String>;

    /// Set a cookie that expires after `days`
    fn set(&self, name: &str, value: &str, days: u32);

    fn remove(&self, name: &str);
}

/// In-process cookie jar for native builds and tests. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieJar {
    cookies: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies.borrow().get(name).cloned()
    }

    fn set(&self, name: &str, value: &str, days: u32) {
        let mut cookies = self.cookies.borrow_mut();
        if days == 0 {
            cookies.remove(name);
        } else {
            cookies.insert(name.to_string(), value.to_string());
        }
    }

    fn remove(&self, name: &str) {
        self.cookies.borrow_mut().remove(name);
    }
}

/// Find `name` in a `document.cookie` string. Returns the raw (still encoded)
/// value; empty values count as absent.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}

/// Build the assignment string for `document.cookie`. `days == 0` expires the
/// cookie immediately.
pub fn set_cookie_string(name: &str, encoded_value: &str, days: u32) -> String {
    format!(
        "{}={};max-age={};path=/;SameSite=Strict",
        name,
        encoded_value,
        days.saturating_mul(SECS_PER_DAY)
    )
}
