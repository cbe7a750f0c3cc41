//! localStorage adapter for the cooldown store
//!
//! Browsers can refuse localStorage (private mode, disabled cookies, sandboxed
//! iframes). In that case [`LocalStorage::open`] returns `None` and the
//! detector falls back to in-memory gating.

use crate::core::KeyValueStore;

/// `window.localStorage`
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    pub fn open() -> Option<Self> {
        let window = web_sys::window()?;
        let storage = window.local_storage().ok()??;
        Some(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) {
        // Quota errors are dropped; the block simply won't persist
        if self.storage.set_item(key, value).is_err() {
            leptos::logging::warn!("Failed to write {} to localStorage", key);
        }
    }
}
