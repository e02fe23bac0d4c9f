/// The publish endpoint setting, stored apart from the draft collection

use super::library::LocalStorage;
use crate::config::STORAGE_KEY_CONFIG;
use crate::error::StoreError;

/// Read the stored endpoint URL; an unreadable entry reads as unset
pub fn load_endpoint(storage: &LocalStorage) -> Option<String> {
    match storage.get_item(STORAGE_KEY_CONFIG) {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(e) => {
            tracing::warn!("Could not read endpoint setting: {}", e);
            None
        }
    }
}

/// Store the endpoint URL; a blank value removes the setting
pub fn save_endpoint(storage: &LocalStorage, url: &str) -> Result<(), StoreError> {
    if url.trim().is_empty() {
        return storage.remove_item(STORAGE_KEY_CONFIG);
    }
    storage.set_item(STORAGE_KEY_CONFIG, url)
}
