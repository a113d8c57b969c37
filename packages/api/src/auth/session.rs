//! Session persistence.
//!
//! In the browser the session survives reloads in `localStorage`. Native builds keep
//! it only in the client's in-memory cache.

use store::Session;

/// Storage key of the serialized session.
pub const SESSION_STORAGE_KEY: &str = "taskboard.auth.session";

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// The previously persisted session, if one exists and still parses.
#[cfg(target_arch = "wasm32")]
pub fn load() -> Option<Session> {
    let raw = local_storage()?.get_item(SESSION_STORAGE_KEY).ok().flatten()?;
    match serde_json::from_str(&raw) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!("discarding unreadable stored session: {e}");
            clear();
            None
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub fn save(session: &Session) {
    let Some(storage) = local_storage() else {
        return;
    };
    match serde_json::to_string(session) {
        Ok(raw) => {
            if storage.set_item(SESSION_STORAGE_KEY, &raw).is_err() {
                tracing::warn!("could not persist session");
            }
        }
        Err(e) => tracing::warn!("could not serialize session: {e}"),
    }
}

#[cfg(target_arch = "wasm32")]
pub fn clear() {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(SESSION_STORAGE_KEY);
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load() -> Option<Session> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save(_session: &Session) {}

#[cfg(not(target_arch = "wasm32"))]
pub fn clear() {}
