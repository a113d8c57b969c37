//! Platform-aware wall clock.
//!
//! Uses `js_sys::Date::now()` in the browser and `std::time::SystemTime`
//! everywhere else, so object keys and token expiry checks behave the same on
//! both targets.

/// Milliseconds since the unix epoch.
#[cfg(target_arch = "wasm32")]
pub fn now_millis() -> i64 {
    js_sys::Date::now() as i64
}

/// Milliseconds since the unix epoch.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Seconds since the unix epoch.
pub fn now_secs() -> i64 {
    now_millis() / 1000
}
