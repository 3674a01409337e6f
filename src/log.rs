//! Console logging.
//!
//! In the browser these go straight to `console.*` via `web_sys`; on native
//! targets (tests, tooling) they become `tracing` events.

#[doc(hidden)]
#[cfg(target_arch = "wasm32")]
pub fn emit(level: Level, message: &str) {
    let value = wasm_bindgen::JsValue::from_str(message);
    match level {
        Level::Info => web_sys::console::log_1(&value),
        Level::Warn => web_sys::console::warn_1(&value),
        Level::Error => web_sys::console::error_1(&value),
    }
}

#[doc(hidden)]
#[cfg(not(target_arch = "wasm32"))]
pub fn emit(level: Level, message: &str) {
    match level {
        Level::Info => tracing::info!(target: "annocore", "{}", message),
        Level::Warn => tracing::warn!(target: "annocore", "{}", message),
        Level::Error => tracing::error!(target: "annocore", "{}", message),
    }
}

#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

#[macro_export]
macro_rules! console_log {
    ($($arg:tt)*) => {
        $crate::log::emit($crate::log::Level::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! console_warn {
    ($($arg:tt)*) => {
        $crate::log::emit($crate::log::Level::Warn, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! console_error {
    ($($arg:tt)*) => {
        $crate::log::emit($crate::log::Level::Error, &format!($($arg)*))
    };
}
