//! Error types.
//!
//! Runtime events never fail; these only surface from mounting (missing page
//! elements, unusable config) and from the best-score store.

use derive_more::{Display, Error};
use wasm_bindgen::JsValue;

/// A page element, the window or local storage was not available at mount time.
#[derive(Debug, Clone, Display, Error)]
#[display("Init error: {} at {}:{}", message, file, line)]
pub struct InitError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl InitError {
    /// Creates a new init error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// A required element id was not found in the document.
    #[track_caller]
    pub fn missing_element(id: &str) -> Self {
        Self::new(format!("missing element #{id}"))
    }
}

impl From<ConfigError> for InitError {
    #[track_caller]
    fn from(err: ConfigError) -> Self {
        Self::new(err.message)
    }
}

impl From<InitError> for JsValue {
    fn from(err: InitError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// The key-value store rejected a write.
#[derive(Debug, Clone, Display, Error)]
#[display("Store error: {} at {}:{}", message, file, line)]
pub struct StoreError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new store error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Page configuration could not be parsed.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("invalid page config: {err}"))
    }
}
