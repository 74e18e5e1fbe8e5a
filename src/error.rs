use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failure while scanning a track file. Never escapes `geometry::parse`;
/// it is folded into the summary's `error` field there.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("No track points found in GPX file")]
    NoPoints,

    #[error("Failed to parse GPX file")]
    Unexpected,
}

/// Reason a file is refused before it reaches the track processor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadRejected {
    #[error("Please upload a {expected} file")]
    Extension { file_name: String, expected: String },

    #[error("File too large (max {})", human_size(.limit))]
    TooLarge { size: u64, limit: u64 },
}

/// `10MB`, `512KB` or `1000 bytes`, whichever unit divides the limit exactly.
fn human_size(bytes: &u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    match *bytes {
        b if b >= MIB && b % MIB == 0 => format!("{}MB", b / MIB),
        b if b >= KIB && b % KIB == 0 => format!("{}KB", b / KIB),
        b => format!("{b} bytes"),
    }
}

/// Error reported by the persistence collaborator for a single record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
    pub code: Option<String>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("An upload is already in progress")]
    AlreadyRunning,
}

impl From<UploadRejected> for JsValue {
    fn from(e: UploadRejected) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

impl From<UploadError> for JsValue {
    fn from(e: UploadError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
