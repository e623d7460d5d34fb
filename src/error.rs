
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimecourseError {
    #[error("Format violation: {message}")]
    FormatViolation { message: String },
    #[error("Structural mismatch: {message}")]
    StructuralMismatch { message: String },
    #[error("Stale version: {dataset} serial number was {expected} when the parse began but is now {found}")]
    StaleVersion { dataset: &'static str, expected: u64, found: u64 },
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),
    #[error("Document error: {message}")]
    Document { message: String, position: Option<u64> },
    #[error("Config error: {0}")]
    Config(String),
    #[error("Io error: {0}")]
    Io(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, TimecourseError>;

impl TimecourseError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::FormatViolation { message: message.into() }
    }
    pub fn mismatch(message: impl Into<String>) -> Self {
        Self::StructuralMismatch { message: message.into() }
    }
    /// Errors a user can act on by fixing the document, as opposed to defects.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::FormatViolation { .. } | Self::StructuralMismatch { .. } | Self::Document { .. }
        )
    }
}

// Helper conversions
impl From<quick_xml::Error> for TimecourseError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Document { message: e.to_string(), position: None }
    }
}
impl From<quick_xml::events::attributes::AttrError> for TimecourseError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::Document { message: e.to_string(), position: None }
    }
}
impl From<config::ConfigError> for TimecourseError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<std::io::Error> for TimecourseError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}
impl From<serde_json::Error> for TimecourseError {
    fn from(e: serde_json::Error) -> Self { Self::Io(e.to_string()) }
}
impl From<std::str::Utf8Error> for TimecourseError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self::Document { message: e.to_string(), position: None }
    }
}
impl From<std::string::FromUtf8Error> for TimecourseError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::Document { message: e.to_string(), position: None }
    }
}
