//! Event domain error types

use database::DatabaseError;
use std::fmt;

/// Result type for event operations
pub type Result<T> = std::result::Result<T, EventError>;

/// Event domain errors
#[derive(Debug)]
pub enum EventError {
    /// A received request could not be mapped to a CloudEvent
    InvalidEvent { message: String },

    /// The document store rejected or failed an operation
    Store {
        message: String,
        source: Option<DatabaseError>,
    },

    /// Encoding or decoding between events and documents failed
    Serialization { message: String },
}

impl EventError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidEvent {
            message: message.into(),
        }
    }
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEvent { message } => write!(f, "Invalid event: {}", message),
            Self::Store { message, .. } => write!(f, "{}", message),
            Self::Serialization { message } => write!(f, "Serialization error: {}", message),
        }
    }
}

impl std::error::Error for EventError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store {
                source: Some(e), ..
            } => Some(e),
            _ => None,
        }
    }
}

impl From<DatabaseError> for EventError {
    fn from(err: DatabaseError) -> Self {
        Self::Store {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}
