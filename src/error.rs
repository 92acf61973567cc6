use serde_json::json;
use thiserror::Error;

/// Failures that end a single link or redirect request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlinkError {
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("token expired")]
    ExpiredToken,

    #[error("unknown chain: {0}")]
    UnknownPreset(String),

    #[error("address too short: {0} characters")]
    AddressTooShort(usize),

    #[error("no metadata for token {0}")]
    MetadataUnavailable(String),

    #[error("metadata lookup: {0}")]
    MetadataLookup(String),

    #[error("storage: {0}")]
    Storage(String),
}

impl BlinkError {
    pub fn missing(name: impl Into<String>) -> Self {
        BlinkError::MissingParameter(name.into())
    }

    pub fn status(&self) -> u16 {
        match self {
            BlinkError::MissingParameter(_)
            | BlinkError::ExpiredToken
            | BlinkError::UnknownPreset(_)
            | BlinkError::AddressTooShort(_) => 400,
            BlinkError::MetadataUnavailable(_) => 422,
            BlinkError::MetadataLookup(_) => 502,
            BlinkError::MalformedToken(_) | BlinkError::Storage(_) => 500,
        }
    }

    /// Message safe to hand back to the caller. Internal causes stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            BlinkError::MissingParameter(_) => "Invalid parameters".into(),
            BlinkError::ExpiredToken => "Token expired".into(),
            BlinkError::MalformedToken(_) | BlinkError::Storage(_) => {
                "Internal server error".into()
            }
            BlinkError::MetadataLookup(_) => "Token metadata service unavailable".into(),
            other => other.to_string(),
        }
    }

    pub fn body(&self) -> serde_json::Value {
        json!({ "error": self.public_message() })
    }
}
