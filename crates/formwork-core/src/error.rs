use thiserror::Error;

#[derive(Debug, Error)]
pub enum UiError {
    #[error("missing required property `{0}`")]
    MissingProperty(String),
    #[error("style `{0}` not found in theme")]
    MissingStyle(String),
    #[error("unknown control type `{0}`")]
    UnknownControlType(String),
    #[error("index {index} out of range for container with {len} controls")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("control `{0}` cannot be added to itself")]
    SelfInsertion(String),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T, E = UiError> = std::result::Result<T, E>;
