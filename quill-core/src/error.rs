use crate::conversation::DocumentId;

/// Failures that stop a request before it is issued
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("No active server configured ('{0}' is not defined)")]
    NoActiveServer(String),
    #[error("API key missing for server '{0}'. Set it with /key <apiKey>")]
    MissingApiKey(String),
    #[error("Unknown server '{0}'")]
    UnknownServer(String),
    #[error("Unknown agent '{0}'")]
    UnknownAgent(String),
    #[error("A request for {0} is already in progress")]
    Busy(DocumentId),
    #[error("{0}")]
    Usage(String),
    #[error("Failed to save configuration")]
    SaveFailed,
}
