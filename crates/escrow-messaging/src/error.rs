use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("channel not found: {0}")]
    ChannelNotFound(String),
    #[error("bot was evicted from the channel")]
    BotEvicted,
    #[error("access denied: {0}")]
    AccessDenied(String),
    /// Neither "not found" nor "still exists" could be determined. Callers
    /// must treat this as "no change, retry later" — never as a deletion.
    #[error("could not determine message existence: {0}")]
    VerifyUnknown(String),
}
