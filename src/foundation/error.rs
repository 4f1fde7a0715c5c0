/// Convenience result alias used across the crate.
pub type ReelResult<T> = Result<T, ReelError>;

/// Error kinds for a generation run.
///
/// Every variant aborts the current run; nothing is retried automatically.
/// Messages are surfaced verbatim to the caller, including engine
/// diagnostic text.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Engine resources unreachable or the engine could not be instantiated.
    #[error("engine load error: {0}")]
    EngineLoad(String),

    /// Image write failure: malformed frame data or engine not ready.
    #[error("staging error: {0}")]
    Staging(String),

    /// Engine-reported encode failure.
    #[error("encode error: {0}")]
    Encode(String),

    /// Output artifact missing or unreadable after encode.
    #[error("read error: {0}")]
    Read(String),

    /// Invalid parameters or state outside the engine boundary.
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    pub fn engine_load(msg: impl Into<String>) -> Self {
        Self::EngineLoad(msg.into())
    }

    pub fn staging(msg: impl Into<String>) -> Self {
        Self::Staging(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
