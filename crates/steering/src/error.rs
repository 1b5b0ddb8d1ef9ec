use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// Unknown forwarding method name.
    #[error("unknown forwarding method: {0}")]
    UnknownForwardingMethod(String),

    /// Unknown scheduler name.
    #[error("unknown scheduler: {0}")]
    UnknownScheduler(String),
}
