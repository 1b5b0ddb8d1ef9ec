use leadervip_steering::SteeringError;
use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// A failure configured on the mock.
    #[error("{0}: injected failure")]
    Injected(&'static str),
}

impl SteeringError for Error {
    fn operation(&self) -> &str {
        match self {
            Self::Injected(operation) => operation,
        }
    }
}
