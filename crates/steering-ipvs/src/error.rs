use std::process::ExitStatus;

use leadervip_steering::SteeringError;
use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The command could not be spawned.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),

    /// The command ran but reported failure.
    #[error("{operation} unexpectedly exited with {status}: {output}")]
    NonZeroExit {
        /// Operation that issued the command.
        operation: &'static str,

        /// Exit status of the command.
        status: ExitStatus,

        /// Combined stdout and stderr.
        output: String,
    },
}

impl SteeringError for Error {
    fn operation(&self) -> &str {
        match self {
            Self::Io(operation, _) | Self::NonZeroExit { operation, .. } => operation,
        }
    }
}
