use crate::targets::ParseError;

use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop the agent before its control loop starts.
#[derive(Debug, Error)]
pub enum Error {
    /// The etcd client could not be set up.
    #[error(transparent)]
    Etcd(#[from] leadervip_etcd::Error),

    /// IO operation failed.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),

    /// Steering requires root privileges.
    #[error("must be root")]
    NotRoot,

    /// The virtual address list is invalid.
    #[error(transparent)]
    Targets(#[from] ParseError),
}
