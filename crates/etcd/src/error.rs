use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading credential material failed.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),

    /// The matched leader advertises no client address, or no member matches.
    #[error("no client address found for leader {0}")]
    LeaderAddressMissing(String),

    /// The leader's first client address is not `[scheme://]host:port`.
    #[error("malformed client address: {0}")]
    MalformedAddress(String),

    /// The member list request failed or returned an unexpected body.
    #[error("member list unavailable: {0}")]
    MembersUnavailable(#[source] reqwest::Error),

    /// The cluster reported no current leader.
    #[error("cluster has no leader")]
    NoLeader,

    /// The status request failed or returned an unexpected body.
    #[error("cluster status unavailable: {0}")]
    StatusUnavailable(#[source] reqwest::Error),

    /// Building the mutually authenticated client failed.
    #[error("failed to configure tls: {0}")]
    Tls(#[source] reqwest::Error),
}
