use std::error::Error as StdError;

use async_trait::async_trait;
use leadervip_etcd::EtcdClient;

/// Source of the current leader's reachable host.
#[async_trait]
pub trait LeaderLocator
where
    Self: Send + Sync + 'static,
{
    /// The error type for the locator.
    type Error: StdError + Send + Sync + 'static;

    /// Find the leader and return the host clients should connect to.
    async fn locate_leader(&self) -> Result<String, Self::Error>;
}

#[async_trait]
impl LeaderLocator for EtcdClient {
    type Error = leadervip_etcd::Error;

    async fn locate_leader(&self) -> Result<String, Self::Error> {
        Self::locate_leader(self).await
    }
}
