//! Abstract interface for the local traffic-steering state: a dummy device
//! owning the virtual addresses and a table of virtual services forwarding to
//! real servers.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod address;
mod error;
mod policy;

pub use address::ServiceAddress;
pub use error::{Error, Result};
pub use policy::{ForwardingMethod, Scheduler};

use std::error::Error as StdError;
use std::fmt::Debug;

use async_trait::async_trait;

/// Marker trait for `SteeringBackend` errors.
pub trait SteeringError: Debug + StdError + Send + Sync + 'static {
    /// Name of the operation that failed.
    fn operation(&self) -> &str;
}

/// Idempotent operations on the host's traffic-steering state.
#[async_trait]
pub trait SteeringBackend
where
    Self: Send + Sync + 'static,
{
    /// The error type for the backend.
    type Error: SteeringError;

    /// Create the dummy device if it does not exist yet.
    ///
    /// Returns `true` if the device was created by this call and `false` if it
    /// was already present.
    async fn ensure_dummy_device(&self, name: &str) -> std::result::Result<bool, Self::Error>;

    /// Stop the device from answering or announcing ARP for addresses it owns.
    async fn suppress_arp(&self, name: &str) -> std::result::Result<(), Self::Error>;

    /// Set the device administratively up.
    async fn bring_device_up(&self, name: &str) -> std::result::Result<(), Self::Error>;

    /// Bind a host-only address to the device.
    async fn bind_address(
        &self,
        address: &str,
        device: &str,
    ) -> std::result::Result<(), Self::Error>;

    /// Remove every virtual service on the host, including ones this agent did
    /// not install.
    async fn reset_forwarding_rules(&self) -> std::result::Result<(), Self::Error>;

    /// Declare a virtual service.
    async fn add_virtual_service(
        &self,
        service: &ServiceAddress,
        scheduler: Scheduler,
    ) -> std::result::Result<(), Self::Error>;

    /// Attach a real server to a previously declared virtual service.
    async fn add_real_server(
        &self,
        service: &ServiceAddress,
        real: &ServiceAddress,
        method: ForwardingMethod,
    ) -> std::result::Result<(), Self::Error>;
}
