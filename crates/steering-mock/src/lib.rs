//! In-memory steering backend that records every call, for testing.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::{Error, Result};

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use leadervip_steering::{ForwardingMethod, Scheduler, ServiceAddress, SteeringBackend};

/// A call made against the mock, in the order it was made.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    /// `ensure_dummy_device`.
    EnsureDummyDevice(String),

    /// `suppress_arp`.
    SuppressArp(String),

    /// `bring_device_up`.
    BringDeviceUp(String),

    /// `bind_address`.
    BindAddress {
        /// The bound address.
        address: String,

        /// The device it was bound to.
        device: String,
    },

    /// `reset_forwarding_rules`.
    ResetForwardingRules,

    /// `add_virtual_service`.
    AddVirtualService {
        /// The virtual service.
        service: ServiceAddress,

        /// Its scheduler.
        scheduler: Scheduler,
    },

    /// `add_real_server`.
    AddRealServer {
        /// The virtual service.
        service: ServiceAddress,

        /// The attached real server.
        real: ServiceAddress,

        /// Forwarding method.
        method: ForwardingMethod,
    },
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    devices: HashSet<String>,
    failing_binds: HashSet<String>,
    failing_services: HashSet<ServiceAddress>,
    fail_next_suppress_arp: bool,
    fail_reset: bool,
}

/// Recording steering backend. Clones share the same recording.
#[derive(Clone, Debug, Default)]
pub struct MockSteering {
    state: Arc<Mutex<State>>,
}

impl MockSteering {
    /// Create a new mock with no devices and no failures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `bind_address` fail for the given address.
    pub fn fail_bind_for(&self, address: impl Into<String>) {
        self.lock().failing_binds.insert(address.into());
    }

    /// Make `add_virtual_service` fail for the given service.
    pub fn fail_service_for(&self, service: ServiceAddress) {
        self.lock().failing_services.insert(service);
    }

    /// Make the next `suppress_arp` call fail; later calls succeed.
    pub fn fail_next_suppress_arp(&self) {
        self.lock().fail_next_suppress_arp = true;
    }

    /// Make `reset_forwarding_rules` fail.
    pub fn fail_reset(&self) {
        self.lock().fail_reset = true;
    }

    /// All calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Forget the recorded calls, keeping devices and configured failures.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of recorded calls matching the predicate.
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record(&self, call: Call) -> MutexGuard<'_, State> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }
}

#[async_trait]
impl SteeringBackend for MockSteering {
    type Error = Error;

    async fn ensure_dummy_device(&self, name: &str) -> Result<bool> {
        let mut state = self.record(Call::EnsureDummyDevice(name.to_string()));

        Ok(state.devices.insert(name.to_string()))
    }

    async fn suppress_arp(&self, name: &str) -> Result<()> {
        let mut state = self.record(Call::SuppressArp(name.to_string()));

        if std::mem::take(&mut state.fail_next_suppress_arp) {
            return Err(Error::Injected("suppress arp"));
        }

        Ok(())
    }

    async fn bring_device_up(&self, name: &str) -> Result<()> {
        self.record(Call::BringDeviceUp(name.to_string()));

        Ok(())
    }

    async fn bind_address(&self, address: &str, device: &str) -> Result<()> {
        let state = self.record(Call::BindAddress {
            address: address.to_string(),
            device: device.to_string(),
        });

        if state.failing_binds.contains(address) {
            return Err(Error::Injected("bind address"));
        }

        Ok(())
    }

    async fn reset_forwarding_rules(&self) -> Result<()> {
        let state = self.record(Call::ResetForwardingRules);

        if state.fail_reset {
            return Err(Error::Injected("reset forwarding rules"));
        }

        Ok(())
    }

    async fn add_virtual_service(
        &self,
        service: &ServiceAddress,
        scheduler: Scheduler,
    ) -> Result<()> {
        let state = self.record(Call::AddVirtualService {
            service: service.clone(),
            scheduler,
        });

        if state.failing_services.contains(service) {
            return Err(Error::Injected("add virtual service"));
        }

        Ok(())
    }

    async fn add_real_server(
        &self,
        service: &ServiceAddress,
        real: &ServiceAddress,
        method: ForwardingMethod,
    ) -> Result<()> {
        self.record(Call::AddRealServer {
            service: service.clone(),
            real: real.clone(),
            method,
        });

        Ok(())
    }
}
