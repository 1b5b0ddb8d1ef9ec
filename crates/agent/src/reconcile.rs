use crate::targets::VirtualTarget;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use leadervip_steering::{ForwardingMethod, Scheduler, SteeringBackend, SteeringError};
use thiserror::Error;
use tracing::{debug, error};

/// Step of the reconciliation that failed for a target.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    /// Creating the device or binding the virtual address to it.
    Bind,

    /// Declaring the virtual service.
    Service,

    /// Attaching the leader as real server.
    RealServer,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bind => "bind",
            Self::Service => "service",
            Self::RealServer => "real server",
        })
    }
}

/// A backend failure for a single target.
#[derive(Debug, Error)]
#[error("{target} ({stage}): {source}")]
pub struct TargetFailure<E: SteeringError> {
    /// The target being reconciled.
    pub target: VirtualTarget,

    /// The step that failed.
    pub stage: Stage,

    /// The backend error.
    #[source]
    pub source: E,
}

/// Failures collected during one reconciliation cycle.
#[derive(Debug, Error)]
pub enum ReconcileError<E: SteeringError> {
    /// Some targets failed; all others were reconciled.
    #[error("{} target operation(s) failed", .0.len())]
    Partial(Vec<TargetFailure<E>>),

    /// Clearing the forwarding table failed, so no rules were installed.
    #[error("failed to reset forwarding rules: {source}")]
    ResetFailed {
        /// The backend error.
        #[source]
        source: E,

        /// Binding failures that happened before the reset.
        failures: Vec<TargetFailure<E>>,
    },
}

impl<E: SteeringError> ReconcileError<E> {
    /// Per-target failures of the cycle.
    pub fn failures(&self) -> &[TargetFailure<E>] {
        match self {
            Self::Partial(failures) | Self::ResetFailed { failures, .. } => failures,
        }
    }
}

/// Rebuilds the steering state from scratch for a given leader.
pub struct Reconciler<B: SteeringBackend> {
    // Set when the device was created and ARP is not yet suppressed on it.
    arp_pending: AtomicBool,
    backend: B,
    device: String,
    forwarding: ForwardingMethod,
    scheduler: Scheduler,
}

impl<B: SteeringBackend> Reconciler<B> {
    /// Creates a reconciler binding virtual addresses to `device`.
    pub fn new(
        backend: B,
        device: impl Into<String>,
        scheduler: Scheduler,
        forwarding: ForwardingMethod,
    ) -> Self {
        Self {
            arp_pending: AtomicBool::new(false),
            backend,
            device: device.into(),
            forwarding,
            scheduler,
        }
    }

    /// Makes every target forward to `leader`.
    ///
    /// The forwarding table is reset exactly once, after all virtual addresses
    /// are bound and before any service is declared.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::ResetFailed`] if the table could not be reset,
    /// in which case no service was declared, and
    /// [`ReconcileError::Partial`] if any target failed while the others were
    /// still processed.
    pub async fn reconcile(
        &self,
        leader: &str,
        targets: &[VirtualTarget],
    ) -> Result<(), ReconcileError<B::Error>> {
        let mut failures = Vec::new();

        for target in targets {
            if let Err(source) = self.bind(target).await {
                failures.push(failure(target, Stage::Bind, source));
            }
        }

        if let Err(source) = self.backend.reset_forwarding_rules().await {
            return Err(ReconcileError::ResetFailed { source, failures });
        }

        for target in targets {
            let service = target.service();

            if let Err(source) = self
                .backend
                .add_virtual_service(&service, self.scheduler)
                .await
            {
                failures.push(failure(target, Stage::Service, source));
                continue;
            }

            let real = target.real_server(leader);

            if let Err(source) = self
                .backend
                .add_real_server(&service, &real, self.forwarding)
                .await
            {
                failures.push(failure(target, Stage::RealServer, source));
                continue;
            }

            debug!(%service, %real, "forwarding installed");
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ReconcileError::Partial(failures))
        }
    }

    async fn bind(&self, target: &VirtualTarget) -> Result<(), B::Error> {
        if self.backend.ensure_dummy_device(&self.device).await? {
            self.arp_pending.store(true, Ordering::Relaxed);
        }

        // The kernel keeps the setting with the device, so a success is final.
        if self.arp_pending.load(Ordering::Relaxed) {
            self.backend.suppress_arp(&self.device).await?;
            self.arp_pending.store(false, Ordering::Relaxed);
        }

        self.backend.bring_device_up(&self.device).await?;
        self.backend.bind_address(&target.host, &self.device).await
    }
}

fn failure<E: SteeringError>(
    target: &VirtualTarget,
    stage: Stage,
    source: E,
) -> TargetFailure<E> {
    error!(
        %target,
        %stage,
        operation = source.operation(),
        error = %source,
        "reconciliation step failed"
    );

    TargetFailure {
        target: target.clone(),
        stage,
        source,
    }
}
