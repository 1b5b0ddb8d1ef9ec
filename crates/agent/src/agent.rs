use crate::locator::LeaderLocator;
use crate::reconcile::Reconciler;
use crate::targets::VirtualTarget;

use std::time::Duration;

use leadervip_steering::{ForwardingMethod, Scheduler, SteeringBackend};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Settings of the control loop.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Pause between two cycles.
    pub interval: Duration,

    /// Dummy device owning the virtual addresses.
    pub device: String,

    /// Scheduler of every virtual service.
    pub scheduler: Scheduler,

    /// How traffic reaches the leader.
    pub forwarding: ForwardingMethod,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            device: "lvip0".to_string(),
            scheduler: Scheduler::default(),
            forwarding: ForwardingMethod::default(),
        }
    }
}

/// Result of a single cycle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CycleOutcome {
    /// The leader could not be located; nothing was changed.
    DiscoveryFailed,

    /// Every target now forwards to `leader`.
    Reconciled {
        /// Host of the leader.
        leader: String,
    },

    /// Some or all targets could not be pointed at `leader`.
    ReconcileFailed {
        /// Host of the leader.
        leader: String,
    },
}

/// Polls for the leader and rebuilds the steering state on a fixed interval.
pub struct Agent<L: LeaderLocator, B: SteeringBackend> {
    interval: Duration,
    leader: Option<String>,
    locator: L,
    reconciler: Reconciler<B>,
    targets: Vec<VirtualTarget>,
}

impl<L: LeaderLocator, B: SteeringBackend> Agent<L, B> {
    /// Creates a new agent.
    pub fn new(locator: L, backend: B, targets: Vec<VirtualTarget>, config: AgentConfig) -> Self {
        let reconciler = Reconciler::new(
            backend,
            config.device,
            config.scheduler,
            config.forwarding,
        );

        Self {
            interval: config.interval,
            leader: None,
            locator,
            reconciler,
            targets,
        }
    }

    /// The leader seen by the last successful discovery.
    pub fn leader(&self) -> Option<&str> {
        self.leader.as_deref()
    }

    /// Runs cycles until `shutdown` is cancelled. Failures never end the loop.
    ///
    /// A cycle still in flight when shutdown is requested is abandoned; every
    /// backend operation is idempotent and the next start rebuilds the state.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        info!(
            interval = ?self.interval,
            targets = self.targets.len(),
            "control loop started"
        );

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    info!("shutdown requested, abandoning cycle in flight");
                    break;
                }
                _ = self.run_cycle() => {}
            }

            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("control loop stopped");
    }

    /// Locates the leader and, if found, reconciles every target against it.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let leader = match self.locator.locate_leader().await {
            Ok(leader) => leader,
            Err(e) => {
                error!(error = %e, "failed to locate leader");
                return CycleOutcome::DiscoveryFailed;
            }
        };

        match self.leader.as_deref() {
            Some(previous) if previous == leader => debug!(%leader, "leader unchanged"),
            Some(previous) => info!(from = %previous, to = %leader, "leader changed"),
            None => info!(%leader, "leader found"),
        }
        self.leader = Some(leader.clone());

        match self.reconciler.reconcile(&leader, &self.targets).await {
            Ok(()) => {
                debug!(%leader, "steering state reconciled");
                CycleOutcome::Reconciled { leader }
            }
            Err(e) => {
                error!(%leader, error = %e, "reconciliation incomplete");
                CycleOutcome::ReconcileFailed { leader }
            }
        }
    }
}
