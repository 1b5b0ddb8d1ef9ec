//! Keeps IPVS virtual services pointed at the current etcd leader.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod agent;
mod error;
mod locator;
mod reconcile;
mod targets;

pub use agent::{Agent, AgentConfig, CycleOutcome};
pub use error::{Error, Result};
pub use locator::LeaderLocator;
pub use reconcile::{ReconcileError, Reconciler, Stage, TargetFailure};
pub use targets::{ParseError, VirtualTarget, parse_targets};
