//! Binary that steers virtual addresses to the current etcd leader.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use leadervip_agent::{Agent, AgentConfig, Error, Result, parse_targets};
use leadervip_etcd::{EtcdClient, TlsConfig};
use leadervip_steering::{ForwardingMethod, Scheduler};
use leadervip_steering_ipvs::IpvsBackend;
use nix::unistd::Uid;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Comma-separated virtual addresses, e.g. `10.96.0.10:2379,10.96.0.10:2380`
    #[arg(index = 1, env = "LEADERVIP_TARGETS")]
    targets: String,

    /// etcd client endpoint
    #[arg(
        long,
        default_value = "https://127.0.0.1:2379",
        env = "LEADERVIP_ETCD_ENDPOINT"
    )]
    etcd_endpoint: Url,

    /// CA certificate of the etcd server
    #[arg(
        long,
        default_value = "/var/lib/rancher/k3s/server/tls/etcd/server-ca.crt",
        env = "LEADERVIP_CA_CERT"
    )]
    ca_cert: PathBuf,

    /// Client certificate presented to etcd
    #[arg(
        long,
        default_value = "/var/lib/rancher/k3s/server/tls/etcd/client.crt",
        env = "LEADERVIP_CLIENT_CERT"
    )]
    client_cert: PathBuf,

    /// Private key of the client certificate
    #[arg(
        long,
        default_value = "/var/lib/rancher/k3s/server/tls/etcd/client.key",
        env = "LEADERVIP_CLIENT_KEY"
    )]
    client_key: PathBuf,

    /// Dummy device owning the virtual addresses
    #[arg(long, default_value = "lvip0", env = "LEADERVIP_DEVICE")]
    device: String,

    /// IPVS forwarding method (masq, droute, tunnel)
    #[arg(long, default_value_t = ForwardingMethod::Masquerade, env = "LEADERVIP_FORWARDING")]
    forwarding: ForwardingMethod,

    /// Seconds between two reconciliation cycles
    #[arg(long, default_value_t = 30, env = "LEADERVIP_INTERVAL_SECS")]
    interval_secs: u64,

    /// Timeout for each etcd request in seconds (no timeout if unset)
    #[arg(long, env = "LEADERVIP_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: Option<u64>,

    /// IPVS scheduler (rr, wrr, lc, wlc, sh)
    #[arg(long, default_value_t = Scheduler::RoundRobin, env = "LEADERVIP_SCHEDULER")]
    scheduler: Scheduler,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let targets = parse_targets(&args.targets).await?;

    if !Uid::effective().is_root() {
        return Err(Error::NotRoot);
    }

    let tls = TlsConfig {
        ca_cert: args.ca_cert,
        client_cert: args.client_cert,
        client_key: args.client_key,
    };
    let timeout = args.request_timeout_secs.map(Duration::from_secs);
    let etcd = EtcdClient::new(args.etcd_endpoint, &tls, timeout)?;

    info!(
        endpoint = %etcd.endpoint(),
        targets = %targets
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
        "steering virtual addresses to the etcd leader"
    );

    let config = AgentConfig {
        interval: Duration::from_secs(args.interval_secs),
        device: args.device,
        scheduler: args.scheduler,
        forwarding: args.forwarding,
    };

    let shutdown = CancellationToken::new();
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| Error::Io("failed to create SIGTERM signal", e))?;

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
            _ = tokio::signal::ctrl_c() => info!("received SIGINT, initiating shutdown"),
        }

        signal_shutdown.cancel();
    });

    Agent::new(etcd, IpvsBackend::new(), targets, config)
        .run(shutdown)
        .await;

    Ok(())
}
