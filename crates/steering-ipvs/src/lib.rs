//! Traffic steering backed by Linux IPVS. Every operation maps to a single
//! invocation of `ip`, `sysctl` or `ipvsadm`.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::{Error, Result};

use std::net::IpAddr;
use std::process::Output;

use async_trait::async_trait;
use leadervip_steering::{ForwardingMethod, Scheduler, ServiceAddress, SteeringBackend};
use tokio::process::Command;
use tracing::debug;

static DEFAULT_IP: &str = "ip";
static DEFAULT_IPVSADM: &str = "ipvsadm";
static DEFAULT_SYSCTL: &str = "sysctl";

/// `arp_ignore=1`: only reply for addresses configured on the incoming interface.
static ARP_IGNORE: &str = "1";

/// `arp_announce=2`: always use the best local address as ARP source.
static ARP_ANNOUNCE: &str = "2";

/// IPVS implementation of [`SteeringBackend`].
#[derive(Clone, Debug)]
pub struct IpvsBackend {
    ip: String,
    ipvsadm: String,
    sysctl: String,
}

impl Default for IpvsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl IpvsBackend {
    /// Creates a backend that resolves the tools through `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_programs(DEFAULT_IP, DEFAULT_IPVSADM, DEFAULT_SYSCTL)
    }

    /// Creates a backend using explicit program paths.
    pub fn with_programs(
        ip: impl Into<String>,
        ipvsadm: impl Into<String>,
        sysctl: impl Into<String>,
    ) -> Self {
        Self {
            ip: ip.into(),
            ipvsadm: ipvsadm.into(),
            sysctl: sysctl.into(),
        }
    }

    async fn exec(
        &self,
        operation: &'static str,
        program: &str,
        args: &[String],
    ) -> Result<Output> {
        debug!(operation, "running {} {}", program, args.join(" "));

        Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| Error::Io(operation, e))
    }

    async fn run(&self, operation: &'static str, program: &str, args: &[String]) -> Result<()> {
        let output = self.exec(operation, program, args).await?;

        check_status(operation, &output)
    }
}

#[async_trait]
impl SteeringBackend for IpvsBackend {
    type Error = Error;

    async fn ensure_dummy_device(&self, name: &str) -> Result<bool> {
        let output = self
            .exec("ensure dummy device", &self.ip, &link_add_args(name))
            .await?;

        classify_link_add(&output)
    }

    async fn suppress_arp(&self, name: &str) -> Result<()> {
        self.run(
            "suppress arp",
            &self.sysctl,
            &sysctl_args(name, "arp_ignore", ARP_IGNORE),
        )
        .await?;

        self.run(
            "suppress arp",
            &self.sysctl,
            &sysctl_args(name, "arp_announce", ARP_ANNOUNCE),
        )
        .await
    }

    async fn bring_device_up(&self, name: &str) -> Result<()> {
        let args = strings(&["link", "set", name, "up"]);

        self.run("bring device up", &self.ip, &args).await
    }

    async fn bind_address(&self, address: &str, device: &str) -> Result<()> {
        self.run("bind address", &self.ip, &addr_replace_args(address, device))
            .await
    }

    async fn reset_forwarding_rules(&self) -> Result<()> {
        self.run("reset forwarding rules", &self.ipvsadm, &strings(&["-C"]))
            .await
    }

    async fn add_virtual_service(
        &self,
        service: &ServiceAddress,
        scheduler: Scheduler,
    ) -> Result<()> {
        self.run(
            "add virtual service",
            &self.ipvsadm,
            &virtual_service_args(service, scheduler),
        )
        .await
    }

    async fn add_real_server(
        &self,
        service: &ServiceAddress,
        real: &ServiceAddress,
        method: ForwardingMethod,
    ) -> Result<()> {
        self.run(
            "add real server",
            &self.ipvsadm,
            &real_server_args(service, real, method),
        )
        .await
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(ToString::to_string).collect()
}

fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    format!("{}{}", stdout, stderr).trim().to_string()
}

fn check_status(operation: &'static str, output: &Output) -> Result<()> {
    if output.status.success() {
        Ok(())
    } else {
        Err(Error::NonZeroExit {
            operation,
            status: output.status,
            output: combined_output(output),
        })
    }
}

/// `ip link add` fails with EEXIST when the device is already there.
fn classify_link_add(output: &Output) -> Result<bool> {
    if output.status.success() {
        return Ok(true);
    }

    if String::from_utf8_lossy(&output.stderr).contains("File exists") {
        return Ok(false);
    }

    check_status("ensure dummy device", output).map(|()| false)
}

fn prefix_len(address: &str) -> u8 {
    match address.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => 128,
        _ => 32,
    }
}

fn link_add_args(name: &str) -> Vec<String> {
    strings(&["link", "add", name, "type", "dummy"])
}

/// sysctl reads `/` inside a key component as a literal `.`, which keeps
/// VLAN-style device names such as `eth0.100` in one component.
fn sysctl_args(device: &str, key: &str, value: &str) -> Vec<String> {
    let device = device.replace('.', "/");

    vec![
        "-w".to_string(),
        format!("net.ipv4.conf.{device}.{key}={value}"),
    ]
}

fn addr_replace_args(address: &str, device: &str) -> Vec<String> {
    vec![
        "addr".to_string(),
        "replace".to_string(),
        format!("{}/{}", address, prefix_len(address)),
        "dev".to_string(),
        device.to_string(),
    ]
}

fn virtual_service_args(service: &ServiceAddress, scheduler: Scheduler) -> Vec<String> {
    vec![
        "-A".to_string(),
        "-t".to_string(),
        service.to_string(),
        "-s".to_string(),
        scheduler.to_string(),
    ]
}

fn real_server_args(
    service: &ServiceAddress,
    real: &ServiceAddress,
    method: ForwardingMethod,
) -> Vec<String> {
    vec![
        "-a".to_string(),
        "-t".to_string(),
        service.to_string(),
        "-r".to_string(),
        real.to_string(),
        method.ipvsadm_flag().to_string(),
    ]
}
