use std::fmt;
use std::net::IpAddr;
use std::num::ParseIntError;
use std::str::FromStr;

use leadervip_steering::ServiceAddress;
use thiserror::Error;

/// Errors produced while parsing the list of virtual addresses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// No `host:port` pair was found in the input.
    #[error("no virtual addresses given")]
    Empty,

    /// The port is not an unsigned integer.
    #[error("invalid port in {0:?}: {1}")]
    InvalidPort(String, #[source] ParseIntError),

    /// The segment has no `:` separating host and port.
    #[error("missing port separator in {0:?}")]
    MissingPort(String),

    /// The port is outside 1-65535.
    #[error("port {1} out of range (1-65535) in {0:?}")]
    PortOutOfRange(String, u64),

    /// The host is neither an IP literal nor a resolvable name.
    #[error("invalid ip or unresolvable host {0:?}")]
    UnresolvableHost(String),
}

/// A virtual `host:port` whose traffic is steered to the leader.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct VirtualTarget {
    /// IP literal or host name, without brackets.
    pub host: String,

    /// Port in 1-65535.
    pub port: u16,
}

impl VirtualTarget {
    /// The virtual service for this target.
    #[must_use]
    pub fn service(&self) -> ServiceAddress {
        ServiceAddress::new(self.host.clone(), self.port)
    }

    /// The real server for this target when `leader` holds leadership.
    #[must_use]
    pub fn real_server(&self, leader: &str) -> ServiceAddress {
        ServiceAddress::new(leader, self.port)
    }
}

impl fmt::Display for VirtualTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.service(), f)
    }
}

impl FromStr for VirtualTarget {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The last colon separates the port so IPv6 literals keep theirs.
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| ParseError::MissingPort(s.to_string()))?;

        let port = port
            .parse::<u64>()
            .map_err(|e| ParseError::InvalidPort(s.to_string(), e))?;
        let port = u16::try_from(port)
            .ok()
            .filter(|port| *port != 0)
            .ok_or_else(|| ParseError::PortOutOfRange(s.to_string(), port))?;

        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        if host.is_empty() {
            return Err(ParseError::UnresolvableHost(String::new()));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

async fn resolves(host: &str, port: u16) -> bool {
    host.parse::<IpAddr>().is_ok()
        || tokio::net::lookup_host((host, port))
            .await
            .is_ok_and(|mut addrs| addrs.next().is_some())
}

/// Parses a comma-separated list of `host:port` pairs.
///
/// Host names go through the system resolver; IP literals are taken as is.
/// Blank entries are skipped and repeated entries are kept once, in order of
/// first appearance.
///
/// # Errors
///
/// This function will return an error if any entry is invalid or names an
/// unresolvable host, or if no entry remains.
pub async fn parse_targets(input: &str) -> Result<Vec<VirtualTarget>, ParseError> {
    let mut targets: Vec<VirtualTarget> = Vec::new();

    for segment in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let target = segment.parse::<VirtualTarget>()?;

        if !resolves(&target.host, target.port).await {
            return Err(ParseError::UnresolvableHost(target.host));
        }

        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    if targets.is_empty() {
        return Err(ParseError::Empty);
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_parses_in_input_order() {
        let targets = parse_targets("10.0.0.2:1, 10.0.0.1:2").await.unwrap();

        assert_eq!(
            targets,
            vec![
                VirtualTarget {
                    host: "10.0.0.2".to_string(),
                    port: 1
                },
                VirtualTarget {
                    host: "10.0.0.1".to_string(),
                    port: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_inputs() {
        assert!(matches!(parse_targets("").await, Err(ParseError::Empty)));
        assert!(matches!(parse_targets(",, ,").await, Err(ParseError::Empty)));
    }

    #[tokio::test]
    async fn test_port_out_of_range() {
        assert!(matches!(
            parse_targets("10.0.0.1:70000").await,
            Err(ParseError::PortOutOfRange(_, 70000))
        ));
        assert!(matches!(
            parse_targets("10.0.0.1:0").await,
            Err(ParseError::PortOutOfRange(_, 0))
        ));
    }

    #[tokio::test]
    async fn test_non_numeric_port() {
        assert!(matches!(
            parse_targets("10.0.0.1:abc").await,
            Err(ParseError::InvalidPort(..))
        ));
        assert!(matches!(
            parse_targets("10.0.0.1:-1").await,
            Err(ParseError::InvalidPort(..))
        ));
    }

    #[tokio::test]
    async fn test_missing_separator() {
        assert!(matches!(
            parse_targets("10.0.0.1").await,
            Err(ParseError::MissingPort(s)) if s == "10.0.0.1"
        ));
    }

    #[tokio::test]
    async fn test_unresolvable_host() {
        assert!(matches!(
            parse_targets("nosuchhost.invalid:80").await,
            Err(ParseError::UnresolvableHost(h)) if h == "nosuchhost.invalid"
        ));
        assert!(matches!(
            parse_targets(":80").await,
            Err(ParseError::UnresolvableHost(_))
        ));
    }

    #[tokio::test]
    async fn test_resolvable_name() {
        let targets = parse_targets("localhost:8080").await.unwrap();

        assert_eq!(targets[0].host, "localhost");
    }

    #[tokio::test]
    async fn test_ipv6_literals() {
        let targets = parse_targets("fd00::1:443,[::1]:80").await.unwrap();

        assert_eq!(targets[0].host, "fd00::1");
        assert_eq!(targets[0].port, 443);
        assert_eq!(targets[1].host, "::1");
        assert_eq!(targets[1].to_string(), "[::1]:80");
    }

    #[tokio::test]
    async fn test_one_bad_entry_fails_all() {
        assert!(parse_targets("10.0.0.1:80,10.0.0.1:x").await.is_err());
    }

    #[tokio::test]
    async fn test_duplicates_collapsed() {
        let targets = parse_targets("1.2.3.4:80,1.2.3.4:443,1.2.3.4:80").await.unwrap();

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].port, 443);
    }

    #[test]
    fn test_real_server_uses_target_port() {
        let target: VirtualTarget = "1.2.3.4:443".parse().unwrap();

        assert_eq!(target.real_server("9.9.9.9").to_string(), "9.9.9.9:443");
    }
}
