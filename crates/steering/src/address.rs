use std::fmt;

/// A `host:port` pair as understood by the forwarding table.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ServiceAddress {
    /// IP literal or host name, without brackets.
    pub host: String,

    /// TCP port.
    pub port: u16,
}

impl ServiceAddress {
    /// Create a new service address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // IPv6 literals need brackets so the port separator stays unambiguous.
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_ipv4() {
        assert_eq!(ServiceAddress::new("10.0.0.1", 80).to_string(), "10.0.0.1:80");
    }

    #[test]
    fn test_display_ipv6_is_bracketed() {
        assert_eq!(
            ServiceAddress::new("fd00::1", 443).to_string(),
            "[fd00::1]:443"
        );
    }
}
