use crate::Error;

use std::fmt;
use std::str::FromStr;

/// Scheduling policy of a virtual service.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Scheduler {
    /// Round robin (`rr`).
    #[default]
    RoundRobin,

    /// Weighted round robin (`wrr`).
    WeightedRoundRobin,

    /// Least connection (`lc`).
    LeastConnection,

    /// Weighted least connection (`wlc`).
    WeightedLeastConnection,

    /// Source hashing (`sh`).
    SourceHashing,
}

impl Scheduler {
    /// Short name used by `ipvsadm -s`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RoundRobin => "rr",
            Self::WeightedRoundRobin => "wrr",
            Self::LeastConnection => "lc",
            Self::WeightedLeastConnection => "wlc",
            Self::SourceHashing => "sh",
        }
    }
}

impl fmt::Display for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheduler {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rr" => Ok(Self::RoundRobin),
            "wrr" => Ok(Self::WeightedRoundRobin),
            "lc" => Ok(Self::LeastConnection),
            "wlc" => Ok(Self::WeightedLeastConnection),
            "sh" => Ok(Self::SourceHashing),
            other => Err(Error::UnknownScheduler(other.to_string())),
        }
    }
}

/// How packets reach the real server.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ForwardingMethod {
    /// NAT (`-m`).
    #[default]
    Masquerade,

    /// Direct routing (`-g`).
    DirectRouting,

    /// IP-in-IP tunnelling (`-i`).
    Tunnel,
}

impl ForwardingMethod {
    /// Name accepted on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Masquerade => "masq",
            Self::DirectRouting => "droute",
            Self::Tunnel => "tunnel",
        }
    }

    /// Flag passed to `ipvsadm -a`.
    #[must_use]
    pub const fn ipvsadm_flag(self) -> &'static str {
        match self {
            Self::Masquerade => "-m",
            Self::DirectRouting => "-g",
            Self::Tunnel => "-i",
        }
    }
}

impl fmt::Display for ForwardingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForwardingMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "masq" | "masquerade" => Ok(Self::Masquerade),
            "droute" | "gatewaying" => Ok(Self::DirectRouting),
            "tunnel" | "ipip" => Ok(Self::Tunnel),
            other => Err(Error::UnknownForwardingMethod(other.to_string())),
        }
    }
}
