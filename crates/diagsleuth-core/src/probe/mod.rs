/// Network probe engine — reachability, scanning, resolution, and
/// throughput probes, each running as one background task.
///
/// Every probe is a pure function of its request: inputs are validated and
/// moved into the task closure at submission, results come back as a typed
/// [`ProbeReport`] through the task channel. Network-level failures
/// (unreachable host, refused connection, failed lookup) are rendered into
/// the report text and the probe still succeeds — the frontend displays
/// whatever text arrives without an error path.
///
/// # Modules
///
/// - [`ping`] / [`trace`] — OS utility transcripts.
/// - [`portscan`] — TCP connect scan over a bounded worker pool.
/// - [`subnet`] — parallel echo sweep of a CIDR block.
/// - [`dns`] — PTR and forward lookups.
/// - [`public_ip`] — external address echo service.
/// - [`flood`] — fixed-duration TCP/UDP send loop.
pub mod dns;
pub mod flood;
pub mod ping;
pub mod portscan;
pub mod public_ip;
pub mod subnet;
pub mod trace;

use crate::error::{TaskError, ValidationError};
use crate::runner::{self, TaskContext, TaskHandle};

use ipnetwork::Ipv4Network;
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// Transport selector for the flood probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TCP" => Ok(Self::Tcp),
            "UDP" => Ok(Self::Udp),
            other => Err(format!("unknown protocol \"{other}\" (expected TCP or UDP)")),
        }
    }
}

/// One probe submission. Each variant carries its own immutable inputs.
#[derive(Debug, Clone)]
pub enum ProbeRequest {
    Ping {
        host: String,
        count: u32,
        timeout_ms: u64,
    },
    PortScan {
        host: String,
        start_port: u16,
        end_port: u16,
        timeout_per_port: Duration,
    },
    SubnetScan {
        cidr: String,
    },
    ReverseDns {
        ip: IpAddr,
    },
    PublicIp,
    DomainResolve {
        target: String,
    },
    Flood {
        host: String,
        port: u16,
        protocol: Protocol,
        payload_bytes: usize,
        duration_secs: u64,
    },
    Traceroute {
        host: String,
    },
}

/// Incremental discovery emitted while a probe runs.
#[derive(Debug, Clone, Serialize)]
pub enum ProbeUpdate {
    /// A port accepted a TCP connection.
    OpenPort(u16),
    /// A swept host answered an echo request.
    LiveHost(IpAddr),
    /// Running send count from the flood loop.
    PacketsSent(u64),
}

/// Terminal result of a probe, one variant per request kind.
#[derive(Debug, Clone, Serialize)]
pub enum ProbeReport {
    Ping {
        transcript: String,
    },
    PortScan {
        target: String,
        open_ports: Vec<u16>,
    },
    SubnetScan {
        network: String,
        live_hosts: Vec<IpAddr>,
    },
    ReverseDns {
        answer: String,
    },
    PublicIp {
        address: String,
    },
    DomainResolve {
        answer: String,
    },
    Flood {
        target: String,
        protocol: Protocol,
        packets_sent: u64,
        /// Send failure that stopped the loop early, if any.
        aborted: Option<String>,
    },
    Traceroute {
        transcript: String,
    },
}

impl ProbeReport {
    /// Render the report as display text, one line per list item.
    pub fn summary(&self) -> String {
        match self {
            Self::Ping { transcript } | Self::Traceroute { transcript } => transcript.clone(),
            Self::PortScan { open_ports, .. } => {
                if open_ports.is_empty() {
                    "No open ports.".to_string()
                } else {
                    open_ports
                        .iter()
                        .map(u16::to_string)
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            Self::SubnetScan { live_hosts, .. } => {
                if live_hosts.is_empty() {
                    "No live hosts.".to_string()
                } else {
                    live_hosts
                        .iter()
                        .map(IpAddr::to_string)
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            Self::ReverseDns { answer } | Self::DomainResolve { answer } => answer.clone(),
            Self::PublicIp { address } => address.clone(),
            Self::Flood {
                target,
                protocol,
                packets_sent,
                aborted,
            } => match aborted {
                Some(err) => format!("Flood error: {err}"),
                None => format!("Sent {packets_sent} packets to {target} via {protocol}"),
            },
        }
    }
}

/// Handle to a running probe task.
pub type ProbeHandle = TaskHandle<ProbeUpdate, ProbeReport>;

pub(crate) type ProbeContext = TaskContext<ProbeUpdate, ProbeReport>;

impl ProbeRequest {
    /// Reject malformed input. Runs before any worker thread is spawned.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Ping { host, count, .. } => {
                require_host(host)?;
                if *count == 0 {
                    return Err(ValidationError::ZeroCount);
                }
            }
            Self::PortScan {
                host,
                start_port,
                end_port,
                ..
            } => {
                require_host(host)?;
                if start_port > end_port {
                    return Err(ValidationError::PortRangeReversed {
                        start: *start_port,
                        end: *end_port,
                    });
                }
            }
            Self::SubnetScan { cidr } => {
                parse_cidr(cidr)?;
            }
            Self::DomainResolve { target } => require_host(target)?,
            Self::Flood {
                host,
                payload_bytes,
                duration_secs,
                ..
            } => {
                require_host(host)?;
                if *payload_bytes == 0 {
                    return Err(ValidationError::ZeroPayload);
                }
                if *duration_secs == 0 {
                    return Err(ValidationError::ZeroDuration);
                }
            }
            Self::Traceroute { host } => require_host(host)?,
            Self::ReverseDns { .. } | Self::PublicIp => {}
        }
        Ok(())
    }
}

/// Validate a probe request and start it on a background worker.
///
/// Returns the task handle immediately; all further communication happens
/// through its event channel.
pub fn start_probe(request: ProbeRequest) -> Result<ProbeHandle, ValidationError> {
    request.validate()?;

    let handle = match request {
        ProbeRequest::Ping {
            host,
            count,
            timeout_ms,
        } => runner::submit("ping", move |ctx| {
            ping::run(ctx, &host, count, Duration::from_millis(timeout_ms))
        }),
        ProbeRequest::PortScan {
            host,
            start_port,
            end_port,
            timeout_per_port,
        } => runner::submit("port-scan", move |ctx| {
            portscan::run(ctx, &host, start_port, end_port, timeout_per_port)
        }),
        ProbeRequest::SubnetScan { cidr } => {
            let network = parse_cidr(&cidr)?;
            runner::submit("subnet-scan", move |ctx| subnet::run(ctx, network))
        }
        ProbeRequest::ReverseDns { ip } => {
            runner::submit("reverse-dns", move |ctx| dns::reverse(ctx, ip))
        }
        ProbeRequest::PublicIp => runner::submit("public-ip", public_ip::run),
        ProbeRequest::DomainResolve { target } => {
            runner::submit("domain-resolve", move |ctx| dns::resolve(ctx, &target))
        }
        ProbeRequest::Flood {
            host,
            port,
            protocol,
            payload_bytes,
            duration_secs,
        } => runner::submit("flood", move |ctx| {
            flood::run(
                ctx,
                &host,
                port,
                protocol,
                payload_bytes,
                Duration::from_secs(duration_secs),
            )
        }),
        ProbeRequest::Traceroute { host } => {
            runner::submit("traceroute", move |ctx| trace::run(ctx, &host))
        }
    };

    Ok(handle)
}

fn require_host(host: &str) -> Result<(), ValidationError> {
    if host.trim().is_empty() {
        Err(ValidationError::EmptyHost)
    } else {
        Ok(())
    }
}

/// Parse an IPv4 CIDR block, mapping parse failures to a validation error.
///
/// The sweep is IPv4-only: IPv6 blocks are rejected here rather than
/// enumerated (a /64 has 2^64 addresses).
pub(crate) fn parse_cidr(input: &str) -> Result<Ipv4Network, ValidationError> {
    input
        .trim()
        .parse::<Ipv4Network>()
        .map_err(|err| ValidationError::InvalidCidr {
            input: input.to_string(),
            reason: err.to_string(),
        })
}

/// Resolve a host string to a single address, preferring IPv4.
///
/// Literal addresses short-circuit without touching the resolver. A failed
/// lookup is a fatal task error: the target itself is the task's root
/// resource, and without an address there is nothing to probe.
pub(crate) fn resolve_host(host: &str) -> Result<IpAddr, TaskError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }
    let addrs = dns_lookup::lookup_host(host)
        .map_err(|err| TaskError::fatal(format!("cannot resolve {host}: {err}")))?;
    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| TaskError::fatal(format!("cannot resolve {host}: no addresses returned")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_port_range_is_rejected() {
        let request = ProbeRequest::PortScan {
            host: "127.0.0.1".into(),
            start_port: 100,
            end_port: 10,
            timeout_per_port: Duration::from_millis(200),
        };
        assert_eq!(
            request.validate(),
            Err(ValidationError::PortRangeReversed {
                start: 100,
                end: 10
            })
        );
    }

    #[test]
    fn equal_port_range_is_accepted() {
        let request = ProbeRequest::PortScan {
            host: "127.0.0.1".into(),
            start_port: 80,
            end_port: 80,
            timeout_per_port: Duration::from_millis(200),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn malformed_cidr_is_rejected_before_submission() {
        for bad in ["", "not-a-network", "10.0.0.0/33", "10.0.0/24", "::1/64"] {
            let request = ProbeRequest::SubnetScan { cidr: bad.into() };
            assert!(
                matches!(request.validate(), Err(ValidationError::InvalidCidr { .. })),
                "expected InvalidCidr for {bad:?}"
            );
        }
    }

    #[test]
    fn empty_host_is_rejected() {
        let request = ProbeRequest::Ping {
            host: "  ".into(),
            count: 4,
            timeout_ms: 1_000,
        };
        assert_eq!(request.validate(), Err(ValidationError::EmptyHost));
    }

    #[test]
    fn zero_flood_parameters_are_rejected() {
        let base = |payload_bytes, duration_secs| ProbeRequest::Flood {
            host: "127.0.0.1".into(),
            port: 9,
            protocol: Protocol::Udp,
            payload_bytes,
            duration_secs,
        };
        assert_eq!(base(0, 1).validate(), Err(ValidationError::ZeroPayload));
        assert_eq!(base(64, 0).validate(), Err(ValidationError::ZeroDuration));
        assert!(base(64, 1).validate().is_ok());
    }

    #[test]
    fn protocol_parses_case_insensitively() {
        assert_eq!("tcp".parse::<Protocol>(), Ok(Protocol::Tcp));
        assert_eq!("UDP".parse::<Protocol>(), Ok(Protocol::Udp));
        assert!("icmp".parse::<Protocol>().is_err());
    }

    #[test]
    fn resolve_host_literal_skips_lookup() {
        let ip = resolve_host("192.0.2.7").expect("literal must parse");
        assert_eq!(ip, "192.0.2.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn port_scan_summary_matches_display_contract() {
        let empty = ProbeReport::PortScan {
            target: "127.0.0.1".into(),
            open_ports: vec![],
        };
        assert_eq!(empty.summary(), "No open ports.");

        let found = ProbeReport::PortScan {
            target: "127.0.0.1".into(),
            open_ports: vec![22, 80],
        };
        assert_eq!(found.summary(), "22\n80");
    }

    #[test]
    fn flood_summary_reports_count_or_error() {
        let ok = ProbeReport::Flood {
            target: "127.0.0.1:9".into(),
            protocol: Protocol::Udp,
            packets_sent: 42,
            aborted: None,
        };
        assert_eq!(ok.summary(), "Sent 42 packets to 127.0.0.1:9 via UDP");

        let failed = ProbeReport::Flood {
            target: "127.0.0.1:9".into(),
            protocol: Protocol::Tcp,
            packets_sent: 3,
            aborted: Some("connection refused".into()),
        };
        assert_eq!(failed.summary(), "Flood error: connection refused");
    }
}
