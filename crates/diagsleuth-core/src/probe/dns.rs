/// Name resolution probes — PTR lookup and forward domain resolution.
///
/// Both probes answer with text: a hostname / address on success, the
/// resolver's diagnosis on failure. The frontend renders the answer either
/// way.
use crate::error::TaskError;
use crate::probe::{ProbeContext, ProbeReport};

use std::net::IpAddr;
use tracing::debug;

/// PTR record lookup for an address.
pub(crate) fn reverse(ctx: &ProbeContext, ip: IpAddr) -> Result<ProbeReport, TaskError> {
    ctx.status(format!("PTR lookup for {ip} …"));
    debug!(%ip, "reverse DNS probe starting");

    let answer = match dns_lookup::lookup_addr(&ip) {
        Ok(name) => name,
        Err(err) => format!("Reverse DNS error: {err}"),
    };

    Ok(ProbeReport::ReverseDns { answer })
}

/// Forward-resolve a domain (or URL) to its first IPv4 address.
pub(crate) fn resolve(ctx: &ProbeContext, target: &str) -> Result<ProbeReport, TaskError> {
    let host = normalise_target(target);
    ctx.status(format!("Resolving {host} …"));
    debug!(host, "domain resolve probe starting");

    let answer = match dns_lookup::lookup_host(host) {
        Ok(addrs) => match addrs.iter().find(|addr| addr.is_ipv4()) {
            Some(addr) => addr.to_string(),
            None => "Domain lookup error: no IPv4 address found".to_string(),
        },
        Err(err) => format!("Domain lookup error: {err}"),
    };

    Ok(ProbeReport::DomainResolve { answer })
}

/// Reduce a pasted URL to a bare hostname: drop the scheme prefix and any
/// trailing slashes (including a path-less `example.com/`).
pub fn normalise_target(target: &str) -> &str {
    let trimmed = target.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/')
}
