/// Live-host sweep of an IPv4 CIDR block.
///
/// Every usable host address gets one echo request with a short timeout;
/// responders are emitted as they answer, non-responders are silently
/// omitted. The sweep runs over a bounded pool — echo processes are
/// heavier than a socket connect, so the pool is smaller than the port
/// scanner's.
use crate::error::TaskError;
use crate::platform;
use crate::probe::{ProbeContext, ProbeReport, ProbeUpdate};

use ipnetwork::Ipv4Network;
use rayon::prelude::*;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tracing::debug;

/// Worker threads for the echo pool. Each worker runs one `ping` process
/// at a time.
const SWEEP_POOL_SIZE: usize = 32;

/// Per-host echo timeout. Hosts on a LAN answer within a few milliseconds;
/// anything slower than this is treated as down, matching the short-sweep
/// behaviour users expect from a subnet scan.
const ECHO_TIMEOUT: Duration = Duration::from_millis(200);

/// Enumerate the usable host addresses of a block.
///
/// For prefixes shorter than /31 the network and broadcast addresses are
/// excluded; /31 (point-to-point, RFC 3021) and /32 yield every address.
pub fn host_addresses(network: Ipv4Network) -> Vec<Ipv4Addr> {
    if network.prefix() >= 31 {
        network.iter().collect()
    } else {
        let net = network.network();
        let bcast = network.broadcast();
        network
            .iter()
            .filter(|&addr| addr != net && addr != bcast)
            .collect()
    }
}

pub(crate) fn run(ctx: &ProbeContext, network: Ipv4Network) -> Result<ProbeReport, TaskError> {
    let hosts = host_addresses(network);
    ctx.status(format!("Sweeping {} hosts in {network} …", hosts.len()));
    debug!(%network, hosts = hosts.len(), "subnet sweep starting");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(SWEEP_POOL_SIZE.min(hosts.len().max(1)))
        .build()
        .map_err(|err| TaskError::fatal(format!("cannot build sweep pool: {err}")))?;

    let mut live_hosts: Vec<Ipv4Addr> = pool.install(|| {
        hosts
            .par_iter()
            .filter_map(|&addr| {
                if ctx.is_cancelled() {
                    return None;
                }
                if platform::single_echo(&addr.to_string(), ECHO_TIMEOUT) {
                    ctx.partial(ProbeUpdate::LiveHost(IpAddr::V4(addr)));
                    Some(addr)
                } else {
                    None
                }
            })
            .collect()
    });
    ctx.check_cancelled()?;

    live_hosts.sort_unstable();
    Ok(ProbeReport::SubnetScan {
        network: network.to_string(),
        live_hosts: live_hosts.into_iter().map(IpAddr::V4).collect(),
    })
}
