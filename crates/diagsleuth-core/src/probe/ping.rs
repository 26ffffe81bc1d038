/// Echo reachability probe — wraps the OS `ping` utility and returns its
/// transcript verbatim. An unreachable host or failed name resolution is
/// still a completed probe: the utility's diagnosis is the result.
use crate::error::TaskError;
use crate::platform;
use crate::probe::{ProbeContext, ProbeReport};

use std::time::Duration;
use tracing::debug;

pub(crate) fn run(
    ctx: &ProbeContext,
    host: &str,
    count: u32,
    timeout: Duration,
) -> Result<ProbeReport, TaskError> {
    ctx.status(format!("Pinging {host} with {count} echo requests …"));
    debug!(host, count, ?timeout, "ping probe starting");

    let transcript = match platform::run_capture(platform::ping_command(host, count, timeout)) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => "Ping error: the ping utility produced no output".to_string(),
        Err(err) => format!("Ping error: {err}"),
    };

    Ok(ProbeReport::Ping { transcript })
}
