/// Hop-path probe — wraps the OS hop tracer (`tracert`/`traceroute`) and
/// returns its transcript verbatim.
use crate::error::TaskError;
use crate::platform;
use crate::probe::{ProbeContext, ProbeReport};

use tracing::debug;

pub(crate) fn run(ctx: &ProbeContext, host: &str) -> Result<ProbeReport, TaskError> {
    ctx.status(format!("Tracing route to {host} …"));
    debug!(host, "traceroute probe starting");

    let transcript = match platform::run_capture(platform::traceroute_command(host)) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => "Traceroute error: the trace utility produced no output".to_string(),
        Err(err) => format!("Traceroute error: {err}"),
    };

    Ok(ProbeReport::Traceroute { transcript })
}
