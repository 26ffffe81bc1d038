/// Public address probe — asks an external echo service what address this
/// machine appears as from the outside.
///
/// The service returns the caller's address as a bare text body. Any
/// network or service failure collapses to the fixed "unavailable" answer;
/// there is no error path out of this probe.
use crate::error::TaskError;
use crate::probe::{ProbeContext, ProbeReport};

use std::time::Duration;
use tracing::debug;

const ECHO_SERVICE_URL: &str = "https://api.ipify.org";

/// Hard ceiling on the round trip. The service normally answers well under
/// a second; past this the probe reports "unavailable" rather than hanging.
const FETCH_TIMEOUT: Duration = Duration::from_secs(4);

/// Fixed answer when the service cannot be reached.
pub const UNAVAILABLE: &str = "unavailable";

pub(crate) fn run(ctx: &ProbeContext) -> Result<ProbeReport, TaskError> {
    ctx.status("Fetching public address …");

    let address = match fetch() {
        Ok(address) => address,
        Err(err) => {
            debug!(%err, "public address fetch failed");
            UNAVAILABLE.to_string()
        }
    };

    Ok(ProbeReport::PublicIp { address })
}

fn fetch() -> Result<String, reqwest::Error> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()?;
    let body = client
        .get(ECHO_SERVICE_URL)
        .send()?
        .error_for_status()?
        .text()?;
    Ok(body.trim().to_string())
}
