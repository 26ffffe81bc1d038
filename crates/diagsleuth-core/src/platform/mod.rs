/// Platform-specific command construction for the OS network utilities.
///
/// The probe engine is socket-based everywhere except echo (ICMP requires
/// raw sockets, so the stock `ping` binary is used instead, as is the OS
/// hop tracer). Windows and Unix spell the same knobs differently; this
/// module is the only place that knows the spelling.
use std::io;
use std::process::{Command, Stdio};
use std::time::Duration;

/// Build a `ping` invocation sending `count` echo requests with a per-reply
/// timeout.
#[cfg(windows)]
pub fn ping_command(host: &str, count: u32, timeout: Duration) -> Command {
    let mut cmd = Command::new("ping");
    cmd.arg("-n")
        .arg(count.to_string())
        .arg("-w")
        .arg(timeout.as_millis().to_string())
        .arg(host);
    cmd
}

/// Build a `ping` invocation sending `count` echo requests with a per-reply
/// timeout. iputils accepts fractional seconds for `-W`.
#[cfg(not(windows))]
pub fn ping_command(host: &str, count: u32, timeout: Duration) -> Command {
    let mut cmd = Command::new("ping");
    cmd.arg("-c")
        .arg(count.to_string())
        .arg("-W")
        .arg(format!("{}", timeout.as_secs_f64()))
        .arg(host);
    cmd
}

/// Build the OS hop-tracing invocation.
#[cfg(windows)]
pub fn traceroute_command(host: &str) -> Command {
    let mut cmd = Command::new("tracert");
    cmd.arg(host);
    cmd
}

/// Build the OS hop-tracing invocation.
#[cfg(not(windows))]
pub fn traceroute_command(host: &str) -> Command {
    let mut cmd = Command::new("traceroute");
    cmd.arg(host);
    cmd
}

/// Fire a single echo request and report whether the host answered within
/// the timeout. Output is discarded; only the exit status matters.
pub fn single_echo(host: &str, timeout: Duration) -> bool {
    let mut cmd = ping_command(host, 1, timeout);
    cmd.stdout(Stdio::null()).stderr(Stdio::null());
    matches!(cmd.status(), Ok(status) if status.success())
}

/// Run a command to completion and merge stdout and stderr into one
/// transcript.
///
/// A non-zero exit still yields the transcript — `ping` and `tracert` print
/// their diagnosis ("Destination host unreachable") to the streams and exit
/// non-zero, and that text IS the result. Only a spawn failure (missing
/// binary) is an error.
pub fn run_capture(mut cmd: Command) -> io::Result<String> {
    let output = cmd.output()?;
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let err_text = String::from_utf8_lossy(&output.stderr);
    if !err_text.trim().is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&err_text);
    }
    Ok(text)
}
