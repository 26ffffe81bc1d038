//! DiagSleuth — network and storage diagnostics from the command line.
//!
//! Thin binary entry point. All logic lives in the `diagsleuth-core`
//! crate; this frontend parses one request, submits it to the engine, and
//! renders the event stream: status lines to stderr, partial results as
//! they arrive, and the terminal report as text or JSON.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use diagsleuth_core::probe::{
    start_probe, ProbeHandle, ProbeReport, ProbeRequest, ProbeUpdate, Protocol,
};
use diagsleuth_core::runner::{TaskEvent, TaskOutcome};
use diagsleuth_core::scan::checksum::collect_files;
use diagsleuth_core::scan::dir_size::format_size;
use diagsleuth_core::scan::{
    start_scan, ChecksumAlgorithm, ScanHandle, ScanReport, ScanRequest, ScanUpdate,
};
use std::fmt::Write as _;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "diagsleuth", version)]
#[command(about = "Network and storage diagnostics with live progress")]
struct Cli {
    /// Emit the terminal report as JSON (suppresses incremental output).
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send echo requests to a host via the OS ping utility
    Ping {
        host: String,
        /// Number of echo requests
        #[arg(short, long, default_value_t = 4)]
        count: u32,
        /// Per-reply timeout in milliseconds
        #[arg(long, default_value_t = 1_000)]
        timeout_ms: u64,
    },
    /// Scan a TCP port range for open ports
    PortScan {
        host: String,
        /// Port range as start-end (e.g. 1-1024) or a single port
        ports: String,
        /// Per-port connect timeout in milliseconds
        #[arg(long, default_value_t = 200)]
        timeout_ms: u64,
    },
    /// Sweep a CIDR block for live hosts
    SubnetScan {
        /// IPv4 block, e.g. 192.168.1.0/24
        cidr: String,
    },
    /// Look up the PTR record for an address
    ReverseDns { ip: IpAddr },
    /// Show this machine's public address
    PublicIp,
    /// Resolve a domain or URL to an IPv4 address
    Resolve { target: String },
    /// Throughput stress test against a host and port you control
    Flood {
        host: String,
        port: u16,
        /// Transport: tcp or udp
        #[arg(long, default_value = "udp")]
        protocol: Protocol,
        /// Payload size per packet in bytes
        #[arg(long, default_value_t = 64)]
        size: usize,
        /// Test duration in seconds
        #[arg(long, default_value_t = 5)]
        duration: u64,
    },
    /// Trace the hop path to a host via the OS tracer
    Traceroute { host: String },
    /// Find same-size duplicate candidates under a folder
    Duplicates { root: PathBuf },
    /// Compute checksums for the given files (or a whole folder)
    Checksum {
        files: Vec<PathBuf>,
        /// Expand this folder recursively instead of listing files
        #[arg(long, conflicts_with = "files")]
        dir: Option<PathBuf>,
        /// Digest: md5 or sha1
        #[arg(long, default_value = "sha1")]
        algorithm: ChecksumAlgorithm,
    },
    /// List directories whose immediate listing is empty
    EmptyFolders { root: PathBuf },
    /// Aggregate child-directory sizes into chart buckets
    DirSizes { root: PathBuf },
}

fn main() -> Result<()> {
    // Structured logging to stderr so stdout stays clean for results.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match build_request(cli.command)? {
        Request::Probe(request) => drive_probe(start_probe(request)?, cli.json),
        Request::Scan(request) => drive_scan(start_scan(request)?, cli.json),
    }
}

enum Request {
    Probe(ProbeRequest),
    Scan(ScanRequest),
}

fn build_request(command: Command) -> Result<Request> {
    let request = match command {
        Command::Ping {
            host,
            count,
            timeout_ms,
        } => Request::Probe(ProbeRequest::Ping {
            host,
            count,
            timeout_ms,
        }),
        Command::PortScan {
            host,
            ports,
            timeout_ms,
        } => {
            let (start_port, end_port) = parse_port_range(&ports)?;
            Request::Probe(ProbeRequest::PortScan {
                host,
                start_port,
                end_port,
                timeout_per_port: Duration::from_millis(timeout_ms),
            })
        }
        Command::SubnetScan { cidr } => Request::Probe(ProbeRequest::SubnetScan { cidr }),
        Command::ReverseDns { ip } => Request::Probe(ProbeRequest::ReverseDns { ip }),
        Command::PublicIp => Request::Probe(ProbeRequest::PublicIp),
        Command::Resolve { target } => Request::Probe(ProbeRequest::DomainResolve { target }),
        Command::Flood {
            host,
            port,
            protocol,
            size,
            duration,
        } => Request::Probe(ProbeRequest::Flood {
            host,
            port,
            protocol,
            payload_bytes: size,
            duration_secs: duration,
        }),
        Command::Traceroute { host } => Request::Probe(ProbeRequest::Traceroute { host }),
        Command::Duplicates { root } => Request::Scan(ScanRequest::Duplicates { root }),
        Command::Checksum {
            files,
            dir,
            algorithm,
        } => {
            let files = match dir {
                Some(dir) => collect_files(&dir),
                None => files,
            };
            Request::Scan(ScanRequest::Checksums { files, algorithm })
        }
        Command::EmptyFolders { root } => Request::Scan(ScanRequest::EmptyFolders { root }),
        Command::DirSizes { root } => Request::Scan(ScanRequest::DirectorySizes { root }),
    };
    Ok(request)
}

/// Parse "start-end" (or a bare single port) into an inclusive range.
fn parse_port_range(input: &str) -> Result<(u16, u16)> {
    match input.split_once('-') {
        Some((start, end)) => {
            let start = start
                .trim()
                .parse::<u16>()
                .with_context(|| format!("invalid start port \"{start}\""))?;
            let end = end
                .trim()
                .parse::<u16>()
                .with_context(|| format!("invalid end port \"{end}\""))?;
            Ok((start, end))
        }
        None => {
            let port = input
                .trim()
                .parse::<u16>()
                .with_context(|| format!("invalid port \"{input}\""))?;
            Ok((port, port))
        }
    }
}

fn drive_probe(handle: ProbeHandle, json: bool) -> Result<()> {
    for event in handle.events.iter() {
        match event {
            TaskEvent::Status(text) => eprintln!("{text}"),
            TaskEvent::Partial(update) => {
                if !json {
                    print_probe_update(&update);
                }
            }
            TaskEvent::Done(outcome) => return finish(outcome, json, probe_report_text),
        }
    }
    bail!("event channel closed without a terminal outcome");
}

fn drive_scan(handle: ScanHandle, json: bool) -> Result<()> {
    for event in handle.events.iter() {
        match event {
            TaskEvent::Status(text) => eprintln!("{text}"),
            TaskEvent::Partial(update) => {
                if !json {
                    print_scan_update(&update);
                }
            }
            TaskEvent::Done(outcome) => return finish(outcome, json, scan_report_text),
        }
    }
    bail!("event channel closed without a terminal outcome");
}

fn finish<R: serde::Serialize>(
    outcome: TaskOutcome<R>,
    json: bool,
    render: impl Fn(&R) -> String,
) -> Result<()> {
    match outcome {
        TaskOutcome::Succeeded(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", render(&report));
            }
            Ok(())
        }
        TaskOutcome::Failed(err) => bail!("{err}"),
        TaskOutcome::Cancelled => bail!("cancelled"),
    }
}

fn print_probe_update(update: &ProbeUpdate) {
    match update {
        ProbeUpdate::OpenPort(port) => println!("open: {port}"),
        ProbeUpdate::LiveHost(ip) => println!("live: {ip}"),
        ProbeUpdate::PacketsSent(count) => eprintln!("… {count} packets sent"),
    }
}

fn print_scan_update(update: &ScanUpdate) {
    match update {
        ScanUpdate::DuplicateGroup(group) => {
            println!("{} files × {} bytes:", group.paths.len(), group.size);
            for path in &group.paths {
                println!("  {}", path.display());
            }
        }
        ScanUpdate::Checksum(entry) => {
            println!("{}  {}", entry.digest_text(), entry.path.display());
        }
        ScanUpdate::EmptyFolder(path) => println!("{}", path.display()),
    }
}

fn probe_report_text(report: &ProbeReport) -> String {
    report.summary()
}

fn scan_report_text(report: &ScanReport) -> String {
    match report {
        ScanReport::Duplicates {
            groups,
            files_seen,
            skipped,
        } => format!(
            "{} duplicate groups ({files_seen} files scanned, {skipped} skipped)",
            groups.len()
        ),
        ScanReport::Checksums { entries, unreadable } => {
            format!("{} files hashed, {unreadable} unreadable", entries.len())
        }
        ScanReport::EmptyFolders {
            folders,
            dirs_seen,
            skipped,
        } => format!(
            "{} empty folders ({dirs_seen} directories examined, {skipped} skipped)",
            folders.len()
        ),
        ScanReport::DirectorySizes {
            buckets,
            total_bytes,
            skipped,
        } => {
            let mut out = String::new();
            for bucket in buckets {
                let _ = writeln!(out, "{:>10}  {}", format_size(bucket.bytes), bucket.name);
            }
            let _ = write!(out, "{:>10}  total", format_size(*total_bytes));
            if *skipped > 0 {
                let _ = write!(out, " ({skipped} entries skipped)");
            }
            out
        }
    }
}
