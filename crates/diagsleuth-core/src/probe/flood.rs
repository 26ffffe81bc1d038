/// Throughput stress probe — sends fixed-size payloads at a target for a
/// wall-clock duration and counts what got out.
///
/// TCP opens a fresh connection per iteration (connection-setup cost is part
/// of what is being measured); UDP binds one socket and fires a fresh
/// datagram per iteration. The first send failure stops the loop and is
/// reported in the result, not as a task failure.
use crate::error::TaskError;
use crate::probe::{resolve_host, ProbeContext, ProbeReport, ProbeUpdate, Protocol};

use std::io::{self, Write};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, UdpSocket};
use std::time::{Duration, Instant};
use tracing::debug;

/// Per-iteration TCP connect timeout. Keeps one black-holed connect from
/// eating the whole test window.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// How often the running packet count is reported. UDP loops reach tens of
/// thousands of sends per second; reporting each one would drown the
/// channel.
const REPORT_INTERVAL: Duration = Duration::from_millis(500);

pub(crate) fn run(
    ctx: &ProbeContext,
    host: &str,
    port: u16,
    protocol: Protocol,
    payload_bytes: usize,
    duration: Duration,
) -> Result<ProbeReport, TaskError> {
    let ip = resolve_host(host)?;
    let addr = SocketAddr::new(ip, port);
    let target = format!("{host}:{port}");
    ctx.status(format!(
        "Flooding {target} via {protocol} for {} s …",
        duration.as_secs()
    ));
    debug!(%addr, %protocol, payload_bytes, "flood probe starting");

    let payload = vec![b'A'; payload_bytes];

    let udp_socket = match protocol {
        Protocol::Udp => {
            let bind_addr: SocketAddr = if ip.is_ipv4() {
                (Ipv4Addr::UNSPECIFIED, 0).into()
            } else {
                (Ipv6Addr::UNSPECIFIED, 0).into()
            };
            match UdpSocket::bind(bind_addr) {
                Ok(socket) => Some(socket),
                Err(err) => {
                    return Ok(ProbeReport::Flood {
                        target,
                        protocol,
                        packets_sent: 0,
                        aborted: Some(err.to_string()),
                    })
                }
            }
        }
        Protocol::Tcp => None,
    };

    let mut send_once: Box<dyn FnMut() -> io::Result<()> + '_> = match &udp_socket {
        Some(socket) => Box::new(|| socket.send_to(&payload, addr).map(|_| ())),
        None => Box::new(|| {
            let mut stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
            stream.write_all(&payload)
        }),
    };

    let deadline = Instant::now() + duration;
    let mut packets_sent: u64 = 0;
    let mut aborted = None;
    let mut last_report = Instant::now();

    while Instant::now() < deadline {
        ctx.check_cancelled()?;
        match send_once() {
            Ok(()) => {
                packets_sent += 1;
                if last_report.elapsed() >= REPORT_INTERVAL {
                    ctx.partial(ProbeUpdate::PacketsSent(packets_sent));
                    last_report = Instant::now();
                }
            }
            Err(err) => {
                aborted = Some(err.to_string());
                break;
            }
        }
    }

    Ok(ProbeReport::Flood {
        target,
        protocol,
        packets_sent,
        aborted,
    })
}
