/// DiagSleuth Core — the concurrent diagnostic task engine.
///
/// This crate contains all business logic with zero UI dependencies.
/// Frontends submit a probe or scan request, receive a task handle, and
/// drain typed progress events plus a single terminal outcome from its
/// channel.
///
/// # Modules
///
/// - [`runner`] — background task execution, progress streaming, outcomes.
/// - [`probe`] — network diagnostics (ping, port scan, subnet sweep, DNS,
///   public address, flood test, traceroute).
/// - [`scan`] — filesystem diagnostics (duplicates, checksums, empty
///   folders, directory sizes).
/// - [`platform`] — per-OS construction of the ping/trace utility commands.
/// - [`error`] — validation and task error taxonomy.
pub mod error;
pub mod platform;
pub mod probe;
pub mod runner;
pub mod scan;
