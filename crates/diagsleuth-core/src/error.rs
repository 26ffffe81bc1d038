/// Error taxonomy for the diagnostic engine.
///
/// Two families:
///
/// - [`ValidationError`] — malformed input detected synchronously at
///   submission; the task is never spawned.
/// - [`TaskError`] — terminal failure payload carried by
///   `TaskOutcome::Failed`.
///
/// Network-level probe conditions (unreachable host, refused connection,
/// failed lookup) are deliberately NOT errors: each probe renders them into
/// its report text and still completes as a success, so the frontend never
/// needs an error path to show "host unreachable".
use std::path::PathBuf;
use thiserror::Error;

/// Rejected input. Surfaced before any worker thread exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid port range: start {start} is greater than end {end}")]
    PortRangeReversed { start: u16, end: u16 },

    #[error("invalid CIDR block \"{input}\": {reason}")]
    InvalidCidr { input: String, reason: String },

    #[error("host must not be empty")]
    EmptyHost,

    #[error("echo count must be at least 1")]
    ZeroCount,

    #[error("payload size must be at least 1 byte")]
    ZeroPayload,

    #[error("duration must be at least 1 second")]
    ZeroDuration,

    #[error("{} does not exist or is not a directory", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("no files selected")]
    EmptyFileList,
}

/// Terminal task failure.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Cooperative cancellation observed by the task body. The runner maps
    /// this to `TaskOutcome::Cancelled`; it is never surfaced as `Failed`.
    #[error("cancelled")]
    Cancelled,

    /// The task's root resource is invalid or became unusable mid-run
    /// (scan root vanished, target host does not resolve).
    #[error("{0}")]
    Fatal(String),

    /// The task body panicked. Captured by the runner so a buggy task can
    /// never take the consumer thread down with it.
    #[error("worker panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    /// Fatal error from anything displayable. Shorthand for call sites that
    /// would otherwise repeat `TaskError::Fatal(format!(...))`.
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }
}
