/// Filesystem scan engine — recursive walkers producing grouped and
/// aggregated results, each running as one background task.
///
/// Failure semantics are uniform across the engine: a single unreadable
/// entry never aborts a scan. Entries that cannot be read are skipped and
/// counted, and the skip count travels with the report so the frontend can
/// surface "N entries skipped" instead of silently under-reporting. Only an
/// invalid or vanished scan root fails the task itself.
///
/// # Modules
///
/// - [`duplicates`] — size-bucket duplicate candidate detection.
/// - [`checksum`] — streaming MD5/SHA1 digests over a fixed file list.
/// - [`empty_dirs`] — directories whose immediate listing is empty.
/// - [`dir_size`] — per-child-directory size aggregation for charting.
pub mod checksum;
pub mod dir_size;
pub mod duplicates;
pub mod empty_dirs;

use crate::error::ValidationError;
use crate::runner::{self, TaskContext, TaskHandle};

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Digest algorithm for the checksum scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChecksumAlgorithm {
    Md5,
    Sha1,
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Md5 => write!(f, "MD5"),
            Self::Sha1 => write!(f, "SHA1"),
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            other => Err(format!("unknown algorithm \"{other}\" (expected md5 or sha1)")),
        }
    }
}

/// One scan submission.
#[derive(Debug, Clone)]
pub enum ScanRequest {
    /// Bucket every regular file under `root` by exact byte size and report
    /// buckets with two or more members.
    Duplicates { root: PathBuf },
    /// Digest each file in a fixed, pre-selected list.
    Checksums {
        files: Vec<PathBuf>,
        algorithm: ChecksumAlgorithm,
    },
    /// Report directories under `root` whose immediate listing is empty.
    EmptyFolders { root: PathBuf },
    /// Aggregate recursive sizes of each immediate child directory of
    /// `root` into chart buckets.
    DirectorySizes { root: PathBuf },
}

/// A set of same-sized files — duplicate candidates. Never fewer than two
/// members; paths are in discovery order.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub size: u64,
    pub paths: Vec<PathBuf>,
}

/// Digest result for one file. `digest` is `None` when the file could not
/// be read; the scan carries on regardless.
#[derive(Debug, Clone, Serialize)]
pub struct ChecksumEntry {
    pub path: PathBuf,
    pub digest: Option<String>,
}

impl ChecksumEntry {
    /// Display text for the digest column.
    pub fn digest_text(&self) -> &str {
        self.digest.as_deref().unwrap_or("ERROR")
    }
}

/// One slice of the directory-size chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeBucket {
    pub name: String,
    pub bytes: u64,
}

/// Incremental result emitted while a scan runs.
#[derive(Debug, Clone, Serialize)]
pub enum ScanUpdate {
    DuplicateGroup(DuplicateGroup),
    Checksum(ChecksumEntry),
    EmptyFolder(PathBuf),
}

/// Terminal result of a scan, one variant per request kind. Skip counts are
/// always reported alongside the aggregate.
#[derive(Debug, Clone, Serialize)]
pub enum ScanReport {
    Duplicates {
        groups: Vec<DuplicateGroup>,
        files_seen: u64,
        skipped: u64,
    },
    Checksums {
        entries: Vec<ChecksumEntry>,
        unreadable: u64,
    },
    EmptyFolders {
        folders: Vec<PathBuf>,
        dirs_seen: u64,
        skipped: u64,
    },
    DirectorySizes {
        buckets: Vec<SizeBucket>,
        total_bytes: u64,
        skipped: u64,
    },
}

/// Handle to a running scan task.
pub type ScanHandle = TaskHandle<ScanUpdate, ScanReport>;

pub(crate) type ScanContext = TaskContext<ScanUpdate, ScanReport>;

impl ScanRequest {
    /// Reject invalid roots and empty selections before spawning a worker.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Duplicates { root } | Self::EmptyFolders { root } | Self::DirectorySizes { root } => {
                require_directory(root)
            }
            Self::Checksums { files, .. } => {
                if files.is_empty() {
                    Err(ValidationError::EmptyFileList)
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Validate a scan request and start it on a background worker.
pub fn start_scan(request: ScanRequest) -> Result<ScanHandle, ValidationError> {
    request.validate()?;

    let handle = match request {
        ScanRequest::Duplicates { root } => {
            runner::submit("duplicate-scan", move |ctx| duplicates::run(ctx, &root))
        }
        ScanRequest::Checksums { files, algorithm } => {
            runner::submit("checksum-scan", move |ctx| {
                checksum::run(ctx, &files, algorithm)
            })
        }
        ScanRequest::EmptyFolders { root } => {
            runner::submit("empty-folder-scan", move |ctx| empty_dirs::run(ctx, &root))
        }
        ScanRequest::DirectorySizes { root } => {
            runner::submit("dir-size-scan", move |ctx| dir_size::run(ctx, &root))
        }
    };

    Ok(handle)
}

fn require_directory(root: &Path) -> Result<(), ValidationError> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(ValidationError::NotADirectory {
            path: root.to_path_buf(),
        })
    }
}

/// The walker configuration shared by all recursive scans: parallel
/// traversal across the CPU count, deterministic entry order, no symlink
/// following (a link cycle must not turn a scan into an infinite walk).
pub(crate) fn walker(root: &Path) -> jwalk::WalkDir {
    jwalk::WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .sort(true)
        .parallelism(jwalk::Parallelism::RayonNewPool(num_cpus::get()))
}
