/// Bulk checksum computation over a fixed, pre-selected file list.
///
/// Digests stream through a fixed-size buffer so a multi-gigabyte file
/// costs the same memory as a kilobyte one. A file that cannot be opened or
/// read yields an `ERROR` entry and the scan moves on.
use crate::error::TaskError;
use crate::scan::{walker, ChecksumAlgorithm, ChecksumEntry, ScanContext, ScanReport, ScanUpdate};

use md5::{Digest, Md5};
use sha1::Sha1;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-buffer size for streaming digests.
const READ_CHUNK: usize = 8 * 1024;

pub(crate) fn run(
    ctx: &ScanContext,
    files: &[PathBuf],
    algorithm: ChecksumAlgorithm,
) -> Result<ScanReport, TaskError> {
    ctx.status(format!("Computing {algorithm} for {} files …", files.len()));

    let mut entries = Vec::with_capacity(files.len());
    let mut unreadable: u64 = 0;

    for path in files {
        ctx.check_cancelled()?;

        let digest = match algorithm {
            ChecksumAlgorithm::Md5 => hash_file::<Md5>(path),
            ChecksumAlgorithm::Sha1 => hash_file::<Sha1>(path),
        };
        let entry = match digest {
            Ok(hex) => ChecksumEntry {
                path: path.clone(),
                digest: Some(hex),
            },
            Err(err) => {
                debug!(path = %path.display(), %err, "file unreadable");
                unreadable += 1;
                ChecksumEntry {
                    path: path.clone(),
                    digest: None,
                }
            }
        };

        ctx.partial(ScanUpdate::Checksum(entry.clone()));
        entries.push(entry);
    }

    debug!(files = entries.len(), unreadable, "checksum scan complete");
    Ok(ScanReport::Checksums {
        entries,
        unreadable,
    })
}

/// Stream a file through a digest in fixed-size chunks.
fn hash_file<D: Digest>(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = D::new();
    let mut buffer = [0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Expand a folder selection into the flat file list a checksum scan
/// consumes, walking recursively. Unreadable entries are left out — the
/// scan itself reports per-file errors for anything that turns unreadable
/// later.
pub fn collect_files(root: &Path) -> Vec<PathBuf> {
    walker(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path())
        .collect()
}
