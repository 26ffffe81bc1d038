/// Empty-directory detection.
///
/// A directory counts as empty only when its immediate listing has zero
/// entries. A directory containing nothing but empty subdirectories is NOT
/// empty — deleting the reported set bottom-up converges in repeated runs,
/// which is how the feature is used. The scan root itself is never
/// reported.
use crate::error::TaskError;
use crate::scan::{walker, ScanContext, ScanReport, ScanUpdate};

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub(crate) fn run(ctx: &ScanContext, root: &Path) -> Result<ScanReport, TaskError> {
    if !root.is_dir() {
        return Err(TaskError::fatal(format!(
            "scan root {} is no longer a directory",
            root.display()
        )));
    }
    ctx.status(format!("Walking {} …", root.display()));

    let mut folders: Vec<PathBuf> = Vec::new();
    let mut dirs_seen: u64 = 0;
    let mut skipped: u64 = 0;
    let mut visited: u64 = 0;

    for entry_result in walker(root) {
        visited += 1;
        if visited.is_multiple_of(1_000) {
            ctx.check_cancelled()?;
        }

        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                debug!(%err, "walk entry skipped");
                skipped += 1;
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        if path == root {
            continue;
        }
        dirs_seen += 1;

        match fs::read_dir(&path) {
            Ok(mut listing) => {
                if listing.next().is_none() {
                    ctx.partial(ScanUpdate::EmptyFolder(path.clone()));
                    folders.push(path);
                }
            }
            Err(err) => {
                debug!(path = %path.display(), %err, "listing failed, directory skipped");
                skipped += 1;
            }
        }
    }
    ctx.check_cancelled()?;

    debug!(dirs_seen, skipped, empty = folders.len(), "empty-folder scan complete");
    Ok(ScanReport::EmptyFolders {
        folders,
        dirs_seen,
        skipped,
    })
}
