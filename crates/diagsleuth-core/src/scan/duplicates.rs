/// Duplicate candidate detection — buckets every regular file under the
/// root by exact byte size.
///
/// Size equality is a candidate heuristic, not proof of identical content:
/// two distinct files of the same length land in the same group. Content
/// hashing (see [`crate::scan::checksum`]) is the confirmation step users
/// run on a group they care about.
use crate::error::TaskError;
use crate::scan::{walker, DuplicateGroup, ScanContext, ScanReport, ScanUpdate};

use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

pub(crate) fn run(ctx: &ScanContext, root: &Path) -> Result<ScanReport, TaskError> {
    if !root.is_dir() {
        return Err(TaskError::fatal(format!(
            "scan root {} is no longer a directory",
            root.display()
        )));
    }
    ctx.status(format!("Scanning {} for duplicates …", root.display()));

    let mut by_size: HashMap<u64, Vec<std::path::PathBuf>> = HashMap::new();
    let mut files_seen: u64 = 0;
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
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let size = match std::fs::symlink_metadata(&path) {
            Ok(meta) => meta.len(),
            Err(err) => {
                debug!(path = %path.display(), %err, "stat failed, entry skipped");
                skipped += 1;
                continue;
            }
        };

        files_seen += 1;
        by_size.entry(size).or_default().push(path);

        if visited.is_multiple_of(5_000) {
            ctx.status(format!("Scanned {files_seen} files …"));
        }
    }
    ctx.check_cancelled()?;

    ctx.status("Grouping by size …");
    let mut groups: Vec<DuplicateGroup> = by_size
        .into_iter()
        .filter(|(_, paths)| paths.len() >= 2)
        .map(|(size, paths)| DuplicateGroup { size, paths })
        .collect();
    // Largest groups first; member paths keep walk order.
    groups.sort_by(|a, b| b.size.cmp(&a.size));

    for group in &groups {
        ctx.partial(ScanUpdate::DuplicateGroup(group.clone()));
    }

    debug!(files_seen, skipped, groups = groups.len(), "duplicate scan complete");
    Ok(ScanReport::Duplicates {
        groups,
        files_seen,
        skipped,
    })
}
