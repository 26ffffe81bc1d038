/// Directory-size aggregation for the usage chart.
///
/// Each immediate child directory of the root becomes a candidate chart
/// slice holding its recursive file-size sum. Slices under 1% of the
/// aggregate fold into a single "Other" slice, and at most the ten largest
/// named slices survive — a chart with forty slivers is unreadable.
use crate::error::TaskError;
use crate::scan::{walker, ScanContext, ScanReport, SizeBucket};

use std::fs;
use std::path::Path;
use tracing::debug;

/// Fraction of the aggregate below which a child directory folds into
/// "Other".
const OTHER_THRESHOLD: f64 = 0.01;

/// Maximum named chart slices.
const MAX_BUCKETS: usize = 10;

pub(crate) fn run(ctx: &ScanContext, root: &Path) -> Result<ScanReport, TaskError> {
    let listing = fs::read_dir(root).map_err(|err| {
        TaskError::fatal(format!("cannot list scan root {}: {err}", root.display()))
    })?;

    let child_dirs: Vec<_> = listing
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();

    let mut sizes: Vec<(String, u64)> = Vec::with_capacity(child_dirs.len());
    let mut skipped: u64 = 0;

    for dir in child_dirs {
        ctx.check_cancelled()?;
        ctx.status(format!("Sizing {} …", dir.display()));

        let (bytes, dir_skipped) = tree_size(&dir);
        skipped += dir_skipped;

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        sizes.push((name, bytes));
    }
    ctx.check_cancelled()?;

    let (buckets, total_bytes) = build_buckets(sizes);
    debug!(total_bytes, skipped, buckets = buckets.len(), "directory-size scan complete");
    Ok(ScanReport::DirectorySizes {
        buckets,
        total_bytes,
        skipped,
    })
}

/// Recursive file-size sum for one directory tree. Unreadable entries
/// contribute zero and are counted.
fn tree_size(dir: &Path) -> (u64, u64) {
    let mut bytes: u64 = 0;
    let mut skipped: u64 = 0;

    for entry_result in walker(dir) {
        match entry_result {
            Ok(entry) if entry.file_type().is_file() => {
                match fs::symlink_metadata(entry.path()) {
                    Ok(meta) => bytes += meta.len(),
                    Err(_) => skipped += 1,
                }
            }
            Ok(_) => {}
            Err(_) => skipped += 1,
        }
    }

    (bytes, skipped)
}

/// Fold raw per-directory sizes into chart slices.
///
/// Directories at or above 1% of the aggregate compete for the ten named
/// slots (stable sort, so equal sizes keep first-seen order); everything
/// else — sub-threshold directories and slot overflow — merges into
/// "Other", appended last when non-zero. Returns the slices and the
/// aggregate.
fn build_buckets(sizes: Vec<(String, u64)>) -> (Vec<SizeBucket>, u64) {
    let total: u64 = sizes.iter().map(|(_, bytes)| bytes).sum();
    let threshold = total as f64 * OTHER_THRESHOLD;

    let (mut big, small): (Vec<_>, Vec<_>) = sizes
        .into_iter()
        .partition(|(_, bytes)| *bytes as f64 >= threshold);
    big.sort_by(|a, b| b.1.cmp(&a.1));

    let mut other: u64 = small.iter().map(|(_, bytes)| bytes).sum();
    other += big
        .iter()
        .skip(MAX_BUCKETS)
        .map(|(_, bytes)| bytes)
        .sum::<u64>();

    let mut buckets: Vec<SizeBucket> = big
        .into_iter()
        .take(MAX_BUCKETS)
        .map(|(name, bytes)| SizeBucket { name, bytes })
        .collect();
    if other > 0 {
        buckets.push(SizeBucket {
            name: "Other".to_string(),
            bytes: other,
        });
    }

    (buckets, total)
}

/// Format a byte count for chart labels and summaries.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
