/// End-to-end scan integration tests.
///
/// These exercise the real scan implementations against real temporary
/// directory trees, verifying grouping, aggregation, incremental partial
/// results, and the skip-and-continue error policy.
///
/// **Why `tests/` integration tests (not unit tests)?** Each scan spawns a
/// real worker thread, walks a real filesystem with jwalk's rayon pool, and
/// streams events over a real channel. Testing against `tempfile` trees
/// covers every layer — thread spawn, traversal, bucketing, channel
/// delivery — with zero mocking.
use diagsleuth_core::error::ValidationError;
use diagsleuth_core::runner::{TaskEvent, TaskHandle, TaskOutcome};
use diagsleuth_core::scan::{
    start_scan, ChecksumAlgorithm, ScanReport, ScanRequest, ScanUpdate,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn write_bytes(path: &Path, n: usize) {
    let mut f = File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

/// Drain a scan's full event stream, returning every event up to and
/// including the terminal one. Panics after a generous deadline.
fn drain<P, R>(handle: &TaskHandle<P, R>) -> Vec<TaskEvent<P, R>> {
    let deadline = Instant::now() + Duration::from_secs(30);
    let mut events = Vec::new();
    loop {
        assert!(
            Instant::now() < deadline,
            "scan did not complete within 30 seconds"
        );
        match handle.events.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                let done = matches!(event, TaskEvent::Done(_));
                events.push(event);
                if done {
                    return events;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                panic!("channel disconnected before a terminal outcome");
            }
        }
    }
}

fn succeeded<P: std::fmt::Debug, R: std::fmt::Debug>(events: Vec<TaskEvent<P, R>>) -> R {
    match events.into_iter().last() {
        Some(TaskEvent::Done(TaskOutcome::Succeeded(report))) => report,
        other => panic!("expected Succeeded, got {other:?}"),
    }
}

// ── Duplicate scan ───────────────────────────────────────────────────────────

/// Files A (10 B) and B (10 B) form one group; C (20 B) is alone and must
/// not be reported.
#[test]
fn duplicate_scan_groups_same_size_files() {
    let tmp = TempDir::new().unwrap();
    write_bytes(&tmp.path().join("a.bin"), 10);
    write_bytes(&tmp.path().join("b.bin"), 10);
    write_bytes(&tmp.path().join("c.bin"), 20);

    let handle = start_scan(ScanRequest::Duplicates {
        root: tmp.path().to_path_buf(),
    })
    .expect("valid request");

    let events = drain(&handle);
    let partial_groups: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            TaskEvent::Partial(ScanUpdate::DuplicateGroup(group)) => Some(group.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(partial_groups.len(), 1, "exactly one group expected");

    match succeeded(events) {
        ScanReport::Duplicates {
            groups, files_seen, ..
        } => {
            assert_eq!(files_seen, 3);
            assert_eq!(groups.len(), 1);
            assert_eq!(groups[0].size, 10);
            let names: Vec<_> = groups[0]
                .paths
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect();
            assert_eq!(names.len(), 2);
            assert!(names.contains(&"a.bin".to_string()));
            assert!(names.contains(&"b.bin".to_string()));
        }
        other => panic!("expected Duplicates report, got {other:?}"),
    }
}

/// Every reported group must be size-homogeneous (checked against the real
/// filesystem) and have at least two members.
#[test]
fn duplicate_groups_are_size_homogeneous() {
    let tmp = TempDir::new().unwrap();
    let nested = tmp.path().join("nested");
    fs::create_dir(&nested).unwrap();
    write_bytes(&tmp.path().join("x1"), 100);
    write_bytes(&nested.join("x2"), 100);
    write_bytes(&nested.join("x3"), 100);
    write_bytes(&tmp.path().join("y1"), 250);
    write_bytes(&nested.join("y2"), 250);
    write_bytes(&tmp.path().join("lonely"), 999);

    let handle = start_scan(ScanRequest::Duplicates {
        root: tmp.path().to_path_buf(),
    })
    .expect("valid request");

    match succeeded(drain(&handle)) {
        ScanReport::Duplicates { groups, .. } => {
            assert_eq!(groups.len(), 2);
            // Largest group size first.
            assert!(groups[0].size >= groups[1].size);
            for group in &groups {
                assert!(group.paths.len() >= 2);
                for path in &group.paths {
                    let actual = fs::metadata(path).unwrap().len();
                    assert_eq!(actual, group.size, "{} breaks homogeneity", path.display());
                }
            }
        }
        other => panic!("expected Duplicates report, got {other:?}"),
    }
}

#[test]
fn duplicate_scan_rejects_missing_root_synchronously() {
    let result = start_scan(ScanRequest::Duplicates {
        root: PathBuf::from("/diagsleuth-no-such-root"),
    });
    assert!(matches!(result, Err(ValidationError::NotADirectory { .. })));
}

// ── Checksum scan ────────────────────────────────────────────────────────────

/// SHA1 of the empty byte sequence is the well-known digest; an unreadable
/// entry yields an ERROR marker without failing the scan.
#[test]
fn checksum_scan_digests_and_error_markers() {
    let tmp = TempDir::new().unwrap();
    let empty = tmp.path().join("empty.bin");
    File::create(&empty).unwrap();
    let missing = tmp.path().join("never-created.bin");

    let handle = start_scan(ScanRequest::Checksums {
        files: vec![empty.clone(), missing.clone()],
        algorithm: ChecksumAlgorithm::Sha1,
    })
    .expect("valid request");

    let events = drain(&handle);
    let partial_count = events
        .iter()
        .filter(|event| matches!(event, TaskEvent::Partial(ScanUpdate::Checksum(_))))
        .count();
    assert_eq!(partial_count, 2, "one partial per input file");

    match succeeded(events) {
        ScanReport::Checksums { entries, unreadable } => {
            assert_eq!(entries.len(), 2);
            assert_eq!(unreadable, 1);
            assert_eq!(
                entries[0].digest.as_deref(),
                Some("da39a3ee5e6b4b0d3255bfef95601890afd80709")
            );
            assert_eq!(entries[1].digest, None);
            assert_eq!(entries[1].digest_text(), "ERROR");
        }
        other => panic!("expected Checksums report, got {other:?}"),
    }
}

/// Two runs over an unmodified file must agree.
#[test]
fn checksum_scan_is_deterministic() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("data.bin");
    write_bytes(&path, 50_000);

    let digest_of = |path: PathBuf| {
        let handle = start_scan(ScanRequest::Checksums {
            files: vec![path],
            algorithm: ChecksumAlgorithm::Md5,
        })
        .expect("valid request");
        match succeeded(drain(&handle)) {
            ScanReport::Checksums { entries, .. } => entries[0].digest.clone(),
            other => panic!("expected Checksums report, got {other:?}"),
        }
    };

    let first = digest_of(path.clone());
    let second = digest_of(path);
    assert!(first.is_some());
    assert_eq!(first, second);
}

// ── Empty-folder scan ────────────────────────────────────────────────────────

/// Only directories with a zero-entry listing count: a directory holding
/// nothing but an empty subdirectory is not itself empty, and the root is
/// never reported.
#[test]
fn empty_folder_scan_uses_immediate_listing_only() {
    let tmp = TempDir::new().unwrap();
    let empty_leaf = tmp.path().join("empty-leaf");
    fs::create_dir(&empty_leaf).unwrap();

    let with_file = tmp.path().join("with-file");
    fs::create_dir(&with_file).unwrap();
    write_bytes(&with_file.join("f.txt"), 1);

    let parent = tmp.path().join("parent");
    let nested_empty = parent.join("nested-empty");
    fs::create_dir_all(&nested_empty).unwrap();

    let handle = start_scan(ScanRequest::EmptyFolders {
        root: tmp.path().to_path_buf(),
    })
    .expect("valid request");

    match succeeded(drain(&handle)) {
        ScanReport::EmptyFolders {
            folders, dirs_seen, ..
        } => {
            assert_eq!(dirs_seen, 4, "leaf, with-file, parent, nested-empty");
            assert!(folders.contains(&empty_leaf));
            assert!(folders.contains(&nested_empty));
            assert!(
                !folders.contains(&parent),
                "a directory containing an empty subdirectory is not empty"
            );
            assert!(!folders.contains(&with_file));
            assert!(!folders.contains(&tmp.path().to_path_buf()));
            assert_eq!(folders.len(), 2);
        }
        other => panic!("expected EmptyFolders report, got {other:?}"),
    }
}

/// An entirely empty root reports nothing and still succeeds.
#[test]
fn empty_folder_scan_of_bare_root() {
    let tmp = TempDir::new().unwrap();
    let handle = start_scan(ScanRequest::EmptyFolders {
        root: tmp.path().to_path_buf(),
    })
    .expect("valid request");

    match succeeded(drain(&handle)) {
        ScanReport::EmptyFolders {
            folders, dirs_seen, ..
        } => {
            assert!(folders.is_empty());
            assert_eq!(dirs_seen, 0);
        }
        other => panic!("expected EmptyFolders report, got {other:?}"),
    }
}

// ── Directory-size scan ──────────────────────────────────────────────────────

/// Child directories aggregate their whole subtree; files sitting directly
/// in the root belong to no bucket.
#[test]
fn directory_size_scan_aggregates_child_trees() {
    let tmp = TempDir::new().unwrap();
    let alpha = tmp.path().join("alpha");
    let alpha_sub = alpha.join("sub");
    let beta = tmp.path().join("beta");
    fs::create_dir_all(&alpha_sub).unwrap();
    fs::create_dir(&beta).unwrap();

    write_bytes(&alpha.join("a1.bin"), 1_000);
    write_bytes(&alpha_sub.join("a2.bin"), 2_000);
    write_bytes(&beta.join("b1.bin"), 1_000);
    write_bytes(&tmp.path().join("root-file.bin"), 50_000);

    let handle = start_scan(ScanRequest::DirectorySizes {
        root: tmp.path().to_path_buf(),
    })
    .expect("valid request");

    match succeeded(drain(&handle)) {
        ScanReport::DirectorySizes {
            buckets,
            total_bytes,
            ..
        } => {
            assert_eq!(total_bytes, 4_000, "root-level files are not counted");
            assert_eq!(buckets.len(), 2);
            assert_eq!(buckets[0].name, "alpha");
            assert_eq!(buckets[0].bytes, 3_000);
            assert_eq!(buckets[1].name, "beta");
            assert_eq!(buckets[1].bytes, 1_000);
        }
        other => panic!("expected DirectorySizes report, got {other:?}"),
    }
}

// ── Cancellation ─────────────────────────────────────────────────────────────

/// Cancelling a running scan must still end in exactly one terminal event.
/// The walk may finish before the flag is observed, so Succeeded is also
/// accepted.
#[test]
fn scan_cancellation_reaches_a_terminal_state() {
    let tmp = TempDir::new().unwrap();
    for i in 0..200 {
        let dir = tmp.path().join(format!("dir{i:03}"));
        fs::create_dir(&dir).unwrap();
        write_bytes(&dir.join("f.bin"), 64);
    }

    let handle = start_scan(ScanRequest::Duplicates {
        root: tmp.path().to_path_buf(),
    })
    .expect("valid request");
    handle.cancel();

    let events = drain(&handle);
    match events.last() {
        Some(TaskEvent::Done(TaskOutcome::Cancelled))
        | Some(TaskEvent::Done(TaskOutcome::Succeeded(_))) => {}
        other => panic!("expected Cancelled or Succeeded, got {other:?}"),
    }
}
