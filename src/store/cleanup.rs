use crate::utils::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// Sweeps stale intake directories and encoder temp files out of the
/// scratch area. Entries left there belong to runs that died before their
/// own cleanup.
pub struct ScratchCleaner {
    scratch_dir: PathBuf,
    max_age: Duration,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub entries_deleted: usize,
    pub bytes_freed: u64,
}

impl ScratchCleaner {
    pub fn new(scratch_dir: impl Into<PathBuf>, max_age_minutes: u64) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            max_age: Duration::from_secs(max_age_minutes * 60),
        }
    }

    pub fn sweep(&self) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();
        if !self.scratch_dir.exists() {
            return Ok(report);
        }

        let now = SystemTime::now();
        for entry in std::fs::read_dir(&self.scratch_dir)?.flatten() {
            let path = entry.path();
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age < self.max_age {
                continue;
            }

            let size = entry_size(&path);
            let removed = if metadata.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };

            match removed {
                Ok(()) => {
                    report.entries_deleted += 1;
                    report.bytes_freed += size;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to delete scratch entry")
                }
            }
        }

        if report.entries_deleted > 0 {
            info!(
                entries_deleted = report.entries_deleted,
                bytes_freed = report.bytes_freed,
                "Scratch cleanup completed"
            );
        }

        Ok(report)
    }
}

fn entry_size(path: &Path) -> u64 {
    let Ok(metadata) = std::fs::symlink_metadata(path) else {
        return 0;
    };
    if !metadata.is_dir() {
        return metadata.len();
    }
    std::fs::read_dir(path)
        .map(|entries| entries.flatten().map(|e| entry_size(&e.path())).sum())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populate(dir: &Path) {
        std::fs::create_dir_all(dir.join("intake_1")).unwrap();
        std::fs::write(dir.join("intake_1").join("a.txt"), b"12345").unwrap();
        std::fs::write(dir.join("clip.mp4"), b"123").unwrap();
    }

    #[test]
    fn test_sweeps_everything_past_age() {
        let dir = TempDir::new().unwrap();
        populate(dir.path());

        let report = ScratchCleaner::new(dir.path(), 0).sweep().unwrap();

        assert_eq!(report.entries_deleted, 2);
        assert_eq!(report.bytes_freed, 8);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_fresh_entries_are_kept() {
        let dir = TempDir::new().unwrap();
        populate(dir.path());

        let report = ScratchCleaner::new(dir.path(), 60).sweep().unwrap();

        assert_eq!(report, CleanupReport::default());
        assert!(dir.path().join("clip.mp4").exists());
    }

    #[test]
    fn test_missing_scratch_dir_is_fine() {
        let dir = TempDir::new().unwrap();
        let report = ScratchCleaner::new(dir.path().join("nope"), 0).sweep().unwrap();
        assert_eq!(report.entries_deleted, 0);
    }
}
