use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use docsheet_core::Result;

/// Delete regular files in `dir` last modified more than `ttl` ago.
/// Returns how many were removed. A missing directory counts as empty.
pub fn sweep_expired(dir: &Path, ttl: Duration) -> Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let now = SystemTime::now();
    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age <= ttl {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                debug!(
                    path = %entry.path().display(),
                    age_secs = age.as_secs(),
                    "Removed expired file"
                );
                removed += 1;
            }
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Failed to remove expired file")
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ttl_removes_files_but_not_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.xlsx"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("keep")).unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let removed = sweep_expired(dir.path(), Duration::ZERO).unwrap();
        assert_eq!(removed, 1);
        assert!(dir.path().join("keep").exists());
    }

    #[test]
    fn fresh_files_survive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("new.xlsx"), b"x").unwrap();

        let removed = sweep_expired(dir.path(), Duration::from_secs(3600)).unwrap();
        assert_eq!(removed, 0);
        assert!(dir.path().join("new.xlsx").exists());
    }

    #[test]
    fn missing_directory_is_empty() {
        let removed = sweep_expired(Path::new("/no/such/outputs"), Duration::ZERO).unwrap();
        assert_eq!(removed, 0);
    }
}
