//! Status detector (C5, spec §4.5): classifies each `ConfigFile` entry as
//! Synced / Missing / Partial relative to the filesystem and the dotfile
//! manager.

use std::path::Path;

use zerb_core::{Chezmoi, ZerbError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    /// File exists and the dotfile manager reports managing it.
    Synced,
    /// File does not exist on disk.
    Missing,
    /// File exists but the manager does not track it.
    Partial,
}

/// Classify `paths` (already normalized by the caller) in input order,
/// checking a cancellation token between entries.
pub fn detect_status(
    paths: &[std::path::PathBuf],
    manager: &dyn Chezmoi,
    is_cancelled: impl Fn() -> bool,
) -> Result<Vec<PathStatus>, ZerbError> {
    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        if is_cancelled() {
            return Err(ZerbError::Cancelled);
        }
        results.push(classify_one(path, manager)?);
    }
    Ok(results)
}

fn classify_one(path: &Path, manager: &dyn Chezmoi) -> Result<PathStatus, ZerbError> {
    if !path.exists() {
        return Ok(PathStatus::Missing);
    }
    if manager.has_file(path)? {
        Ok(PathStatus::Synced)
    } else {
        Ok(PathStatus::Partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct FakeChezmoi {
        tracked: Vec<PathBuf>,
    }

    impl Chezmoi for FakeChezmoi {
        fn add(
            &self,
            _path: &Path,
            _opts: zerb_core::ConfigFileOptions,
        ) -> Result<Vec<PathBuf>, ZerbError> {
            Ok(vec![])
        }
        fn remove(&self, _path: &Path) -> Result<(), ZerbError> {
            Ok(())
        }
        fn has_file(&self, path: &Path) -> Result<bool, ZerbError> {
            Ok(self.tracked.iter().any(|p| p == path))
        }
        fn source_dir(&self) -> Result<PathBuf, ZerbError> {
            Ok(PathBuf::from("/home/u/.local/share/chezmoi"))
        }
    }

    #[test]
    fn missing_file_is_missing() {
        let manager = FakeChezmoi { tracked: vec![] };
        let paths = vec![PathBuf::from("/nonexistent/path/does-not-exist")];
        let result = detect_status(&paths, &manager, || false).unwrap();
        assert_eq!(result, vec![PathStatus::Missing]);
    }

    #[test]
    fn existing_untracked_file_is_partial() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let manager = FakeChezmoi { tracked: vec![] };
        let paths = vec![temp.path().to_path_buf()];
        let result = detect_status(&paths, &manager, || false).unwrap();
        assert_eq!(result, vec![PathStatus::Partial]);
    }

    #[test]
    fn existing_tracked_file_is_synced() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let manager = FakeChezmoi {
            tracked: vec![temp.path().to_path_buf()],
        };
        let paths = vec![temp.path().to_path_buf()];
        let result = detect_status(&paths, &manager, || false).unwrap();
        assert_eq!(result, vec![PathStatus::Synced]);
    }

    #[test]
    fn cancellation_aborts_between_entries() {
        let manager = FakeChezmoi { tracked: vec![] };
        let paths = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        let result = detect_status(&paths, &manager, || true);
        assert!(matches!(result, Err(ZerbError::Cancelled)));
    }

    #[test]
    fn preserves_input_order() {
        let temp_a = tempfile::NamedTempFile::new().unwrap();
        let manager = FakeChezmoi {
            tracked: vec![temp_a.path().to_path_buf()],
        };
        let paths = vec![
            PathBuf::from("/missing"),
            temp_a.path().to_path_buf(),
        ];
        let result = detect_status(&paths, &manager, || false).unwrap();
        assert_eq!(result, vec![PathStatus::Missing, PathStatus::Synced]);
    }
}
