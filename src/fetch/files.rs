// src/fetch/files.rs
use anyhow::{Context, Result};
use glob::glob;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// Regular files directly under `dir`, sorted by name.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*", dir.display());
    let mut files: Vec<PathBuf> = glob(&pattern)
        .with_context(|| format!("bad glob pattern {pattern}"))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "unreadable directory entry");
                None
            }
        })
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Whether `dir` already holds a file whose name carries `date_token`.
pub fn has_files_for(dir: &Path, date_token: &str) -> Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    Ok(list_files(dir)?.iter().any(|p| {
        p.file_name()
            .is_some_and(|n| n.to_string_lossy().contains(date_token))
    }))
}

/// Remove `paths`, logging the ones that could not be deleted. Returns how
/// many were removed.
pub fn delete_files(paths: &[PathBuf]) -> usize {
    let mut removed = 0;
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!(file = %path.display(), "deleted");
                removed += 1;
            }
            Err(e) => warn!(file = %path.display(), error = %e, "failed to delete"),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_checks_and_deletes() -> Result<()> {
        let dir = tempfile::tempdir()?;
        for name in ["quote2024-01-23.pdf", "omts2024-01-23.csv", "indhist22-Jan-2024.xls"] {
            fs::write(dir.path().join(name), b"x")?;
        }
        fs::create_dir(dir.path().join("sub"))?;

        let files = list_files(dir.path())?;
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["indhist22-Jan-2024.xls", "omts2024-01-23.csv", "quote2024-01-23.pdf"]
        );

        assert!(has_files_for(dir.path(), "2024-01-23")?);
        assert!(!has_files_for(dir.path(), "2024-01-24")?);
        assert!(!has_files_for(&dir.path().join("missing"), "2024")?);

        assert_eq!(delete_files(&files), 3);
        assert!(list_files(dir.path())?.is_empty());
        assert_eq!(delete_files(&files), 0);
        Ok(())
    }
}
