use std::path::{Path, PathBuf};

use crate::error::{LeaderboardError, Result};

/// Lists files in `dir` whose extension is `ext` (without the dot), as
/// absolute paths ordered by file name.
pub fn abs_file_paths(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let abs_dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(dir)
    };

    if !abs_dir.is_dir() {
        return Err(LeaderboardError::DirectoryDoesNotExist { path: abs_dir });
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&abs_dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, ext) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|value| value.to_str()) == Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_matching_extension_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.csv"), "").unwrap();
        std::fs::write(dir.path().join("a.csv"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let files = abs_file_paths(dir.path(), "csv").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = abs_file_paths(&missing, "csv").unwrap_err();
        assert!(matches!(err, LeaderboardError::DirectoryDoesNotExist { .. }));
    }
}
