use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use crate::domain::error::{AppError, Result};

/// Read a whole local file. The handle is closed when this returns, on every path.
pub async fn read_local_file(path: &Path) -> Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            AppError::NotFound(format!("Local file {} does not exist", path.display()))
        }
        _ => AppError::IoError(format!("Failed to open {}: {}", path.display(), e)),
    })?;

    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)
        .await
        .map_err(|e| AppError::IoError(format!("Failed to read {}: {}", path.display(), e)))?;

    Ok(buffer)
}

/// Relative paths are taken from `data_dir`; absolute paths are kept.
pub fn resolve_data_path(data_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || data_dir.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    }
}

/// All `*.csv` files directly inside `dir`, sorted by file name. Paths come back absolute.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AppError::NotFound(format!(
            "Data folder {} does not exist",
            dir.display()
        )));
    }
    let dir = dir.canonicalize()?;

    let mut files = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_local_file(&dir.path().join("nope.csv")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_discover_sorted_csv_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "x\n1").unwrap();
        fs::write(dir.path().join("a.CSV"), "x\n1").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let files = discover_csv_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.CSV", "b.csv"]);
    }

    #[test]
    fn test_discover_missing_folder() {
        let err = discover_csv_files(Path::new("/definitely/not/here")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_resolve_data_path() {
        assert_eq!(
            resolve_data_path(Path::new("data"), Path::new("a.csv")),
            PathBuf::from("data/a.csv")
        );
        let absolute = std::env::temp_dir().join("a.csv");
        assert_eq!(resolve_data_path(Path::new("data"), &absolute), absolute);
    }
}
