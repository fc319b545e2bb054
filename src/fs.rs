//! Small async file helpers shared by the cache, scraper and exporter.

use crate::error::PatchNotesError;
use std::path::Path;

/// Write `contents` to `path` via a sibling temp file and a rename, so a
/// crash never leaves a half-written file behind. Parent directories are
/// created as needed.
pub async fn write_atomic(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), PatchNotesError> {
    let write_err = |source| PatchNotesError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

/// Read a UTF-8 file.
pub async fn read_to_string(path: &Path) -> Result<String, PatchNotesError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PatchNotesError::InputReadFailed {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn atomic_write_creates_parents_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/out.html");
        write_atomic(&path, "hello").await.unwrap();
        assert_eq!(read_to_string(&path).await.unwrap(), "hello");
        assert!(!dir.path().join("a/b/out.html.tmp").exists());
    }

    #[tokio::test]
    async fn read_missing_file_names_path() {
        let err = read_to_string(Path::new("/definitely/not/here.html"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.html"));
    }
}
