//! Patch-note metadata cache: one `{url, time}` JSON record per line.

use crate::error::PatchNotesError;
use crate::fs::{read_to_string, write_atomic};
use crate::note::{PatchNote, PatchNoteRecord};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Line-delimited store of the known patch notes.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Replace the cache with `notes`, in the given order.
    pub async fn save(&self, notes: &[PatchNote]) -> Result<(), PatchNotesError> {
        let mut out = String::new();
        for note in notes {
            let line = serde_json::to_string(&note.record())
                .map_err(|e| PatchNotesError::Internal(format!("cannot encode cache record: {e}")))?;
            out.push_str(&line);
            out.push('\n');
        }
        write_atomic(&self.path, out).await?;
        info!("Saved {} patch note records to {}", notes.len(), self.path.display());
        Ok(())
    }

    /// Read every record back. Blank lines are ignored.
    ///
    /// # Errors
    /// [`PatchNotesError::CacheRead`] if the file cannot be read,
    /// [`PatchNotesError::CacheParse`] naming the first bad line.
    pub async fn load(&self) -> Result<Vec<PatchNote>, PatchNotesError> {
        let raw = read_to_string(&self.path).await.map_err(|e| match e {
            PatchNotesError::InputReadFailed { path, source } => {
                PatchNotesError::CacheRead { path, source }
            }
            other => other,
        })?;

        let mut notes = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let parse_err = |detail: String| PatchNotesError::CacheParse {
                path: self.path.clone(),
                line: idx + 1,
                detail,
            };
            let record: PatchNoteRecord =
                serde_json::from_str(line).map_err(|e| parse_err(e.to_string()))?;
            notes.push(PatchNote::try_from(record).map_err(|e| parse_err(e.to_string()))?);
        }
        info!("Loaded {} patch note records from {}", notes.len(), self.path.display());
        Ok(notes)
    }

    /// Add `fresh` to the cached records, keeping the first record per URL,
    /// and save the result. A missing cache counts as empty.
    pub async fn merge(&self, fresh: &[PatchNote]) -> Result<Vec<PatchNote>, PatchNotesError> {
        let existing = if self.exists() {
            self.load().await?
        } else {
            Vec::new()
        };
        let merged = merge_notes(fresh, &existing);
        self.save(&merged).await?;
        Ok(merged)
    }
}

/// `first` then the notes of `second` whose URL is not already present.
fn merge_notes(first: &[PatchNote], second: &[PatchNote]) -> Vec<PatchNote> {
    let mut seen = HashSet::new();
    first
        .iter()
        .chain(second)
        .filter(|n| seen.insert(n.url.clone()))
        .map(|n| PatchNote {
            content: None,
            ..n.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn note(day: u32) -> PatchNote {
        PatchNote::new(
            &format!("https://www.eveechoes.com/news/updata/202309{day:02}/{day}.html"),
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_then_load_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("cache.jsonl"));
        let notes = vec![note(14), note(2)];
        store.save(&notes).await.unwrap();
        assert_eq!(store.load().await.unwrap(), notes);
    }

    #[tokio::test]
    async fn blank_lines_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.jsonl");
        std::fs::write(
            &path,
            "\n{\"url\":\"https://x.org/a.html\",\"time\":\"2021-05-06\"}\n\n",
        )
        .unwrap();
        let notes = CacheStore::new(&path).load().await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].date, NaiveDate::from_ymd_opt(2021, 5, 6).unwrap());
    }

    #[tokio::test]
    async fn corrupt_line_is_reported_with_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.jsonl");
        std::fs::write(
            &path,
            "{\"url\":\"https://x.org/a.html\",\"time\":\"2021-05-06\"}\nnot json\n",
        )
        .unwrap();
        let err = CacheStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, PatchNotesError::CacheParse { line: 2, .. }), "got {err}");
    }

    #[tokio::test]
    async fn missing_cache_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CacheStore::new(dir.path().join("nope.jsonl")).load().await.unwrap_err();
        assert!(matches!(err, PatchNotesError::CacheRead { .. }));
    }

    #[tokio::test]
    async fn merge_prefers_fresh_and_dedupes() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("cache.jsonl"));
        store.save(&[note(1), note(2)]).await.unwrap();
        let merged = store.merge(&[note(3), note(2)]).await.unwrap();
        let days: Vec<u32> = merged.iter().map(|n| chrono::Datelike::day(&n.date)).collect();
        assert_eq!(days, vec![3, 2, 1]);
        assert_eq!(store.load().await.unwrap(), merged);
    }
}
