//! Single-page HTML export of many normalized patch notes.
//!
//! Pure composition over [`crate::normalize`]: every note with content is
//! normalized, the fragments are concatenated newest first and dropped into
//! a page template.

use crate::config::NormalizeConfig;
use crate::error::{DocumentError, PatchNotesError};
use crate::fs::write_atomic;
use crate::normalize::normalize_note;
use crate::note::PatchNote;
use crate::progress::ProgressCallback;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Page template shipped with the crate.
pub const DEFAULT_TEMPLATE: &str = include_str!("../resources/patch_notes_template.html");

const TIME_PLACEHOLDER: &str = "{time_updated}";
const NOTES_PLACEHOLDER: &str = "{patch_notes}";

/// How a page is rendered.
#[derive(Clone, Default)]
pub struct ExportOptions {
    /// Template with `{time_updated}` and `{patch_notes}` placeholders.
    /// `None` uses [`DEFAULT_TEMPLATE`].
    pub template: Option<String>,
    pub normalize: NormalizeConfig,
    pub progress: Option<ProgressCallback>,
}

impl ExportOptions {
    fn template(&self) -> Result<&str, PatchNotesError> {
        let template = self.template.as_deref().unwrap_or(DEFAULT_TEMPLATE);
        if !template.contains(NOTES_PLACEHOLDER) {
            return Err(PatchNotesError::InvalidConfig(format!(
                "export template has no {NOTES_PLACEHOLDER} placeholder"
            )));
        }
        Ok(template)
    }
}

/// Outcome of one export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub exported: usize,
    /// Notes without loaded content.
    pub skipped: usize,
    /// Notes whose normalization failed.
    pub errors: Vec<DocumentError>,
    /// Size of the written page.
    pub bytes: usize,
}

/// Render the page in memory. `time_updated` is inserted verbatim.
pub fn render_page(
    notes: &[PatchNote],
    time_updated: &str,
    options: &ExportOptions,
) -> Result<(String, ExportStats), PatchNotesError> {
    let template = options.template()?;
    let mut stats = ExportStats::default();

    let mut sorted: Vec<&PatchNote> = notes.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    let (with_content, without): (Vec<&PatchNote>, Vec<&PatchNote>) =
        sorted.into_iter().partition(|n| n.content.is_some());
    stats.skipped = without.len();
    for note in &without {
        debug!("Patch note {} has no content, not exported", note.date);
    }

    let total = with_content.len();
    let progress = options.progress.as_ref();
    if let Some(cb) = progress {
        cb.on_batch_start(total);
    }
    info!("Inserting {} patch notes", total);

    let mut fragments = Vec::with_capacity(total);
    for (i, note) in with_content.into_iter().enumerate() {
        let index = i + 1;
        let label = note.date.to_string();
        if let Some(cb) = progress {
            cb.on_document_start(index, total, &label);
        }
        match normalize_note(note, &options.normalize) {
            Ok(normalized) => {
                if !normalized.stats.unresolved.is_empty() {
                    debug!(
                        "Patch note {}: unresolved containers {:?}",
                        label, normalized.stats.unresolved
                    );
                }
                let html = normalized.to_html();
                if let Some(cb) = progress {
                    cb.on_document_complete(index, total, html.len());
                }
                fragments.push(html);
                stats.exported += 1;
            }
            Err(e) => {
                warn!("Skipping patch note {}: {}", label, e);
                if let Some(cb) = progress {
                    cb.on_document_error(index, total, &e.to_string());
                }
                stats.errors.push(DocumentError::NormalizeFailed {
                    date: label,
                    detail: e.to_string(),
                });
            }
        }
        if index % 20 == 0 {
            info!("Inserted {}/{}", index, total);
        }
    }
    if let Some(cb) = progress {
        cb.on_batch_complete(total, stats.exported);
    }

    let page = template
        .replace(TIME_PLACEHOLDER, time_updated)
        .replace(NOTES_PLACEHOLDER, &fragments.join("\n"));
    stats.bytes = page.len();
    Ok((page, stats))
}

/// Render the page stamped with the current local time and write it to
/// `path` atomically.
pub async fn export_html(
    notes: &[PatchNote],
    path: impl AsRef<Path>,
    options: &ExportOptions,
) -> Result<ExportStats, PatchNotesError> {
    let path = path.as_ref();
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
    let (page, stats) = render_page(notes, &now, options)?;
    info!("Saving {} patch notes to {}", stats.exported, path.display());
    write_atomic(path, page).await?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(date: &str, content: Option<&str>) -> PatchNote {
        let mut n = PatchNote::new(&format!("https://x.org/updata/{date}/1.html"), None).unwrap();
        n.content = content.map(str::to_string);
        n
    }

    fn article(title: &str) -> String {
        format!(r#"<div class="newDetail"><div class="title">{title}</div><div class="artCon"><p>x</p></div></div>"#)
    }

    fn options(template: &str) -> ExportOptions {
        ExportOptions {
            template: Some(template.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn notes_are_sorted_newest_first() {
        let notes = vec![
            note("20220101", Some(&article("Old"))),
            note("20230101", Some(&article("New"))),
        ];
        let (page, stats) = render_page(&notes, "now", &options("{time_updated}|{patch_notes}")).unwrap();
        assert!(page.starts_with("now|"));
        let new_at = page.find("New").unwrap();
        let old_at = page.find("Old").unwrap();
        assert!(new_at < old_at);
        assert_eq!(stats.exported, 2);
        assert_eq!(stats.bytes, page.len());
    }

    #[test]
    fn broken_and_empty_notes_are_skipped() {
        let notes = vec![
            note("20230101", Some(&article("Good"))),
            note("20230102", Some("<p>no structure</p>")),
            note("20230103", None),
        ];
        let (page, stats) = render_page(&notes, "now", &options("{patch_notes}")).unwrap();
        assert!(page.contains("patch-note-2023-01-01"));
        assert_eq!(stats.exported, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.errors.len(), 1);
        assert!(matches!(
            &stats.errors[0],
            DocumentError::NormalizeFailed { date, .. } if date == "2023-01-02"
        ));
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let err = render_page(&[], "now", &options("<html></html>")).unwrap_err();
        assert!(matches!(err, PatchNotesError::InvalidConfig(_)));
    }

    #[test]
    fn default_template_has_both_placeholders() {
        assert!(DEFAULT_TEMPLATE.contains(TIME_PLACEHOLDER));
        assert!(DEFAULT_TEMPLATE.contains(NOTES_PLACEHOLDER));
    }

    #[tokio::test]
    async fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patch_notes.html");
        let stats = export_html(
            &[note("20230914", Some(&article("T")))],
            &path,
            &ExportOptions::default(),
        )
        .await
        .unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.len(), stats.bytes);
        assert!(written.contains(r#"id="patch-note-2023-09-14""#));
        assert!(!written.contains(NOTES_PLACEHOLDER));
    }
}
