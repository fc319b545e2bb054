//! Document assembly: the fixed normalization pipeline.
//!
//! One call takes the raw markup of one article and returns its canonical
//! fragment. Normalization is synchronous and holds no shared state, so
//! independent articles can be normalized on as many threads as needed.
//!
//! The output shape is always:
//!
//! ```text
//! <div class="patch-note" id="patch-note-YYYY-MM-DD">
//!   <div class="patch-title">…</div>
//!   <div class="patch-content">… p / ul / h3 / h4 …</div>
//! </div>
//! ```

use crate::config::NormalizeConfig;
use crate::dom::{Fragment, NodeId};
use crate::error::NormalizeError;
use crate::note::PatchNote;
use crate::pipeline::classify::{classify, Classification};
use crate::pipeline::{cleanup, collapse, extract, heading, list};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Class names accepted for the title region: the site's and our own.
const TITLE_CLASSES: &[&str] = &["title", "patch-title"];
/// Class names accepted for the content region: the site's and our own.
const CONTENT_CLASSES: &[&str] = &["artCon", "patch-content"];

/// Counters collected while normalizing one article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeStats {
    pub images_removed: usize,
    pub spans_unwrapped: usize,
    pub containers_collapsed: usize,
    pub lists_built: usize,
    pub list_items: usize,
    pub major_headings: usize,
    pub minor_headings: usize,
    /// Heading-marker spans left untouched because they failed the shape or
    /// anchor checks.
    pub headings_skipped: usize,
    /// Line breaks that only separated a heading from the following text.
    pub breaks_removed: usize,
    pub headings_extracted: usize,
    /// Tags of single container children no collapse rule covers.
    pub unresolved: Vec<String>,
}

/// A canonical patch-note fragment.
#[derive(Debug, Clone)]
pub struct NormalizedNote {
    pub fragment: Fragment,
    /// The `div.patch-note` element.
    pub root: NodeId,
    pub title: NodeId,
    pub content: NodeId,
    pub stats: NormalizeStats,
}

impl NormalizedNote {
    /// Markup of the canonical `div.patch-note`.
    pub fn to_html(&self) -> String {
        self.fragment.outer_html(self.root)
    }
}

/// Normalize the markup of one article published on `date`.
///
/// # Errors
/// - [`NormalizeError::MalformedMarkup`] if the markup cannot be parsed
/// - [`NormalizeError::StructureNotFound`] if the root, title or content
///   region is missing
pub fn normalize(
    markup: &str,
    date: NaiveDate,
    config: &NormalizeConfig,
) -> Result<NormalizedNote, NormalizeError> {
    let fragment = Fragment::parse(markup)?;
    normalize_fragment(fragment, date, config)
}

/// Normalize the content of a downloaded [`PatchNote`].
pub fn normalize_note(
    note: &PatchNote,
    config: &NormalizeConfig,
) -> Result<NormalizedNote, NormalizeError> {
    let markup = note
        .content
        .as_deref()
        .ok_or_else(|| NormalizeError::MissingContent {
            note: note.date.to_string(),
        })?;
    normalize(markup, note.date, config)
}

/// Run the pipeline over an already parsed fragment.
pub fn normalize_fragment(
    mut fragment: Fragment,
    date: NaiveDate,
    config: &NormalizeConfig,
) -> Result<NormalizedNote, NormalizeError> {
    let mut stats = NormalizeStats::default();

    // ── Step 1: Locate root, drop images ─────────────────────────────────
    let root = fragment
        .first_element_child(fragment.root())
        .ok_or(NormalizeError::StructureNotFound { region: "root" })?;
    if config.strip_images {
        stats.images_removed = cleanup::strip_images(&mut fragment, root);
    }

    // ── Step 2: Canonical root/title/content attributes ──────────────────
    if let Some(el) = fragment.element_mut(root) {
        el.set_attr("class", "patch-note");
        el.set_attr("id", format!("patch-note-{}", date.format("%Y-%m-%d")));
    }
    let title = find_region(&fragment, root, TITLE_CLASSES)
        .ok_or(NormalizeError::StructureNotFound { region: "title" })?;
    let content = find_region(&fragment, root, CONTENT_CLASSES)
        .ok_or(NormalizeError::StructureNotFound { region: "content" })?;
    if let Some(el) = fragment.element_mut(title) {
        el.set_attr("class", "patch-title");
    }
    if let Some(el) = fragment.element_mut(content) {
        el.set_attr("class", "patch-content");
    }

    // ── Step 3: Inline spans ─────────────────────────────────────────────
    stats.spans_unwrapped = cleanup::strip_spans(&mut fragment, root, config);

    // ── Step 4: Grouping containers ──────────────────────────────────────
    let collapsed = collapse::collapse_containers(&mut fragment, content);
    stats.containers_collapsed = collapsed.removed + collapsed.unwrapped + collapsed.paragraphs;
    stats.unresolved = collapsed.unresolved;

    // ── Step 5: Lists, paragraph styling, bold ───────────────────────────
    let lists = list::rebuild_lists(&mut fragment, content, config);
    stats.lists_built = lists.lists;
    stats.list_items = lists.items;
    cleanup::strip_paragraph_styling(&mut fragment, content);
    cleanup::canonicalize_bold(&mut fragment, content);

    // ── Step 6: Headings ─────────────────────────────────────────────────
    let markers = fragment.find_all(content, |el| config.is_heading_marker(el));
    for span in markers {
        if !fragment.is_attached(span) {
            continue;
        }
        match classify(&fragment, span) {
            Classification::Heading(h) => {
                let made = heading::synthesize(&mut fragment, &h);
                stats.major_headings += usize::from(made.major.is_some());
                stats.minor_headings += usize::from(made.minor.is_some());
                stats.breaks_removed += usize::from(made.break_removed);
            }
            Classification::NoHeading => stats.headings_skipped += 1,
        }
    }

    // ── Step 7: Headings nested in paragraphs ────────────────────────────
    stats.headings_extracted = extract::extract_headings(&mut fragment, content);

    debug!(
        "Normalized patch note {}: {} h3, {} h4, {} skipped, {} lists",
        date,
        stats.major_headings,
        stats.minor_headings,
        stats.headings_skipped,
        stats.lists_built
    );

    Ok(NormalizedNote {
        fragment,
        root,
        title,
        content,
        stats,
    })
}

fn find_region(fragment: &Fragment, root: NodeId, classes: &[&str]) -> Option<NodeId> {
    classes
        .iter()
        .find_map(|class| fragment.find_element(root, "div", Some(class)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 9, 14).unwrap()
    }

    fn article(content: &str) -> String {
        format!(
            r#"<div class="newDetail"><div class="title">Patch Notes</div><div class="artCon">{content}</div></div>"#
        )
    }

    fn content_html(content: &str) -> String {
        let note = normalize(&article(content), date(), &NormalizeConfig::default()).unwrap();
        note.fragment.inner_html(note.content)
    }

    #[test]
    fn stamps_canonical_attributes() {
        let note = normalize(&article("<p>x</p>"), date(), &NormalizeConfig::default()).unwrap();
        assert_eq!(
            note.to_html(),
            r#"<div class="patch-note" id="patch-note-2023-09-14"><div class="patch-title">Patch Notes</div><div class="patch-content"><p>x</p></div></div>"#
        );
    }

    #[test]
    fn missing_content_region_is_fatal() {
        let err = normalize(
            r#"<div><div class="title">T</div></div>"#,
            date(),
            &NormalizeConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, NormalizeError::StructureNotFound { region: "content" }));
    }

    #[test]
    fn missing_title_region_is_fatal() {
        let err = normalize(
            r#"<div><div class="artCon">x</div></div>"#,
            date(),
            &NormalizeConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, NormalizeError::StructureNotFound { region: "title" }));
    }

    #[test]
    fn empty_input_has_no_root() {
        let err = normalize("  ", date(), &NormalizeConfig::default()).unwrap_err();
        assert!(matches!(err, NormalizeError::StructureNotFound { region: "root" }));
    }

    #[test]
    fn heading_inside_wrapped_div_is_synthesized() {
        let html = content_html(
            r#"<div><div><span style="color:#FF8C00;"><strong>New Content</strong></span></div></div><p>Body</p>"#,
        );
        // The div chain collapses to a p holding the span, which is then its
        // sole content and therefore a heading.
        assert_eq!(html, "<h3>New Content</h3><p>Body</p>");
    }

    #[test]
    fn legacy_bold_and_images_are_cleaned() {
        let html = content_html(r#"<p align="center"><img src="a.png"><b>Note</b> text</p>"#);
        assert_eq!(html, "<p><strong>Note</strong> text</p>");
    }

    #[test]
    fn images_kept_when_configured() {
        let config = NormalizeConfig::builder().strip_images(false).build().unwrap();
        let note = normalize(&article(r#"<p><img src="a.png">x</p>"#), date(), &config).unwrap();
        assert_eq!(note.stats.images_removed, 0);
        assert!(note.to_html().contains("<img"));
    }

    #[test]
    fn stats_count_each_stage() {
        let note = normalize(
            &article(
                r#"<p><span style="color:#FF8C00;"><strong>A</strong><br>B</span></p>
<p style="margin-left: 40px;">one</p><p style="margin-left: 40px;">two</p>
<p>text <span style="color:#FF8C00;">inline</span> text</p>"#,
            ),
            date(),
            &NormalizeConfig::default(),
        )
        .unwrap();
        assert_eq!(note.stats.major_headings, 1);
        assert_eq!(note.stats.minor_headings, 1);
        assert_eq!(note.stats.headings_skipped, 1);
        assert_eq!(note.stats.lists_built, 1);
        assert_eq!(note.stats.list_items, 2);
        assert_eq!(note.stats.headings_extracted, 2);
        assert_eq!(note.stats.breaks_removed, 0);
    }

    #[test]
    fn separator_breaks_are_counted() {
        let note = normalize(
            &article(r#"<p><span style="color:#FF8C00;">Title</span><br>Body</p>"#),
            date(),
            &NormalizeConfig::default(),
        )
        .unwrap();
        assert_eq!(note.stats.breaks_removed, 1);
        assert_eq!(note.fragment.inner_html(note.content), "<h4>Title</h4><p>Body</p>");
    }

    #[test]
    fn note_without_content_is_rejected() {
        let note = PatchNote::new("https://www.eveechoes.com/news/updata/20230914/1.html", None)
            .unwrap();
        let err = normalize_note(&note, &NormalizeConfig::default()).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingContent { .. }));
    }
}
