//! News-site scraping: listing pages, article download and local storage.
//!
//! Page parsing is split from fetching: the `parse_*` / [`extract_article`]
//! functions are pure and work on markup, [`Scraper`] drives them over the
//! network through a rate-limited [`Fetcher`].
//!
//! ## Site layout
//!
//! ```text
//! listing   div.wrap ul.newList li.item a[href] p.newDate
//! pager     div.wrap div.pageBox div.pager a.next span "Last"
//! article   div.wrap div.newDetail (div.title, div.artCon)
//! ```

use crate::cache::CacheStore;
use crate::config::ScrapeConfig;
use crate::dom::{Fragment, NodeId};
use crate::error::{DocumentError, PatchNotesError};
use crate::fetch::Fetcher;
use crate::fs::{read_to_string, write_atomic};
use crate::note::PatchNote;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

static RE_LAST_PAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"updata/index_(\d+)\.html").unwrap());

// ── Page parsing ─────────────────────────────────────────────────────────

fn parse_page(markup: &str, url: &str) -> Result<Fragment, PatchNotesError> {
    Fragment::parse(markup).map_err(|e| PatchNotesError::PageFormat {
        url: url.to_string(),
        detail: e.to_string(),
    })
}

fn require(
    found: Option<NodeId>,
    url: &str,
    what: &str,
) -> Result<NodeId, PatchNotesError> {
    found.ok_or_else(|| PatchNotesError::PageFormat {
        url: url.to_string(),
        detail: format!("no {what} found"),
    })
}

/// Number of the last listing page, read from the pager's "Last" link.
pub fn parse_last_page_index(markup: &str, url: &str) -> Result<u32, PatchNotesError> {
    let page = parse_page(markup, url)?;
    let wrap = require(page.find_element(page.root(), "div", Some("wrap")), url, "div.wrap")?;
    let page_box = require(page.find_element(wrap, "div", Some("pageBox")), url, "div.pageBox")?;
    let pager = require(page.find_element(page_box, "div", Some("pager")), url, "div.pager")?;

    let last_href = page
        .find_all(pager, |el| el.tag() == "a" && el.has_class("next"))
        .into_iter()
        .filter(|&a| {
            page.find_element(a, "span", None)
                .is_some_and(|span| page.text_content(span).trim() == "Last")
        })
        .filter_map(|a| page.element(a).and_then(|el| el.attr("href")))
        .last()
        .ok_or_else(|| PatchNotesError::PageFormat {
            url: url.to_string(),
            detail: "no link to the last page".into(),
        })?;
    debug!("Found last page url: {}", last_href);

    RE_LAST_PAGE
        .captures(last_href)
        .and_then(|caps| caps[1].parse().ok())
        .ok_or_else(|| PatchNotesError::PageFormat {
            url: url.to_string(),
            detail: format!("unexpected last page link '{last_href}'"),
        })
}

/// Every patch note linked from one listing page, in page order.
///
/// Items without a link or with an unusable URL are skipped with a warning.
/// A missing or unparsable `p.newDate` falls back to the date in the URL.
pub fn parse_patch_note_list(markup: &str, url: &str) -> Result<Vec<PatchNote>, PatchNotesError> {
    let page = parse_page(markup, url)?;
    let wrap = require(page.find_element(page.root(), "div", Some("wrap")), url, "div.wrap")?;
    let list = require(page.find_element(wrap, "ul", Some("newList")), url, "ul.newList")?;

    let mut notes = Vec::new();
    for item in page.find_all(list, |el| el.tag() == "li" && el.has_class("item")) {
        let Some((link, href)) = page.find_element(item, "a", None).and_then(|link| {
            page.element(link)
                .and_then(|el| el.attr("href"))
                .map(|href| (link, href))
        }) else {
            warn!("Listing item on {} has no patch note link", url);
            continue;
        };
        let date = page
            .find_element(link, "p", Some("newDate"))
            .map(|p| page.text_content(p))
            .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok());
        if date.is_none() {
            warn!("No date found for patch note {}", href);
        }
        match PatchNote::new(href, date) {
            Ok(note) => notes.push(note),
            Err(e) => warn!("Skipping listing item on {}: {}", url, e),
        }
    }
    info!("Found {} patch note urls in {}", notes.len(), url);
    Ok(notes)
}

/// Outer markup of the article's `div.newDetail`, which must hold a
/// `div.title` and a `div.artCon`.
pub fn extract_article(markup: &str, url: &str) -> Result<String, PatchNotesError> {
    let page = parse_page(markup, url)?;
    let wrap = require(page.find_element(page.root(), "div", Some("wrap")), url, "div.wrap")?;
    let detail = require(page.find_element(wrap, "div", Some("newDetail")), url, "div.newDetail")?;
    require(page.find_element(detail, "div", Some("artCon")), url, "patch note content")?;
    require(page.find_element(detail, "div", Some("title")), url, "patch note title")?;
    Ok(page.outer_html(detail))
}

// ── Scraper ──────────────────────────────────────────────────────────────

/// Outcome of a batch download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub errors: Vec<DocumentError>,
}

impl DownloadReport {
    fn absorb(&mut self, other: DownloadReport) {
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
    }
}

/// Drives listing discovery and article downloads for one output directory.
pub struct Scraper {
    config: ScrapeConfig,
    fetcher: Fetcher,
    cache: CacheStore,
}

impl Scraper {
    pub fn new(config: ScrapeConfig) -> Result<Self, PatchNotesError> {
        let fetcher = Fetcher::new(&config)?;
        let cache = CacheStore::new(config.cache_path());
        Ok(Self {
            config,
            fetcher,
            cache,
        })
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Where a note's article is saved.
    pub fn note_path(&self, note: &PatchNote) -> PathBuf {
        self.config.output_dir.join(note.file_name())
    }

    /// Number of the last listing page.
    pub async fn last_page_index(&self) -> Result<u32, PatchNotesError> {
        let url = self.config.listing_url(1);
        let markup = self.fetcher.fetch_page(&url).await?;
        let last = parse_last_page_index(&markup, &url)?;
        info!("Last patch notes page has index {}", last);
        Ok(last)
    }

    /// Patch notes linked from listing page `page` (1-indexed).
    pub async fn list_patch_notes(&self, page: u32) -> Result<Vec<PatchNote>, PatchNotesError> {
        let url = self.config.listing_url(page);
        let markup = self.fetcher.fetch_page(&url).await?;
        parse_patch_note_list(&markup, &url)
    }

    async fn collect_pages(&self, min: u32, max: u32) -> Result<Vec<PatchNote>, PatchNotesError> {
        let mut notes = Vec::new();
        for page in min..=max {
            info!("Loading patch note urls {}/{}", page, max);
            notes.extend(self.list_patch_notes(page).await?);
        }
        Ok(notes)
    }

    /// Collect every note from listing pages `min..=max` and replace the
    /// cache with them.
    pub async fn find_all_patch_notes(
        &self,
        max: u32,
        min: u32,
    ) -> Result<Vec<PatchNote>, PatchNotesError> {
        let notes = self.collect_pages(min.max(1), max).await?;
        info!("Loaded a total of {} patch note urls", notes.len());
        self.cache.save(&notes).await?;
        Ok(notes)
    }

    /// Download one article, keep it in `note.content` and save it.
    pub async fn download_patch_note(&self, note: &mut PatchNote) -> Result<usize, PatchNotesError> {
        let markup = self.fetcher.fetch_page(&note.url).await?;
        let article = extract_article(&markup, &note.url)?;
        let path = self.note_path(note);
        write_atomic(&path, &article).await?;
        debug!("Saved patch notes {} to {}", note.url, path.display());
        let bytes = article.len();
        note.content = Some(article);
        Ok(bytes)
    }

    /// Download every note, optionally skipping those already saved.
    ///
    /// A failed note is recorded in the report and the batch continues.
    pub async fn download_all(&self, notes: &mut [PatchNote], skip_existing: bool) -> DownloadReport {
        let total = notes.len();
        let progress = self.config.progress_callback.as_ref();
        let mut report = DownloadReport::default();
        if let Some(cb) = progress {
            cb.on_batch_start(total);
        }

        for (i, note) in notes.iter_mut().enumerate() {
            let index = i + 1;
            let label = note.date.to_string();
            if skip_existing && self.note_path(note).exists() {
                info!("Processing {} [{}/{}]: file exists, skipping", label, index, total);
                report.skipped += 1;
                if let Some(cb) = progress {
                    cb.on_document_skipped(index, total);
                }
                continue;
            }

            info!("Processing {} [{}/{}]: downloading {}", label, index, total, note.url);
            if let Some(cb) = progress {
                cb.on_document_start(index, total, &label);
            }
            match self.download_patch_note(note).await {
                Ok(bytes) => {
                    report.downloaded += 1;
                    if let Some(cb) = progress {
                        cb.on_document_complete(index, total, bytes);
                    }
                }
                Err(e) => {
                    warn!("Failed to download patch note {}: {}", label, e);
                    if let Some(cb) = progress {
                        cb.on_document_error(index, total, &e.to_string());
                    }
                    report.errors.push(DocumentError::DownloadFailed {
                        date: label,
                        detail: e.to_string(),
                    });
                }
            }
        }

        if let Some(cb) = progress {
            cb.on_batch_complete(total, report.downloaded + report.skipped);
        }
        report
    }

    /// True if any note has not been saved locally yet.
    pub fn has_missing_notes(&self, notes: &[PatchNote]) -> bool {
        notes.iter().any(|n| !self.note_path(n).exists())
    }

    /// Walk listing pages from the newest, downloading missing notes, until
    /// a page has nothing new or `stop_at` is reached. Discovered notes are
    /// merged into the cache.
    pub async fn download_new(&self, stop_at: u32) -> Result<DownloadReport, PatchNotesError> {
        info!("Loading missing patch notes");
        let mut report = DownloadReport::default();
        for page in 1..=stop_at.max(1) {
            let mut notes = self.list_patch_notes(page).await?;
            self.cache.merge(&notes).await?;
            if !self.has_missing_notes(&notes) {
                info!("Page {} has no new patch notes, stopping search", page);
                break;
            }
            report.absorb(self.download_all(&mut notes, true).await);
        }
        Ok(report)
    }

    /// Read the saved article of every note into `note.content`.
    ///
    /// Notes without a saved file keep `content = None` and are reported.
    pub async fn load_contents(&self, notes: &mut [PatchNote]) -> Vec<DocumentError> {
        let mut errors = Vec::new();
        for note in notes.iter_mut() {
            match read_to_string(&self.note_path(note)).await {
                Ok(content) => note.content = Some(content),
                Err(e) => {
                    warn!("Patch note {} has no saved content: {}", note.date, e);
                    errors.push(DocumentError::ContentUnavailable {
                        date: note.date.to_string(),
                        detail: e.to_string(),
                    });
                }
            }
        }
        info!(
            "Loaded content of {}/{} patch notes",
            notes.len() - errors.len(),
            notes.len()
        );
        errors
    }
}
