//! The patch-note entity shared by the scraper, cache and exporter.

use crate::error::PatchNotesError;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static RE_URL_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"updata/(\d{8})/").unwrap());

/// One patch-note article: where it lives, when it was published and,
/// once downloaded, its raw markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchNote {
    pub url: String,
    pub date: NaiveDate,
    /// Outer markup of the article's `div.newDetail`.
    pub content: Option<String>,
}

impl PatchNote {
    /// Create a note from a link found on the news site.
    ///
    /// Protocol-relative (`//host/..`) and bare `www.` links are completed
    /// to `https`. Without an explicit `date`, it is read from the
    /// `updata/YYYYMMDD/` path segment.
    ///
    /// # Errors
    /// - [`PatchNotesError::InvalidUrl`] for any other non-`http` link
    /// - [`PatchNotesError::DateNotFound`] if no date is given or found
    pub fn new(url: &str, date: Option<NaiveDate>) -> Result<Self, PatchNotesError> {
        let url = normalize_url(url)?;
        let date = match date {
            Some(d) => d,
            None => date_from_url(&url)?,
        };
        Ok(Self {
            url,
            date,
            content: None,
        })
    }

    /// File name of the saved article: `patch_notes_YYYY-MM-DD.html`.
    pub fn file_name(&self) -> String {
        format!("patch_notes_{}.html", self.date.format("%Y-%m-%d"))
    }

    pub fn record(&self) -> PatchNoteRecord {
        PatchNoteRecord {
            url: self.url.clone(),
            time: self.date,
        }
    }
}

impl fmt::Display for PatchNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PatchNote({})", self.date)
    }
}

/// Metadata of one note as stored in the cache, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchNoteRecord {
    pub url: String,
    /// ISO publish date.
    pub time: NaiveDate,
}

impl TryFrom<PatchNoteRecord> for PatchNote {
    type Error = PatchNotesError;

    fn try_from(record: PatchNoteRecord) -> Result<Self, Self::Error> {
        PatchNote::new(&record.url, Some(record.time))
    }
}

fn normalize_url(url: &str) -> Result<String, PatchNotesError> {
    let url = url.trim();
    if url.starts_with("http") {
        Ok(url.to_string())
    } else if url.starts_with("//") {
        Ok(format!("https:{url}"))
    } else if url.starts_with("www") {
        Ok(format!("https://{url}"))
    } else {
        Err(PatchNotesError::InvalidUrl {
            url: url.to_string(),
        })
    }
}

/// Publish date from the `updata/YYYYMMDD/` segment of an article URL.
pub fn date_from_url(url: &str) -> Result<NaiveDate, PatchNotesError> {
    RE_URL_DATE
        .captures(url)
        .and_then(|caps| NaiveDate::parse_from_str(&caps[1], "%Y%m%d").ok())
        .ok_or_else(|| PatchNotesError::DateNotFound {
            url: url.to_string(),
        })
}
