//! Error types for the ee-patch-notes library.
//!
//! Three types reflect three failure modes:
//!
//! * [`NormalizeError`] — **Fatal for one document**: its markup cannot be
//!   turned into a canonical fragment (undecodable input, no title or content
//!   region). There is no partial output for such a document.
//!
//! * [`PatchNotesError`] — **Fatal for an operation**: a fetch, cache, export
//!   or configuration step cannot proceed at all.
//!
//! * [`DocumentError`] — **Non-fatal**: one document in a batch failed while
//!   the others are fine. Collected in batch reports so a single broken
//!   article never aborts a run over hundreds of them.
//!
//! A heading span that fails the shape heuristic is not an error of any
//! kind: it is left untouched and only counted in
//! [`crate::normalize::NormalizeStats::headings_skipped`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the normalization of one document.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The input could not be tokenized into a tree at all.
    #[error("Markup could not be tokenized: {detail}")]
    MalformedMarkup { detail: String },

    /// The root, title or content region of the article is missing.
    #[error("Patch note structure not recognised: no {region} region found")]
    StructureNotFound { region: &'static str },

    /// A patch note was handed over without any content loaded.
    #[error("Patch note {note} has no content loaded")]
    MissingContent { note: String },
}

/// All fatal errors returned by the collaborator operations.
#[derive(Debug, Error)]
pub enum PatchNotesError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The URL is neither absolute, protocol-relative nor `www.`-prefixed.
    #[error("Invalid patch note url '{url}'")]
    InvalidUrl { url: String },

    /// No `updata/YYYYMMDD/` segment, and no date given explicitly.
    #[error("Can't extract patch note date from url '{url}'")]
    DateNotFound { url: String },

    // ── Network errors ────────────────────────────────────────────────────
    /// The request could not be sent or the body could not be read.
    #[error("Failed to fetch '{url}': {reason}\nCheck your internet connection.")]
    RequestFailed { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("Fetching '{url}' returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// A news listing or article page does not have the expected layout.
    #[error("Unexpected page format at '{url}': {detail}")]
    PageFormat { url: String, detail: String },

    // ── Cache errors ──────────────────────────────────────────────────────
    /// Cache file could not be read.
    #[error("Failed to read patch note cache '{path}': {source}")]
    CacheRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cache record is not valid JSON or has an invalid date.
    #[error("Corrupt patch note cache '{path}' at line {line}: {detail}")]
    CacheParse {
        path: PathBuf,
        line: usize,
        detail: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read a saved article or template.
    #[error("Failed to read '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),

    // ── Normalization ─────────────────────────────────────────────────────
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// A non-fatal error for a single document in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// Downloading or saving the article failed.
    #[error("Patch note {date}: download failed: {detail}")]
    DownloadFailed { date: String, detail: String },

    /// The saved article could not be loaded back.
    #[error("Patch note {date}: content unavailable: {detail}")]
    ContentUnavailable { date: String, detail: String },

    /// The article markup could not be normalized.
    #[error("Patch note {date}: normalization failed: {detail}")]
    NormalizeFailed { date: String, detail: String },
}
