//! # ee-patch-notes
//!
//! Scrape Eve Echoes patch notes and normalize their hand-authored markup
//! into clean, semantically tagged HTML.
//!
//! ## Why this crate?
//!
//! The news site's articles were written over years in a WYSIWYG editor that
//! never emitted heading or list tags. Headings are orange `span`s in
//! varying bold/italic wrappers, lists are paragraphs with a left margin,
//! and everything sits in layers of anonymous `div`s. This crate recovers
//! that structure with a fixed, deterministic and idempotent pipeline.
//!
//! ## Pipeline Overview
//!
//! ```text
//! article markup
//!  │
//!  ├─ 1. Parse     html5ever → arena tree (malformed nesting tolerated)
//!  ├─ 2. Stamp     div.patch-note#patch-note-<date>, .patch-title, .patch-content
//!  ├─ 3. Clean     drop images, flatten decorative spans
//!  ├─ 4. Collapse  resolve anonymous div wrappers
//!  ├─ 5. Lists     indented paragraphs → ul/li; strip paragraph styling
//!  ├─ 6. Headings  classify marker spans → h3/h4
//!  └─ 7. Extract   split paragraphs around the new headings
//! ```
//!
//! Around the core, [`scrape`] discovers and downloads articles through a
//! rate-limited [`fetch::Fetcher`], [`cache`] keeps the known notes, and
//! [`export`] renders all normalized notes into one page.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use ee_patch_notes::{normalize, NormalizeConfig};
//!
//! let markup = r#"<div class="newDetail"><div class="title">Patch</div>
//! <div class="artCon"><p><span style="color:#FF8C00;"><strong>New Content</strong></span></p></div></div>"#;
//! let date = NaiveDate::from_ymd_opt(2023, 9, 14).unwrap();
//! let note = normalize(markup, date, &NormalizeConfig::default()).unwrap();
//! assert!(note.to_html().contains("<h3>New Content</h3>"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ee-patch-notes` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! ee-patch-notes = { version = "0.4", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod config;
pub mod dom;
pub mod error;
pub mod export;
pub mod fetch;
pub mod fs;
pub mod normalize;
pub mod note;
pub mod pipeline;
pub mod progress;
pub mod scrape;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::CacheStore;
pub use config::{NormalizeConfig, NormalizeConfigBuilder, ScrapeConfig, ScrapeConfigBuilder};
pub use dom::{Fragment, NodeId, Role};
pub use error::{DocumentError, NormalizeError, PatchNotesError};
pub use export::{export_html, render_page, ExportOptions, ExportStats};
pub use fetch::{Fetcher, RateLimit};
pub use normalize::{normalize, normalize_fragment, normalize_note, NormalizeStats, NormalizedNote};
pub use note::{PatchNote, PatchNoteRecord};
pub use pipeline::classify::{classify, Classification, HeadingSpan};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use scrape::{DownloadReport, Scraper};
