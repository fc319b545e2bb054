//! CLI binary for ee-patch-notes.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ScrapeConfig` / `NormalizeConfig` and reports results.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use ee_patch_notes::{
    export_html, normalize, BatchProgressCallback, DocumentError, DownloadReport, ExportOptions,
    NormalizeConfig, ProgressCallback, ScrapeConfig, Scraper,
};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

static RE_FILE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").unwrap());

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar per batch plus a log line for every
/// document that failed.
struct CliProgressCallback {
    bar: ProgressBar,
    verb: &'static str,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new(verb: &'static str) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            verb,
            errors: AtomicUsize::new(0),
        })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} notes  {msg}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        // `load-new` runs one batch per listing page on the same bar.
        self.bar.reset();
        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix(self.verb);
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_document_start(&self, _index: usize, _total: usize, label: &str) {
        self.bar.set_message(label.to_string());
    }

    fn on_document_complete(&self, _index: usize, _total: usize, _bytes: usize) {
        self.bar.inc(1);
    }

    fn on_document_skipped(&self, _index: usize, _total: usize) {
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} Note {:>3}/{:<3}  {}", red("✗"), index, total, red(&msg)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!("{} {}/{} notes", green("✔"), bold(&success_count.to_string()), total);
        } else {
            eprintln!(
                "{} {}/{} notes  ({} failed)",
                red("⚠"),
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Discover every patch note and download the missing ones
  ee-patch-notes load-all data

  # Only walk the newest listing pages until nothing new shows up
  ee-patch-notes load-new data

  # Render all downloaded notes into data/patch_notes.html
  ee-patch-notes export-html data --copy-to /var/www/patch_notes.html

  # Re-download everything from the cached list, then export
  ee-patch-notes load-all-export data --cache --force-reload

  # Normalize one saved article to stdout
  ee-patch-notes normalize data/patch_notes/patch_notes_2023-09-14.html

LAYOUT:
  <path>/patch_notes/cache.jsonl              known notes, one JSON record per line
  <path>/patch_notes/patch_notes_<date>.html  downloaded articles
  <path>/patch_notes.html                     exported page
"#;

/// Patch notes scraper and normalizer for the game Eve Echoes.
#[derive(Parser, Debug)]
#[command(
    name = "ee-patch-notes",
    version,
    about = "Patch notes scraper and normalizer for the game Eve Echoes",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// What to do.
    #[arg(value_enum)]
    mode: Mode,

    /// Output directory; for `normalize`, the saved article to normalize.
    path: PathBuf,

    /// Use the cached patch note list instead of walking every listing page
    /// (new notes will be missing). Only effective for load-all.
    #[arg(short, long)]
    cache: bool,

    /// Re-download and overwrite notes that are already saved. Only
    /// effective for load-all.
    #[arg(short, long)]
    force_reload: bool,

    /// Listing page URL; `{index}` is replaced by the page suffix.
    #[arg(long, env = "EE_PATCH_NOTES_URL", default_value = ee_patch_notes::config::DEFAULT_URL_PATTERN)]
    url: String,

    /// Minimum delay between HTTP requests in seconds.
    #[arg(short, long, env = "EE_PATCH_NOTES_RATELIMIT", default_value_t = 1.0)]
    ratelimit: f64,

    /// Upper bound, in seconds, of the random delay added to the rate limit.
    #[arg(long, env = "EE_PATCH_NOTES_RATELIMIT_RND_FAC", default_value_t = 2.0)]
    ratelimit_rnd_fac: f64,

    /// Copy the exported page to this path.
    #[arg(long)]
    copy_to: Option<PathBuf>,

    /// Publish date for `normalize` (YYYY-MM-DD). Default: taken from the
    /// file name.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Disable progress bar.
    #[arg(long, env = "EE_PATCH_NOTES_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "EE_PATCH_NOTES_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "EE_PATCH_NOTES_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    LoadAll,
    LoadNew,
    ExportHtml,
    LoadAllExport,
    LoadNewExport,
    Normalize,
}

impl Mode {
    fn exports(self) -> bool {
        matches!(self, Mode::ExportHtml | Mode::LoadAllExport | Mode::LoadNewExport)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && cli.mode != Mode::Normalize;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.mode == Mode::Normalize {
        return normalize_file(&cli).await;
    }

    // ── Build config ─────────────────────────────────────────────────────
    let output_dir = cli.path.join("patch_notes");
    let download_cb: Option<ProgressCallback> = show_progress
        .then(|| CliProgressCallback::new("Downloading") as Arc<dyn BatchProgressCallback>);
    let mut builder = ScrapeConfig::builder()
        .url_pattern(cli.url.clone())
        .output_dir(&output_dir)
        .rate_limit_secs(cli.ratelimit)
        .rate_limit_jitter(cli.ratelimit_rnd_fac);
    if let Some(cb) = download_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid scraper configuration")?;
    let scraper = Scraper::new(config).context("Failed to set up the scraper")?;

    // ── Download ─────────────────────────────────────────────────────────
    let report = match cli.mode {
        Mode::LoadAll | Mode::LoadAllExport => Some(load_all(&cli, &scraper).await?),
        Mode::LoadNew | Mode::LoadNewExport => {
            info!(
                "Loading new patch notes into {}, rate limit between {}s and {}s",
                output_dir.display(),
                cli.ratelimit,
                cli.ratelimit + cli.ratelimit_rnd_fac
            );
            let last = scraper
                .last_page_index()
                .await
                .context("Failed to read the news page range")?;
            Some(
                scraper
                    .download_new(last)
                    .await
                    .context("Failed to load new patch notes")?,
            )
        }
        _ => None,
    };
    if let Some(report) = &report {
        print_download_summary(&cli, report);
    }

    // ── Export ───────────────────────────────────────────────────────────
    if cli.mode.exports() {
        export(&cli, &scraper, show_progress).await?;
    }

    Ok(())
}

async fn load_all(cli: &Cli, scraper: &Scraper) -> Result<DownloadReport> {
    info!(
        "Loading all patch notes into {}, rate limit between {}s and {}s",
        scraper.config().output_dir.display(),
        cli.ratelimit,
        cli.ratelimit + cli.ratelimit_rnd_fac
    );
    let mut notes = if cli.cache {
        scraper
            .cache()
            .load()
            .await
            .context("Failed to load the patch note cache")?
    } else {
        let last = scraper
            .last_page_index()
            .await
            .context("Failed to read the news page range")?;
        scraper
            .find_all_patch_notes(last, 1)
            .await
            .context("Failed to collect patch note urls")?
    };
    Ok(scraper.download_all(&mut notes, !cli.force_reload).await)
}

async fn export(cli: &Cli, scraper: &Scraper, show_progress: bool) -> Result<()> {
    let out_path = cli.path.join("patch_notes.html");
    info!("Generating html, output file is {}", out_path.display());

    let mut notes = scraper
        .cache()
        .load()
        .await
        .context("Failed to load the patch note cache")?;
    let missing = scraper.load_contents(&mut notes).await;

    let options = ExportOptions {
        progress: show_progress
            .then(|| CliProgressCallback::new("Exporting") as Arc<dyn BatchProgressCallback>),
        ..Default::default()
    };
    let stats = export_html(&notes, &out_path, &options)
        .await
        .context("Export failed")?;

    if !cli.quiet {
        eprintln!(
            "{}  {} notes exported  {}  →  {}",
            if stats.errors.is_empty() { green("✔") } else { red("⚠") },
            stats.exported,
            dim(&format!("{} bytes", stats.bytes)),
            bold(&out_path.display().to_string()),
        );
        print_document_errors(missing.iter().chain(&stats.errors));
    }

    if let Some(copy_to) = &cli.copy_to {
        info!("Copying created file to {}", copy_to.display());
        tokio::fs::copy(&out_path, copy_to)
            .await
            .with_context(|| format!("Failed to copy export to {}", copy_to.display()))?;
    }
    Ok(())
}

async fn normalize_file(cli: &Cli) -> Result<()> {
    let date = match cli.date {
        Some(d) => d,
        None => date_from_file_name(&cli.path)?,
    };
    let markup = tokio::fs::read_to_string(&cli.path)
        .await
        .with_context(|| format!("Failed to read {}", cli.path.display()))?;
    let note = normalize(&markup, date, &NormalizeConfig::default())
        .with_context(|| format!("Failed to normalize {}", cli.path.display()))?;

    let html = note.to_html();
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(html.as_bytes())
        .context("Failed to write to stdout")?;
    handle.write_all(b"\n").ok();

    if !cli.quiet {
        let s = &note.stats;
        eprintln!(
            "{} {} h3, {} h4, {} lists ({} items), {} spans left as-is",
            green("✔"),
            s.major_headings,
            s.minor_headings,
            s.lists_built,
            s.list_items,
            s.headings_skipped
        );
        if !s.unresolved.is_empty() {
            eprintln!("  {}", dim(&format!("unresolved containers: {:?}", s.unresolved)));
        }
    }
    Ok(())
}

fn date_from_file_name(path: &Path) -> Result<NaiveDate> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let Some(caps) = RE_FILE_DATE.captures(&name) else {
        bail!("No date in file name '{}'; pass --date YYYY-MM-DD", name);
    };
    NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d")
        .with_context(|| format!("Invalid date in file name '{}'", name))
}

fn print_download_summary(cli: &Cli, report: &DownloadReport) {
    if cli.quiet {
        return;
    }
    eprintln!(
        "{}  {} downloaded, {} already saved",
        if report.errors.is_empty() { green("✔") } else { red("⚠") },
        report.downloaded,
        report.skipped
    );
    print_document_errors(report.errors.iter());
}

fn print_document_errors<'a>(errors: impl Iterator<Item = &'a DocumentError>) {
    for e in errors {
        eprintln!("  {} {}", red("✗"), e);
    }
}
