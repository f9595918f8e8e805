//! Sequential harvesting over a list of target pages
//!
//! Targets come from `video_id,url` CSV files. Each page is visited on the same
//! browser page, its records written to `comments_<video_id>.json`, and a
//! failing page is recorded and skipped without stopping the batch.

use crate::{browser::Page,
            comments::{CommentRecord, HarvestConfig, RecordSource, visit_page},
            error::{HarvestError, Result}};
use std::{fs,
          path::{Path, PathBuf},
          sync::atomic::{AtomicBool, Ordering}};

/// One page to visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    /// Opaque identifier used for logging and output naming
    pub id: String,
    pub url: String,
}

impl PageTarget {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self { id: id.into(), url: normalize_target_url(&url.into()) }
    }
}

/// Add a scheme to URLs exported without one
pub fn normalize_target_url(url: &str) -> String {
    let trimmed = url.trim();

    if trimmed.contains("://") || trimmed.starts_with("about:") || trimmed.starts_with("data:") {
        return trimmed.to_string();
    }

    if let Some(rest) = trimmed.strip_prefix("//") {
        return format!("https://{}", rest);
    }

    format!("https://{}", trimmed)
}

/// Parse `video_id,url` rows; a header is detected by `video_id` in the first record
///
/// Quoted fields are unquoted. An unquoted URL containing commas spans several
/// fields, which are joined back so only the first comma separates id from URL.
/// Rows missing either side are skipped.
pub fn parse_targets(contents: &str) -> Vec<PageTarget> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let mut targets = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::debug!("Skipping malformed CSV row: {}", e);
                continue;
            }
        };

        if index == 0 && record.iter().any(|field| field.to_lowercase().contains("video_id")) {
            continue;
        }

        let id = record.get(0).unwrap_or_default();
        let url = record.iter().skip(1).collect::<Vec<_>>().join(",");
        if !id.is_empty() && !url.trim().is_empty() {
            targets.push(PageTarget::new(id, url));
        }
    }

    targets
}

pub fn read_targets(path: &Path) -> Result<Vec<PageTarget>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| HarvestError::InvalidInput(format!("Missing CSV {}: {}", path.display(), e)))?;
    Ok(parse_targets(&contents))
}

/// Lower-case, runs of non-alphanumerics become `-`, no leading/trailing dashes
pub fn slugify(phrase: &str) -> String {
    let mut slug = String::with_capacity(phrase.len());
    for c in phrase.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Where a batch reads its targets and writes its results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    pub csv_path: PathBuf,
    pub out_dir: PathBuf,
}

/// Resolve the command-line input: a CSV path, an `@handle`, or a search phrase
///
/// - `*.csv`: that file, output folder named after its parent directory
/// - `@handle`: `<data>/<handle>/<handle>_video_ids_with_urls.csv`
/// - phrase: `<data>/<slug>/video_ids_with_urls.csv`
///
/// `folder` overrides the output folder name in every case.
pub fn resolve_input(input: &str, data_root: &Path, out_root: &Path, folder: Option<&str>) -> Result<ResolvedInput> {
    let input = input.trim();
    if input.is_empty() {
        return Err(HarvestError::InvalidInput("Provide a search phrase, an @handle or a CSV path".to_string()));
    }

    let (csv_path, default_folder) = if input.to_lowercase().ends_with(".csv") {
        let csv_path = PathBuf::from(input);
        let parent = csv_path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "default".to_string());
        (csv_path, parent)
    } else if let Some(handle) = input.strip_prefix('@') {
        let handle = handle.trim().to_lowercase();
        if handle.is_empty() {
            return Err(HarvestError::InvalidInput("Empty handle".to_string()));
        }
        (data_root.join(&handle).join(format!("{}_video_ids_with_urls.csv", handle)), handle)
    } else {
        let slug = slugify(input);
        if slug.is_empty() {
            return Err(HarvestError::InvalidInput(format!("Cannot derive a folder name from '{}'", input)));
        }
        (data_root.join(&slug).join("video_ids_with_urls.csv"), slug)
    };

    let folder = folder.filter(|f| !f.trim().is_empty()).map(str::to_string).unwrap_or(default_folder);
    Ok(ResolvedInput { csv_path, out_dir: out_root.join(folder) })
}

pub fn output_path(out_dir: &Path, id: &str) -> PathBuf {
    out_dir.join(format!("comments_{}.json", id))
}

/// Write the records of one page as a pretty-printed JSON array
pub fn write_comments(out_dir: &Path, id: &str, records: &[CommentRecord]) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let path = output_path(out_dir, id);
    fs::write(&path, serde_json::to_string_pretty(records)?)?;
    Ok(path)
}

/// A page whose comments were saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub id: String,
    pub count: usize,
    pub source: RecordSource,
    pub path: PathBuf,
}

/// A page whose visit or persistence failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub succeeded: Vec<PageSummary>,
    pub failed: Vec<PageFailure>,
    /// Targets not attempted because the batch was interrupted
    pub skipped: usize,
}

impl BatchReport {
    pub fn total_comments(&self) -> usize {
        self.succeeded.iter().map(|s| s.count).sum()
    }
}

/// Visit every target in order, persisting each page's records
///
/// `stop` is checked between pages; the page in progress always completes.
pub fn run_batch<P: Page + ?Sized>(
    page: &P,
    targets: &[PageTarget],
    config: &HarvestConfig,
    out_dir: &Path,
    stop: &AtomicBool,
) -> BatchReport {
    let mut report = BatchReport::default();

    for (index, target) in targets.iter().enumerate() {
        if stop.load(Ordering::SeqCst) {
            report.skipped = targets.len() - index;
            log::warn!("Interrupted, skipping {} remaining pages", report.skipped);
            break;
        }

        log::info!("{} ({}/{}): opening {}", target.id, index + 1, targets.len(), target.url);

        let saved = visit_page(page, &target.url, config).and_then(|outcome| {
            let path = write_comments(out_dir, &target.id, &outcome.records)?;
            Ok(PageSummary { id: target.id.clone(), count: outcome.records.len(), source: outcome.source, path })
        });

        match saved {
            Ok(summary) => {
                log::info!(
                    "{}: saved {} comments ({:?}) -> {}",
                    summary.id,
                    summary.count,
                    summary.source,
                    summary.path.display()
                );
                report.succeeded.push(summary);
            }
            Err(e) => {
                log::error!("{}: failed: {}", target.id, e);
                report.failed.push(PageFailure { id: target.id.clone(), reason: e.to_string() });
            }
        }
    }

    report
}
