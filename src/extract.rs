use crate::config::PROGRESS_INTERVAL;
use crate::dispatch::{Dispatcher, DispatcherConfig, SubmitError};
use crate::models::Page;
use crate::output::CsvSink;
use crate::parser::WikiReader;
use crate::registry::ConjugatorRegistry;
use crate::stats::{ExtractionStats, StatsSummary};
use crate::storage::{MemorySink, StorageSink};
use crate::worker::PageWorker;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Dump to read, `.xml` or `.xml.bz2`
    pub input: String,
    /// Directory receiving the CSV files and `summary.json`
    pub output_dir: String,
    pub dispatcher: DispatcherConfig,
    /// Keep results in memory and write nothing
    pub dry_run: bool,
}

/// Outcome of a run, written as `summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSummary {
    pub input: String,
    pub dry_run: bool,
    pub duration_secs: f64,
    /// Pages dropped by the reader for their namespace
    pub skipped_pages: u64,
    pub languages: usize,
    pub words: usize,
    pub infinitives: usize,
    pub verb_forms: usize,
    pub stats: StatsSummary,
}

/// Feeds `pages` through a worker pool until the stream ends or the page
/// limit is reached.
///
/// Returns once every accepted page has been processed. A stream error stops
/// submission; pages already queued are still drained before the error is
/// returned.
pub fn extract_pages<I>(
    pages: I,
    registry: Arc<ConjugatorRegistry>,
    sink: Arc<dyn StorageSink>,
    config: &DispatcherConfig,
) -> Result<Arc<ExtractionStats>>
where
    I: IntoIterator<Item = Result<Page>>,
{
    let stats = Arc::new(ExtractionStats::new());
    let worker = PageWorker::new(registry, sink, stats.clone());
    let mut dispatcher = Dispatcher::new(config, worker)?;
    let pb = ProgressBar::new_spinner();

    let mut stream_error = None;
    for page in pages {
        let page = match page {
            Ok(page) => page,
            Err(e) => {
                error!(error = %e, accepted = dispatcher.accepted(), "Dump stream failed");
                stream_error = Some(e);
                break;
            }
        };

        match dispatcher.submit(page) {
            Ok(()) => stats.inc_submitted(),
            Err(SubmitError::PageLimitReached(limit)) => {
                info!(limit, "Page limit reached, stopping");
                break;
            }
            Err(e @ SubmitError::Closed) => {
                pb.finish_and_clear();
                dispatcher.drain()?;
                return Err(e.into());
            }
        }

        let submitted = stats.submitted();
        if submitted % PROGRESS_INTERVAL == 0 {
            pb.set_message(format!(
                "{} pages submitted, {} processed",
                submitted,
                stats.processed()
            ));
            pb.tick();
        }
    }

    pb.finish_and_clear();
    dispatcher.drain()?;

    if let Some(e) = stream_error {
        return Err(e.context(format!(
            "Extraction stopped after {} pages",
            stats.submitted()
        )));
    }

    info!(
        pages = stats.processed(),
        forms = stats.forms(),
        failures = stats.failures(),
        "Extraction pass complete"
    );
    Ok(stats)
}

/// Runs the full extraction of `config.input` and, unless this is a dry run,
/// writes the CSV files and `summary.json` to `config.output_dir`.
pub fn run_extraction(config: &ExtractConfig) -> Result<ExtractionSummary> {
    config.dispatcher.validate()?;
    let start = Instant::now();

    let mut reader = WikiReader::open(&config.input)
        .with_context(|| format!("Failed to open wiki dump at: {}", config.input))?;

    info!(
        input = %config.input,
        output = %config.output_dir,
        dry_run = config.dry_run,
        "Starting extraction"
    );

    let (stats, store_counts) = if config.dry_run {
        let sink = Arc::new(MemorySink::new());
        let registry = Arc::new(ConjugatorRegistry::with_defaults(sink.clone()));
        let stats = extract_pages(reader.by_ref(), registry, sink.clone(), &config.dispatcher)?;
        (stats, StoreCounts::of(&sink))
    } else {
        let sink = Arc::new(CsvSink::create(Path::new(&config.output_dir))?);
        let registry = Arc::new(ConjugatorRegistry::with_defaults(sink.clone()));
        let stats = extract_pages(reader.by_ref(), registry, sink.clone(), &config.dispatcher)?;
        sink.finish()?;
        (stats, StoreCounts::of(sink.store()))
    };

    let summary = ExtractionSummary {
        input: config.input.clone(),
        dry_run: config.dry_run,
        duration_secs: start.elapsed().as_secs_f64(),
        skipped_pages: reader.skipped(),
        languages: store_counts.languages,
        words: store_counts.words,
        infinitives: store_counts.infinitives,
        verb_forms: store_counts.verb_forms,
        stats: stats.summary(),
    };

    if !config.dry_run {
        write_summary(Path::new(&config.output_dir), &summary)?;
    }

    Ok(summary)
}

struct StoreCounts {
    languages: usize,
    words: usize,
    infinitives: usize,
    verb_forms: usize,
}

impl StoreCounts {
    fn of(store: &MemorySink) -> Self {
        Self {
            languages: store.language_count(),
            words: store.word_count(),
            infinitives: store.infinitive_count(),
            verb_forms: store.verb_form_count(),
        }
    }
}

fn write_summary(output_dir: &Path, summary: &ExtractionSummary) -> Result<()> {
    let path = output_dir.join(SUMMARY_FILE);
    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn config(workers: usize, page_limit: Option<u64>) -> DispatcherConfig {
        DispatcherConfig {
            workers,
            queue_capacity: 4,
            page_limit,
        }
    }

    fn pages(n: usize) -> Vec<Result<Page>> {
        (0..n)
            .map(|i| {
                Ok(Page::new(
                    format!("werk{i}en"),
                    "==Dutch==\n===Verb===\n{{nl-verb}}\n",
                ))
            })
            .collect()
    }

    #[test]
    fn every_page_is_processed() {
        let sink = Arc::new(MemorySink::new());
        let registry = Arc::new(ConjugatorRegistry::with_defaults(sink.clone()));
        let stats = extract_pages(pages(25), registry, sink.clone(), &config(3, None)).unwrap();

        assert_eq!(stats.submitted(), 25);
        assert_eq!(stats.processed(), 25);
        assert_eq!(sink.verb_form_count(), 25);
    }

    #[test]
    fn limit_stops_submission() {
        let sink = Arc::new(MemorySink::new());
        let registry = Arc::new(ConjugatorRegistry::with_defaults(sink.clone()));
        let stats = extract_pages(pages(25), registry, sink.clone(), &config(2, Some(10))).unwrap();

        assert_eq!(stats.processed(), 10);
        assert_eq!(sink.infinitive_count(), 10);
    }

    #[test]
    fn stream_error_drains_then_fails() {
        let sink = Arc::new(MemorySink::new());
        let registry = Arc::new(ConjugatorRegistry::with_defaults(sink.clone()));
        let mut input = pages(5);
        input.push(Err(anyhow!("Malformed XML near byte 42")));
        input.extend(pages(5));

        let err = extract_pages(input, registry, sink.clone(), &config(2, None)).unwrap_err();

        assert!(format!("{:#}", err).contains("Malformed XML near byte 42"));
        assert_eq!(sink.verb_form_count(), 5);
    }
}
