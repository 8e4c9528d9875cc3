use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics collected during the extraction process
#[derive(Debug, Default)]
pub struct ExtractionStats {
    pub pages_submitted: AtomicU64,
    pub pages_processed: AtomicU64,
    pub language_sections: AtomicU64,
    pub verb_sections: AtomicU64,
    pub unknown_languages: AtomicU64,
    pub templates_extracted: AtomicU64,
    pub forms_persisted: AtomicU64,
    pub templates_skipped: AtomicU64,
    pub template_failures: AtomicU64,
    pub sink_errors: AtomicU64,
}

/// Plain snapshot of [`ExtractionStats`], written as `summary.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub pages_submitted: u64,
    pub pages_processed: u64,
    pub language_sections: u64,
    pub verb_sections: u64,
    pub unknown_languages: u64,
    pub templates_extracted: u64,
    pub forms_persisted: u64,
    pub templates_skipped: u64,
    pub template_failures: u64,
    pub sink_errors: u64,
}

impl ExtractionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_submitted(&self) {
        self.pages_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_processed(&self) {
        self.pages_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_language_sections(&self) {
        self.language_sections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_verb_sections(&self, count: u64) {
        self.verb_sections.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_unknown_languages(&self) {
        self.unknown_languages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_templates(&self, count: u64) {
        self.templates_extracted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_forms(&self, count: u64) {
        self.forms_persisted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_skipped(&self) {
        self.templates_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failures(&self) {
        self.template_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_sink_errors(&self) {
        self.sink_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn submitted(&self) -> u64 {
        self.pages_submitted.load(Ordering::Relaxed)
    }

    pub fn processed(&self) -> u64 {
        self.pages_processed.load(Ordering::Relaxed)
    }

    pub fn forms(&self) -> u64 {
        self.forms_persisted.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.template_failures.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            pages_submitted: self.submitted(),
            pages_processed: self.processed(),
            language_sections: self.language_sections.load(Ordering::Relaxed),
            verb_sections: self.verb_sections.load(Ordering::Relaxed),
            unknown_languages: self.unknown_languages.load(Ordering::Relaxed),
            templates_extracted: self.templates_extracted.load(Ordering::Relaxed),
            forms_persisted: self.forms(),
            templates_skipped: self.templates_skipped.load(Ordering::Relaxed),
            template_failures: self.failures(),
            sink_errors: self.sink_errors.load(Ordering::Relaxed),
        }
    }
}
