use crate::conjugator::ConjugateError;
use crate::models::Page;
use crate::registry::ConjugatorRegistry;
use crate::section::language_sections;
use crate::stats::ExtractionStats;
use crate::storage::StorageSink;
use crate::template::extract_templates;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Runs one page through segmentation, template extraction and conjugation.
///
/// Cloning is cheap; every dispatcher thread owns a clone.
#[derive(Clone)]
pub struct PageWorker {
    registry: Arc<ConjugatorRegistry>,
    sink: Arc<dyn StorageSink>,
    stats: Arc<ExtractionStats>,
}

impl PageWorker {
    pub fn new(
        registry: Arc<ConjugatorRegistry>,
        sink: Arc<dyn StorageSink>,
        stats: Arc<ExtractionStats>,
    ) -> Self {
        Self {
            registry,
            sink,
            stats,
        }
    }

    pub fn stats(&self) -> &Arc<ExtractionStats> {
        &self.stats
    }

    /// Processes `page` and returns the number of verb forms persisted.
    ///
    /// Failures are confined to the language section or template they occur
    /// in; the rest of the page is still processed.
    pub fn process(&self, page: &Page) -> u64 {
        let mut forms = 0u64;
        let mut word_stored = false;

        for section in language_sections(&page.text) {
            self.stats.inc_language_sections();
            if !section.has_verb() {
                continue;
            }

            let conjugator = match self.registry.lookup(section.name) {
                Some(c) => c,
                None => {
                    debug!(title = %page.title, language = section.name, "No conjugator for language");
                    self.stats.inc_unknown_languages();
                    continue;
                }
            };

            if let Err(e) = self.sink.insert_language(conjugator.language()) {
                warn!(title = %page.title, language = section.name, error = %e, "Failed to store language");
                self.stats.inc_sink_errors();
                continue;
            }

            if !word_stored {
                match self.sink.insert_word(&page.title) {
                    Ok(_) => word_stored = true,
                    Err(e) => {
                        warn!(title = %page.title, error = %e, "Failed to store word");
                        self.stats.inc_sink_errors();
                        continue;
                    }
                }
            }

            let verb_sections = section.verb_sections();
            self.stats.add_verb_sections(verb_sections.len() as u64);

            for verb_section in verb_sections {
                let templates = extract_templates(verb_section);
                self.stats.add_templates(templates.len() as u64);

                for template in templates {
                    match conjugator.conjugate(&page.title, template) {
                        Ok(count) => forms += count as u64,
                        Err(e) if e.is_skip() => {
                            trace!(title = %page.title, template, "Skipping template");
                            self.stats.inc_skipped();
                        }
                        Err(ConjugateError::Sink(e)) => {
                            warn!(title = %page.title, template, error = %e, "Failed to store verb form");
                            self.stats.inc_sink_errors();
                        }
                        Err(e) => {
                            debug!(title = %page.title, error = %e, "Rejected template");
                            self.stats.inc_failures();
                        }
                    }
                }
            }
        }

        self.stats.add_forms(forms);
        self.stats.inc_processed();
        forms
    }
}
