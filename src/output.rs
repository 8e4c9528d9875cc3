//! CSV output for an extraction run.
//!
//! Ids are assigned by an inner [`MemorySink`]; a row is written only by the
//! call that created it, so every file holds each record exactly once no
//! matter how many workers insert the same value.

use crate::config::WRITE_BUFFER_SIZE;
use crate::models::{InfinitiveId, Language, LanguageId, VerbForm, WordId};
use crate::storage::{MemorySink, SinkError, StorageSink, Upsert};
use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info};

type CsvWriter = Mutex<Writer<BufWriter<File>>>;

pub const LANGUAGES_FILE: &str = "languages.csv";
pub const WORDS_FILE: &str = "words.csv";
pub const INFINITIVES_FILE: &str = "infinitives.csv";
pub const VERB_FORMS_FILE: &str = "verb_forms.csv";

pub struct CsvSink {
    store: MemorySink,
    languages: CsvWriter,
    words: CsvWriter,
    infinitives: CsvWriter,
    verb_forms: CsvWriter,
}

fn open_writer(dir: &Path, name: &str, header: &[&str]) -> Result<CsvWriter> {
    let path = dir.join(name);
    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file));
    writer.write_record(header)?;
    Ok(Mutex::new(writer))
}

type CsvGuard<'a> = MutexGuard<'a, Writer<BufWriter<File>>>;

/// Locks one output file. Rows are assigned their id while the lock is held,
/// so rows land in the file in id order.
fn lock<'a>(writer: &'a CsvWriter, file: &'static str) -> Result<CsvGuard<'a>, SinkError> {
    writer.lock().map_err(|_| SinkError::Poisoned(file))
}

fn write_row<const N: usize>(
    writer: &mut CsvGuard<'_>,
    file: &'static str,
    key: &str,
    row: [&str; N],
) -> Result<(), SinkError> {
    writer.write_record(row).map_err(|e| {
        error!(file, key, error = %e, "Row stored in memory but missing from CSV output");
        SinkError::from(e)
    })
}

impl CsvSink {
    /// Creates `output_dir` if needed and truncates the four output files.
    pub fn create(output_dir: &Path) -> Result<Self> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

        Ok(Self {
            store: MemorySink::new(),
            languages: open_writer(output_dir, LANGUAGES_FILE, &["id", "name", "tag"])?,
            words: open_writer(output_dir, WORDS_FILE, &["id", "word"])?,
            infinitives: open_writer(
                output_dir,
                INFINITIVES_FILE,
                &["id", "word_id", "language_id"],
            )?,
            verb_forms: open_writer(
                output_dir,
                VERB_FORMS_FILE,
                &["language_id", "infinitive_id", "word", "tense", "number", "person"],
            )?,
        })
    }

    /// Id assignment and counts behind the files.
    pub fn store(&self) -> &MemorySink {
        &self.store
    }

    /// Flushes every file. Must be called once all workers are done.
    pub fn finish(&self) -> Result<()> {
        for (name, writer) in [
            (LANGUAGES_FILE, &self.languages),
            (WORDS_FILE, &self.words),
            (INFINITIVES_FILE, &self.infinitives),
            (VERB_FORMS_FILE, &self.verb_forms),
        ] {
            let mut writer = lock(writer, name)?;
            writer
                .flush()
                .with_context(|| format!("Failed to flush {}", name))?;
        }

        info!(
            languages = self.store.language_count(),
            words = self.store.word_count(),
            infinitives = self.store.infinitive_count(),
            verb_forms = self.store.verb_form_count(),
            "CSV output flushed"
        );
        Ok(())
    }

    fn write_word(&self, text: &str) -> Result<(String, Upsert<WordId>), SinkError> {
        let mut words = lock(&self.words, WORDS_FILE)?;
        let (key, row) = self.store.upsert_word(text)?;
        if row.created {
            let mut id_buf = itoa::Buffer::new();
            let id = id_buf.format(row.id);
            write_row(&mut words, WORDS_FILE, id, [id, key.as_str()])?;
        }
        Ok((key, row))
    }
}

impl StorageSink for CsvSink {
    fn insert_language(&self, language: &Language) -> Result<LanguageId, SinkError> {
        let mut languages = lock(&self.languages, LANGUAGES_FILE)?;
        let row = self.store.upsert_language(language);
        if row.created {
            let mut id_buf = itoa::Buffer::new();
            let id = id_buf.format(row.id);
            write_row(
                &mut languages,
                LANGUAGES_FILE,
                id,
                [id, language.name.as_str(), language.tag.as_str()],
            )?;
        }
        Ok(row.id)
    }

    fn insert_word(&self, text: &str) -> Result<WordId, SinkError> {
        Ok(self.write_word(text)?.1.id)
    }

    fn insert_infinitive(
        &self,
        word: &str,
        language_id: LanguageId,
    ) -> Result<InfinitiveId, SinkError> {
        let (_, word) = self.write_word(word)?;

        let mut infinitives = lock(&self.infinitives, INFINITIVES_FILE)?;
        let row = self.store.upsert_infinitive(word.id, language_id);
        if row.created {
            let mut id_buf = itoa::Buffer::new();
            let mut word_buf = itoa::Buffer::new();
            let mut lang_buf = itoa::Buffer::new();
            let id = id_buf.format(row.id);
            write_row(
                &mut infinitives,
                INFINITIVES_FILE,
                id,
                [id, word_buf.format(word.id), lang_buf.format(language_id)],
            )?;
        }
        Ok(row.id)
    }

    fn insert_verb_form(&self, form: &VerbForm) -> Result<bool, SinkError> {
        let mut verb_forms = lock(&self.verb_forms, VERB_FORMS_FILE)?;
        if !self.store.store_verb_form(form)? {
            return Ok(false);
        }

        let mut lang_buf = itoa::Buffer::new();
        let mut inf_buf = itoa::Buffer::new();
        let person = form.person.to_string();
        write_row(
            &mut verb_forms,
            VERB_FORMS_FILE,
            form.word.as_str(),
            [
                lang_buf.format(form.language_id),
                inf_buf.format(form.infinitive_id),
                form.word.as_str(),
                form.tense.as_str(),
                form.number.as_str(),
                person.as_str(),
            ],
        )?;
        Ok(true)
    }
}
