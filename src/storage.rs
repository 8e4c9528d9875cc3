//! Write-only storage boundary of the pipeline.
//!
//! Every insert is idempotent: inserting a language, word or infinitive that
//! already exists returns the existing id, and a verb form identical to a
//! stored one is accepted without creating a second row. Workers rely on this
//! when two of them race past the infinitive cache with the same verb.

use crate::models::{InfinitiveId, Language, LanguageId, VerbForm, WordId};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Cannot store an empty word")]
    EmptyWord,

    #[error("Invalid verb form for '{word}': {reason}")]
    InvalidForm { word: String, reason: &'static str },

    #[error("Output lock poisoned: {0}")]
    Poisoned(&'static str),
}

/// Destination for everything the pipeline extracts.
pub trait StorageSink: Send + Sync {
    fn insert_language(&self, language: &Language) -> Result<LanguageId, SinkError>;

    /// Words are identified by their case-normalized text.
    fn insert_word(&self, text: &str) -> Result<WordId, SinkError>;

    /// Creates the word if needed and the inflection table it heads.
    fn insert_infinitive(
        &self,
        word: &str,
        language_id: LanguageId,
    ) -> Result<InfinitiveId, SinkError>;

    /// Returns true if the form was not stored before.
    fn insert_verb_form(&self, form: &VerbForm) -> Result<bool, SinkError>;
}

/// Concurrent in-memory store.
///
/// Backs dry runs, assigns ids for the CSV output, and records every insert
/// call so tests can check what reached storage.
#[derive(Default)]
pub struct MemorySink {
    languages: DashMap<String, LanguageId>,
    words: DashMap<String, WordId>,
    infinitives: DashMap<(WordId, LanguageId), InfinitiveId>,
    verb_forms: DashSet<VerbForm>,

    next_language_id: AtomicU32,
    next_word_id: AtomicU32,
    next_infinitive_id: AtomicU32,

    infinitive_calls: AtomicU64,
    verb_form_calls: AtomicU64,
}

/// Id of a row and whether this call created it.
pub(crate) struct Upsert<T> {
    pub id: T,
    pub created: bool,
}

fn upsert<K>(map: &DashMap<K, u32>, key: K, counter: &AtomicU32) -> Upsert<u32>
where
    K: Eq + std::hash::Hash,
{
    match map.entry(key) {
        Entry::Occupied(e) => Upsert {
            id: *e.get(),
            created: false,
        },
        Entry::Vacant(e) => {
            let id = counter.fetch_add(1, Ordering::Relaxed) + 1;
            e.insert(id);
            Upsert { id, created: true }
        }
    }
}

pub fn normalize_word(text: &str) -> String {
    text.trim().to_lowercase()
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn upsert_language(&self, language: &Language) -> Upsert<LanguageId> {
        upsert(
            &self.languages,
            language.name.to_lowercase(),
            &self.next_language_id,
        )
    }

    pub(crate) fn upsert_word(&self, text: &str) -> Result<(String, Upsert<WordId>), SinkError> {
        let key = normalize_word(text);
        if key.is_empty() {
            return Err(SinkError::EmptyWord);
        }
        let row = upsert(&self.words, key.clone(), &self.next_word_id);
        Ok((key, row))
    }

    pub(crate) fn upsert_infinitive(
        &self,
        word_id: WordId,
        language_id: LanguageId,
    ) -> Upsert<InfinitiveId> {
        self.infinitive_calls.fetch_add(1, Ordering::Relaxed);
        upsert(
            &self.infinitives,
            (word_id, language_id),
            &self.next_infinitive_id,
        )
    }

    /// Returns true if the form was not stored before.
    pub(crate) fn store_verb_form(&self, form: &VerbForm) -> Result<bool, SinkError> {
        self.verb_form_calls.fetch_add(1, Ordering::Relaxed);
        if !form.is_valid() {
            let reason = if form.person.is_empty() {
                "singular form without a person"
            } else {
                "plural form with a person"
            };
            return Err(SinkError::InvalidForm {
                word: form.word.clone(),
                reason,
            });
        }
        if form.word.trim().is_empty() {
            return Err(SinkError::EmptyWord);
        }
        Ok(self.verb_forms.insert(form.clone()))
    }

    pub fn language_id(&self, name: &str) -> Option<LanguageId> {
        self.languages.get(&name.to_lowercase()).map(|id| *id)
    }

    pub fn word_id(&self, text: &str) -> Option<WordId> {
        self.words.get(&normalize_word(text)).map(|id| *id)
    }

    pub fn infinitive_id(&self, word: &str, language_id: LanguageId) -> Option<InfinitiveId> {
        let word_id = self.word_id(word)?;
        self.infinitives
            .get(&(word_id, language_id))
            .map(|id| *id)
    }

    /// Snapshot of the stored verb forms, in no particular order.
    pub fn verb_forms(&self) -> Vec<VerbForm> {
        self.verb_forms.iter().map(|f| f.key().clone()).collect()
    }

    pub fn language_count(&self) -> usize {
        self.languages.len()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn infinitive_count(&self) -> usize {
        self.infinitives.len()
    }

    pub fn verb_form_count(&self) -> usize {
        self.verb_forms.len()
    }

    /// Number of `insert_infinitive` calls, including ones that found an existing row.
    pub fn infinitive_calls(&self) -> u64 {
        self.infinitive_calls.load(Ordering::Relaxed)
    }

    /// Number of `insert_verb_form` calls, including duplicates and rejects.
    pub fn verb_form_calls(&self) -> u64 {
        self.verb_form_calls.load(Ordering::Relaxed)
    }
}

impl StorageSink for MemorySink {
    fn insert_language(&self, language: &Language) -> Result<LanguageId, SinkError> {
        Ok(self.upsert_language(language).id)
    }

    fn insert_word(&self, text: &str) -> Result<WordId, SinkError> {
        Ok(self.upsert_word(text)?.1.id)
    }

    fn insert_infinitive(
        &self,
        word: &str,
        language_id: LanguageId,
    ) -> Result<InfinitiveId, SinkError> {
        let (_, word) = self.upsert_word(word)?;
        Ok(self.upsert_infinitive(word.id, language_id).id)
    }

    fn insert_verb_form(&self, form: &VerbForm) -> Result<bool, SinkError> {
        self.store_verb_form(form)
    }
}
