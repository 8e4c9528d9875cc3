use crate::conjugator::Conjugator;
use crate::dutch::Dutch;
use crate::models::Language;
use crate::section::language_key;
use crate::storage::StorageSink;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Language alias '{alias}' is already handled by {existing}")]
    DuplicateLanguage { alias: String, existing: String },
}

/// Maps the language names found in section headers to conjugators.
///
/// Filled once before any page is dispatched and only read afterwards, so
/// workers share it behind an `Arc` without locking.
#[derive(Default)]
pub struct ConjugatorRegistry {
    conjugators: Vec<Arc<dyn Conjugator>>,
    by_alias: FxHashMap<String, usize>,
}

impl ConjugatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every conjugator this crate ships, writing to `sink`.
    pub fn with_defaults(sink: Arc<dyn StorageSink>) -> Self {
        let mut registry = Self::new();
        registry.conjugators.push(Arc::new(Dutch::new(sink)));
        registry.index_last();
        registry
    }

    pub fn register(&mut self, conjugator: Arc<dyn Conjugator>) -> Result<(), RegistryError> {
        for alias in &conjugator.language().aliases {
            if let Some(&idx) = self.by_alias.get(alias) {
                return Err(RegistryError::DuplicateLanguage {
                    alias: alias.clone(),
                    existing: self.conjugators[idx].language().name.clone(),
                });
            }
        }
        self.conjugators.push(conjugator);
        self.index_last();
        Ok(())
    }

    fn index_last(&mut self) {
        let idx = self.conjugators.len() - 1;
        for alias in &self.conjugators[idx].language().aliases {
            self.by_alias.insert(alias.clone(), idx);
        }
    }

    /// Finds the conjugator for a section header name, ignoring case.
    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn Conjugator>> {
        self.by_alias
            .get(&language_key(name))
            .map(|&idx| &self.conjugators[idx])
    }

    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        self.conjugators.iter().map(|c| c.language())
    }

    pub fn len(&self) -> usize {
        self.conjugators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conjugators.is_empty()
    }
}
