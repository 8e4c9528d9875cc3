use crate::models::{InfinitiveId, LanguageId};
use crate::storage::{SinkError, StorageSink};
use rustc_hash::FxHashMap;
use std::sync::RwLock;
use tracing::{trace, warn};

/// Infinitive text to inflection table id, shared by every worker that
/// conjugates one language.
///
/// Lookups take the read lock. A miss releases it, inserts the infinitive
/// through the sink, then takes the write lock to record the id. Two workers
/// may miss on the same infinitive at once and both insert it; the sink's
/// insert is idempotent, so both receive the same id and no row is duplicated.
#[derive(Default)]
pub struct InfinitiveCache {
    ids: RwLock<FxHashMap<String, InfinitiveId>>,
}

impl InfinitiveCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, infinitive: &str) -> Option<InfinitiveId> {
        match self.ids.read() {
            Ok(ids) => ids.get(infinitive).copied(),
            Err(poisoned) => poisoned.into_inner().get(infinitive).copied(),
        }
    }

    pub fn insert(&self, infinitive: &str, id: InfinitiveId) {
        let mut ids = match self.ids.write() {
            Ok(ids) => ids,
            Err(poisoned) => {
                warn!("Infinitive cache lock poisoned, continuing with its contents");
                poisoned.into_inner()
            }
        };
        ids.insert(infinitive.to_string(), id);
    }

    /// Returns the cached id for `infinitive`, inserting it into `sink` on a miss.
    pub fn get_or_insert(
        &self,
        infinitive: &str,
        language_id: LanguageId,
        sink: &dyn StorageSink,
    ) -> Result<InfinitiveId, SinkError> {
        if let Some(id) = self.get(infinitive) {
            return Ok(id);
        }

        trace!(infinitive, "Infinitive cache miss");
        let id = sink.insert_infinitive(infinitive, language_id)?;
        self.insert(infinitive, id);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        match self.ids.read() {
            Ok(ids) => ids.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
