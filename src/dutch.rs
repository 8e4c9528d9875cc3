use crate::cache::InfinitiveCache;
use crate::conjugator::{ConjugateError, Conjugator};
use crate::models::{InfinitiveId, Language, LanguageId, Number, Person, Tense, VerbForm};
use crate::storage::{SinkError, StorageSink};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::sync::Arc;
use tracing::trace;

/// `{{nl-verb}}`, optionally with principal parts: the page is an infinitive.
static INFINITIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{\{nl-verb(?:\|[^{}]*)?\}\}$").unwrap());

/// Section head of an inflected form; carries no grammar of its own.
static FORM_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\{\{(?:nl-verb[ -]form|head\|nl\|verb[ -]form)\}\}$").unwrap()
});

static FORM_OF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{\{[^|{}]*form of\|").unwrap());

/// `{{nl-verb form of|...|krijgen}}`: the last positional parameter.
static INFINITIVE_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|([^|={}]+)\}\}$").unwrap());

static MOOD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|m=([^|{}]*)").unwrap());
static TENSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|t=([^|{}]*)").unwrap());
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|n=([^|{}]*)").unwrap());
static PERSON: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|p=([^|{}]*)").unwrap());

/// Grammar encoded by a `form of` template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormTemplate<'a> {
    pub infinitive: &'a str,
    pub tense: Tense,
    pub number: Number,
    /// Empty for plural forms
    pub person: Person,
}

fn param<'a>(pattern: &Regex, template: &'a str) -> Option<&'a str> {
    pattern
        .captures(template)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|v| !v.is_empty())
}

/// The infinitive a `form of` template points back to.
pub fn infinitive_ref<'a>(word: &str, template: &'a str) -> Result<&'a str, ConjugateError> {
    let invalid = || ConjugateError::InvalidTemplate {
        word: word.to_string(),
        template: template.to_string(),
    };

    if !FORM_OF.is_match(template) {
        return Err(invalid());
    }
    param(&INFINITIVE_REF, template).ok_or_else(invalid)
}

/// Decodes a Dutch `form of` template without touching storage.
///
/// Only indicative forms are modeled; any other mood is refused. A singular
/// template that names no person applies to all three.
pub fn parse_form_template<'a>(
    word: &str,
    template: &'a str,
) -> Result<FormTemplate<'a>, ConjugateError> {
    let infinitive = infinitive_ref(word, template)?;

    if let Some(mood) = param(&MOOD, template) {
        if mood != "ind" {
            return Err(ConjugateError::UnsupportedMood {
                template: template.to_string(),
                mood: mood.to_string(),
            });
        }
    }

    let tense = match param(&TENSE, template) {
        Some("pres") | Some("present") => Tense::Present,
        Some("past") => Tense::Past,
        Some(value) => {
            return Err(ConjugateError::InvalidTense {
                template: template.to_string(),
                value: value.to_string(),
            })
        }
        None => return Err(ConjugateError::MissingTense(template.to_string())),
    };

    let number = match param(&NUMBER, template) {
        Some("sg") => Number::Singular,
        Some("pl") => Number::Plural,
        Some(value) => {
            return Err(ConjugateError::InvalidNumber {
                template: template.to_string(),
                value: value.to_string(),
            })
        }
        None => return Err(ConjugateError::MissingNumber(template.to_string())),
    };

    let person = match number {
        Number::Plural => Person::empty(),
        Number::Singular => match param(&PERSON, template) {
            None => Person::all(),
            Some(value) => {
                Person::from_digits(value).ok_or_else(|| ConjugateError::InvalidPerson {
                    template: template.to_string(),
                    value: value.to_string(),
                })?
            }
        },
    };

    Ok(FormTemplate {
        infinitive,
        tense,
        number,
        person,
    })
}

/// Conjugator for Dutch verbs.
pub struct Dutch {
    language: Language,
    sink: Arc<dyn StorageSink>,
    language_id: OnceCell<LanguageId>,
    tables: InfinitiveCache,
}

impl Dutch {
    pub fn new(sink: Arc<dyn StorageSink>) -> Self {
        Self {
            language: Language::new("Dutch", "nl", &["Nederlands", "Flemish"]),
            sink,
            language_id: OnceCell::new(),
            tables: InfinitiveCache::new(),
        }
    }

    fn language_id(&self) -> Result<LanguageId, SinkError> {
        self.language_id
            .get_or_try_init(|| self.sink.insert_language(&self.language))
            .copied()
    }

    /// The present plural of a Dutch verb is spelled like its infinitive, so
    /// every infinitive also fills that cell of its own table. Past plurals
    /// arrive as ordinary verb forms.
    fn add_infinitive(&self, word: &str) -> Result<usize, ConjugateError> {
        let language_id = self.language_id()?;
        let table = self
            .tables
            .get_or_insert(word, language_id, self.sink.as_ref())?;

        let created = self
            .sink
            .insert_verb_form(&VerbForm::plural(language_id, table, word, Tense::Present))?;
        Ok(usize::from(created))
    }

    fn add_form(
        &self,
        word: &str,
        language_id: LanguageId,
        table: InfinitiveId,
        form: FormTemplate<'_>,
    ) -> Result<usize, ConjugateError> {
        let verb_form = match form.number {
            Number::Plural => VerbForm::plural(language_id, table, word, form.tense),
            Number::Singular => {
                VerbForm::singular(language_id, table, word, form.tense, form.person)
            }
        };
        Ok(usize::from(self.sink.insert_verb_form(&verb_form)?))
    }
}

impl Conjugator for Dutch {
    fn language(&self) -> &Language {
        &self.language
    }

    fn conjugate(&self, word: &str, template: &str) -> Result<usize, ConjugateError> {
        let template = template.trim();

        if INFINITIVE.is_match(template) {
            trace!(word, "Dutch infinitive");
            return self.add_infinitive(word);
        }
        if FORM_HEADER.is_match(template) {
            return Ok(0);
        }

        // The referenced infinitive is registered even when the rest of the
        // template turns out to be unusable.
        let infinitive = infinitive_ref(word, template)?;
        let language_id = self.language_id()?;
        let table = self
            .tables
            .get_or_insert(infinitive, language_id, self.sink.as_ref())?;

        let form = parse_form_template(word, template)?;
        trace!(word, infinitive, "Dutch verb form");
        self.add_form(word, language_id, table, form)
    }
}
