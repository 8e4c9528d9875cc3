use bitflags::bitflags;
use serde::Serialize;
use std::fmt;

pub type LanguageId = u32;
pub type WordId = u32;
pub type InfinitiveId = u32;

/// One `<page>` of a Wiktionary export: the word under discussion and the
/// wikitext of its most recent revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub ns: Option<i32>,
    pub text: String,
}

impl Page {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ns: None,
            text: text.into(),
        }
    }
}

/// A natural language a conjugator understands.
///
/// Markup refers to the same language by several names ("Dutch",
/// "Nederlands", "Flemish"); every alias resolves to the same conjugator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Language {
    pub name: String,
    pub tag: String,
    pub aliases: Vec<String>,
}

impl Language {
    /// Creates a language whose aliases always include its own name.
    /// Aliases are stored lower-cased, the way section headers are looked up.
    pub fn new(name: &str, tag: &str, aliases: &[&str]) -> Self {
        let mut all: Vec<String> = Vec::with_capacity(aliases.len() + 1);
        for alias in std::iter::once(&name).chain(aliases.iter()) {
            let alias = alias.trim().to_lowercase();
            if !alias.is_empty() && !all.contains(&alias) {
                all.push(alias);
            }
        }
        Self {
            name: name.to_string(),
            tag: tag.to_string(),
            aliases: all,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.aliases.iter().any(|a| *a == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tense {
    Present,
    Past,
}

impl Tense {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tense::Present => "present",
            Tense::Past => "past",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Number {
    Singular,
    Plural,
}

impl Number {
    pub fn as_str(&self) -> &'static str {
        match self {
            Number::Singular => "singular",
            Number::Plural => "plural",
        }
    }
}

bitflags! {
    /// Grammatical persons a verb form is valid for.
    ///
    /// A singular form may cover several persons at once; templates that
    /// name no person cover all three.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct Person: u8 {
        const FIRST = 0b001;
        const SECOND = 0b010;
        const THIRD = 0b100;
    }
}

impl Person {
    /// Parses a run of person digits such as `1`, `3` or `13`.
    pub fn from_digits(digits: &str) -> Option<Self> {
        let mut person = Person::empty();
        for c in digits.chars() {
            person |= match c {
                '1' => Person::FIRST,
                '2' => Person::SECOND,
                '3' => Person::THIRD,
                _ => return None,
            };
        }
        if person.is_empty() {
            None
        } else {
            Some(person)
        }
    }
}

impl fmt::Display for Person {
    /// Renders the set as its digits, e.g. `123` for all persons.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.contains(Person::FIRST) {
            f.write_str("1")?;
        }
        if self.contains(Person::SECOND) {
            f.write_str("2")?;
        }
        if self.contains(Person::THIRD) {
            f.write_str("3")?;
        }
        Ok(())
    }
}

/// A finite form of a verb, attached to the inflection table of its infinitive.
///
/// Plural forms carry no person; singular forms carry at least one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VerbForm {
    pub language_id: LanguageId,
    pub infinitive_id: InfinitiveId,
    pub word: String,
    pub tense: Tense,
    pub number: Number,
    pub person: Person,
}

impl VerbForm {
    pub fn plural(
        language_id: LanguageId,
        infinitive_id: InfinitiveId,
        word: &str,
        tense: Tense,
    ) -> Self {
        Self {
            language_id,
            infinitive_id,
            word: word.to_string(),
            tense,
            number: Number::Plural,
            person: Person::empty(),
        }
    }

    pub fn singular(
        language_id: LanguageId,
        infinitive_id: InfinitiveId,
        word: &str,
        tense: Tense,
        person: Person,
    ) -> Self {
        Self {
            language_id,
            infinitive_id,
            word: word.to_string(),
            tense,
            number: Number::Singular,
            person,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self.number {
            Number::Plural => self.person.is_empty(),
            Number::Singular => !self.person.is_empty(),
        }
    }
}
