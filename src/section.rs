//! Splits a page's wikitext into language sections and, within those, verb sections.
//!
//! A Wiktionary page describes one spelling in every language that uses it.
//! Each language starts with an H2 header:
//!
//! ```text
//! ==English==
//! ===Verb===
//! {{en-verb|lies|lying|lay|lain}}
//!
//! ==Dutch==
//! ===Verb===
//! {{nl-verb}}
//! ====Conjugation====
//! ```

use crate::config::VERB_HEADER_MARKER;
use memchr::memmem;
use once_cell::sync::Lazy;
use regex::Regex;

static LANGUAGE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^==([^=\n]+)==[ \t]*(?:\r?\n|\z)").unwrap());

static VERB_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^={3,}[ \t]*Verb[ \t]*={3,}[ \t]*\r?$").unwrap());

static ANY_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^={2,}[^=\n].*={2,}[ \t]*\r?$").unwrap());

/// The part of a page that describes the word in one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageSection<'a> {
    /// Header text as written, trimmed (`"Dutch"`)
    pub name: &'a str,
    /// Everything between this language header and the next one
    pub body: &'a str,
}

impl<'a> LanguageSection<'a> {
    /// Cheap test for a verb header; sections failing it are never looked up.
    pub fn has_verb(&self) -> bool {
        memmem::find(self.body.as_bytes(), VERB_HEADER_MARKER.as_bytes()).is_some()
    }

    /// Blocks of text that follow a verb header. Each ends at the next header
    /// of any depth or at the end of the language section.
    pub fn verb_sections(&self) -> Vec<&'a str> {
        verb_sections(self.body)
    }
}

/// Returns the language sections of `text` in page order. Text before the
/// first language header belongs to no language and is dropped.
pub fn language_sections(text: &str) -> Vec<LanguageSection<'_>> {
    let headers: Vec<_> = LANGUAGE_HEADER.captures_iter(text).collect();
    let mut sections = Vec::with_capacity(headers.len());

    for (i, caps) in headers.iter().enumerate() {
        let (Some(header), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());

        sections.push(LanguageSection {
            name: name.as_str().trim(),
            body: &text[header.end()..end],
        });
    }

    sections
}

/// Lower-cased lookup key for a language header name.
pub fn language_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn verb_sections(body: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut offset = 0;

    while let Some(header) = VERB_HEADER.find(&body[offset..]) {
        let start = offset + header.end();
        let rest = &body[start..];

        match ANY_HEADER.find(rest) {
            Some(next) => {
                sections.push(&rest[..next.start()]);
                offset = start + next.start();
            }
            None => {
                sections.push(rest);
                break;
            }
        }
    }

    sections
}
