//! Anvil: verb conjugation extraction from Wiktionary dumps
//!
//! This crate streams a Wiktionary XML export and turns the verb templates
//! found in each entry into inflection records (infinitives and their
//! conjugated forms), written out as CSV.
//!
//! 1. **Reading** -- Stream `<page>` elements out of a plain or BZ2-compressed
//!    dump, dropping pages in namespaces that never define words
//! 2. **Dispatch** -- Push pages through a bounded queue to a fixed pool of
//!    worker threads; a full queue blocks the reader
//! 3. **Segmentation** -- Split each page into language sections, keep those
//!    with a verb header, and pull the verb templates out of each verb section
//! 4. **Conjugation** -- Hand each template to the conjugator registered for
//!    the section's language, which records infinitives and verb forms
//!
//! # Architecture
//!
//! - **Streaming XML parsing** -- Never loads the full dump into memory
//! - **Back-pressure** -- A bounded crossbeam channel between reader and workers
//! - **Idempotent storage** -- Every insert returns the existing id when the
//!   row is already there, so concurrent workers never duplicate a record
//! - **Shared infinitive cache** -- Read-mostly `RwLock` map per conjugator
//! - **Atomic operations** -- Lock-free counters for extraction statistics
//!
//! # Key Modules
//!
//! - [`parser`] -- Streaming XML reader with BZ2 decompression
//! - [`dispatch`] -- Bounded queue and worker pool
//! - [`worker`] -- Per-page segmentation and conjugation
//! - [`section`] -- Language and verb section splitting
//! - [`template`] -- Verb template extraction
//! - [`conjugator`] -- Conjugator trait and its error type
//! - [`registry`] -- Language name to conjugator lookup
//! - [`dutch`] -- Dutch conjugator
//! - [`cache`] -- Infinitive id cache
//! - [`storage`] -- Storage trait and the in-memory store
//! - [`output`] -- CSV storage
//! - [`extract`] -- Extraction run orchestration
//! - [`view`] -- Single page lookup for debugging templates
//! - [`models`] -- Core data types (Page, Language, VerbForm)
//! - [`stats`] -- Thread-safe atomic counters for extraction metrics
//! - [`config`] -- Constants
//!
//! # Example Usage
//!
//! ```bash
//! # Extract Dutch verbs with 8 workers
//! anvil -v extract -i enwiktionary-latest-pages-articles.xml.bz2 -o output/ --workers 8
//!
//! # Print the raw wikitext of one entry
//! anvil view -i enwiktionary-latest-pages-articles.xml.bz2 krijgen
//! ```

pub mod cache;
pub mod config;
pub mod conjugator;
pub mod dispatch;
pub mod dutch;
pub mod extract;
pub mod models;
pub mod output;
pub mod parser;
pub mod registry;
pub mod section;
pub mod stats;
pub mod storage;
pub mod template;
pub mod view;
pub mod worker;
