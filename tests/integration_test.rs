//! Integration tests for the Anvil conjugation extraction pipeline.
//!
//! These tests drive the complete data flow from a plain or BZ2-compressed
//! XML dump through the worker pool and into storage:
//!
//! - **Parser Tests** -- BZ2 decompression, plain XML, namespace filtering
//! - **Conjugation Tests** -- Infinitive and verb form templates end to end
//! - **Concurrency Tests** -- Large page counts through a small bounded queue
//! - **Output Tests** -- CSV files, `summary.json`, dry runs, page limits
//!
//! # Test Strategy
//!
//! Most tests share the `sample_xml()` fixture, a minimal Wiktionary dump with
//! one infinitive entry, one inflected entry, a noun, a template page and a
//! multi-language page. In-memory runs use `MemorySink` so every insert can be
//! inspected; file runs go through `run_extraction` into a `TempDir`.

use anvil::dispatch::DispatcherConfig;
use anvil::extract::{extract_pages, run_extraction, ExtractConfig, SUMMARY_FILE};
use anvil::models::{Number, Page, Person, Tense};
use anvil::parser::WikiReader;
use anvil::registry::ConjugatorRegistry;
use anvil::storage::MemorySink;
use anvil::worker::PageWorker;
use anvil::stats::ExtractionStats;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use rustc_hash::FxHashSet;
use std::fs;
use std::io::Write;
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};

/// Helper: create a BZ2-compressed XML file from a string.
///
/// The file name ends in `.xml.bz2` so the reader picks the decompressor.
fn create_bz2_xml(xml: &str) -> NamedTempFile {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(xml.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    let mut tmp = tempfile::Builder::new()
        .suffix(".xml.bz2")
        .tempfile()
        .unwrap();
    tmp.write_all(&compressed).unwrap();
    tmp.flush().unwrap();
    tmp
}

fn create_plain_xml(xml: &str) -> NamedTempFile {
    let mut tmp = tempfile::Builder::new().suffix(".xml").tempfile().unwrap();
    tmp.write_all(xml.as_bytes()).unwrap();
    tmp.flush().unwrap();
    tmp
}

/// Sample Wiktionary XML with an infinitive, an inflected form with several
/// meanings, a noun, a reserved namespace page and a multi-language page.
fn sample_xml() -> &'static str {
    r#"<mediawiki>
        <page>
            <title>krijgen</title>
            <ns>0</ns>
            <id>1</id>
            <revision>
                <id>100</id>
                <text>==English==
===Verb===
{{en-verb}}
# (dialectal) to get

==Dutch==
===Pronunciation===
* {{IPA|nl|/ˈkrɛi̯ɣə(n)/}}

===Verb===
{{nl-verb|kreeg|gekregen}}
# to get, to receive

====Conjugation====
{{nl-conj-st|krijg|kreeg|gekregen}}</text>
            </revision>
        </page>
        <page>
            <title>krijg</title>
            <ns>0</ns>
            <id>2</id>
            <revision>
                <id>101</id>
                <text>==Dutch==
===Verb===
{{nl-verb form}}
# {{nl-verb form of|p=1|n=sg|t=pres|m=ind|krijgen}}
# {{nl-verb form of|n=sg|t=pres|m=imp|krijgen}}</text>
            </revision>
        </page>
        <page>
            <title>boek</title>
            <ns>0</ns>
            <id>3</id>
            <revision>
                <id>102</id>
                <text>==Dutch==
===Noun===
{{nl-noun|n|boeken|boekje}}</text>
            </revision>
        </page>
        <page>
            <title>Template:nl-verb</title>
            <ns>10</ns>
            <id>4</id>
            <revision>
                <id>103</id>
                <text>==Dutch==
===Verb===
{{nl-verb}}</text>
            </revision>
        </page>
        <page>
            <title>kreeg</title>
            <ns>0</ns>
            <id>5</id>
            <revision>
                <id>104</id>
                <text>==Dutch==
===Verb===
{{nl-verb form}}
# {{nl-verb form of|n=sg|t=past|m=ind|krijgen}}

==Afrikaans==
===Verb===
{{af-verb form}}</text>
            </revision>
        </page>
    </mediawiki>"#
}

fn config(workers: usize, queue_capacity: usize) -> DispatcherConfig {
    DispatcherConfig {
        workers,
        queue_capacity,
        page_limit: None,
    }
}

fn run_in_memory(xml: &str) -> (Arc<MemorySink>, Arc<ExtractionStats>) {
    let sink = Arc::new(MemorySink::new());
    let registry = Arc::new(ConjugatorRegistry::with_defaults(sink.clone()));
    let reader = WikiReader::new(xml.as_bytes());
    let stats = extract_pages(reader, registry, sink.clone(), &config(2, 2)).unwrap();
    (sink, stats)
}

fn page_xml(title: &str, text: &str) -> String {
    format!(
        "<mediawiki><page><title>{}</title><ns>0</ns><revision><text>{}</text></revision></page></mediawiki>",
        title, text
    )
}

// ---------------------------------------------------------------------------
// Parser Tests
// ---------------------------------------------------------------------------

#[test]
fn parser_reads_bz2_dump() {
    let tmp = create_bz2_xml(sample_xml());
    let mut reader = WikiReader::open(tmp.path().to_str().unwrap()).unwrap();
    let titles: Vec<String> = reader.by_ref().map(|p| p.unwrap().title).collect();

    assert_eq!(titles, vec!["krijgen", "krijg", "boek", "kreeg"]);
    assert_eq!(reader.skipped(), 1);
}

#[test]
fn parser_reads_plain_dump() {
    let tmp = create_plain_xml(sample_xml());
    let pages: Vec<Page> = WikiReader::open(tmp.path().to_str().unwrap())
        .unwrap()
        .map(|p| p.unwrap())
        .collect();

    assert_eq!(pages.len(), 4);
    assert_eq!(pages[0].ns, Some(0));
    assert!(pages[0].text.contains("{{nl-verb|kreeg|gekregen}}"));
}

#[test]
fn parser_reports_missing_file() {
    assert!(WikiReader::open("/nonexistent/dump.xml.bz2").is_err());
}

// ---------------------------------------------------------------------------
// Conjugation Tests
// ---------------------------------------------------------------------------

#[test]
fn infinitive_page_stores_present_plural() {
    let xml = page_xml(
        "krijgen",
        "==English==\n===Verb===\n{{en-verb}}\n\n==Dutch==\n===Verb===\n{{nl-verb}}\n# to get",
    );
    let (sink, stats) = run_in_memory(&xml);

    assert_eq!(sink.infinitive_calls(), 1);
    assert_eq!(sink.infinitive_count(), 1);

    let forms = sink.verb_forms();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].word, "krijgen");
    assert_eq!(forms[0].tense, Tense::Present);
    assert_eq!(forms[0].number, Number::Plural);

    let lang = sink.language_id("Dutch").unwrap();
    assert_eq!(forms[0].infinitive_id, sink.infinitive_id("krijgen", lang).unwrap());
    assert_eq!(stats.summary().unknown_languages, 1);
}

#[test]
fn first_person_singular_form() {
    let xml = page_xml(
        "krijg",
        "==Dutch==\n===Verb===\n{{nl-verb form}}\n# {{nl-verb form of|p=1|n=sg|t=pres|m=ind|krijgen}}",
    );
    let (sink, _) = run_in_memory(&xml);

    let forms = sink.verb_forms();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].word, "krijg");
    assert_eq!(forms[0].tense, Tense::Present);
    assert_eq!(forms[0].number, Number::Singular);
    assert_eq!(forms[0].person, Person::FIRST);
}

#[test]
fn imperative_mood_is_skipped() {
    let xml = page_xml(
        "krijgt",
        "==Dutch==\n===Verb===\n{{nl-verb form}}\n# {{nl-verb form of|n=pl|m=imp|krijgen}}",
    );
    let (sink, stats) = run_in_memory(&xml);

    assert_eq!(sink.verb_form_count(), 0);
    assert_eq!(sink.verb_form_calls(), 0);
    assert_eq!(stats.processed(), 1);
    assert_eq!(stats.summary().templates_skipped, 1);
}

#[test]
fn sample_dump_end_to_end() {
    let (sink, stats) = run_in_memory(sample_xml());
    let summary = stats.summary();

    assert_eq!(summary.pages_processed, 4);
    // English and Afrikaans verb sections have no conjugator.
    assert_eq!(summary.unknown_languages, 2);
    assert_eq!(summary.templates_skipped, 1);
    assert_eq!(summary.template_failures, 0);

    assert_eq!(sink.language_count(), 1);
    assert_eq!(sink.infinitive_count(), 1);
    // krijgen (present plural), krijg (1st sg present), kreeg (123 sg past)
    assert_eq!(sink.verb_form_count(), 3);

    let past = sink
        .verb_forms()
        .into_iter()
        .find(|f| f.word == "kreeg")
        .unwrap();
    assert_eq!(past.tense, Tense::Past);
    assert_eq!(past.person, Person::all());

    assert!(sink.word_id("boek").is_none());
}

// ---------------------------------------------------------------------------
// Concurrency Tests
// ---------------------------------------------------------------------------

fn synthetic_pages(n: usize) -> Vec<Page> {
    (0..n)
        .map(|i| {
            let stem = format!("werk{}", i / 3);
            match i % 3 {
                0 => Page::new(
                    format!("{stem}en"),
                    "==Dutch==\n===Verb===\n{{nl-verb}}\n# to do".to_string(),
                ),
                1 => Page::new(
                    stem.clone(),
                    format!(
                        "==Dutch==\n===Verb===\n{{{{nl-verb form}}}}\n\
                         # {{{{nl-verb form of|p=1|n=sg|t=pres|m=ind|{stem}en}}}}\n\
                         # {{{{nl-verb form of|n=sg|t=pres|m=imp|{stem}en}}}}"
                    ),
                ),
                _ => Page::new(
                    format!("{stem}te"),
                    format!(
                        "==English==\n===Noun===\nnothing\n\n==Dutch==\n===Verb===\n{{{{nl-verb form}}}}\n\
                         # {{{{nl-verb form of|n=sg|t=past|m=ind|{stem}en}}}}"
                    ),
                ),
            }
        })
        .collect()
}

type FormKey = (String, Tense, Number, u8);

fn form_keys(sink: &MemorySink) -> FxHashSet<FormKey> {
    sink.verb_forms()
        .into_iter()
        .map(|f| (f.word, f.tense, f.number, f.person.bits()))
        .collect()
}

#[test]
fn ten_thousand_pages_match_serial_baseline() {
    let pages = synthetic_pages(10_000);

    let serial_sink = Arc::new(MemorySink::new());
    let serial_registry = Arc::new(ConjugatorRegistry::with_defaults(serial_sink.clone()));
    let serial = PageWorker::new(
        serial_registry,
        serial_sink.clone(),
        Arc::new(ExtractionStats::new()),
    );
    for page in &pages {
        serial.process(page);
    }

    let sink = Arc::new(MemorySink::new());
    let registry = Arc::new(ConjugatorRegistry::with_defaults(sink.clone()));
    let stats = extract_pages(
        pages.into_iter().map(Ok),
        registry,
        sink.clone(),
        &config(8, 100),
    )
    .unwrap();

    assert_eq!(stats.submitted(), 10_000);
    assert_eq!(stats.processed(), 10_000);
    assert_eq!(sink.verb_form_count(), serial_sink.verb_form_count());
    assert_eq!(sink.infinitive_count(), serial_sink.infinitive_count());
    assert_eq!(sink.word_count(), serial_sink.word_count());
    assert_eq!(form_keys(&sink), form_keys(&serial_sink));
    assert_eq!(sink.language_count(), 1);
}

// ---------------------------------------------------------------------------
// Output Tests
// ---------------------------------------------------------------------------

fn extract_config(input: &NamedTempFile, output: &TempDir, dry_run: bool) -> ExtractConfig {
    ExtractConfig {
        input: input.path().to_str().unwrap().to_string(),
        output_dir: output.path().to_str().unwrap().to_string(),
        dispatcher: config(4, 8),
        dry_run,
    }
}

#[test]
fn extraction_produces_csv_files() {
    let tmp = create_bz2_xml(sample_xml());
    let output_dir = TempDir::new().unwrap();

    let summary = run_extraction(&extract_config(&tmp, &output_dir, false)).unwrap();
    assert_eq!(summary.stats.pages_processed, 4);
    assert_eq!(summary.skipped_pages, 1);
    assert_eq!(summary.verb_forms, 3);

    for name in [
        "languages.csv",
        "words.csv",
        "infinitives.csv",
        "verb_forms.csv",
        SUMMARY_FILE,
    ] {
        assert!(output_dir.path().join(name).exists(), "{name} missing");
    }

    let languages = fs::read_to_string(output_dir.path().join("languages.csv")).unwrap();
    assert_eq!(languages, "id,name,tag\n1,Dutch,nl\n");

    let mut reader = csv::Reader::from_path(output_dir.path().join("verb_forms.csv")).unwrap();
    let mut rows: Vec<(String, String, String, String)> = reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            (r[2].to_string(), r[3].to_string(), r[4].to_string(), r[5].to_string())
        })
        .collect();
    rows.sort();
    assert_eq!(
        rows,
        vec![
            ("kreeg".into(), "past".into(), "singular".into(), "123".into()),
            ("krijg".into(), "present".into(), "singular".into(), "1".into()),
            ("krijgen".into(), "present".into(), "plural".into(), "".into()),
        ]
    );

    let infinitives = fs::read_to_string(output_dir.path().join("infinitives.csv")).unwrap();
    assert_eq!(infinitives.lines().count(), 2);
}

#[test]
fn summary_json_matches_run() {
    let tmp = create_bz2_xml(sample_xml());
    let output_dir = TempDir::new().unwrap();
    run_extraction(&extract_config(&tmp, &output_dir, false)).unwrap();

    let json = fs::read_to_string(output_dir.path().join(SUMMARY_FILE)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["verb_forms"], 3);
    assert_eq!(value["stats"]["pages_processed"], 4);
    assert_eq!(value["dry_run"], false);
}

#[test]
fn extraction_dry_run_writes_no_files() {
    let tmp = create_bz2_xml(sample_xml());
    let output_dir = TempDir::new().unwrap();

    let summary = run_extraction(&extract_config(&tmp, &output_dir, true)).unwrap();

    assert_eq!(summary.verb_forms, 3);
    assert_eq!(fs::read_dir(output_dir.path()).unwrap().count(), 0);
}

#[test]
fn extraction_respects_limit() {
    let tmp = create_bz2_xml(sample_xml());
    let output_dir = TempDir::new().unwrap();
    let mut config = extract_config(&tmp, &output_dir, true);
    config.dispatcher.page_limit = Some(1);

    let summary = run_extraction(&config).unwrap();

    assert_eq!(summary.stats.pages_submitted, 1);
    assert_eq!(summary.stats.pages_processed, 1);
    assert_eq!(summary.verb_forms, 1);
}

#[test]
fn malformed_dump_fails_after_draining() {
    let xml = "<mediawiki>\
               <page><title>krijgen</title><revision><text>==Dutch==\n===Verb===\n{{nl-verb}}</text></revision></page>\
               <page><title>krijg</title><revision><text>broken</revision></page>\
               </mediawiki>";
    let sink = Arc::new(MemorySink::new());
    let registry = Arc::new(ConjugatorRegistry::with_defaults(sink.clone()));

    let err = extract_pages(
        WikiReader::new(xml.as_bytes()),
        registry,
        sink.clone(),
        &config(2, 1),
    )
    .unwrap_err();

    assert!(format!("{:#}", err).contains("Malformed XML"));
    assert_eq!(sink.verb_form_count(), 1);
}

#[test]
fn invalid_dispatcher_config_is_rejected() {
    let tmp = create_bz2_xml(sample_xml());
    let output_dir = TempDir::new().unwrap();
    let mut config = extract_config(&tmp, &output_dir, false);
    config.dispatcher.workers = 0;

    assert!(run_extraction(&config).is_err());
    assert!(!output_dir.path().join("verb_forms.csv").exists());
}
