use crate::config::{READ_BUFFER_SIZE, RESERVED_NAMESPACES};
use crate::models::Page;
use anyhow::{bail, Context, Result};
use bzip2::read::BzDecoder;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, trace};

/// Element whose character data is being collected.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Ns,
    Text,
}

/// Streams `<page>` elements out of a MediaWiki export one at a time.
///
/// Only the page being assembled is held in memory. Pages under a reserved
/// namespace (`User:`, `Template:`, ...) are dropped before they are yielded.
/// A malformed stream yields its error once and then ends the iteration.
pub struct WikiReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    finished: bool,
    skipped: u64,
    /// Elements opened and not yet closed, across pages
    depth: usize,
}

impl WikiReader<Box<dyn BufRead + Send>> {
    /// Opens a dump from disk. Files ending in `.bz2` are decompressed on the fly.
    pub fn open(path: &str) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open wiki dump: {}", path))?;

        let is_bz2 = Path::new(path)
            .extension()
            .map(|e| e == "bz2")
            .unwrap_or(false);

        let inner: Box<dyn BufRead + Send> = if is_bz2 {
            Box::new(BufReader::with_capacity(
                READ_BUFFER_SIZE,
                BzDecoder::new(file),
            ))
        } else {
            Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file))
        };

        debug!(path, compressed = is_bz2, "Opened wiki dump");
        Ok(Self::new(inner))
    }
}

impl<R: BufRead> WikiReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: Reader::from_reader(inner),
            buf: Vec::with_capacity(64 * 1024),
            finished: false,
            skipped: 0,
            depth: 0,
        }
    }

    /// Number of pages dropped so far because of their namespace.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn next_page(&mut self) -> Result<Option<Page>> {
        loop {
            match self.read_page()? {
                None => return Ok(None),
                Some(page) if is_reserved_title(&page.title) => {
                    trace!(title = %page.title, "Skipping reserved namespace page");
                    self.skipped += 1;
                }
                Some(page) => return Ok(Some(page)),
            }
        }
    }

    /// Reads up to and including the next `</page>`.
    fn read_page(&mut self) -> Result<Option<Page>> {
        let mut in_page = false;
        let mut revisions = 0u32;
        let mut field: Option<Field> = None;
        let mut value = String::new();

        let mut title: Option<String> = None;
        let mut ns: Option<i32> = None;
        let mut text: Option<String> = None;

        loop {
            self.buf.clear();
            let position = self.reader.buffer_position();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .with_context(|| format!("Malformed XML near byte {}", position))?;

            match event {
                Event::Start(ref e) => {
                    self.depth += 1;
                    match e.local_name().as_ref() {
                        b"page" => {
                            in_page = true;
                            revisions = 0;
                            title = None;
                            ns = None;
                            text = None;
                        }
                        b"revision" if in_page => revisions += 1,
                        b"title" if in_page && revisions == 0 => {
                            field = Some(Field::Title);
                            value.clear();
                        }
                        b"ns" if in_page && revisions == 0 => {
                            field = Some(Field::Ns);
                            value.clear();
                        }
                        // Full-history exports carry many revisions; keep the first.
                        b"text" if in_page && revisions == 1 => {
                            field = Some(Field::Text);
                            value.clear();
                        }
                        _ => {}
                    }
                }
                Event::Text(ref e) => {
                    if field.is_some() {
                        let unescaped = e
                            .unescape()
                            .with_context(|| format!("Invalid XML escape near byte {}", position))?;
                        value.push_str(&unescaped);
                    }
                }
                Event::CData(ref e) => {
                    if field.is_some() {
                        value.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Event::End(ref e) => {
                    self.depth = self.depth.saturating_sub(1);
                    let name = e.local_name();
                    match (field, name.as_ref()) {
                        (Some(Field::Title), b"title") => {
                            title = Some(std::mem::take(&mut value));
                            field = None;
                        }
                        (Some(Field::Ns), b"ns") => {
                            ns = value.trim().parse().ok();
                            field = None;
                        }
                        (Some(Field::Text), b"text") => {
                            text = Some(std::mem::take(&mut value));
                            field = None;
                        }
                        (_, b"page") if in_page => {
                            in_page = false;
                            match title.take() {
                                Some(title) => {
                                    return Ok(Some(Page {
                                        title,
                                        ns,
                                        text: text.take().unwrap_or_default(),
                                    }));
                                }
                                None => debug!("Skipping page without a title"),
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => {
                    if in_page {
                        bail!("Unexpected end of input inside <page>");
                    }
                    if self.depth > 0 {
                        bail!(
                            "Unexpected end of input: {} element(s) left open, dump is truncated",
                            self.depth
                        );
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for WikiReader<R> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_page() {
            Ok(Some(page)) => Some(Ok(page)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Returns true for titles such as `Template:nl-verb` whose prefix names a
/// namespace that never holds word entries.
pub fn is_reserved_title(title: &str) -> bool {
    match title.find(':') {
        Some(colon) => RESERVED_NAMESPACES.contains(&&title[..colon]),
        None => false,
    }
}
