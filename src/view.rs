use crate::models::Page;
use crate::parser::WikiReader;
use anyhow::{Context, Result};
use std::io::BufRead;
use tracing::debug;

/// Scans the dump at `input` for the first page titled exactly `title`.
pub fn find_page(input: &str, title: &str) -> Result<Option<Page>> {
    let reader = WikiReader::open(input)
        .with_context(|| format!("Failed to open wiki dump at: {}", input))?;
    find_in(reader, title)
}

/// Like [`find_page`] over any page stream; stops reading at the first match.
pub fn find_in<R: BufRead>(reader: WikiReader<R>, title: &str) -> Result<Option<Page>> {
    let mut scanned = 0u64;
    for page in reader {
        let page = page?;
        scanned += 1;
        if page.title == title {
            debug!(title, scanned, "Found page");
            return Ok(Some(page));
        }
    }
    debug!(title, scanned, "Page not found");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"<mediawiki>
  <page><title>lopen</title><ns>0</ns><revision><text>==Dutch==</text></revision></page>
  <page><title>krijgen</title><ns>0</ns><revision><text>first</text></revision></page>
  <page><title>krijgen</title><ns>0</ns><revision><text>second</text></revision></page>
</mediawiki>"#;

    #[test]
    fn returns_first_match() {
        let reader = WikiReader::new(DUMP.as_bytes());
        let page = find_in(reader, "krijgen").unwrap().unwrap();
        assert_eq!(page.text, "first");
    }

    #[test]
    fn missing_title() {
        let reader = WikiReader::new(DUMP.as_bytes());
        assert!(find_in(reader, "Krijgen").unwrap().is_none());
    }
}
