//! Page metadata extraction.
//!
//! A tutorial opens with a paragraph of `key: value` lines right after its
//! heading:
//!
//! ```markdown
//! # 認識 Webduino
//!
//! title: 認識 Webduino
//! img: cover.png
//! folder: intro
//! src: intro.html
//! ```
//!
//! After rendering, the first `paragraphs` `<p>` elements of each fragment are
//! read and every line of their inner HTML is split on the first `": "`. The
//! value is everything after that separator, untouched: no trimming, no type
//! coercion, no validation. A line without the separator maps the whole line to
//! a field with no value, which later renders as `undefined`. When a key occurs
//! twice, the later line wins.
//!
//! The resulting [`Catalog`] is the only carrier of metadata between stages.
//! It is returned by [`extract_catalog`] and passed explicitly to the injector
//! and the index builder.

use crate::layout;
use crate::types::PageId;
use rayon::prelude::*;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Fragment listing failed: {0}")]
    Layout(#[from] layout::LayoutError),
}

/// Separator between key and value within a metadata line.
const SEPARATOR: &str = ": ";

/// Metadata of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub page: PageId,
    /// `None` marks a line that had no `": "` separator.
    pub fields: BTreeMap<String, Option<String>>,
}

impl MetadataRecord {
    /// Value of `key`, if present and not separator-less.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_deref())
    }
}

/// Split metadata lines into fields.
pub fn parse_metadata_lines(text: &str) -> BTreeMap<String, Option<String>> {
    text.split('\n')
        .map(|line| match line.split_once(SEPARATOR) {
            Some((key, value)) => (key.to_string(), Some(value.to_string())),
            None => (line.to_string(), None),
        })
        .collect()
}

/// Extract the metadata record of one fragment.
///
/// Returns `None` when the fragment has no `<p>` element.
pub fn extract_record(fragment: &str, page: PageId, paragraphs: usize) -> Option<MetadataRecord> {
    let document = Html::parse_fragment(fragment);
    let selector = Selector::parse("p").expect("static selector");

    let mut fields = BTreeMap::new();
    let mut found = false;
    for p in document.select(&selector).take(paragraphs) {
        found = true;
        fields.extend(parse_metadata_lines(&p.inner_html()));
    }
    found.then_some(MetadataRecord { page, fields })
}

/// All metadata records of one build, in page id order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub records: Vec<MetadataRecord>,
}

impl Catalog {
    pub fn find_by_page(&self, page: &PageId) -> Option<&MetadataRecord> {
        self.records.iter().find(|r| &r.page == page)
    }

    /// First record whose `title` field equals `title`.
    pub fn find_by_title(&self, title: &str) -> Option<&MetadataRecord> {
        self.records.iter().find(|r| r.get("title") == Some(title))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Extract records from every fragment under `fragments_dir`.
///
/// Fragments are parsed in parallel; the catalog is in sorted page id order
/// regardless of scheduling.
pub fn extract_catalog(fragments_dir: &Path, paragraphs: usize) -> Result<Catalog, MetadataError> {
    let ids = layout::html_ids(fragments_dir)?;
    let records = ids
        .into_par_iter()
        .map(|id| -> Result<Option<MetadataRecord>, MetadataError> {
            let html = fs::read_to_string(id.to_path(fragments_dir, "html"))?;
            Ok(extract_record(&html, id, paragraphs))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Catalog {
        records: records.into_iter().flatten().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(html: &str) -> MetadataRecord {
        extract_record(html, PageId::from("t"), 1).unwrap()
    }

    #[test]
    fn n_lines_give_n_fields() {
        let lines: Vec<String> = (0..5).map(|i| format!("k{i}: v{i}")).collect();
        let html = format!("<h1>T</h1>\n<p>{}</p>", lines.join("\n"));
        let rec = record(&html);
        assert_eq!(rec.fields.len(), 5);
        for i in 0..5 {
            assert_eq!(rec.get(&format!("k{i}")), Some(format!("v{i}").as_str()));
        }
    }

    #[test]
    fn tutorial_header_fields() {
        let rec = record(
            "<h1>Intro</h1>\n<p data-page-meta>title: Intro\nimg: cover.png\nfolder: intro\nsrc: intro.html</p>\n<p>Body</p>",
        );
        assert_eq!(rec.get("title"), Some("Intro"));
        assert_eq!(rec.get("img"), Some("cover.png"));
        assert_eq!(rec.get("folder"), Some("intro"));
        assert_eq!(rec.get("src"), Some("intro.html"));
        assert_eq!(rec.fields.len(), 4);
    }

    #[test]
    fn value_keeps_later_separators() {
        let rec = record("<p>link: http://a: b</p>");
        assert_eq!(rec.get("link"), Some("http://a: b"));
    }

    #[test]
    fn values_are_not_trimmed() {
        let rec = record("<p>title:  spaced </p>");
        assert_eq!(rec.get("title"), Some(" spaced "));
    }

    #[test]
    fn line_without_separator_has_no_value() {
        let rec = record("<p>just words\ntitle: T</p>");
        assert_eq!(rec.fields.get("just words"), Some(&None));
        assert_eq!(rec.get("just words"), None);
        assert_eq!(rec.get("title"), Some("T"));
    }

    #[test]
    fn duplicate_key_last_wins() {
        let rec = record("<p>title: one\ntitle: two</p>");
        assert_eq!(rec.get("title"), Some("two"));
        assert_eq!(rec.fields.len(), 1);
    }

    #[test]
    fn only_first_paragraph_by_default() {
        let rec = record("<p>a: 1</p><p>b: 2</p>");
        assert_eq!(rec.get("a"), Some("1"));
        assert_eq!(rec.get("b"), None);
    }

    #[test]
    fn multiple_paragraphs_merge() {
        let rec = extract_record("<p>a: 1</p><hr><p>b: 2</p><p>c: 3</p>", PageId::from("t"), 2).unwrap();
        assert_eq!(rec.get("a"), Some("1"));
        assert_eq!(rec.get("b"), Some("2"));
        assert_eq!(rec.get("c"), None);
    }

    #[test]
    fn fragment_without_paragraph_has_no_record() {
        assert!(extract_record("<h1>Only</h1>", PageId::from("t"), 1).is_none());
    }

    #[test]
    fn inline_markup_is_kept_as_html() {
        let rec = record("<p>title: <em>Hi</em></p>");
        assert_eq!(rec.get("title"), Some("<em>Hi</em>"));
    }

    #[test]
    fn catalog_lookups() {
        let catalog = Catalog {
            records: vec![
                extract_record("<p>title: Same</p>", PageId::from("a"), 1).unwrap(),
                extract_record("<p>title: Same\nimg: 2.png</p>", PageId::from("b"), 1).unwrap(),
            ],
        };
        assert_eq!(catalog.find_by_page(&PageId::from("b")).unwrap().get("img"), Some("2.png"));
        // Title join takes the first match
        assert_eq!(catalog.find_by_title("Same").unwrap().page, PageId::from("a"));
        assert!(catalog.find_by_title("Other").is_none());
        assert!(catalog.find_by_page(&PageId::from("c")).is_none());
    }

    #[test]
    fn extract_catalog_is_sorted_by_page() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("b")).unwrap();
        fs::write(tmp.path().join("b/z.html"), "<p>title: Z</p>").unwrap();
        fs::write(tmp.path().join("a.html"), "<p>title: A</p>").unwrap();
        fs::write(tmp.path().join("empty.html"), "<h1>none</h1>").unwrap();

        let catalog = extract_catalog(tmp.path(), 1).unwrap();
        let pages: Vec<&str> = catalog.records.iter().map(|r| r.page.as_str()).collect();
        assert_eq!(pages, vec!["a", "b/z"]);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn extract_catalog_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let catalog = extract_catalog(&tmp.path().join("nope"), 1).unwrap();
        assert!(catalog.is_empty());
    }
}
