//! Open Graph and `<title>` injection for published pages.
//!
//! Each laid-out page is read, matched with its [`MetadataRecord`], and
//! rewritten with lol_html:
//!
//! | element                                     | new content                                   |
//! |---------------------------------------------|-----------------------------------------------|
//! | `<title>`                                   | inner HTML of the page's first `<h1>`         |
//! | `meta[property=og:title]`                   | same                                          |
//! | `meta[property=og:description]`, `meta[itemprop=description]`, `meta[name=description]` | first unmarked `<p>` |
//! | `meta[property=og:image]`, `meta[itemprop=image]` | `{base_url}img/{folder}/{img}`          |
//! | `meta[property=og:url]`                     | `{base_url}tutorials/{folder}/{src}`          |
//!
//! The description is the first paragraph of tutorial text: paragraphs marked
//! as the metadata block are skipped, so the `key: value` lines never end up in
//! `og:description`, whether or not `strip` is enabled.
//!
//! A missing record or field shows up as the literal `undefined` in the
//! constructed URLs. With `strip` enabled the metadata block marked by the
//! renderer is removed from the page; a page without that marker is an error.

use crate::config::{JoinKey, SiteConfig};
use crate::layout;
use crate::metadata::{Catalog, MetadataRecord};
use crate::render::META_MARKER;
use crate::types::{PageId, Stage, StageReport};
use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, element};
use rayon::prelude::*;
use scraper::{Html, Selector};
use std::cell::Cell;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTML rewriting failed: {0}")]
    Rewrite(#[from] lol_html::errors::RewritingError),
    #[error("Page listing failed: {0}")]
    Layout(#[from] layout::LayoutError),
    #[error("{0}: no data-page-meta block to strip")]
    MissingMetaMarker(String),
}

/// Placeholder for values that could not be resolved.
pub const UNDEFINED: &str = "undefined";

const IMAGE_DIR: &str = "img/";
const PAGE_DIR: &str = "tutorials/";

/// Injection parameters taken from the site config.
#[derive(Debug, Clone, Copy)]
pub struct InjectSettings<'a> {
    pub base_url: &'a str,
    pub join: JoinKey,
    pub strip: bool,
}

impl<'a> InjectSettings<'a> {
    pub fn from_config(config: &'a SiteConfig) -> Self {
        Self {
            base_url: &config.base_url,
            join: config.metadata.join,
            strip: config.metadata.strip,
        }
    }
}

/// Values read from the page itself.
#[derive(Debug, Default, PartialEq, Eq)]
struct PageText {
    title: String,
    description: String,
}

fn read_page_text(html: &str) -> PageText {
    let document = Html::parse_document(html);
    let h1 = Selector::parse("h1").expect("static selector");
    let description = Selector::parse(&format!("p:not([{META_MARKER}])")).expect("static selector");

    PageText {
        title: document
            .select(&h1)
            .next()
            .map(|e| e.inner_html())
            .unwrap_or_default(),
        description: document
            .select(&description)
            .next()
            .map(|e| e.inner_html())
            .unwrap_or_default(),
    }
}

fn field<'r>(record: Option<&'r MetadataRecord>, key: &str) -> &'r str {
    record.and_then(|r| r.get(key)).unwrap_or(UNDEFINED)
}

/// Rewrite one laid-out page.
pub fn inject(
    html: &str,
    page: &PageId,
    catalog: &Catalog,
    settings: &InjectSettings<'_>,
) -> Result<String, InjectError> {
    let text = read_page_text(html);
    let record = match settings.join {
        JoinKey::Path => catalog.find_by_page(page),
        JoinKey::Title => catalog.find_by_title(&text.title),
    };

    let folder = field(record, "folder");
    let image = format!("{}{IMAGE_DIR}{folder}/{}", settings.base_url, field(record, "img"));
    let url = format!("{}{PAGE_DIR}{folder}/{}", settings.base_url, field(record, "src"));

    let title = text.title.as_str();
    let description = text.description.as_str();
    let stripped = Cell::new(0usize);

    let mut handlers = vec![
        element!("title", |el| {
            el.set_inner_content(title, ContentType::Html);
            Ok(())
        }),
        element!("meta", |el| {
            let property = el.get_attribute("property");
            let itemprop = el.get_attribute("itemprop");
            let name = el.get_attribute("name");
            let content = match (property.as_deref(), itemprop.as_deref(), name.as_deref()) {
                (Some("og:title"), _, _) => Some(title),
                (Some("og:description"), _, _)
                | (_, Some("description"), _)
                | (_, _, Some("description")) => Some(description),
                (Some("og:image"), _, _) | (_, Some("image"), _) => Some(image.as_str()),
                (Some("og:url"), _, _) => Some(url.as_str()),
                _ => None,
            };
            if let Some(content) = content {
                el.set_attribute("content", content)?;
            }
            Ok(())
        }),
    ];
    if settings.strip {
        handlers.push(element!(format!("[{META_MARKER}]"), |el| {
            el.remove();
            stripped.set(stripped.get() + 1);
            Ok(())
        }));
    }

    let output = lol_html::rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::default()
        },
    )?;

    if settings.strip && stripped.get() == 0 {
        return Err(InjectError::MissingMetaMarker(page.to_string()));
    }
    Ok(output)
}

/// Inject metadata into every page under `pages_dir`, writing to `out_dir`.
pub fn publish_pages(
    pages_dir: &Path,
    out_dir: &Path,
    catalog: &Catalog,
    settings: &InjectSettings<'_>,
) -> Result<StageReport, InjectError> {
    let ids = layout::html_ids(pages_dir)?;
    ids.par_iter()
        .map(|id| -> Result<(), InjectError> {
            let html = fs::read_to_string(id.to_path(pages_dir, "html"))?;
            let published = inject(&html, id, catalog, settings)?;
            let dest = id.to_path(out_dir, "html");
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(dest, published)?;
            Ok(())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = StageReport::new(Stage::Publish);
    report.written = ids.iter().map(PageId::to_string).collect();
    Ok(report.sorted())
}
