//! Markdown to HTML rendering.
//!
//! Stage `markdown` of the pipeline. Every `.md` file under the source tree is
//! rendered with pulldown-cmark into a fragment at the same relative path under
//! the fragments tree, with the extension replaced by `.html`:
//!
//! ```text
//! app/_md/intro/intro.md  →  app/_md2html/intro/intro.html
//! ```
//!
//! Rendering is stock CommonMark plus tables, strikethrough and task lists,
//! with two adjustments applied on the event stream:
//!
//! - **Headings** are emitted as bare `<hN>…</hN>`. No anchor id is generated,
//!   so CJK or other non-ASCII heading text never turns into a mangled id.
//! - **Metadata paragraphs**: the leading `paragraphs` `<p>` elements carry the
//!   [`META_MARKER`] attribute, as do `<hr>` rules directly around or between
//!   them. The injector uses the marker to strip the block from published
//!   pages without relying on element positions.
//!
//! Fragments whose destination is not older than the source are skipped
//! (see [`crate::cache::needs_rebuild`]), and fragments left behind by deleted
//! sources are removed.

use crate::cache;
use crate::types::{PageId, Stage, StageReport};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Attribute marking the metadata block in rendered fragments.
pub const META_MARKER: &str = "data-page-meta";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Render Markdown to an HTML fragment.
///
/// `meta_paragraphs` is the number of leading paragraphs that hold page
/// metadata; they are marked with [`META_MARKER`].
pub fn render_markdown(markdown: &str, meta_paragraphs: usize) -> String {
    let events: Vec<Event<'_>> = Parser::new_ext(markdown, parser_options()).collect();
    let block = metadata_block(&events, meta_paragraphs);

    let mut in_meta_paragraph = false;
    let rewritten = events.into_iter().enumerate().map(|(i, event)| match event {
        Event::Start(Tag::Heading { level, .. }) => Event::Html(format!("<{level}>").into()),
        Event::End(TagEnd::Heading(level)) => Event::Html(format!("</{level}>\n").into()),
        Event::Start(Tag::Paragraph) if block.contains(i) => {
            in_meta_paragraph = true;
            Event::Html(CowStr::from(format!("<p {META_MARKER}>")))
        }
        Event::End(TagEnd::Paragraph) if in_meta_paragraph => {
            in_meta_paragraph = false;
            Event::Html("</p>\n".into())
        }
        Event::Rule if block.contains(i) => Event::Html(format!("<hr {META_MARKER} />\n").into()),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, rewritten);
    out
}

/// Event index range covering the metadata paragraphs and adjacent rules.
struct MetaBlock {
    paragraph_starts: Vec<usize>,
    rules: Vec<usize>,
}

impl MetaBlock {
    fn contains(&self, index: usize) -> bool {
        self.paragraph_starts.contains(&index) || self.rules.contains(&index)
    }
}

fn metadata_block(events: &[Event<'_>], meta_paragraphs: usize) -> MetaBlock {
    let mut paragraph_starts = Vec::new();
    let mut last_end = None;
    let mut open = false;
    for (i, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::Paragraph) if paragraph_starts.len() < meta_paragraphs => {
                paragraph_starts.push(i);
                open = true;
            }
            Event::End(TagEnd::Paragraph) if open => {
                open = false;
                last_end = Some(i);
                if paragraph_starts.len() == meta_paragraphs {
                    break;
                }
            }
            _ => {}
        }
    }

    let mut rules = Vec::new();
    if let (Some(&first), Some(last)) = (paragraph_starts.first(), last_end) {
        let is_rule = |i: usize| matches!(events.get(i), Some(Event::Rule));
        if first > 0 && is_rule(first - 1) {
            rules.push(first - 1);
        }
        rules.extend((first..last).filter(|&i| is_rule(i)));
        if is_rule(last + 1) {
            rules.push(last + 1);
        }
    }

    MetaBlock {
        paragraph_starts,
        rules,
    }
}

/// Render one Markdown file into `dest`, creating parent directories.
pub fn render_file(src: &Path, dest: &Path, meta_paragraphs: usize) -> Result<(), RenderError> {
    let markdown = fs::read_to_string(src)?;
    let fragment = render_markdown(&markdown, meta_paragraphs);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, fragment)?;
    Ok(())
}

/// Collect every Markdown file under `source_dir`, sorted by path.
pub fn markdown_sources(source_dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
    if !source_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path
                .extension()
                .map(|e| e.eq_ignore_ascii_case("md"))
                .unwrap_or(false)
        {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Render every source (or only `only`, when given) into `fragments_dir`.
///
/// Unless `force` is set, sources whose fragment is up to date are skipped.
/// Files are rendered in parallel on the global rayon pool. On a full run,
/// fragments whose source no longer exists are removed.
pub fn render_tree(
    source_dir: &Path,
    fragments_dir: &Path,
    meta_paragraphs: usize,
    force: bool,
    only: Option<&[PathBuf]>,
) -> Result<StageReport, RenderError> {
    let sources = match only {
        Some(paths) => paths.to_vec(),
        None => markdown_sources(source_dir)?,
    };

    let outcomes = sources
        .par_iter()
        .filter_map(|src| PageId::from_path(source_dir, src).map(|id| (src, id)))
        .map(|(src, id)| -> Result<(PageId, bool), RenderError> {
            let dest = id.to_path(fragments_dir, "html");
            if !force && !cache::needs_rebuild(src, &dest) {
                return Ok((id, false));
            }
            render_file(src, &dest, meta_paragraphs)?;
            Ok((id, true))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = StageReport::new(Stage::Markdown);
    if only.is_none() {
        let live: BTreeSet<PageId> = outcomes.iter().map(|(id, _)| id.clone()).collect();
        for id in cache::remove_orphans(fragments_dir, "html", &live)? {
            report.removed.push(id.to_string());
        }
    }
    for (id, written) in outcomes {
        if written {
            report.written.push(id.to_string());
        } else {
            report.skipped.push(id.to_string());
        }
    }
    Ok(report.sorted())
}
