//! Layout composition: partial inclusion and master/fragment merging.
//!
//! Two build-time passes, neither of which is a templating language:
//!
//! ## Include (stage `include`)
//!
//! Main layouts live under `<layouts>/<main_dir>/`; reusable partials live
//! anywhere under `<layouts>/`. Each main layout is expanded and written to the
//! combined directory at the same relative path:
//!
//! ```html
//! <head>
//!   <include src="../module/head.html" title="Webduino"></include>
//! </head>
//! ```
//!
//! `src` is resolved relative to the including file. Any other attribute is a
//! variable: `@!@title` inside `head.html` becomes `Webduino`. Partials may
//! include further partials; a partial that includes itself, directly or
//! through others, is an error.
//!
//! ## Extend (stage `extend`)
//!
//! A rendered fragment is merged into a combined *master* layout:
//!
//! ```html
//! <!-- @@master = main.html -->
//! <!-- @@block = content -->
//! <h1>Intro</h1>
//! <!-- @@close -->
//! ```
//!
//! Each `@@block` replaces the master's `<!-- @@placeholder = name -->` marker
//! of the same name. A fragment without blocks fills the `content` placeholder
//! with its whole body. Placeholders left unfilled are dropped. Fragments
//! without a `@@master` line use the configured default master. Master names
//! are relative to the combined directory; a master may extend another master.

use crate::cache;
use crate::types::{PageId, Stage, StageReport};
use rayon::prelude::*;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Partial {partial} included from {from} does not exist")]
    MissingPartial { partial: PathBuf, from: PathBuf },
    #[error("Include cycle through {0}")]
    IncludeCycle(PathBuf),
    #[error("<include> without src attribute in {0}")]
    IncludeWithoutSrc(PathBuf),
    #[error("Master layout not found: {0}")]
    MissingMaster(String),
    #[error("Master layouts extend each other in a cycle: {0}")]
    MasterCycle(String),
    #[error("{page}: {source}")]
    InPage {
        page: String,
        #[source]
        source: Box<LayoutError>,
    },
}

// Quoted attribute values may contain `>`.
static INCLUDE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<include\b((?:[^>"']|"[^"]*"|'[^']*')*?)/?>(?:\s*</include>)?"#)
        .expect("include tag pattern")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("attribute pattern")
});

static MASTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*@@master\s*=\s*(\S+?)\s*-->\n?").expect("master pattern")
});

static BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--\s*@@block\s*=\s*([\w-]+)\s*-->(.*?)<!--\s*@@close\s*-->")
        .expect("block pattern")
});

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*@@placeholder\s*=\s*([\w-]+)\s*-->").expect("placeholder pattern")
});

/// Placeholder filled by fragments that declare no blocks.
pub const DEFAULT_BLOCK: &str = "content";

// ============================================================================
// Include
// ============================================================================

/// Parse `name="value"`, `name='value'` and `name=value` pairs from the inside
/// of a tag.
fn parse_attributes(raw: &str) -> BTreeMap<String, String> {
    ATTRIBUTE
        .captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            (caps[1].to_string(), value.to_string())
        })
        .collect()
}

/// Replace `<prefix><name>` occurrences with variable values.
///
/// Longer names are substituted first so `@!@titleColor` is not clobbered by
/// `@!@title`.
fn substitute_variables(content: &str, vars: &BTreeMap<String, String>, prefix: &str) -> String {
    let mut names: Vec<&String> = vars.keys().collect();
    names.sort_by_key(|n| std::cmp::Reverse(n.len()));
    let mut out = content.to_string();
    for name in names {
        out = out.replace(&format!("{prefix}{name}"), &vars[name]);
    }
    out
}

/// Expand every `<include>` tag in `content`, which was read from `file`.
pub fn expand_includes(content: &str, file: &Path, prefix: &str) -> Result<String, LayoutError> {
    let mut stack = vec![canonical(file)];
    expand(content, file, &BTreeMap::new(), prefix, &mut stack)
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn expand(
    content: &str,
    file: &Path,
    vars: &BTreeMap<String, String>,
    prefix: &str,
    stack: &mut Vec<PathBuf>,
) -> Result<String, LayoutError> {
    let content = substitute_variables(content, vars, prefix);
    let base = file.parent().unwrap_or(Path::new(""));

    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for caps in INCLUDE_TAG.captures_iter(&content) {
        let whole = caps.get(0).expect("group 0 always matches");
        out.push_str(&content[last..whole.start()]);
        last = whole.end();

        let mut attrs = parse_attributes(&caps[1]);
        let src = attrs
            .remove("src")
            .ok_or_else(|| LayoutError::IncludeWithoutSrc(file.to_path_buf()))?;
        let partial = base.join(&src);
        if !partial.is_file() {
            return Err(LayoutError::MissingPartial {
                partial,
                from: file.to_path_buf(),
            });
        }
        let key = canonical(&partial);
        if stack.contains(&key) {
            return Err(LayoutError::IncludeCycle(partial));
        }

        let partial_content = fs::read_to_string(&partial)?;
        stack.push(key);
        let expanded = expand(&partial_content, &partial, &attrs, prefix, stack)?;
        stack.pop();
        out.push_str(&expanded);
    }
    out.push_str(&content[last..]);
    Ok(out)
}

/// Expand every main layout into `combined_dir`.
pub fn compose_layouts(
    main_dir: &Path,
    combined_dir: &Path,
    prefix: &str,
) -> Result<StageReport, LayoutError> {
    let mut report = StageReport::new(Stage::Include);
    let mut live = BTreeSet::new();
    let entries: Vec<walkdir::Result<walkdir::DirEntry>> = if main_dir.is_dir() {
        WalkDir::new(main_dir).sort_by_file_name().into_iter().collect()
    } else {
        Vec::new()
    };
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_html(path) {
            continue;
        }
        live.extend(PageId::from_path(main_dir, path));
        let rel = path.strip_prefix(main_dir).unwrap_or(path);
        let content = fs::read_to_string(path)?;
        let combined = expand_includes(&content, path, prefix)?;

        let dest = combined_dir.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, combined)?;
        report.written.push(slash_path(rel));
    }
    for id in cache::remove_orphans(combined_dir, "html", &live)? {
        report.removed.push(format!("{id}.html"));
    }
    Ok(report.sorted())
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("html"))
        .unwrap_or(false)
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// Extend
// ============================================================================

/// Combined master layouts, keyed by `/`-separated path relative to the
/// combined directory.
#[derive(Debug, Default, Clone)]
pub struct Layouts {
    masters: HashMap<String, String>,
}

impl Layouts {
    /// Load every `.html` file under `combined_dir`.
    pub fn load(combined_dir: &Path) -> Result<Self, LayoutError> {
        let mut masters = HashMap::new();
        if combined_dir.is_dir() {
            for entry in WalkDir::new(combined_dir) {
                let entry = entry?;
                let path = entry.path();
                if entry.file_type().is_file() && is_html(path) {
                    let rel = path.strip_prefix(combined_dir).unwrap_or(path);
                    masters.insert(slash_path(rel), fs::read_to_string(path)?);
                }
            }
        }
        Ok(Self { masters })
    }

    pub fn insert(&mut self, name: &str, content: &str) {
        self.masters.insert(name.to_string(), content.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.trim_start_matches("./");
        self.masters.get(name).map(String::as_str)
    }
}

/// The master named by a `@@master` line, if any.
pub fn master_of(html: &str) -> Option<&str> {
    MASTER.captures(html).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Named blocks of a child document.
fn blocks_of(child: &str) -> HashMap<String, String> {
    let blocks: HashMap<String, String> = BLOCK
        .captures_iter(child)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect();
    if blocks.is_empty() {
        let body = MASTER.replace_all(child, "").into_owned();
        HashMap::from([(DEFAULT_BLOCK.to_string(), body)])
    } else {
        blocks
    }
}

fn fill_placeholders(master: &str, blocks: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(master, |caps: &Captures<'_>| {
            blocks.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// Merge a fragment into its master layout chain.
pub fn extend(fragment: &str, layouts: &Layouts, default_master: &str) -> Result<String, LayoutError> {
    let mut chain: Vec<String> = Vec::new();
    let mut child = fragment.to_string();
    let mut master_name = master_of(fragment).unwrap_or(default_master).to_string();

    loop {
        if chain.contains(&master_name) {
            return Err(LayoutError::MasterCycle(master_name));
        }
        let master = layouts
            .get(&master_name)
            .ok_or_else(|| LayoutError::MissingMaster(master_name.clone()))?;
        let filled = fill_placeholders(master, &blocks_of(&child));
        chain.push(master_name);

        match master_of(master) {
            Some(next) => {
                master_name = next.to_string();
                child = filled;
            }
            None => return Ok(filled),
        }
    }
}

/// Lay out every fragment (or only `only`, when given) into `pages_dir`.
///
/// Unless `force` is set, pages that are not older than their fragment are
/// skipped. On a full run, pages whose fragment no longer exists are removed.
pub fn apply_layouts(
    fragments_dir: &Path,
    pages_dir: &Path,
    layouts: &Layouts,
    default_master: &str,
    force: bool,
    only: Option<&[PageId]>,
) -> Result<StageReport, LayoutError> {
    let ids: Vec<PageId> = match only {
        Some(ids) => ids.to_vec(),
        None => html_ids(fragments_dir)?,
    };

    let outcomes = ids
        .par_iter()
        .map(|id| -> Result<(PageId, bool), LayoutError> {
            let src = id.to_path(fragments_dir, "html");
            let dest = id.to_path(pages_dir, "html");
            if !force && !cache::needs_rebuild(&src, &dest) {
                return Ok((id.clone(), false));
            }
            let fragment = fs::read_to_string(&src)?;
            let page = extend(&fragment, layouts, default_master).map_err(|e| {
                LayoutError::InPage {
                    page: id.to_string(),
                    source: Box::new(e),
                }
            })?;
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, page)?;
            Ok((id.clone(), true))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = StageReport::new(Stage::Extend);
    if only.is_none() {
        let live: BTreeSet<PageId> = ids.iter().cloned().collect();
        for id in cache::remove_orphans(pages_dir, "html", &live)? {
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

/// Ids of every `.html` file under `dir`, sorted.
pub fn html_ids(dir: &Path) -> Result<Vec<PageId>, LayoutError> {
    let mut ids = Vec::new();
    if !dir.is_dir() {
        return Ok(ids);
    }
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_html(entry.path()) {
            continue;
        }
        if let Some(id) = PageId::from_path(dir, entry.path()) {
            ids.push(id);
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    // =========================================================================
    // Include
    // =========================================================================

    #[test]
    fn include_replaces_tag_with_partial() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main/main.html");
        fs::create_dir_all(tmp.path().join("main")).unwrap();
        write(&tmp.path().join("module/footer.html"), "<footer>f</footer>");
        let out = expand_includes(
            r#"<body><include src="../module/footer.html"></include></body>"#,
            &main,
            "@!@",
        )
        .unwrap();
        assert_eq!(out, "<body><footer>f</footer></body>");
    }

    #[test]
    fn include_self_closing_tag() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main.html");
        write(&tmp.path().join("nav.html"), "<nav></nav>");
        let out = expand_includes(r#"<include src="nav.html" />"#, &main, "@!@").unwrap();
        assert_eq!(out, "<nav></nav>");
    }

    #[test]
    fn include_accepts_unquoted_src() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main.html");
        write(&tmp.path().join("head.html"), "<meta>");
        let out = expand_includes("<include src=head.html></include>", &main, "@!@").unwrap();
        assert_eq!(out, "<meta>");
        let out = expand_includes("<include src=head.html/>", &main, "@!@").unwrap();
        assert_eq!(out, "<meta>");
    }

    #[test]
    fn include_variable_may_contain_angle_bracket() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main.html");
        write(&tmp.path().join("crumb.html"), "<span>@!@sep</span>");
        let out = expand_includes(
            r#"<include src="crumb.html" sep="a > b"></include>"#,
            &main,
            "@!@",
        )
        .unwrap();
        assert_eq!(out, "<span>a > b</span>");
    }

    #[test]
    fn include_substitutes_variables() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main.html");
        write(
            &tmp.path().join("head.html"),
            "<title>@!@title</title><meta name=\"theme\" content=\"@!@titleColor\">",
        );
        let out = expand_includes(
            r#"<include src="head.html" title="Webduino" titleColor="red"></include>"#,
            &main,
            "@!@",
        )
        .unwrap();
        assert_eq!(
            out,
            "<title>Webduino</title><meta name=\"theme\" content=\"red\">"
        );
    }

    #[test]
    fn include_nested_partials_resolve_relative_to_each_file() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main/main.html");
        fs::create_dir_all(tmp.path().join("main")).unwrap();
        write(
            &tmp.path().join("module/header.html"),
            r#"<header><include src="parts/logo.html"></include></header>"#,
        );
        write(&tmp.path().join("module/parts/logo.html"), "<img>");
        let out = expand_includes(
            r#"<include src="../module/header.html"></include>"#,
            &main,
            "@!@",
        )
        .unwrap();
        assert_eq!(out, "<header><img></header>");
    }

    #[test]
    fn include_missing_partial_is_error() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main.html");
        let result = expand_includes(r#"<include src="nope.html"></include>"#, &main, "@!@");
        assert!(matches!(result, Err(LayoutError::MissingPartial { .. })));
    }

    #[test]
    fn include_without_src_is_error() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main.html");
        let result = expand_includes("<include></include>", &main, "@!@");
        assert!(matches!(result, Err(LayoutError::IncludeWithoutSrc(_))));
    }

    #[test]
    fn include_cycle_is_error() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main.html");
        write(&tmp.path().join("a.html"), r#"<include src="b.html"></include>"#);
        write(&tmp.path().join("b.html"), r#"<include src="a.html"></include>"#);
        let result = expand_includes(r#"<include src="a.html"></include>"#, &main, "@!@");
        assert!(matches!(result, Err(LayoutError::IncludeCycle(_))));
    }

    #[test]
    fn same_partial_twice_is_not_a_cycle() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main.html");
        write(&tmp.path().join("hr.html"), "<hr>");
        let out = expand_includes(
            r#"<include src="hr.html"></include>|<include src="hr.html"></include>"#,
            &main,
            "@!@",
        )
        .unwrap();
        assert_eq!(out, "<hr>|<hr>");
    }

    #[test]
    fn compose_layouts_mirrors_main_dir() {
        let tmp = TempDir::new().unwrap();
        let layouts = tmp.path().join("_layout");
        let combined = tmp.path().join("_layout-combine");
        write(
            &layouts.join("main/main.html"),
            r#"<html><include src="../module/head.html"></include></html>"#,
        );
        write(&layouts.join("main/sub/page.html"), "<p>plain</p>");
        write(&layouts.join("module/head.html"), "<head></head>");

        let report = compose_layouts(&layouts.join("main"), &combined, "@!@").unwrap();
        assert_eq!(report.written, vec!["main.html", "sub/page.html"]);
        assert_eq!(
            fs::read_to_string(combined.join("main.html")).unwrap(),
            "<html><head></head></html>"
        );
        assert!(!combined.join("head.html").exists());
    }

    #[test]
    fn compose_layouts_removes_deleted_main_layouts() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("_layout/main");
        let combined = tmp.path().join("_layout-combine");
        write(&main.join("main.html"), "<main></main>");
        write(&main.join("old.html"), "<old></old>");
        compose_layouts(&main, &combined, "@!@").unwrap();

        fs::remove_file(main.join("old.html")).unwrap();
        let report = compose_layouts(&main, &combined, "@!@").unwrap();
        assert_eq!(report.removed, vec!["old.html"]);
        assert!(!combined.join("old.html").exists());
        assert!(combined.join("main.html").exists());
    }

    // =========================================================================
    // Extend
    // =========================================================================

    fn layouts_with(master: &str) -> Layouts {
        let mut layouts = Layouts::default();
        layouts.insert("main.html", master);
        layouts
    }

    #[test]
    fn fragment_without_blocks_fills_content() {
        let layouts = layouts_with("<main><!-- @@placeholder = content --></main>");
        let out = extend("<!-- @@master = main.html -->\n<h1>Intro</h1>\n", &layouts, "main.html").unwrap();
        assert_eq!(out, "<main><h1>Intro</h1>\n</main>");
    }

    #[test]
    fn fragment_without_master_uses_default() {
        let layouts = layouts_with("[<!-- @@placeholder = content -->]");
        let out = extend("<p>x</p>", &layouts, "main.html").unwrap();
        assert_eq!(out, "[<p>x</p>]");
    }

    #[test]
    fn named_blocks_fill_named_placeholders() {
        let layouts = layouts_with(
            "<head><!-- @@placeholder = head --></head><body><!-- @@placeholder = content --></body>",
        );
        let fragment = "<!-- @@master = main.html -->\n\
            <!-- @@block = head --><style></style><!-- @@close -->\n\
            <!-- @@block = content --><p>body</p><!-- @@close -->";
        let out = extend(fragment, &layouts, "main.html").unwrap();
        assert_eq!(out, "<head><style></style></head><body><p>body</p></body>");
    }

    #[test]
    fn unfilled_placeholders_are_dropped() {
        let layouts = layouts_with("a<!-- @@placeholder = sidebar -->b<!-- @@placeholder = content -->c");
        let out = extend("X", &layouts, "main.html").unwrap();
        assert_eq!(out, "abXc");
    }

    #[test]
    fn masters_can_extend_masters() {
        let mut layouts = Layouts::default();
        layouts.insert("base.html", "<html><!-- @@placeholder = content --></html>");
        layouts.insert(
            "article.html",
            "<!-- @@master = base.html -->\n<!-- @@block = content --><article><!-- @@placeholder = content --></article><!-- @@close -->",
        );
        let out = extend("<!-- @@master = article.html -->\nhi", &layouts, "base.html").unwrap();
        assert_eq!(out, "<html><article>hi</article></html>");
    }

    #[test]
    fn missing_master_is_error() {
        let layouts = Layouts::default();
        let result = extend("<!-- @@master = gone.html -->", &layouts, "main.html");
        assert!(matches!(result, Err(LayoutError::MissingMaster(name)) if name == "gone.html"));
    }

    #[test]
    fn master_cycle_is_error() {
        let mut layouts = Layouts::default();
        layouts.insert("a.html", "<!-- @@master = b.html -->");
        layouts.insert("b.html", "<!-- @@master = a.html -->");
        let result = extend("<!-- @@master = a.html -->", &layouts, "a.html");
        assert!(matches!(result, Err(LayoutError::MasterCycle(_))));
    }

    #[test]
    fn apply_layouts_writes_pages_and_reports_page_on_error() {
        let tmp = TempDir::new().unwrap();
        let fragments = tmp.path().join("frag");
        let pages = tmp.path().join("pages");
        write(&fragments.join("intro/intro.html"), "<h1>Intro</h1>");
        write(&fragments.join("bad.html"), "<!-- @@master = missing.html -->");
        let layouts = layouts_with("<main><!-- @@placeholder = content --></main>");

        let only = [PageId::from("intro/intro")];
        let report =
            apply_layouts(&fragments, &pages, &layouts, "main.html", false, Some(&only)).unwrap();
        assert_eq!(report.written, vec!["intro/intro"]);
        assert_eq!(
            fs::read_to_string(pages.join("intro/intro.html")).unwrap(),
            "<main><h1>Intro</h1></main>"
        );

        let err = apply_layouts(&fragments, &pages, &layouts, "main.html", true, None).unwrap_err();
        assert!(matches!(err, LayoutError::InPage { ref page, .. } if page == "bad"));
    }

    #[test]
    fn apply_layouts_removes_pages_of_deleted_fragments() {
        let tmp = TempDir::new().unwrap();
        let fragments = tmp.path().join("frag");
        let pages = tmp.path().join("pages");
        write(&fragments.join("intro/intro.html"), "<h1>Intro</h1>");
        write(&pages.join("led/led.html"), "<main>stale</main>");
        let layouts = layouts_with("<main><!-- @@placeholder = content --></main>");

        let report = apply_layouts(&fragments, &pages, &layouts, "main.html", false, None).unwrap();
        assert_eq!(report.written, vec!["intro/intro"]);
        assert_eq!(report.removed, vec!["led/led"]);
        assert!(!pages.join("led").exists());

        // A partial run leaves other pages alone
        write(&pages.join("led/led.html"), "<main>stale</main>");
        let only = [PageId::from("intro/intro")];
        let report =
            apply_layouts(&fragments, &pages, &layouts, "main.html", true, Some(&only)).unwrap();
        assert!(report.removed.is_empty());
        assert!(pages.join("led/led.html").exists());
    }

    #[test]
    fn html_ids_lists_html_only() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("a/b.html"), "");
        write(&tmp.path().join("c.html"), "");
        write(&tmp.path().join("d.txt"), "");
        let ids = html_ids(tmp.path()).unwrap();
        assert_eq!(ids, vec![PageId::from("a/b"), PageId::from("c")]);
    }
}
