//! Shared types used across pipeline stages.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Stable identity of one tutorial page.
///
/// The id is the Markdown source path relative to the source root, without
/// its extension, with `/` separators on every platform:
///
/// ```text
/// app/_md/intro/intro.md        → intro/intro
/// app/_md2html/intro/intro.html → intro/intro
/// app/tutorials/intro/intro.html → intro/intro
/// ```
///
/// Every intermediate tree mirrors the source tree, so the same id names the
/// source, its fragment, and its laid-out page.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(String);

impl PageId {
    /// Derive the id of `path` relative to `root`. Returns `None` when `path`
    /// is not under `root`.
    pub fn from_path(root: &Path, path: &Path) -> Option<Self> {
        let rel = path.strip_prefix(root).ok()?.with_extension("");
        let parts: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            return None;
        }
        Some(Self(parts.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File path for this page under `dir` with the given extension.
    pub fn to_path(&self, dir: &Path, extension: &str) -> PathBuf {
        let mut path = dir.to_path_buf();
        let (parent, name) = self.0.rsplit_once('/').unwrap_or(("", &self.0));
        for part in parent.split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        // Not `set_extension`: ids like `v1.2` keep their dot.
        path.push(format!("{name}.{extension}"));
        path
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Clean,
    Include,
    Markdown,
    Extend,
    Styles,
    Index,
    Publish,
    Assemble,
    Sitemap,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Clean => "clean",
            Stage::Include => "include",
            Stage::Markdown => "markdown",
            Stage::Extend => "extend",
            Stage::Styles => "styles",
            Stage::Index => "index",
            Stage::Publish => "publish",
            Stage::Assemble => "assemble",
            Stage::Sitemap => "sitemap",
        }
    }
}

/// What one stage did: files written, files skipped as unchanged, and stale
/// outputs removed because their input is gone.
///
/// Entries are display names relative to the stage's output directory, sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub written: Vec<String>,
    pub skipped: Vec<String>,
    pub removed: Vec<String>,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            written: Vec::new(),
            skipped: Vec::new(),
            removed: Vec::new(),
        }
    }

    pub(crate) fn sorted(mut self) -> Self {
        self.written.sort();
        self.skipped.sort();
        self.removed.sort();
        self
    }
}
