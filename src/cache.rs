//! Change filter for incremental builds.
//!
//! Three mechanisms keep incremental runs cheap without changing their output:
//!
//! ## Timestamp filter
//!
//! [`needs_rebuild`] compares a source with its destination: the destination is
//! regenerated only when it is missing or strictly older than the source. A
//! destination that is as new as, or newer than, its source is left alone. This
//! is the only skip rule in the pipeline.
//!
//! ## Orphan removal
//!
//! A destination whose source was deleted is never touched by the timestamp
//! filter. [`remove_orphans`] deletes those files (and the directories they
//! leave empty) so a deleted tutorial disappears from every later stage.
//!
//! ## Build stamp
//!
//! The timestamp filter cannot see that a page's *layout* changed, since it
//! only compares the page with its own fragment, nor that a setting used while
//! rendering changed. After the include stage a [`BuildStamp`] is computed:
//!
//! - `render`: SHA-256 of the settings that shape fragments (metadata marker
//!   and paragraph count).
//! - `layouts`: SHA-256 of the combined layouts (relative path and contents, in
//!   sorted order) plus the default master name.
//!
//! It is compared with the stamp recorded by the previous run in
//! `<combined>/.layout-stamp.json`. A different `render` hash re-renders every
//! fragment; either difference re-lays out every page. The stamp only ever adds
//! work, never skips it, so a clean build and an incremental build produce the
//! same files.
//!
//! A missing, unreadable or outdated stamp file counts as "changed".

use crate::types::PageId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Name of the stamp file within the combined layout directory.
const STAMP_FILENAME: &str = ".layout-stamp.json";

/// Version of the stamp format. Bump to invalidate existing stamps.
const STAMP_VERSION: u32 = 2;

/// Whether `dest` must be regenerated from `src`.
///
/// True when `dest` is missing, when either modification time cannot be read,
/// or when `dest` is strictly older than `src`.
pub fn needs_rebuild(src: &Path, dest: &Path) -> bool {
    match (modified(src), modified(dest)) {
        (Some(src_time), Some(dest_time)) => dest_time < src_time,
        _ => true,
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Delete every `.{extension}` file under `dir` whose id is not in `live`.
///
/// Directories emptied by the removal are deleted too; `dir` itself is kept.
/// Returns the removed ids, sorted.
pub fn remove_orphans(
    dir: &Path,
    extension: &str,
    live: &BTreeSet<PageId>,
) -> io::Result<Vec<PageId>> {
    let mut removed = Vec::new();
    if !dir.is_dir() {
        return Ok(removed);
    }
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let path = entry.path();
        let matches_ext = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if !entry.file_type().is_file() || !matches_ext {
            continue;
        }
        let Some(id) = PageId::from_path(dir, path) else {
            continue;
        };
        if !live.contains(&id) {
            fs::remove_file(path)?;
            removed.push(id);
        }
    }

    // Deepest first, so nested empty directories collapse upward.
    let mut dirs: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect();
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    for d in dirs {
        if fs::read_dir(&d)?.next().is_none() {
            fs::remove_dir(&d)?;
        }
    }
    Ok(removed)
}

/// Settings folded into the [`BuildStamp`].
#[derive(Debug, Clone, Copy)]
pub struct StampSettings<'a> {
    /// Attribute marking the metadata block in fragments.
    pub meta_marker: &'a str,
    /// Number of leading metadata paragraphs.
    pub meta_paragraphs: usize,
    /// Master used by fragments that name none.
    pub default_master: &'a str,
}

/// Recorded fingerprint of the render settings and the combined layouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStamp {
    pub version: u32,
    pub render: String,
    pub layouts: String,
}

impl BuildStamp {
    /// Fingerprint `settings` and the current contents of `combined_dir`.
    ///
    /// The stamp file itself is excluded. An absent directory hashes like an
    /// empty one.
    pub fn compute(combined_dir: &Path, settings: &StampSettings<'_>) -> io::Result<Self> {
        let mut render = Sha256::new();
        render.update(settings.meta_marker.as_bytes());
        render.update(b"\0");
        render.update(settings.meta_paragraphs.to_le_bytes());

        let mut layouts = Sha256::new();
        layouts.update(settings.default_master.as_bytes());
        layouts.update(b"\0");
        if combined_dir.is_dir() {
            for entry in WalkDir::new(combined_dir).sort_by_file_name() {
                let entry = entry.map_err(io::Error::other)?;
                if !entry.file_type().is_file() || entry.file_name() == STAMP_FILENAME {
                    continue;
                }
                let rel = entry
                    .path()
                    .strip_prefix(combined_dir)
                    .unwrap_or(entry.path());
                layouts.update(rel.to_string_lossy().as_bytes());
                layouts.update(b"\0");
                layouts.update(fs::read(entry.path())?);
                layouts.update(b"\0");
            }
        }
        Ok(Self {
            version: STAMP_VERSION,
            render: format!("{:x}", render.finalize()),
            layouts: format!("{:x}", layouts.finalize()),
        })
    }

    /// Load the stamp recorded by the previous run, if any.
    pub fn load(combined_dir: &Path) -> Option<Self> {
        let content = fs::read_to_string(stamp_path(combined_dir)).ok()?;
        let stamp: Self = serde_json::from_str(&content).ok()?;
        (stamp.version == STAMP_VERSION).then_some(stamp)
    }

    pub fn save(&self, combined_dir: &Path) -> io::Result<()> {
        fs::create_dir_all(combined_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(stamp_path(combined_dir), json)
    }

    /// Whether fragments must be re-rendered compared with `previous`.
    pub fn render_changed(&self, previous: Option<&Self>) -> bool {
        previous.is_none_or(|p| p.render != self.render)
    }

    /// Whether pages must be re-laid out compared with `previous`.
    pub fn layouts_changed(&self, previous: Option<&Self>) -> bool {
        self.render_changed(previous) || previous.is_none_or(|p| p.layouts != self.layouts)
    }
}

/// Resolve the stamp file path for a combined layout directory.
pub fn stamp_path(combined_dir: &Path) -> PathBuf {
    combined_dir.join(STAMP_FILENAME)
}
