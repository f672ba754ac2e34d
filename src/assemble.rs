//! Production output assembly.
//!
//! `build/` is emptied, then the static trees are copied in next to the
//! published pages:
//!
//! ```text
//! app/json   → build/json
//! app/style  → build/style
//! app/media  → build/media
//! app/js     → build/js
//! ```
//!
//! Missing source trees are skipped. Published pages are written to
//! `build/tutorials/` by the inject stage.

use crate::types::{Stage, StageReport};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remove everything inside `dir`, keeping the directory itself.
///
/// A missing directory is created empty.
pub fn clean_dir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        return fs::create_dir_all(dir);
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Recursively copy `src` into `dest`, returning the copied files'
/// `/`-separated relative paths in sorted order.
pub fn copy_tree(src: &Path, dest: &Path) -> io::Result<Vec<String>> {
    let mut copied = Vec::new();
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied.push(
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/"),
            );
        }
    }
    Ok(copied)
}

/// Copy each `(source tree, name under output)` pair into `output`.
pub fn copy_assets(output: &Path, trees: &[(PathBuf, &str)]) -> Result<StageReport, AssembleError> {
    let mut report = StageReport::new(Stage::Assemble);
    for (src, name) in trees {
        if !src.is_dir() {
            report.skipped.push(name.to_string());
            continue;
        }
        for rel in copy_tree(src, &output.join(name))? {
            report.written.push(format!("{name}/{rel}"));
        }
    }
    Ok(report.sorted())
}
