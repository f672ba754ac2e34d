//! Watch mode: rebuild on source changes.
//!
//! Three source trees are watched recursively, each mapped to the partial
//! rebuild it needs:
//!
//! | tree                 | change kind     | rebuild                                   |
//! |----------------------|-----------------|-------------------------------------------|
//! | `paths.layouts`      | `Layout`        | include, render, re-layout all, index     |
//! | `paths.source` `*.md`| `Markdown`      | render, re-layout changed, index          |
//! | `paths.styles_src`   | `Stylesheet`    | styles                                    |
//!
//! Events are batched: a rebuild starts once no new event has arrived for
//! [`DEBOUNCE_MS`]. A failed rebuild is reported and the loop keeps running.

use crate::output;
use crate::pipeline::{ChangeKind, Site};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File watcher failed: {0}")]
    Notify(#[from] notify::Error),
}

pub const DEBOUNCE_MS: u64 = 300;

/// Editor swap files, backups and dotfiles.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Watched trees, resolved to absolute paths so they compare with the paths
/// notify reports.
#[derive(Debug, Clone)]
pub struct WatchTargets {
    pub layouts: PathBuf,
    pub source: PathBuf,
    pub styles_src: PathBuf,
}

impl WatchTargets {
    pub fn for_site(site: &Site) -> Self {
        Self {
            layouts: absolute(&site.layouts_dir()),
            source: absolute(&site.source_dir()),
            styles_src: absolute(&site.styles_src_dir()),
        }
    }

    /// Category of a changed path, if it belongs to a watched tree.
    pub fn categorize(&self, path: &Path) -> Option<ChangeKind> {
        if is_temp_file(path) {
            return None;
        }
        if path.starts_with(&self.layouts) {
            Some(ChangeKind::Layout)
        } else if path.starts_with(&self.source) {
            let is_md = path
                .extension()
                .map(|e| e.eq_ignore_ascii_case("md"))
                .unwrap_or(false);
            is_md.then_some(ChangeKind::Markdown)
        } else if path.starts_with(&self.styles_src) {
            Some(ChangeKind::Stylesheet)
        } else {
            None
        }
    }

    fn dirs(&self) -> [&Path; 3] {
        [&self.layouts, &self.source, &self.styles_src]
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Batches rapid file events.
struct Debouncer {
    pending: HashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: HashSet::new(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<PathBuf> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

/// Change kinds touched by a batch of paths.
pub fn classify(targets: &WatchTargets, paths: &[PathBuf]) -> BTreeSet<ChangeKind> {
    paths.iter().filter_map(|p| targets.categorize(p)).collect()
}

fn handle_changes(site: &Site, targets: &WatchTargets, paths: &[PathBuf]) {
    let changes = classify(targets, paths);
    if changes.is_empty() {
        return;
    }
    output::print_watch_change(&changes, paths, site.root());
    match site.rebuild(&changes) {
        Ok(reports) => {
            for report in &reports {
                output::print_stage_report(report);
            }
        }
        Err(e) => output::print_watch_error(&e),
    }
}

/// Watch the site's source trees and rebuild until the watcher stops.
pub fn watch(site: &Site) -> Result<(), WatchError> {
    let targets = WatchTargets::for_site(site);
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx)?;

    let mut watched = Vec::new();
    for dir in targets.dirs() {
        if dir.is_dir() {
            watcher.watch(dir, RecursiveMode::Recursive)?;
            watched.push(dir.to_path_buf());
        }
    }
    output::print_watch_start(&watched, site.root());

    let mut debouncer = Debouncer::new();
    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Err(e)) => output::print_watch_error(&e),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                handle_changes(site, &targets, &debouncer.take());
            }
            Err(RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};

    fn targets() -> WatchTargets {
        WatchTargets {
            layouts: PathBuf::from("/site/app/_layout"),
            source: PathBuf::from("/site/app/_md"),
            styles_src: PathBuf::from("/site/app/_less"),
        }
    }

    #[test]
    fn categorize_by_tree() {
        let t = targets();
        assert_eq!(
            t.categorize(Path::new("/site/app/_layout/module/header.html")),
            Some(ChangeKind::Layout)
        );
        assert_eq!(
            t.categorize(Path::new("/site/app/_md/intro/intro.md")),
            Some(ChangeKind::Markdown)
        );
        assert_eq!(
            t.categorize(Path::new("/site/app/_less/import/vars.less")),
            Some(ChangeKind::Stylesheet)
        );
    }

    #[test]
    fn non_markdown_in_source_is_ignored() {
        let t = targets();
        assert_eq!(t.categorize(Path::new("/site/app/_md/intro/cover.png")), None);
    }

    #[test]
    fn outputs_and_temp_files_are_ignored() {
        let t = targets();
        assert_eq!(t.categorize(Path::new("/site/app/_md2html/intro/intro.html")), None);
        assert_eq!(t.categorize(Path::new("/site/app/_layout-combine/main.html")), None);
        assert_eq!(t.categorize(Path::new("/site/app/_md/intro/.intro.md.swp")), None);
        assert_eq!(t.categorize(Path::new("/site/app/_md/intro/intro.md~")), None);
    }

    #[test]
    fn classify_merges_kinds() {
        let paths = vec![
            PathBuf::from("/site/app/_md/a.md"),
            PathBuf::from("/site/app/_md/b.md"),
            PathBuf::from("/site/app/_less/site.less"),
            PathBuf::from("/elsewhere/x"),
        ];
        let kinds = classify(&targets(), &paths);
        assert_eq!(
            kinds,
            BTreeSet::from([ChangeKind::Markdown, ChangeKind::Stylesheet])
        );
    }

    #[test]
    fn debouncer_batches_until_quiet() {
        let mut debouncer = Debouncer::new();
        assert!(!debouncer.ready());
        assert_eq!(debouncer.timeout(), Duration::from_secs(60));

        debouncer.add(
            Event::new(EventKind::Create(CreateKind::File))
                .add_path(PathBuf::from("/site/app/_md/a.md"))
                .add_path(PathBuf::from("/site/app/_md/a.md.tmp")),
        );
        debouncer.add(
            Event::new(EventKind::Modify(ModifyKind::Any))
                .add_path(PathBuf::from("/site/app/_md/a.md")),
        );
        // Just received an event: not quiet yet
        assert!(!debouncer.ready());
        assert_eq!(debouncer.timeout(), Duration::from_millis(DEBOUNCE_MS));

        debouncer.last_event = Some(Instant::now() - Duration::from_millis(DEBOUNCE_MS + 1));
        assert!(debouncer.ready());
        assert_eq!(debouncer.take(), vec![PathBuf::from("/site/app/_md/a.md")]);
        assert!(!debouncer.ready());
    }

    #[test]
    fn access_events_are_not_relevant() {
        let event = Event::new(EventKind::Access(notify::event::AccessKind::Any));
        assert!(!is_relevant(&event));
        assert!(is_relevant(&Event::new(EventKind::Create(CreateKind::Any))));
    }
}
