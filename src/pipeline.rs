//! Build orchestration.
//!
//! [`Site`] ties the project root and its config together and runs the stages
//! in a fixed order:
//!
//! ```text
//! dev build:    include → markdown → extend → index → styles
//! production:   dev build → clean build/ → publish → assemble → sitemap
//! ```
//!
//! Every whole build holds the site's build lock, so a watch-triggered rebuild
//! never overlaps another build. Individual stage methods do not lock; they are
//! public for the CLI and tests.
//!
//! Metadata moves between stages only as a [`Catalog`] value: extraction
//! returns it, and the index and publish stages take it as an argument.

use crate::assemble::{self, AssembleError};
use crate::cache::{BuildStamp, StampSettings};
use crate::config::{self, ConfigError, SiteConfig};
use crate::index::{self, IndexError};
use crate::inject::{self, InjectError, InjectSettings};
use crate::layout::{self, LayoutError, Layouts};
use crate::metadata::{self, Catalog, MetadataError};
use crate::render::{self, RenderError};
use crate::sitemap;
use crate::styles::{self, StyleSettings, StylesError};
use crate::types::{Stage, StageReport};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),
    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),
    #[error("Metadata extraction failed: {0}")]
    Metadata(#[from] MetadataError),
    #[error("Index failed: {0}")]
    Index(#[from] IndexError),
    #[error("Publishing failed: {0}")]
    Inject(#[from] InjectError),
    #[error("Stylesheets failed: {0}")]
    Styles(#[from] StylesError),
    #[error("Assembly failed: {0}")]
    Assemble(#[from] AssembleError),
}

/// Sub-directory of the output holding published pages.
pub const PUBLISHED_DIR: &str = "tutorials";

/// Category of a changed source file, as seen by watch mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeKind {
    Layout,
    Markdown,
    Stylesheet,
}

/// A tutorial project: root directory plus resolved config.
#[derive(Debug)]
pub struct Site {
    root: PathBuf,
    config: SiteConfig,
    build_lock: Mutex<()>,
}

impl Site {
    pub fn new(root: impl Into<PathBuf>, config: SiteConfig) -> Self {
        Self {
            root: root.into(),
            config,
            build_lock: Mutex::new(()),
        }
    }

    /// Load `config.toml` from `root` and build a site around it.
    pub fn load(root: &Path) -> Result<Self, BuildError> {
        let config = config::load_config(root)?;
        Ok(Self::new(root, config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Resolve a project-relative path.
    pub fn path(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    pub fn source_dir(&self) -> PathBuf {
        self.path(&self.config.paths.source)
    }

    pub fn layouts_dir(&self) -> PathBuf {
        self.path(&self.config.paths.layouts)
    }

    pub fn combined_dir(&self) -> PathBuf {
        self.path(&self.config.paths.combined)
    }

    pub fn fragments_dir(&self) -> PathBuf {
        self.path(&self.config.paths.fragments)
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.path(&self.config.paths.pages)
    }

    pub fn styles_src_dir(&self) -> PathBuf {
        self.path(&self.config.paths.styles_src)
    }

    pub fn styles_dir(&self) -> PathBuf {
        self.path(&self.config.paths.styles)
    }

    pub fn index_path(&self) -> PathBuf {
        self.path(&self.config.paths.json)
            .join(&self.config.metadata.index_file)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path(&self.config.paths.output)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.build_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Stages
    // ------------------------------------------------------------------

    /// Empty the intermediate trees: fragments, pages, styles and combined
    /// layouts.
    pub fn clean(&self) -> Result<StageReport, BuildError> {
        let mut report = StageReport::new(Stage::Clean);
        let paths = &self.config.paths;
        for rel in [&paths.fragments, &paths.pages, &paths.styles, &paths.combined] {
            assemble::clean_dir(&self.path(rel))?;
            report.written.push(rel.display().to_string());
        }
        Ok(report)
    }

    /// Empty the production output directory.
    pub fn clean_output(&self) -> Result<StageReport, BuildError> {
        let mut report = StageReport::new(Stage::Clean);
        assemble::clean_dir(&self.output_dir())?;
        report
            .written
            .push(self.config.paths.output.display().to_string());
        Ok(report)
    }

    pub fn compose(&self) -> Result<StageReport, BuildError> {
        let main_dir = self.layouts_dir().join(&self.config.layout.main_dir);
        Ok(layout::compose_layouts(
            &main_dir,
            &self.combined_dir(),
            &self.config.layout.include_prefix,
        )?)
    }

    pub fn render(&self, force: bool) -> Result<StageReport, BuildError> {
        Ok(render::render_tree(
            &self.source_dir(),
            &self.fragments_dir(),
            self.config.metadata.paragraphs,
            force,
            None,
        )?)
    }

    pub fn layout(&self, force: bool) -> Result<StageReport, BuildError> {
        let layouts = Layouts::load(&self.combined_dir())?;
        Ok(layout::apply_layouts(
            &self.fragments_dir(),
            &self.pages_dir(),
            &layouts,
            &self.config.layout.default_master,
            force,
            None,
        )?)
    }

    pub fn catalog(&self) -> Result<Catalog, BuildError> {
        Ok(metadata::extract_catalog(
            &self.fragments_dir(),
            self.config.metadata.paragraphs,
        )?)
    }

    pub fn index(&self, catalog: &Catalog) -> Result<StageReport, BuildError> {
        let source_dir = self.source_dir();
        let dated = self.config.metadata.index_date.then_some(source_dir.as_path());
        index::write_index(&self.index_path(), catalog, dated)?;

        let mut report = StageReport::new(Stage::Index);
        report.written.push(self.config.metadata.index_file.clone());
        Ok(report)
    }

    pub fn styles(&self) -> Result<StageReport, BuildError> {
        let settings = StyleSettings {
            compiler: &self.config.styles.compiler,
            extension: &self.config.styles.extension,
            lib_dir: &self.config.styles.lib_dir,
        };
        Ok(styles::build_styles(
            &self.styles_src_dir(),
            &self.styles_dir(),
            &settings,
        )?)
    }

    pub fn publish(&self, catalog: &Catalog) -> Result<StageReport, BuildError> {
        Ok(inject::publish_pages(
            &self.pages_dir(),
            &self.output_dir().join(PUBLISHED_DIR),
            catalog,
            &InjectSettings::from_config(&self.config),
        )?)
    }

    pub fn assemble(&self) -> Result<StageReport, BuildError> {
        let paths = &self.config.paths;
        let trees = [
            (self.path(&paths.json), "json"),
            (self.path(&paths.styles), "style"),
            (self.path(&paths.media), "media"),
            (self.path(&paths.scripts), "js"),
        ];
        Ok(assemble::copy_assets(&self.output_dir(), &trees)?)
    }

    pub fn sitemap(&self) -> Result<StageReport, BuildError> {
        sitemap::write_sitemap(
            &self.output_dir(),
            self.config.site_url(),
            &self.config.sitemap,
        )?;
        let mut report = StageReport::new(Stage::Sitemap);
        report.written.push(sitemap::SITEMAP_FILE.to_string());
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Builds
    // ------------------------------------------------------------------

    /// Layout, render, extend and index.
    ///
    /// With `recompose`, layouts are re-included first and the build stamp is
    /// checked: changed render settings re-render every fragment, and changed
    /// layouts (or render settings) re-lay out every page.
    fn content(
        &self,
        recompose: bool,
        reports: &mut Vec<StageReport>,
    ) -> Result<Catalog, BuildError> {
        let mut stamp = None;
        let mut force_render = false;
        let mut force_layout = false;
        if recompose {
            reports.push(self.compose()?);
            let current = BuildStamp::compute(&self.combined_dir(), &self.stamp_settings())?;
            let previous = BuildStamp::load(&self.combined_dir());
            force_render = current.render_changed(previous.as_ref());
            force_layout = current.layouts_changed(previous.as_ref());
            stamp = Some(current);
        }

        reports.push(self.render(force_render)?);
        reports.push(self.layout(force_layout)?);
        if let Some(stamp) = stamp {
            stamp.save(&self.combined_dir())?;
        }

        let catalog = self.catalog()?;
        reports.push(self.index(&catalog)?);
        Ok(catalog)
    }

    fn stamp_settings(&self) -> StampSettings<'_> {
        StampSettings {
            meta_marker: render::META_MARKER,
            meta_paragraphs: self.config.metadata.paragraphs,
            default_master: &self.config.layout.default_master,
        }
    }

    /// Full development build into the `app/` trees.
    pub fn dev_build(&self) -> Result<Vec<StageReport>, BuildError> {
        let _guard = self.lock();
        let mut reports = Vec::new();
        self.content(true, &mut reports)?;
        reports.push(self.styles()?);
        Ok(reports)
    }

    /// Development build followed by assembly of the production output.
    pub fn production_build(&self) -> Result<Vec<StageReport>, BuildError> {
        let _guard = self.lock();
        let mut reports = Vec::new();
        let catalog = self.content(true, &mut reports)?;
        reports.push(self.styles()?);

        reports.push(self.clean_output()?);
        reports.push(self.publish(&catalog)?);
        reports.push(self.assemble()?);
        reports.push(self.sitemap()?);
        Ok(reports)
    }

    /// Rebuild only what the given kinds of change affect.
    pub fn rebuild(&self, changes: &BTreeSet<ChangeKind>) -> Result<Vec<StageReport>, BuildError> {
        let _guard = self.lock();
        let mut reports = Vec::new();
        let layouts = changes.contains(&ChangeKind::Layout);
        if layouts || changes.contains(&ChangeKind::Markdown) {
            self.content(layouts, &mut reports)?;
        }
        if changes.contains(&ChangeKind::Stylesheet) {
            reports.push(self.styles()?);
        }
        Ok(reports)
    }
}
