//! # Tutorial Site
//!
//! Builds a static tutorial site from a tree of Markdown files. Each tutorial
//! carries its own metadata in a leading `key: value` paragraph; the build turns
//! that into page titles, Open Graph tags, a JSON catalog and a sitemap.
//!
//! # Architecture: Strict Pipeline
//!
//! ```text
//! include   app/_layout/main  →  app/_layout-combine   (partials expanded)
//! markdown  app/_md           →  app/_md2html          (HTML fragments)
//! extend    app/_md2html      →  app/tutorials         (fragments in layouts)
//! index     app/_md2html      →  app/json/tutorials.json
//! styles    app/_less         →  app/style
//! ── production only ──
//! publish   app/tutorials     →  build/tutorials       (title + og:* injected)
//! assemble  app/{json,style,media,js} → build/
//! sitemap   build/**/*.html   →  build/sitemap.xml
//! ```
//!
//! Every intermediate tree mirrors the Markdown tree, so one [`types::PageId`]
//! (`intro/intro`) names a source, its fragment and its laid-out page. Each
//! stage reads only the previous stage's files, and metadata travels as a
//! [`metadata::Catalog`] value rather than shared state.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`render`] | Markdown → HTML fragments; bare headings, metadata block marking |
//! | [`layout`] | `<include>` expansion and `@@master`/`@@block` layout merging |
//! | [`cache`] | Timestamp change filter, orphan removal and build stamp |
//! | [`metadata`] | `key: value` extraction into a [`metadata::Catalog`] |
//! | [`inject`] | `<title>` and Open Graph rewriting of published pages |
//! | [`index`] | JSON catalog of all tutorials |
//! | [`styles`] | Stylesheet compilation through an external compiler |
//! | [`assemble`] | Output cleaning and static tree copying |
//! | [`sitemap`] | `sitemap.xml` for the production output |
//! | [`pipeline`] | [`pipeline::Site`]: stage order, build lock, partial rebuilds |
//! | [`watch`] | Debounced file watching for the dev server loop |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`types`] | Page ids and stage reports shared across modules |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Incremental by Timestamp, Correct by Construction
//!
//! A stage skips a file only when its output is at least as new as its input,
//! and removes outputs whose input was deleted. Layout and render-setting
//! changes cannot be seen that way, so both are hashed into a build stamp: a
//! changed render hash re-renders every fragment and any change re-lays out
//! every page. A clean build and an incremental build therefore write the same
//! bytes.
//!
//! ## Marked Metadata Block
//!
//! The renderer tags the metadata paragraph (and the `<hr>` rules around it)
//! with `data-page-meta`. Stripping the block from published pages targets that
//! marker instead of element positions, and fails loudly on a page without it.

pub mod assemble;
pub mod cache;
pub mod config;
pub mod index;
pub mod inject;
pub mod layout;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod sitemap;
pub mod styles;
pub mod types;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
