use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tutorial_site::pipeline::{BuildError, Site};
use tutorial_site::types::StageReport;
use tutorial_site::{config, output, watch};

#[derive(Parser)]
#[command(name = "tutorial-site")]
#[command(about = "Builds a static tutorial site from a tree of Markdown files")]
#[command(long_about = "\
Builds a static tutorial site from a tree of Markdown files

Each tutorial is a Markdown file whose first paragraph holds `key: value`
metadata. Tutorials are rendered, merged into shared layouts, indexed into a
JSON catalog, and published with Open Graph tags and a sitemap.

Project structure (all paths configurable in config.toml):

  app/
  ├── _md/intro/intro.md           # Tutorial sources
  ├── _layout/main/main.html       # Main layouts (<include> partials)
  ├── _layout/module/*.html        # Partials
  ├── _less/*.less                 # Stylesheets (lib/ copied verbatim)
  ├── media/                       # Copied to build/media
  └── js/                          # Copied to build/js

Tutorial header:

  # 認識 Webduino

  title: 認識 Webduino
  img: cover.png
  folder: intro
  src: intro.html

Run 'tutorial-site gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Project root (holds config.toml and app/)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Clean, build the app/ trees, then rebuild on every change (default)
    Dev,
    /// Build the app/ trees and assemble the production site in build/
    Build,
    /// Remove rendered fragments, pages, styles and combined layouts
    Clean,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Dev) {
        Command::Dev => {
            let site = load_site(&cli.root)?;
            println!("==> Cleaning intermediate output");
            print_reports(&[site.clean()?]);

            println!("==> Building {}", site.root().display());
            print_reports(&site.dev_build()?);

            println!("==> Watching for changes (Ctrl-C to stop)");
            watch::watch(&site)?;
        }
        Command::Build => {
            let site = load_site(&cli.root)?;
            println!("==> Building {}", site.root().display());
            print_reports(&site.production_build()?);
            println!("==> Build complete: {}", site.output_dir().display());
        }
        Command::Clean => {
            let site = load_site(&cli.root)?;
            print_reports(&[site.clean()?]);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_site(root: &Path) -> Result<Site, BuildError> {
    let site = Site::load(root)?;
    init_thread_pool(&site.config().processing);
    Ok(site)
}

fn print_reports(reports: &[StageReport]) {
    for report in reports {
        output::print_stage_report(report);
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can only lower it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
