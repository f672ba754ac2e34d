//! Stylesheet compilation.
//!
//! Only the top level of the stylesheet source directory is compiled:
//!
//! ```text
//! app/_less/site.less     → app/style/site.css   (compiler)
//! app/_less/print.css     → app/style/print.css  (copied)
//! app/_less/lib/**        → app/style/lib/**     (copied verbatim)
//! app/_less/import/*.less   not compiled on their own
//! ```
//!
//! The compiler is an external command configured as an argv list. `{input}`
//! in any argument is replaced with the source path and the compiled CSS is
//! read from stdout.

use crate::assemble::copy_tree;
use crate::types::{Stage, StageReport};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum StylesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("No stylesheet compiler configured for {0}")]
    NoCompiler(PathBuf),
    #[error("Failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Compiling {file} failed ({status}): {stderr}")]
    Compiler {
        file: PathBuf,
        status: String,
        stderr: String,
    },
}

const INPUT_TOKEN: &str = "{input}";

/// What to run for a stylesheet source, and how.
#[derive(Debug, Clone)]
pub struct StyleSettings<'a> {
    pub compiler: &'a [String],
    pub extension: &'a str,
    pub lib_dir: &'a str,
}

/// Run the configured compiler on one source and return the CSS.
pub fn compile_stylesheet(compiler: &[String], input: &Path) -> Result<String, StylesError> {
    let (program, args) = compiler
        .split_first()
        .ok_or_else(|| StylesError::NoCompiler(input.to_path_buf()))?;
    let input_str = input.to_string_lossy();
    let args: Vec<String> = args.iter().map(|a| a.replace(INPUT_TOKEN, &input_str)).collect();

    let output = Command::new(program)
        .args(&args)
        .output()
        .map_err(|source| StylesError::Spawn {
            program: program.clone(),
            source,
        })?;
    if !output.status.success() {
        return Err(StylesError::Compiler {
            file: input.to_path_buf(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Compile and copy stylesheets from `src_dir` into `out_dir`.
pub fn build_styles(
    src_dir: &Path,
    out_dir: &Path,
    settings: &StyleSettings<'_>,
) -> Result<StageReport, StylesError> {
    let mut report = StageReport::new(Stage::Styles);
    if !src_dir.is_dir() {
        return Ok(report);
    }
    fs::create_dir_all(out_dir)?;

    for entry in WalkDir::new(src_dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(stem) = path.file_stem() else {
            continue;
        };
        let name = format!("{}.css", stem.to_string_lossy());
        let dest = out_dir.join(&name);
        if has_extension(path, settings.extension) {
            let css = compile_stylesheet(settings.compiler, path)?;
            fs::write(&dest, css)?;
        } else if has_extension(path, "css") {
            fs::copy(path, &dest)?;
        } else {
            continue;
        }
        report.written.push(name);
    }

    let lib_src = src_dir.join(settings.lib_dir);
    if !settings.lib_dir.is_empty() && lib_src.is_dir() {
        for rel in copy_tree(&lib_src, &out_dir.join(settings.lib_dir))? {
            report.written.push(format!("{}/{rel}", settings.lib_dir));
        }
    }
    Ok(report.sorted())
}
