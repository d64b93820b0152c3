//! Source parser: turns a library's `.ql` files into documented files.

pub mod ql;

use crate::model::DocumentedFile;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory under a library root holding its sources.
pub const SOURCE_DIR: &str = "qilletni-src";

/// Source file extension.
pub const SOURCE_EXTENSION: &str = "ql";

/// Parse every `.ql` file under `<root>/qilletni-src`, in path order.
pub fn parse_library(library: &str, root: &Path) -> Result<Vec<DocumentedFile>> {
    let src = root.join(SOURCE_DIR);
    if !src.is_dir() {
        bail!("{} has no {} directory", root.display(), SOURCE_DIR);
    }

    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&src.to_string_lossy()),
        SOURCE_EXTENSION
    );
    let paths = source_files(
        glob::glob(&pattern).with_context(|| format!("invalid glob pattern: {}", pattern))?,
    )
    .with_context(|| format!("failed to walk {}", src.display()))?;

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let relative = path.strip_prefix(&src).unwrap_or(path);
        let import_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(ql::parse(library, &import_path, &content));
    }
    Ok(files)
}

/// Regular files among the walked entries, sorted. An unreadable entry fails the walk.
fn source_files<E>(entries: impl IntoIterator<Item = Result<PathBuf, E>>) -> Result<Vec<PathBuf>>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?;
        if path.is_file() {
            paths.push(path);
        }
    }
    // Sort for deterministic output
    paths.sort();
    Ok(paths)
}
