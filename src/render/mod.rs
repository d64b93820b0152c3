//! Site output: HTML pages, per-library search index and static assets.

pub mod anchor;
pub mod description;
pub mod html;
pub mod search;
pub mod tree;

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::library::LibraryDocs;
use crate::metadata::LibraryMetadata;
use anchor::Links;
use html::{EntityPage, FilesPage, GlobalIndexPage, LibraryIndexPage, SourceFilePage};

/// A generated page at a fixed place in the site.
pub trait Page {
    /// Output path relative to the site root.
    fn path(&self) -> PathBuf;
    fn render(&self, links: &Links) -> String;
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Render `page` into the site rooted at `output`.
pub fn write_page(output: &Path, page: &dyn Page, links: &Links) -> Result<PathBuf> {
    let path = output.join(page.path());
    write_file(&path, &page.render(links))?;
    Ok(path)
}

/// Every page of one library. Returns the number of pages written.
pub fn write_library_pages(output: &Path, docs: &LibraryDocs, links: &Links) -> Result<usize> {
    let mut pages: Vec<Box<dyn Page + '_>> = Vec::new();
    pages.push(Box::new(LibraryIndexPage { docs }));
    pages.push(Box::new(FilesPage { docs }));
    pages.extend(
        docs.entities()
            .map(|entity| Box::new(EntityPage { docs, entity }) as Box<dyn Page + '_>),
    );
    pages.extend(
        docs.files()
            .iter()
            .map(|file| Box::new(SourceFilePage { docs, file }) as Box<dyn Page + '_>),
    );

    for page in &pages {
        write_page(output, page.as_ref(), links)?;
    }
    debug!("{}: wrote {} pages", docs.name(), pages.len());
    Ok(pages.len())
}

/// `library/<name>/index.json`
pub fn write_search_index(output: &Path, docs: &LibraryDocs, links: &Links) -> Result<PathBuf> {
    let entries = search::build_index(docs, links);
    let json = search::to_json(&entries)
        .with_context(|| format!("failed to serialize search index of {}", docs.name()))?;
    let path = output.join("library").join(docs.name()).join("index.json");
    write_file(&path, &json)?;
    debug!("{}: {} search entries", docs.name(), entries.len());
    Ok(path)
}

/// The site-wide library list.
pub fn write_global_index(
    output: &Path,
    libraries: &[LibraryMetadata],
    links: &Links,
) -> Result<PathBuf> {
    write_page(output, &GlobalIndexPage { libraries }, links)
}

/// `style.css` at the site root.
pub fn write_static_assets(output: &Path) -> Result<()> {
    write_file(&output.join("style.css"), html::STYLE_CSS)
}
