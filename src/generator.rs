//! Run orchestration: parse each library, persist it, then splice the
//! extension functions every library declared into the libraries they
//! target.

use anyhow::{Context, Result};
use log::{debug, error, info};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cache::CacheStore;
use crate::library::LibraryDocs;
use crate::metadata::LibraryMetadata;
use crate::model::{DocumentedFile, DocumentedItem};
use crate::parser;
use crate::render::{self, anchor::Links};
use crate::resolve::group_by_library;

/// What happened to one target library during the splice pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpliceOutcome {
    /// The cache was loaded, extended and written back.
    Spliced { added: usize },
    /// The target has not been processed yet; its extensions are dropped.
    MissingCache,
    /// Loading or re-persisting the target failed.
    Failed(String),
}

/// Summary of a generator run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Libraries whose pages and cache were written, in processing order
    pub processed: Vec<String>,
    /// Libraries (or library roots) that failed, with the error
    pub failed: Vec<(String, String)>,
    /// Splice outcome per target library
    pub splices: BTreeMap<String, SpliceOutcome>,
    /// Extension items dropped for lack of a resolvable target
    pub unresolved: usize,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
            || self
                .splices
                .values()
                .any(|outcome| matches!(outcome, SpliceOutcome::Failed(_)))
    }
}

/// Writes the documentation site and keeps the library cache in sync.
pub struct DocGenerator {
    store: CacheStore,
    output: PathBuf,
    links: Links,
}

impl DocGenerator {
    pub fn new(store: CacheStore, output: impl Into<PathBuf>, links: Links) -> Self {
        Self {
            store,
            output: output.into(),
            links,
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn std_name(&self) -> &str {
        &self.links.std_name
    }

    /// Create the output directory and write the shared assets.
    pub fn initialize_output(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output).with_context(|| {
            format!("failed to create output directory: {}", self.output.display())
        })?;
        render::write_static_assets(&self.output)
    }

    /// First pass for one library: classify, write its pages and search
    /// index, persist its cache.
    ///
    /// Returns every extension function the library declares, for
    /// [`DocGenerator::resolve_extensions`].
    pub fn process_library(
        &self,
        metadata: LibraryMetadata,
        files: Vec<DocumentedFile>,
    ) -> Result<Vec<DocumentedItem>> {
        let docs = LibraryDocs::from_parsed(metadata, files, self.std_name());
        self.publish(&docs)?;
        let extensions: Vec<DocumentedItem> = docs.on_extensions().cloned().collect();
        info!(
            "processed {} ({} files, {} extension functions)",
            docs.name(),
            docs.files().len(),
            extensions.len()
        );
        Ok(extensions)
    }

    /// [`DocGenerator::process_library`] for a library root holding
    /// `qll.info` and `qilletni-src/`.
    pub fn process_library_dir(&self, root: &Path) -> Result<(String, Vec<DocumentedItem>)> {
        let metadata = LibraryMetadata::load(root)?;
        let name = metadata.name.clone();
        let files = parser::parse_library(&name, root)
            .with_context(|| format!("failed to parse library {}", name))?;
        let extensions = self.process_library(metadata, files)?;
        Ok((name, extensions))
    }

    fn publish(&self, docs: &LibraryDocs) -> Result<()> {
        render::write_library_pages(&self.output, docs, &self.links)?;
        render::write_search_index(&self.output, docs, &self.links)?;
        self.store
            .write(docs)
            .with_context(|| format!("failed to write cache for {}", docs.name()))
    }

    /// Second pass for one target library: load its cache, attach `items`
    /// to its entities, then rewrite its pages, search index and cache.
    ///
    /// A library with no cache yet yields [`SpliceOutcome::MissingCache`] and
    /// the items are not kept anywhere. This is never retried: callers that
    /// process targets after their extenders must feed the same items again
    /// once the target exists, e.g. by running the whole pipeline again.
    /// Feeding items that are already attached changes nothing.
    pub fn splice_extensions(&self, library: &str, items: &[DocumentedItem]) -> Result<SpliceOutcome> {
        let Some(mut docs) = self
            .store
            .read(library, self.std_name())
            .with_context(|| format!("failed to load cache for {}", library))?
        else {
            info!(
                "no cache for {} yet; skipping {} extension functions",
                library,
                items.len()
            );
            return Ok(SpliceOutcome::MissingCache);
        };

        let added = docs.add_extended_functions(items);
        debug!("{}: spliced {} of {} extension functions", library, added, items.len());
        self.publish(&docs)?;
        Ok(SpliceOutcome::Spliced { added })
    }

    /// Group extension items by target library and splice each group.
    /// A failing target is logged and recorded; the others still run.
    pub fn resolve_extensions<'a, I>(&self, items: I) -> RunReport
    where
        I: IntoIterator<Item = &'a DocumentedItem>,
    {
        let grouped = group_by_library(items, self.std_name());
        let mut report = RunReport {
            unresolved: grouped.unresolved,
            ..RunReport::default()
        };

        for (library, items) in &grouped.by_library {
            let outcome = match self.splice_extensions(library, items) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("{}: {:#}", library, e);
                    SpliceOutcome::Failed(format!("{:#}", e))
                }
            };
            report.splices.insert(library.clone(), outcome);
        }
        report
    }

    /// Rewrite the site-wide index from every cached library.
    pub fn regenerate_global_index(&self) -> Result<usize> {
        let libraries = self
            .store
            .list_cached_libraries()
            .context("failed to list cached libraries")?;
        render::write_global_index(&self.output, &libraries, &self.links)?;
        info!("global index lists {} libraries", libraries.len());
        Ok(libraries.len())
    }

    /// Full run: the first pass over every root in order, the splice pass
    /// over everything they declared, then the global index.
    pub fn generate(&self, roots: &[PathBuf]) -> Result<RunReport> {
        self.initialize_output()?;

        let mut processed = Vec::new();
        let mut failed = Vec::new();
        let mut extensions = Vec::new();
        for root in roots {
            match self.process_library_dir(root) {
                Ok((name, items)) => {
                    processed.push(name);
                    extensions.extend(items);
                }
                Err(e) => {
                    error!("{}: {:#}", root.display(), e);
                    failed.push((root.display().to_string(), format!("{:#}", e)));
                }
            }
        }

        let mut report = self.resolve_extensions(&extensions);
        report.processed = processed;
        report.failed = failed;

        self.regenerate_global_index()?;
        Ok(report)
    }
}
