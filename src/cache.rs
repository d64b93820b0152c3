//! On-disk cache of parsed libraries, one `<library>.cache` file each.

use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::codec;
use crate::error::{CacheError, Result};
use crate::library::LibraryDocs;
use crate::metadata::LibraryMetadata;

const CACHE_EXTENSION: &str = "cache";

/// Library caches stored in a single directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, library: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", library, CACHE_EXTENSION))
    }

    pub fn contains(&self, library: &str) -> bool {
        self.path_for(library).is_file()
    }

    /// Persist a library, replacing any existing cache file for it.
    ///
    /// The old file is deleted before the new one is written, so a crash in
    /// between leaves a missing or truncated file. Both are detected on the
    /// next read.
    pub fn write(&self, docs: &LibraryDocs) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;

        let bytes = codec::encode_library(docs.metadata(), docs.files(), docs.native_entities());
        let path = self.path_for(docs.name());
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::io(&path, e)),
        }
        fs::write(&path, &bytes).map_err(|e| CacheError::io(&path, e))?;
        debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Load and classify a cached library. `Ok(None)` when nothing is cached.
    pub fn read(&self, library: &str, std_name: &str) -> Result<Option<LibraryDocs>> {
        let path = self.path_for(library);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(&path, e)),
        };
        let record = codec::decode_library(&bytes)
            .map_err(|source| CacheError::Corrupt { path: path.clone(), source })?;
        debug!("read {} bytes from {}", bytes.len(), path.display());
        Ok(Some(LibraryDocs::from_record(record, std_name)))
    }

    /// Metadata of every cached library, sorted by name.
    ///
    /// Any unreadable or corrupt cache file fails the whole listing.
    pub fn list_cached_libraries(&self) -> Result<Vec<LibraryMetadata>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CacheError::io(&self.dir, e)),
        };

        let mut libraries = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| CacheError::io(&self.dir, e))?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(CACHE_EXTENSION)
            {
                continue;
            }
            let bytes = fs::read(&path).map_err(|e| CacheError::io(&path, e))?;
            let metadata = codec::decode_metadata(&bytes)
                .map_err(|source| CacheError::Corrupt { path: path.clone(), source })?;
            libraries.push(metadata);
        }
        libraries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(libraries)
    }
}
