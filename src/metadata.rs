//! Library metadata, read from a library's `qll.info` and stored at the head
//! of its cache file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Name of the metadata file at the root of every library.
pub const INFO_FILE: &str = "qll.info";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibraryMetadata {
    pub name: String,
    pub version: String,
    pub author: String,
    pub description: String,
    #[serde(default, alias = "sourceUrl")]
    pub source_url: Option<String>,
}

impl LibraryMetadata {
    /// Parse `qll.info` YAML. Unknown keys (dependencies, providers, ...)
    /// are ignored.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        let mut meta: LibraryMetadata = serde_yaml::from_str(content)?;
        meta.source_url = meta
            .source_url
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        Ok(meta)
    }

    /// Load `qll.info` from a library root directory.
    pub fn load(library_root: &Path) -> Result<Self> {
        let path = library_root.join(INFO_FILE);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("invalid {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_keys() {
        let meta = LibraryMetadata::from_yaml(
            "name: demo\nversion: 1.0.0\nauthor: Someone\ndescription: A demo\n",
        )
        .unwrap();
        assert_eq!(meta.name, "demo");
        assert_eq!(meta.version, "1.0.0");
        assert_eq!(meta.source_url, None);
    }

    #[test]
    fn source_url_trailing_slash_is_trimmed() {
        let meta = LibraryMetadata::from_yaml(
            "name: demo\nversion: '1.0'\nauthor: a\ndescription: d\nsourceUrl: https://example.com/demo/\ndependencies: []\n",
        )
        .unwrap();
        assert_eq!(meta.source_url.as_deref(), Some("https://example.com/demo"));
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = LibraryMetadata::from_yaml("name: demo\nversion: 1.0.0\n").unwrap_err();
        assert!(err.to_string().contains("author"));
    }
}
