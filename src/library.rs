//! One library's documentation, classified into the buckets the pages and
//! the extension splice work from.

use log::debug;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::codec::LibraryRecord;
use crate::metadata::LibraryMetadata;
use crate::model::{DocumentedFile, DocumentedItem, EntityDoc, FunctionType, InnerDoc};
use crate::resolve::resolve_target;
use crate::types::{native_entities, NATIVE_TYPES};

/// Position of an item inside a [`LibraryDocs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRef {
    File { file: usize, item: usize },
    Native(usize),
}

/// Parsed (or cache-loaded) documentation of a single library.
#[derive(Debug, Clone)]
pub struct LibraryDocs {
    metadata: LibraryMetadata,
    std_name: String,
    files: Vec<DocumentedFile>,
    native_entities: Vec<DocumentedItem>,
    entities: Vec<ItemRef>,
    functions: Vec<ItemRef>,
    fields: Vec<ItemRef>,
    on_extensions: Vec<ItemRef>,
    entity_index: HashMap<String, ItemRef>,
}

impl LibraryDocs {
    /// Classify freshly parsed files.
    pub fn from_parsed(
        metadata: LibraryMetadata,
        files: Vec<DocumentedFile>,
        std_name: &str,
    ) -> Self {
        Self::classify(metadata, files, Vec::new(), std_name)
    }

    /// Rebuild from a decoded cache file, re-running the same classification.
    pub fn from_record(record: LibraryRecord, std_name: &str) -> Self {
        Self::classify(
            record.metadata,
            record.files,
            record.native_entities,
            std_name,
        )
    }

    fn classify(
        metadata: LibraryMetadata,
        files: Vec<DocumentedFile>,
        mut natives: Vec<DocumentedItem>,
        std_name: &str,
    ) -> Self {
        let is_std = metadata.name == std_name;
        if !is_std && !natives.is_empty() {
            debug!(
                "{}: ignoring {} native entities outside the standard library",
                metadata.name,
                natives.len()
            );
            natives.clear();
        }
        if is_std && natives.is_empty() {
            natives = native_entities(std_name);
        }

        let mut docs = LibraryDocs {
            metadata,
            std_name: std_name.to_string(),
            files,
            native_entities: natives,
            entities: Vec::new(),
            functions: Vec::new(),
            fields: Vec::new(),
            on_extensions: Vec::new(),
            entity_index: HashMap::new(),
        };

        for (f, file) in docs.files.iter().enumerate() {
            for (i, item) in file.items.iter().enumerate() {
                let at = ItemRef::File { file: f, item: i };
                match item.doc() {
                    InnerDoc::Field(_) => docs.fields.push(at),
                    InnerDoc::Entity(_) => docs.entities.push(at),
                    InnerDoc::Function(_) => {
                        let has_target = item
                            .as_function()
                            .is_some_and(|(function, _)| function.target().is_some());
                        if has_target {
                            docs.on_extensions.push(at);
                        } else {
                            docs.functions.push(at);
                        }
                    }
                    // Constructors live inside their entity, never at file level.
                    InnerDoc::Constructor(_) => {}
                }
            }
        }
        docs.entities
            .extend((0..docs.native_entities.len()).map(ItemRef::Native));

        docs.sort_buckets();

        for &at in &docs.entities {
            let name = docs.item(at).subject().name().to_string();
            docs.entity_index.entry(name).or_insert(at);
        }

        // Extensions declared by this library on its own entities.
        let own_name = docs.metadata.name.clone();
        let own: Vec<DocumentedItem> = docs
            .on_extensions()
            .filter(|item| {
                resolve_target(item, std_name).is_some_and(|target| target.library == own_name)
            })
            .cloned()
            .collect();
        docs.add_extended_functions(&own);

        docs
    }

    fn sort_buckets(&mut self) {
        let mut on_extensions = std::mem::take(&mut self.on_extensions);
        on_extensions.sort_by(|a, b| {
            let key = |at: &ItemRef| self.function(*at).map(|f| (f.target(), f.name.as_str()));
            key(a).cmp(&key(b))
        });
        self.on_extensions = on_extensions;

        let mut functions = std::mem::take(&mut self.functions);
        functions.sort_by(|a, b| {
            let key =
                |at: &ItemRef| self.function(*at).map(|f| (f.target().is_some(), f.name.as_str()));
            key(a).cmp(&key(b))
        });
        self.functions = functions;

        let mut entities = std::mem::take(&mut self.entities);
        entities.sort_by(|a, b| {
            compare_entities(self.item(*a).subject().name(), self.item(*b).subject().name())
        });
        self.entities = entities;
    }

    fn function(&self, at: ItemRef) -> Option<&FunctionType> {
        self.item(at).as_function().map(|(function, _)| function)
    }

    pub fn item(&self, at: ItemRef) -> &DocumentedItem {
        match at {
            ItemRef::File { file, item } => &self.files[file].items[item],
            ItemRef::Native(i) => &self.native_entities[i],
        }
    }

    fn item_mut(&mut self, at: ItemRef) -> &mut DocumentedItem {
        match at {
            ItemRef::File { file, item } => &mut self.files[file].items[item],
            ItemRef::Native(i) => &mut self.native_entities[i],
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn metadata(&self) -> &LibraryMetadata {
        &self.metadata
    }

    pub fn std_name(&self) -> &str {
        &self.std_name
    }

    pub fn is_std(&self) -> bool {
        self.metadata.name == self.std_name
    }

    pub fn files(&self) -> &[DocumentedFile] {
        &self.files
    }

    pub fn native_entities(&self) -> &[DocumentedItem] {
        &self.native_entities
    }

    /// Entities, native types first in declaration order, then by name.
    pub fn entities(&self) -> impl Iterator<Item = &DocumentedItem> + '_ {
        self.entities.iter().map(|&at| self.item(at))
    }

    /// File-level functions that extend nothing.
    pub fn functions(&self) -> impl Iterator<Item = &DocumentedItem> + '_ {
        self.functions.iter().map(|&at| self.item(at))
    }

    pub fn fields(&self) -> impl Iterator<Item = &DocumentedItem> + '_ {
        self.fields.iter().map(|&at| self.item(at))
    }

    /// File-level functions declared `on` some type, sorted by target then name.
    pub fn on_extensions(&self) -> impl Iterator<Item = &DocumentedItem> + '_ {
        self.on_extensions.iter().map(|&at| self.item(at))
    }

    pub fn find_entity(&self, name: &str) -> Option<(&DocumentedItem, &EntityDoc)> {
        let item = self.item(*self.entity_index.get(name)?);
        item.as_entity().map(|(_, doc)| (item, doc))
    }

    fn entity_doc_mut(&mut self, name: &str) -> Option<&mut EntityDoc> {
        let at = *self.entity_index.get(name)?;
        self.item_mut(at).entity_doc_mut()
    }

    /// Attach extension functions to this library's entities.
    ///
    /// Items whose target entity is missing, or which are already attached,
    /// are skipped. Returns how many were added.
    pub fn add_extended_functions(&mut self, items: &[DocumentedItem]) -> usize {
        let mut added = 0;
        for item in items {
            let Some((function, _)) = item.as_function() else {
                debug!("{}: skipping non-function extension item", self.metadata.name);
                continue;
            };
            let Some(target) = resolve_target(item, &self.std_name) else {
                debug!(
                    "{}: {} has no resolvable target",
                    self.metadata.name, function.name
                );
                continue;
            };
            let library = self.metadata.name.clone();
            let Some(entity) = self.entity_doc_mut(&target.entity) else {
                debug!(
                    "{}: no entity {} for extension {} from {}",
                    library, target.entity, function.name, function.library_name
                );
                continue;
            };
            if entity.add_extension(item.clone()) {
                added += 1;
            } else {
                debug!(
                    "{}: duplicate extension {} on {}",
                    library, function.name, target.entity
                );
            }
        }
        added
    }
}

/// Native types sort first in declaration order, other entities by name.
fn compare_entities(a: &str, b: &str) -> Ordering {
    let native_pos = |name: &str| NATIVE_TYPES.iter().position(|n| *n == name);
    match (native_pos(a), native_pos(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
