//! Target resolution for extension functions.
//!
//! An extension function names its target in one of two ways:
//!
//! 1. an `@on library.Entity` line in its doc comment, which names the
//!    library explicitly;
//! 2. a bare `on T` where `T` is a native type, which belongs to the
//!    standard library.
//!
//! Anything else cannot be routed to a library and is dropped.

use log::warn;
use std::collections::BTreeMap;
use std::fmt;

use crate::model::DocumentedItem;
use crate::types::is_native_type;

/// The library and entity an extension function attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionTarget {
    pub library: String,
    pub entity: String,
}

impl fmt::Display for ExtensionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.library, self.entity)
    }
}

/// Resolve where an extension function belongs. Returns `None` for
/// non-functions and for functions with no resolvable target.
pub fn resolve_target(item: &DocumentedItem, std_name: &str) -> Option<ExtensionTarget> {
    let (function, doc) = item.as_function()?;

    let typed = doc
        .on_line
        .as_ref()
        .and_then(|on| on.field_type.as_ref())
        .and_then(|field_type| split_qualified(&field_type.identifier));
    if let Some((library, entity)) = typed {
        return Some(ExtensionTarget {
            library: library.to_string(),
            entity: entity.to_string(),
        });
    }

    let on = function.target()?;
    is_native_type(on).then(|| ExtensionTarget {
        library: std_name.to_string(),
        entity: on.to_string(),
    })
}

/// `library.Entity` → `("library", "Entity")`; anything without exactly one
/// dot is not a qualified name.
fn split_qualified(identifier: &str) -> Option<(&str, &str)> {
    let (library, entity) = identifier.split_once('.')?;
    if library.is_empty() || entity.is_empty() || entity.contains('.') {
        return None;
    }
    Some((library, entity))
}

/// Extension items grouped by the library they target.
#[derive(Debug, Default)]
pub struct GroupedExtensions {
    pub by_library: BTreeMap<String, Vec<DocumentedItem>>,
    /// Items dropped because neither rule resolved a target
    pub unresolved: usize,
}

/// Group extension items by target library, dropping (and warning about)
/// any that cannot be resolved.
pub fn group_by_library<'a, I>(items: I, std_name: &str) -> GroupedExtensions
where
    I: IntoIterator<Item = &'a DocumentedItem>,
{
    let mut grouped = GroupedExtensions::default();
    for item in items {
        match resolve_target(item, std_name) {
            Some(target) => grouped
                .by_library
                .entry(target.library)
                .or_default()
                .push(item.clone()),
            None => {
                warn!(
                    "cannot resolve extension target for {} in {} (on {:?}); dropping it",
                    item.subject().name(),
                    item.subject().import_path(),
                    item.as_function().and_then(|(f, _)| f.target()).unwrap_or("")
                );
                grouped.unresolved += 1;
            }
        }
    }
    grouped
}
