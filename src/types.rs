//! Built-in types of the language, owned by the standard library.

use crate::model::{DocDescription, DocumentedItem, DocumentedType, EntityDoc, EntityType, InnerDoc};

/// Native types in declaration order.
pub const NATIVE_TYPES: &[&str] = &[
    "int",
    "double",
    "string",
    "boolean",
    "collection",
    "song",
    "album",
    "list",
    "java",
    "function",
];

pub fn is_native_type(name: &str) -> bool {
    NATIVE_TYPES.contains(&name)
}

pub fn native_type_description(name: &str) -> &'static str {
    match name {
        "int" => "An integer value, up to 64 bits.",
        "double" => "A double precision floating point value, up to 64 bits.",
        "string" => "A character string.",
        "boolean" => "A true/false value.",
        "collection" => "A playlist or collection of songs.",
        "song" => "A provider-agnostic piece of music that can be interacted with through service providers.",
        "album" => "A provider-agnostic musical album that can be interacted with through service providers.",
        "list" => "A dynamic collection of types.",
        "java" => "A reference to a Java object, for interacting with native methods.",
        _ => "A native type.",
    }
}

/// One pseudo-entity per native type, declared by `std_name`, with an empty
/// extension list.
pub fn native_entities(std_name: &str) -> Vec<DocumentedItem> {
    NATIVE_TYPES
        .iter()
        .map(|name| {
            DocumentedItem::new(
                DocumentedType::Entity(EntityType {
                    library_name: std_name.to_string(),
                    import_path: std_name.to_string(),
                    name: name.to_string(),
                }),
                InnerDoc::Entity(EntityDoc::new(
                    Some(DocDescription::text(native_type_description(name))),
                    Vec::new(),
                )),
            )
        })
        .collect()
}
