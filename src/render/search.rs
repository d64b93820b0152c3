//! Per-library search index (`library/<name>/index.json`).

use rayon::prelude::*;
use serde::Serialize;

use super::anchor::{
    constructor_anchor, constructor_signature, entity_url, field_signature, function_anchor,
    function_signature, library_url, Links,
};
use super::description::plain_text;
use crate::library::LibraryDocs;
use crate::model::{DocumentedItem, DocumentedType, ItemKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub parent: Option<String>,
    pub title: String,
    pub import_path: String,
    pub url: String,
    pub library: String,
    pub description: String,
}

/// Entries for every entity and its non-field members, then every extension
/// and free function.
pub fn build_index(docs: &LibraryDocs, links: &Links) -> Vec<IndexEntry> {
    let library = docs.name();
    let entities: Vec<&DocumentedItem> = docs.entities().collect();
    let functions: Vec<&DocumentedItem> = docs.on_extensions().chain(docs.functions()).collect();

    let mut entries: Vec<IndexEntry> = entities
        .par_iter()
        .flat_map_iter(|&entity| {
            let name = entity.subject().name();
            let contained = entity
                .as_entity()
                .map(|(_, doc)| doc.contained_items.as_slice())
                .unwrap_or_default();
            std::iter::once(index_entry(entity, None, library, links)).chain(
                contained
                    .iter()
                    // Fields have no anchor on entity pages.
                    .filter(|item| item.kind() != ItemKind::Field)
                    .map(move |item| index_entry(item, Some(name), library, links)),
            )
        })
        .collect();

    entries.par_extend(
        functions
            .par_iter()
            .map(|item| index_entry(item, None, library, links)),
    );
    entries
}

fn index_entry(
    item: &DocumentedItem,
    parent_entity: Option<&str>,
    library: &str,
    links: &Links,
) -> IndexEntry {
    let subject = item.subject();
    let base = match parent_entity {
        Some(entity) => entity_url(library, entity),
        None => library_url(library),
    };

    let (id, title, url, parent) = match subject {
        DocumentedType::Entity(entity) => (
            format!("{}-{}", entity.import_path, entity.name),
            entity.name.clone(),
            entity_url(library, &entity.name),
            None,
        ),
        DocumentedType::Constructor(constructor) => (
            format!("{}-{}-constructor", constructor.import_path, constructor.name),
            constructor_signature(constructor),
            format!("{}#{}", base, constructor_anchor(constructor)),
            None,
        ),
        DocumentedType::Field(field) => (
            format!("{}-{}-{}", field.import_path, field.field_type, field.name),
            field_signature(field),
            base,
            None,
        ),
        DocumentedType::Function(function) => {
            let base = match (parent_entity, function.target()) {
                (None, Some(on)) => links
                    .script_type(on)
                    .unwrap_or_else(|| library_url(library)),
                _ => base,
            };
            (
                format!(
                    "{}-{}-{}",
                    function.import_path,
                    function.name,
                    function.params.join(",")
                ),
                function_signature(function),
                format!("{}#{}", base, function_anchor(function)),
                function.target().map(str::to_string),
            )
        }
    };

    IndexEntry {
        id,
        kind: subject.kind().as_str().to_string(),
        parent: parent.or_else(|| parent_entity.map(str::to_string)),
        title,
        import_path: subject.import_path().to_string(),
        url,
        library: subject.library_name().to_string(),
        description: item
            .doc()
            .description()
            .map(|d| plain_text(d, links))
            .unwrap_or_default(),
    }
}

/// The index as pretty-printed JSON.
pub fn to_json(entries: &[IndexEntry]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::LibraryMetadata;
    use crate::model::*;

    fn library() -> LibraryDocs {
        let constructor = DocumentedItem::new(
            DocumentedType::Constructor(ConstructorType {
                library_name: "demo".to_string(),
                import_path: "widget.ql".to_string(),
                name: "Widget".to_string(),
                params: vec!["x".to_string()],
            }),
            InnerDoc::Constructor(ConstructorDoc::default()),
        );
        let field = DocumentedItem::new(
            DocumentedType::Field(FieldType {
                library_name: "demo".to_string(),
                import_path: "widget.ql".to_string(),
                field_type: "int".to_string(),
                name: "x".to_string(),
            }),
            InnerDoc::Field(FieldDoc::default()),
        );
        let widget = DocumentedItem::new(
            DocumentedType::Entity(EntityType {
                library_name: "demo".to_string(),
                import_path: "widget.ql".to_string(),
                name: "Widget".to_string(),
            }),
            InnerDoc::Entity(EntityDoc::new(
                Some(DocDescription::text("A *small* widget.")),
                vec![constructor, field],
            )),
        );
        let free = DocumentedItem::new(
            DocumentedType::Function(FunctionType {
                library_name: "demo".to_string(),
                import_path: "widget.ql".to_string(),
                name: "make".to_string(),
                params: vec!["a".to_string(), "b".to_string()],
                is_native: false,
                is_static: false,
                on_entity: None,
            }),
            InnerDoc::Function(FunctionDoc::default()),
        );
        LibraryDocs::from_parsed(
            LibraryMetadata {
                name: "demo".to_string(),
                version: "1".to_string(),
                author: "a".to_string(),
                description: "d".to_string(),
                source_url: None,
            },
            vec![DocumentedFile {
                file_name: "widget.ql".to_string(),
                import_path: "widget.ql".to_string(),
                items: vec![widget, free],
            }],
            "std",
        )
    }

    #[test]
    fn entries_cover_entities_members_and_functions() {
        let entries = build_index(&library(), &Links::new("std", None));
        let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Widget", "Widget(x)", "fun make(a, b)"]);

        assert_eq!(entries[0].kind, "entity");
        assert_eq!(entries[0].url, "/library/demo/entity/Widget.html");
        assert_eq!(entries[0].description, "A small widget.");

        assert_eq!(entries[1].parent.as_deref(), Some("Widget"));
        assert_eq!(entries[1].url, "/library/demo/entity/Widget.html#Widget%28x%29");

        assert_eq!(entries[2].id, "widget.ql-make-a,b");
        assert_eq!(entries[2].parent, None);
        assert_eq!(entries[2].url, "/library/demo/#fun+make%28a%2C+b%29");
    }

    #[test]
    fn json_uses_camel_case_and_nulls() {
        let entries = build_index(&library(), &Links::new("std", None));
        let json = to_json(&entries).unwrap();
        assert!(json.contains("\"importPath\": \"widget.ql\""));
        assert!(json.contains("\"type\": \"entity\""));
        assert!(json.contains("\"parent\": null"));
    }
}
