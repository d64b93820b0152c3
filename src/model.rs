//! Data model for parsed library documentation.
//!
//! A library is a list of [`DocumentedFile`]s. Every file holds
//! [`DocumentedItem`]s, each pairing a subject ([`DocumentedType`]) with the
//! doc written for it ([`InnerDoc`]). Subjects and docs always have the same
//! [`ItemKind`].

use std::fmt;

/// One parsed source file of a library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentedFile {
    /// Bare file name, e.g. `widget.ql`
    pub file_name: String,
    /// Path relative to the library source root, `/`-separated
    pub import_path: String,
    pub items: Vec<DocumentedItem>,
}

/// The four kinds of documented things.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Entity,
    Constructor,
    Field,
    Function,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Entity => "entity",
            ItemKind::Constructor => "constructor",
            ItemKind::Field => "field",
            ItemKind::Function => "function",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subject paired with its documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentedItem {
    subject: DocumentedType,
    doc: InnerDoc,
}

impl DocumentedItem {
    /// Pair a subject with its doc.
    ///
    /// # Panics
    ///
    /// Panics if the two are of different kinds (an entity subject with a
    /// function doc, etc.). Callers building items from untrusted input must
    /// compare [`DocumentedType::kind`] and [`InnerDoc::kind`] first.
    pub fn new(subject: DocumentedType, doc: InnerDoc) -> Self {
        assert_eq!(
            subject.kind(),
            doc.kind(),
            "documented item pairs a {} subject with a {} doc",
            subject.kind(),
            doc.kind()
        );
        Self { subject, doc }
    }

    pub fn subject(&self) -> &DocumentedType {
        &self.subject
    }

    pub fn doc(&self) -> &InnerDoc {
        &self.doc
    }

    pub fn kind(&self) -> ItemKind {
        self.subject.kind()
    }

    /// The function subject and doc, if this item documents a function.
    pub fn as_function(&self) -> Option<(&FunctionType, &FunctionDoc)> {
        match (&self.subject, &self.doc) {
            (DocumentedType::Function(function), InnerDoc::Function(doc)) => Some((function, doc)),
            _ => None,
        }
    }

    /// The entity subject and doc, if this item documents an entity.
    pub fn as_entity(&self) -> Option<(&EntityType, &EntityDoc)> {
        match (&self.subject, &self.doc) {
            (DocumentedType::Entity(entity), InnerDoc::Entity(doc)) => Some((entity, doc)),
            _ => None,
        }
    }

    /// Mutable access to the entity doc. The extension list is the only
    /// part of the tree that changes after parsing.
    pub fn entity_doc_mut(&mut self) -> Option<&mut EntityDoc> {
        match &mut self.doc {
            InnerDoc::Entity(doc) => Some(doc),
            _ => None,
        }
    }
}

/// What is being documented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentedType {
    Entity(EntityType),
    Constructor(ConstructorType),
    Field(FieldType),
    Function(FunctionType),
}

impl DocumentedType {
    pub fn kind(&self) -> ItemKind {
        match self {
            DocumentedType::Entity(_) => ItemKind::Entity,
            DocumentedType::Constructor(_) => ItemKind::Constructor,
            DocumentedType::Field(_) => ItemKind::Field,
            DocumentedType::Function(_) => ItemKind::Function,
        }
    }

    pub fn library_name(&self) -> &str {
        match self {
            DocumentedType::Entity(t) => &t.library_name,
            DocumentedType::Constructor(t) => &t.library_name,
            DocumentedType::Field(t) => &t.library_name,
            DocumentedType::Function(t) => &t.library_name,
        }
    }

    pub fn import_path(&self) -> &str {
        match self {
            DocumentedType::Entity(t) => &t.import_path,
            DocumentedType::Constructor(t) => &t.import_path,
            DocumentedType::Field(t) => &t.import_path,
            DocumentedType::Function(t) => &t.import_path,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DocumentedType::Entity(t) => &t.name,
            DocumentedType::Constructor(t) => &t.name,
            DocumentedType::Field(t) => &t.name,
            DocumentedType::Function(t) => &t.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    pub library_name: String,
    pub import_path: String,
    pub name: String,
}

/// A constructor belongs to the entity whose name equals `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorType {
    pub library_name: String,
    pub import_path: String,
    pub name: String,
    pub params: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub library_name: String,
    pub import_path: String,
    /// Declared type as written in source
    pub field_type: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
    pub library_name: String,
    pub import_path: String,
    pub name: String,
    pub params: Vec<String>,
    pub is_native: bool,
    pub is_static: bool,
    /// Entity or native type this function extends (`fun f() on T`)
    pub on_entity: Option<String>,
}

impl FunctionType {
    /// The extended type, treating an empty string as no target.
    pub fn target(&self) -> Option<&str> {
        self.on_entity.as_deref().filter(|on| !on.is_empty())
    }

    /// Whether two subjects describe the same source function: same name,
    /// parameters and declaring library file.
    pub fn same_function(&self, other: &FunctionType) -> bool {
        self.name == other.name
            && self.params == other.params
            && self.library_name == other.library_name
            && self.import_path == other.import_path
    }
}

/// The documentation attached to a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InnerDoc {
    Constructor(ConstructorDoc),
    Entity(EntityDoc),
    Field(FieldDoc),
    Function(FunctionDoc),
}

impl InnerDoc {
    pub fn kind(&self) -> ItemKind {
        match self {
            InnerDoc::Constructor(_) => ItemKind::Constructor,
            InnerDoc::Entity(_) => ItemKind::Entity,
            InnerDoc::Field(_) => ItemKind::Field,
            InnerDoc::Function(_) => ItemKind::Function,
        }
    }

    pub fn description(&self) -> Option<&DocDescription> {
        match self {
            InnerDoc::Constructor(doc) => doc.description.as_ref(),
            InnerDoc::Entity(doc) => doc.description.as_ref(),
            InnerDoc::Field(doc) => doc.description.as_ref(),
            InnerDoc::Function(doc) => doc.description.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructorDoc {
    pub description: Option<DocDescription>,
    pub param_docs: Vec<ParamDoc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityDoc {
    pub description: Option<DocDescription>,
    /// Fields, functions and constructors declared in the entity body
    pub contained_items: Vec<DocumentedItem>,
    on_extension_functions: Vec<DocumentedItem>,
}

impl EntityDoc {
    pub fn new(description: Option<DocDescription>, contained_items: Vec<DocumentedItem>) -> Self {
        Self {
            description,
            contained_items,
            on_extension_functions: Vec::new(),
        }
    }

    /// Rebuild an entity doc with a known extension list (used by the decoder).
    pub fn with_extensions(
        description: Option<DocDescription>,
        contained_items: Vec<DocumentedItem>,
        on_extension_functions: Vec<DocumentedItem>,
    ) -> Self {
        Self {
            description,
            contained_items,
            on_extension_functions,
        }
    }

    /// Functions declared elsewhere that extend this entity, in the order
    /// they were added.
    pub fn on_extension_functions(&self) -> &[DocumentedItem] {
        &self.on_extension_functions
    }

    /// Whether an extension for the same source function is already recorded.
    pub fn has_extension(&self, function: &FunctionType) -> bool {
        self.on_extension_functions.iter().any(|existing| {
            existing
                .as_function()
                .is_some_and(|(existing, _)| existing.same_function(function))
        })
    }

    /// Append an extension function unless it is already present.
    ///
    /// Returns `false` for duplicates and for items that are not functions.
    pub fn add_extension(&mut self, item: DocumentedItem) -> bool {
        let Some((function, _)) = item.as_function() else {
            return false;
        };
        if self.has_extension(function) {
            return false;
        }
        self.on_extension_functions.push(item);
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDoc {
    pub description: Option<DocDescription>,
    pub field_type: Option<DocFieldType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionDoc {
    pub description: Option<DocDescription>,
    pub param_docs: Vec<ParamDoc>,
    pub return_doc: Option<ReturnDoc>,
    /// Explicit `@on` line naming the typed target, e.g. `demo.Widget`
    pub on_line: Option<DocOnLine>,
    pub errors: Option<DocErrors>,
}

/// Where a referenced type lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeOrigin {
    /// A library entity or native type, `library.Entity` or `int`
    Script,
    /// A host-platform class, e.g. `java.lang.String`
    Host,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocFieldType {
    pub origin: TypeOrigin,
    pub identifier: String,
}

impl DocFieldType {
    pub fn script(identifier: impl Into<String>) -> Self {
        Self {
            origin: TypeOrigin::Script,
            identifier: identifier.into(),
        }
    }

    pub fn host(identifier: impl Into<String>) -> Self {
        Self {
            origin: TypeOrigin::Host,
            identifier: identifier.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDoc {
    pub name: String,
    pub field_type: Option<DocFieldType>,
    pub description: Option<DocDescription>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnDoc {
    pub field_type: Option<DocFieldType>,
    pub description: Option<DocDescription>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocOnLine {
    pub field_type: Option<DocFieldType>,
    pub description: Option<DocDescription>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocErrors {
    pub description: Option<DocDescription>,
}

/// Description prose, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocDescription {
    pub items: Vec<DescriptionItem>,
}

impl DocDescription {
    pub fn new(items: Vec<DescriptionItem>) -> Self {
        Self { items }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            items: vec![DescriptionItem::Text(text.into())],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionItem {
    Text(String),
    /// Host-platform class name
    HostRef(String),
    ParamRef(String),
    /// `library.Entity` or a native type name
    TypeRef(String),
}
