//! HTML pages: hand-built markup around Markdown-rendered descriptions.

use std::path::PathBuf;

use super::anchor::{
    constructor_anchor, constructor_signature, entity_url, field_anchor, field_signature,
    function_anchor, function_signature, library_url, source_file_href, source_file_url, Links,
    HTML_SUFFIX,
};
use super::description::{short_plain_text, to_html};
use super::tree::{build_file_tree, FileNode};
use super::Page;
use crate::library::LibraryDocs;
use crate::metadata::LibraryMetadata;
use crate::model::*;

/// Characters of description shown in summary lists.
const SUMMARY_LENGTH: usize = 120;

pub const STYLE_CSS: &str = "\
body { font-family: system-ui, sans-serif; max-width: 56em; margin: 2em auto; padding: 0 1em; }
nav { margin-bottom: 1.5em; }
code { background: #f4f4f4; padding: 0.15em 0.3em; border-radius: 3px; }
pre { background: #f4f4f4; padding: 1em; border-radius: 5px; overflow-x: auto; }
dt { font-weight: bold; margin-top: 0.5em; }
dd { margin-left: 1.5em; }
section.item { border-top: 1px solid #ddd; padding-top: 0.5em; }
.tag { display: inline-block; font-size: 0.75em; padding: 0.1em 0.4em; border-radius: 3px; margin-left: 0.5em; background: #e0e7ff; }
.summary { color: #555; }
ul.tree { list-style: none; padding-left: 1.2em; }
";

/// `library/<name>/index.html`
pub struct LibraryIndexPage<'a> {
    pub docs: &'a LibraryDocs,
}

/// `library/<name>/files.html`
pub struct FilesPage<'a> {
    pub docs: &'a LibraryDocs,
}

/// `library/<name>/entity/<Entity>.html`
pub struct EntityPage<'a> {
    pub docs: &'a LibraryDocs,
    pub entity: &'a DocumentedItem,
}

/// `library/<name>/file/<flattened path>.html`
pub struct SourceFilePage<'a> {
    pub docs: &'a LibraryDocs,
    pub file: &'a DocumentedFile,
}

/// Site-wide `index.html` listing every cached library.
pub struct GlobalIndexPage<'a> {
    pub libraries: &'a [LibraryMetadata],
}

fn library_dir(name: &str) -> PathBuf {
    PathBuf::from("library").join(name)
}

impl Page for LibraryIndexPage<'_> {
    fn path(&self) -> PathBuf {
        library_dir(self.docs.name()).join("index.html")
    }

    fn render(&self, links: &Links) -> String {
        let docs = self.docs;
        let meta = docs.metadata();
        let mut out = String::new();

        out.push_str(&format!("<h1>{}</h1>\n", html_escape(&meta.name)));
        out.push_str(&format!(
            "<p>Version {} by {}</p>\n",
            html_escape(&meta.version),
            html_escape(&meta.author)
        ));
        if let Some(ref url) = meta.source_url {
            out.push_str(&format!(
                "<p><a href=\"{}\">Source</a></p>\n",
                html_escape(url)
            ));
        }
        out.push_str(&format!("<p>{}</p>\n", html_escape(&meta.description)));

        let entities: Vec<_> = docs.entities().collect();
        if !entities.is_empty() {
            out.push_str("<h2>Entities</h2>\n<ul>\n");
            for entity in entities {
                let name = entity.subject().name();
                out.push_str(&format!(
                    "  <li><a href=\"{}\">{}</a>{}</li>\n",
                    html_escape(&entity_url(docs.name(), name)),
                    html_escape(name),
                    summary(entity, links)
                ));
            }
            out.push_str("</ul>\n");
        }

        let functions: Vec<_> = docs.functions().collect();
        if !functions.is_empty() {
            out.push_str("<h2>Functions</h2>\n");
            for item in functions {
                out.push_str(&render_item(item, docs.name(), links));
            }
        }

        let extensions: Vec<_> = docs.on_extensions().collect();
        if !extensions.is_empty() {
            out.push_str("<h2>Extension functions</h2>\n");
            for item in extensions {
                out.push_str(&render_item(item, docs.name(), links));
            }
        }

        let fields: Vec<_> = docs.fields().collect();
        if !fields.is_empty() {
            out.push_str("<h2>Fields</h2>\n");
            for item in fields {
                out.push_str(&render_item(item, docs.name(), links));
            }
        }

        let head = format!(
            "<meta name=\"search-index\" content=\"{}index.json\">\n",
            html_escape(&library_url(docs.name()))
        );
        layout(&meta.name, Some(docs.name()), &head, &out)
    }
}

impl Page for FilesPage<'_> {
    fn path(&self) -> PathBuf {
        library_dir(self.docs.name()).join("files.html")
    }

    fn render(&self, _links: &Links) -> String {
        let name = self.docs.name();
        let tree = build_file_tree(self.docs.files().iter().map(|f| f.import_path.as_str()));
        let mut out = format!("<h1>{} source files</h1>\n", html_escape(name));
        out.push_str(&render_tree(&tree, name));
        layout(&format!("{} files", name), Some(name), "", &out)
    }
}

fn render_tree(nodes: &[FileNode], library: &str) -> String {
    let mut out = String::from("<ul class=\"tree\">\n");
    for node in nodes {
        if node.is_dir {
            out.push_str(&format!("<li>{}/\n", html_escape(&node.name)));
            out.push_str(&render_tree(&node.children, library));
            out.push_str("</li>\n");
        } else {
            out.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                html_escape(&source_file_url(library, &node.path)),
                html_escape(&node.name)
            ));
        }
    }
    out.push_str("</ul>\n");
    out
}

impl Page for EntityPage<'_> {
    fn path(&self) -> PathBuf {
        let name = self.entity.subject().name();
        library_dir(self.docs.name())
            .join("entity")
            .join(format!("{}{}", name, HTML_SUFFIX))
    }

    fn render(&self, links: &Links) -> String {
        let library = self.docs.name();
        let name = self.entity.subject().name();
        let mut out = format!("<h1>{}</h1>\n", html_escape(name));

        let Some((entity, doc)) = self.entity.as_entity() else {
            return layout(name, Some(library), "", &out);
        };
        // Native types have no source file.
        if self.docs.files().iter().any(|f| f.import_path == entity.import_path) {
            out.push_str(&format!(
                "<p>Defined in <a href=\"{}\"><code>{}</code></a></p>\n",
                html_escape(&source_file_url(library, &entity.import_path)),
                html_escape(&entity.import_path)
            ));
        }
        if let Some(ref description) = doc.description {
            out.push_str(&to_html(description, links));
        }

        for (kind, heading) in [
            (ItemKind::Constructor, "Constructors"),
            (ItemKind::Field, "Fields"),
            (ItemKind::Function, "Functions"),
        ] {
            let items: Vec<_> = doc
                .contained_items
                .iter()
                .filter(|item| item.kind() == kind)
                .collect();
            if items.is_empty() {
                continue;
            }
            out.push_str(&format!("<h2>{}</h2>\n", heading));
            for item in items {
                out.push_str(&render_item(item, library, links));
            }
        }

        let extensions = doc.on_extension_functions();
        if !extensions.is_empty() {
            out.push_str("<h2>Extension functions</h2>\n");
            for item in extensions {
                out.push_str(&render_item(item, library, links));
            }
        }

        layout(name, Some(library), "", &out)
    }
}

impl Page for SourceFilePage<'_> {
    fn path(&self) -> PathBuf {
        library_dir(self.docs.name())
            .join("file")
            .join(format!("{}{}", source_file_href(&self.file.import_path), HTML_SUFFIX))
    }

    fn render(&self, links: &Links) -> String {
        let library = self.docs.name();
        let mut out = format!("<h1><code>{}</code></h1>\n", html_escape(&self.file.import_path));
        for item in &self.file.items {
            match item.subject() {
                DocumentedType::Entity(entity) => {
                    out.push_str(&format!(
                        "<h3>entity <a href=\"{}\">{}</a></h3>\n{}",
                        html_escape(&entity_url(library, &entity.name)),
                        html_escape(&entity.name),
                        summary(item, links)
                    ));
                }
                _ => out.push_str(&render_item(item, library, links)),
            }
        }
        layout(&self.file.import_path, Some(library), "", &out)
    }
}

impl Page for GlobalIndexPage<'_> {
    fn path(&self) -> PathBuf {
        PathBuf::from("index.html")
    }

    fn render(&self, _links: &Links) -> String {
        let mut out = String::from("<h1>Libraries</h1>\n");
        if self.libraries.is_empty() {
            out.push_str("<p><em>No libraries have been documented yet.</em></p>\n");
        } else {
            out.push_str("<dl>\n");
            for meta in self.libraries {
                out.push_str(&format!(
                    "  <dt><a href=\"{}\">{}</a> <span class=\"tag\">{}</span></dt>\n",
                    html_escape(&library_url(&meta.name)),
                    html_escape(&meta.name),
                    html_escape(&meta.version)
                ));
                out.push_str(&format!("  <dd>{}</dd>\n", html_escape(&meta.description)));
            }
            out.push_str("</dl>\n");
        }
        layout("Libraries", None, "", &out)
    }
}

fn layout(title: &str, library: Option<&str>, head: &str, body: &str) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    out.push_str("<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    out.push_str("<link rel=\"stylesheet\" href=\"/style.css\">\n");
    out.push_str(head);
    out.push_str("</head>\n<body>\n<nav><a href=\"/index.html\">All libraries</a>");
    if let Some(library) = library {
        let base = library_url(library);
        out.push_str(&format!(
            " | <a href=\"{0}\">{1}</a> | <a href=\"{0}files.html\">Files</a>",
            html_escape(&base),
            html_escape(library)
        ));
    }
    out.push_str("</nav>\n");
    out.push_str(body);
    out.push_str("</body>\n</html>\n");
    out
}

/// Short plain-text description after a list entry.
fn summary(item: &DocumentedItem, links: &Links) -> String {
    match item.doc().description() {
        Some(description) if !description.is_empty() => format!(
            " <span class=\"summary\">{}</span>",
            html_escape(&short_plain_text(description, links, SUMMARY_LENGTH))
        ),
        _ => String::new(),
    }
}

/// One function, constructor or field with its full documentation.
fn render_item(item: &DocumentedItem, page_library: &str, links: &Links) -> String {
    let (anchor, signature) = match item.subject() {
        DocumentedType::Function(function) => {
            (function_anchor(function), function_signature(function))
        }
        DocumentedType::Constructor(constructor) => (
            constructor_anchor(constructor),
            constructor_signature(constructor),
        ),
        DocumentedType::Field(field) => (field_anchor(field), field_signature(field)),
        DocumentedType::Entity(entity) => (entity.name.clone(), entity.name.clone()),
    };

    let mut out = format!(
        "<section class=\"item\" id=\"{}\">\n<pre><code>{}</code></pre>\n",
        html_escape(&anchor),
        html_escape(&signature)
    );

    let source_library = item.subject().library_name();
    if source_library != page_library {
        out.push_str(&format!(
            "<p><span class=\"tag\">from <a href=\"{}\">{}</a></span></p>\n",
            html_escape(&library_url(source_library)),
            html_escape(source_library)
        ));
    }

    if let Some(description) = item.doc().description() {
        out.push_str(&to_html(description, links));
    }

    match item.doc() {
        InnerDoc::Function(doc) => {
            out.push_str(&render_params(&doc.param_docs, links));
            if let Some(ref returns) = doc.return_doc {
                out.push_str("<h4>Returns</h4>\n");
                out.push_str(&typed_line(
                    returns.field_type.as_ref(),
                    returns.description.as_ref(),
                    links,
                ));
            }
            if let Some(ref on) = doc.on_line {
                out.push_str("<h4>On</h4>\n");
                out.push_str(&typed_line(on.field_type.as_ref(), on.description.as_ref(), links));
            }
            if let Some(ref errors) = doc.errors {
                out.push_str("<h4>Errors</h4>\n");
                if let Some(ref description) = errors.description {
                    out.push_str(&to_html(description, links));
                }
            }
        }
        InnerDoc::Constructor(doc) => out.push_str(&render_params(&doc.param_docs, links)),
        InnerDoc::Field(doc) => {
            if let Some(ref field_type) = doc.field_type {
                out.push_str("<h4>Type</h4>\n");
                out.push_str(&typed_line(Some(field_type), None, links));
            }
        }
        InnerDoc::Entity(_) => {}
    }

    out.push_str("</section>\n");
    out
}

fn render_params(params: &[ParamDoc], links: &Links) -> String {
    if params.is_empty() {
        return String::new();
    }
    let mut out = String::from("<h4>Parameters</h4>\n<dl>\n");
    for param in params {
        out.push_str(&format!("  <dt><code>{}</code>", html_escape(&param.name)));
        if let Some(ref field_type) = param.field_type {
            out.push_str(&format!(" {}", type_link(field_type, links)));
        }
        out.push_str("</dt>\n");
        if let Some(ref description) = param.description {
            out.push_str(&format!("  <dd>{}</dd>\n", to_html(description, links)));
        }
    }
    out.push_str("</dl>\n");
    out
}

fn typed_line(
    field_type: Option<&DocFieldType>,
    description: Option<&DocDescription>,
    links: &Links,
) -> String {
    let mut out = String::new();
    if let Some(field_type) = field_type {
        out.push_str(&format!("<p>{}</p>\n", type_link(field_type, links)));
    }
    if let Some(description) = description {
        out.push_str(&to_html(description, links));
    }
    out
}

fn type_link(field_type: &DocFieldType, links: &Links) -> String {
    let (name, url) = links.field_type(field_type);
    match url {
        Some(url) => format!(
            "<a href=\"{}\"><code>{}</code></a>",
            html_escape(&url),
            html_escape(&name)
        ),
        None => format!("<code>{}</code>", html_escape(&name)),
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
