//! Signatures, anchors and URLs shared by every page.

use std::fmt::Write;

use crate::model::{ConstructorType, DocFieldType, FieldType, FunctionType, TypeOrigin};
use crate::types::is_native_type;

/// Extension appended to every generated page link.
pub const HTML_SUFFIX: &str = ".html";

/// `[native ][static ]fun name(a, b)[ on T]`
pub fn function_signature(function: &FunctionType) -> String {
    let mut out = String::new();
    if function.is_native {
        out.push_str("native ");
    }
    if function.is_static {
        out.push_str("static ");
    }
    let _ = write!(out, "fun {}({})", function.name, function.params.join(", "));
    if let Some(on) = function.target() {
        let _ = write!(out, " on {}", on);
    }
    out
}

/// `Name(a, b)`
pub fn constructor_signature(constructor: &ConstructorType) -> String {
    format!("{}({})", constructor.name, constructor.params.join(", "))
}

/// `type name`
pub fn field_signature(field: &FieldType) -> String {
    format!("{} {}", field.field_type, field.name)
}

pub fn function_anchor(function: &FunctionType) -> String {
    form_encode(&function_signature(function))
}

pub fn constructor_anchor(constructor: &ConstructorType) -> String {
    form_encode(&constructor_signature(constructor))
}

pub fn field_anchor(field: &FieldType) -> String {
    form_encode(&field_signature(field))
}

/// Page name of a source file: its import path with `/` replaced by `_`.
pub fn source_file_href(import_path: &str) -> String {
    import_path.replace('\\', "/").replace('/', "_")
}

/// `application/x-www-form-urlencoded` encoding: spaces become `+`.
pub fn form_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'-' | b'*' | b'_' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}

pub fn library_url(library: &str) -> String {
    format!("/library/{}/", form_encode(library))
}

pub fn entity_url(library: &str, entity: &str) -> String {
    format!(
        "/library/{}/entity/{}{}",
        form_encode(library),
        form_encode(entity),
        HTML_SUFFIX
    )
}

pub fn source_file_url(library: &str, import_path: &str) -> String {
    format!(
        "/library/{}/file/{}{}",
        form_encode(library),
        source_file_href(import_path),
        HTML_SUFFIX
    )
}

/// Last segment of a dotted name: `java.lang.String` → `String`.
pub fn short_name(identifier: &str) -> &str {
    identifier.rsplit('.').next().unwrap_or(identifier)
}

/// Link targets that depend on run configuration.
#[derive(Debug, Clone)]
pub struct Links {
    pub std_name: String,
    /// Base URL of the host platform's API docs
    pub host_docs_url: Option<String>,
}

impl Links {
    pub fn new(std_name: impl Into<String>, host_docs_url: Option<String>) -> Self {
        Self {
            std_name: std_name.into(),
            host_docs_url: host_docs_url.map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    /// Page of a script type: a native type or `library.Entity`.
    pub fn script_type(&self, identifier: &str) -> Option<String> {
        if is_native_type(identifier) {
            return Some(entity_url(&self.std_name, identifier));
        }
        let (library, entity) = identifier.split_once('.')?;
        if library.is_empty() || entity.is_empty() || entity.contains('.') {
            return None;
        }
        Some(entity_url(library, entity))
    }

    /// API doc page of a fully qualified host class.
    pub fn host_type(&self, identifier: &str) -> Option<String> {
        let base = self.host_docs_url.as_deref()?;
        if !identifier.contains('.') {
            return None;
        }
        Some(format!("{}/{}{}", base, identifier.replace('.', "/"), HTML_SUFFIX))
    }

    /// Display name and link of a documented type.
    pub fn field_type(&self, field_type: &DocFieldType) -> (String, Option<String>) {
        let name = short_name(&field_type.identifier).to_string();
        let url = match field_type.origin {
            TypeOrigin::Script => self.script_type(&field_type.identifier),
            TypeOrigin::Host => self.host_type(&field_type.identifier),
        };
        (name, url)
    }
}
