use super::{tag, Encode, NilPlaceholder, Optional};
use super::{
    ARRAY16, ARRAY32, FALSE, FIXARRAY, FIXARRAY_MAX_LEN, FIXINT_MAX, FIXSTR, FIXSTR_MAX_LEN, NIL,
    STR16, STR32, STR8, TRUE, UINT16, UINT32, UINT8,
};
use crate::metadata::LibraryMetadata;
use crate::model::*;

/// Appends tokens to an in-memory buffer.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub(crate) fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_uint(&mut self, value: u32) {
        if value <= FIXINT_MAX as u32 {
            self.buf.push(value as u8);
        } else if let Ok(v) = u8::try_from(value) {
            self.buf.push(UINT8);
            self.buf.push(v);
        } else if let Ok(v) = u16::try_from(value) {
            self.buf.push(UINT16);
            self.buf.extend_from_slice(&v.to_be_bytes());
        } else {
            self.buf.push(UINT32);
            self.buf.extend_from_slice(&value.to_be_bytes());
        }
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(if value { TRUE } else { FALSE });
    }

    pub fn write_str(&mut self, value: &str) {
        let len = value.len();
        if len <= FIXSTR_MAX_LEN {
            self.buf.push(FIXSTR | len as u8);
        } else if let Ok(l) = u8::try_from(len) {
            self.buf.push(STR8);
            self.buf.push(l);
        } else if let Ok(l) = u16::try_from(len) {
            self.buf.push(STR16);
            self.buf.extend_from_slice(&l.to_be_bytes());
        } else {
            debug_assert!(len <= u32::MAX as usize);
            self.buf.push(STR32);
            self.buf.extend_from_slice(&(len as u32).to_be_bytes());
        }
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn write_array_header(&mut self, len: usize) {
        if len <= FIXARRAY_MAX_LEN {
            self.buf.push(FIXARRAY | len as u8);
        } else if let Ok(l) = u16::try_from(len) {
            self.buf.push(ARRAY16);
            self.buf.extend_from_slice(&l.to_be_bytes());
        } else {
            debug_assert!(len <= u32::MAX as usize);
            self.buf.push(ARRAY32);
            self.buf.extend_from_slice(&(len as u32).to_be_bytes());
        }
    }

    /// Nil token followed by the kind of the absent value.
    pub fn write_placeholder(&mut self, kind: NilPlaceholder) {
        self.buf.push(NIL);
        self.buf.push(kind as u8);
    }

    fn write_optional_str(&mut self, value: Option<&str>, absent: NilPlaceholder) {
        match value {
            Some(s) => self.write_str(s),
            None => self.write_placeholder(absent),
        }
    }
}

impl Encode for LibraryMetadata {
    fn encode(&self, enc: &mut Encoder) {
        enc.write_str(&self.name);
        enc.write_str(&self.version);
        enc.write_str(&self.author);
        enc.write_str(&self.description);
        enc.write_optional_str(self.source_url.as_deref(), NilPlaceholder::NoSourceUrl);
    }
}

impl Encode for DocumentedFile {
    fn encode(&self, enc: &mut Encoder) {
        enc.write_str(&self.file_name);
        enc.write_str(&self.import_path);
        self.items.encode(enc);
    }
}

impl Encode for DocumentedItem {
    fn encode(&self, enc: &mut Encoder) {
        self.subject().encode(enc);
        self.doc().encode(enc);
    }
}

impl Encode for DocumentedType {
    fn encode(&self, enc: &mut Encoder) {
        match self {
            DocumentedType::Entity(t) => {
                enc.write_uint(tag::TYPE_ENTITY);
                enc.write_str(&t.library_name);
                enc.write_str(&t.import_path);
                enc.write_str(&t.name);
            }
            DocumentedType::Constructor(t) => {
                enc.write_uint(tag::TYPE_CONSTRUCTOR);
                enc.write_str(&t.library_name);
                enc.write_str(&t.import_path);
                enc.write_str(&t.name);
                t.params.encode(enc);
            }
            DocumentedType::Field(t) => {
                enc.write_uint(tag::TYPE_FIELD);
                enc.write_str(&t.library_name);
                enc.write_str(&t.import_path);
                enc.write_str(&t.field_type);
                enc.write_str(&t.name);
            }
            DocumentedType::Function(t) => {
                enc.write_uint(tag::TYPE_FUNCTION);
                enc.write_str(&t.library_name);
                enc.write_str(&t.import_path);
                enc.write_str(&t.name);
                t.params.encode(enc);
                enc.write_bool(t.is_native);
                enc.write_bool(t.is_static);
                enc.write_optional_str(t.on_entity.as_deref(), NilPlaceholder::NoOnType);
            }
        }
    }
}

impl Encode for InnerDoc {
    fn encode(&self, enc: &mut Encoder) {
        match self {
            InnerDoc::Constructor(doc) => {
                enc.write_uint(tag::DOC_CONSTRUCTOR);
                doc.description.encode(enc);
                doc.param_docs.encode(enc);
            }
            InnerDoc::Entity(doc) => {
                enc.write_uint(tag::DOC_ENTITY);
                doc.description.encode(enc);
                doc.contained_items.encode(enc);
                doc.on_extension_functions().encode(enc);
            }
            InnerDoc::Field(doc) => {
                enc.write_uint(tag::DOC_FIELD);
                doc.description.encode(enc);
                doc.field_type.encode(enc);
            }
            InnerDoc::Function(doc) => {
                enc.write_uint(tag::DOC_FUNCTION);
                doc.description.encode(enc);
                doc.param_docs.encode(enc);
                doc.return_doc.encode(enc);
                doc.on_line.encode(enc);
                doc.errors.encode(enc);
            }
        }
    }
}

impl Encode for ParamDoc {
    fn encode(&self, enc: &mut Encoder) {
        enc.write_str(&self.name);
        self.field_type.encode(enc);
        self.description.encode(enc);
    }
}

impl Optional for ReturnDoc {
    const ABSENT: NilPlaceholder = NilPlaceholder::NoReturn;
}

impl Encode for ReturnDoc {
    fn encode(&self, enc: &mut Encoder) {
        self.field_type.encode(enc);
        self.description.encode(enc);
    }
}

impl Optional for DocOnLine {
    const ABSENT: NilPlaceholder = NilPlaceholder::NoOnLine;
}

impl Encode for DocOnLine {
    fn encode(&self, enc: &mut Encoder) {
        self.field_type.encode(enc);
        self.description.encode(enc);
    }
}

impl Optional for DocErrors {
    const ABSENT: NilPlaceholder = NilPlaceholder::NoErrors;
}

impl Encode for DocErrors {
    fn encode(&self, enc: &mut Encoder) {
        self.description.encode(enc);
    }
}

impl Optional for DocFieldType {
    const ABSENT: NilPlaceholder = NilPlaceholder::NoFieldType;
}

impl Encode for DocFieldType {
    fn encode(&self, enc: &mut Encoder) {
        enc.write_uint(match self.origin {
            TypeOrigin::Script => tag::ORIGIN_SCRIPT,
            TypeOrigin::Host => tag::ORIGIN_HOST,
        });
        enc.write_str(&self.identifier);
    }
}

impl Optional for DocDescription {
    const ABSENT: NilPlaceholder = NilPlaceholder::NoDescription;
}

impl Encode for DocDescription {
    fn encode(&self, enc: &mut Encoder) {
        self.items.encode(enc);
    }
}

impl Encode for DescriptionItem {
    fn encode(&self, enc: &mut Encoder) {
        let (kind, value) = match self {
            DescriptionItem::Text(s) => (tag::DESC_TEXT, s),
            DescriptionItem::HostRef(s) => (tag::DESC_HOST_REF, s),
            DescriptionItem::ParamRef(s) => (tag::DESC_PARAM_REF, s),
            DescriptionItem::TypeRef(s) => (tag::DESC_TYPE_REF, s),
        };
        enc.write_uint(kind);
        enc.write_str(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_pick_the_narrowest_width() {
        let mut enc = Encoder::new();
        enc.write_uint(5);
        enc.write_uint(200);
        enc.write_uint(300);
        enc.write_uint(70_000);
        assert_eq!(
            enc.into_bytes(),
            vec![5, UINT8, 200, UINT16, 0x01, 0x2c, UINT32, 0x00, 0x01, 0x11, 0x70]
        );
    }

    #[test]
    fn short_strings_are_fixstr() {
        let mut enc = Encoder::new();
        enc.write_str("abc");
        assert_eq!(enc.into_bytes(), vec![FIXSTR | 3, b'a', b'b', b'c']);
    }
}
