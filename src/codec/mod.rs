//! Binary codec for the documentation cache.
//!
//! The stream is a sequence of self-describing tokens (a MessagePack subset):
//! unsigned integers, booleans, length-prefixed UTF-8 strings, array headers
//! and nil. Values are written field by field in a fixed order; nothing is
//! looked up by key, so the encoder and decoder must walk every variant the
//! same way.
//!
//! Polymorphic values start with a small variant tag. Optional values are
//! either the value itself or a nil token followed by a [`NilPlaceholder`]
//! byte naming which optional is absent. The decoder checks that byte, which
//! keeps nested optionals (an absent `ReturnDoc` versus a present one whose
//! field type is absent) apart.

mod decoder;
mod encoder;

pub use decoder::Decoder;
pub use encoder::Encoder;

use crate::error::CorruptCacheError;
use crate::metadata::LibraryMetadata;
use crate::model::{DocumentedFile, DocumentedItem};

// -- Token markers ------------------------------------------------------------

pub(crate) const NIL: u8 = 0xc0;
pub(crate) const FALSE: u8 = 0xc2;
pub(crate) const TRUE: u8 = 0xc3;
pub(crate) const FIXINT_MAX: u8 = 0x7f;
pub(crate) const UINT8: u8 = 0xcc;
pub(crate) const UINT16: u8 = 0xcd;
pub(crate) const UINT32: u8 = 0xce;
pub(crate) const FIXSTR: u8 = 0xa0;
pub(crate) const FIXSTR_MAX_LEN: usize = 31;
pub(crate) const STR8: u8 = 0xd9;
pub(crate) const STR16: u8 = 0xda;
pub(crate) const STR32: u8 = 0xdb;
pub(crate) const FIXARRAY: u8 = 0x90;
pub(crate) const FIXARRAY_MAX_LEN: usize = 15;
pub(crate) const ARRAY16: u8 = 0xdc;
pub(crate) const ARRAY32: u8 = 0xdd;

// -- Cache file framing -------------------------------------------------------

/// Leading bytes of every cache file.
pub const MAGIC: &[u8; 4] = b"QLDC";

/// Bumped whenever the field order of any encoded type changes.
pub const FORMAT_VERSION: u8 = 1;

// -- Variant tags -------------------------------------------------------------

pub(crate) mod tag {
    pub const TYPE_ENTITY: u32 = 0;
    pub const TYPE_CONSTRUCTOR: u32 = 1;
    pub const TYPE_FIELD: u32 = 2;
    pub const TYPE_FUNCTION: u32 = 3;

    pub const DOC_CONSTRUCTOR: u32 = 0;
    pub const DOC_ENTITY: u32 = 1;
    pub const DOC_FIELD: u32 = 2;
    pub const DOC_FUNCTION: u32 = 3;

    pub const DESC_TEXT: u32 = 0;
    pub const DESC_HOST_REF: u32 = 1;
    pub const DESC_PARAM_REF: u32 = 2;
    pub const DESC_TYPE_REF: u32 = 3;

    pub const ORIGIN_SCRIPT: u32 = 0;
    pub const ORIGIN_HOST: u32 = 1;
}

/// Which optional value a nil token stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NilPlaceholder {
    NoErrors = 0,
    NoOnLine = 1,
    NoOnType = 2,
    NoReturn = 3,
    NoFieldType = 4,
    NoDescription = 5,
    NoSourceUrl = 6,
}

impl NilPlaceholder {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => NilPlaceholder::NoErrors,
            1 => NilPlaceholder::NoOnLine,
            2 => NilPlaceholder::NoOnType,
            3 => NilPlaceholder::NoReturn,
            4 => NilPlaceholder::NoFieldType,
            5 => NilPlaceholder::NoDescription,
            6 => NilPlaceholder::NoSourceUrl,
            _ => return None,
        })
    }
}

// -- Traits -------------------------------------------------------------------

/// A value that can be written to the cache stream.
pub trait Encode {
    fn encode(&self, enc: &mut Encoder);
}

/// A value that can be read back from the cache stream.
pub trait Decode: Sized {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CorruptCacheError>;
}

/// A type that may be legitimately absent, and the placeholder written
/// in its place.
pub trait Optional {
    const ABSENT: NilPlaceholder;
}

impl<T: Encode + Optional> Encode for Option<T> {
    fn encode(&self, enc: &mut Encoder) {
        match self {
            Some(value) => value.encode(enc),
            None => enc.write_placeholder(T::ABSENT),
        }
    }
}

impl<T: Decode + Optional> Decode for Option<T> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CorruptCacheError> {
        if dec.take_placeholder(T::ABSENT)? {
            Ok(None)
        } else {
            T::decode(dec).map(Some)
        }
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, enc: &mut Encoder) {
        enc.write_array_header(self.len());
        for value in self {
            value.encode(enc);
        }
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, enc: &mut Encoder) {
        self.as_slice().encode(enc);
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CorruptCacheError> {
        let len = dec.read_array_header()?;
        // Every element takes at least one byte; don't trust a corrupt count.
        let mut values = Vec::with_capacity(len.min(dec.remaining()));
        for _ in 0..len {
            values.push(T::decode(dec)?);
        }
        Ok(values)
    }
}

impl Encode for String {
    fn encode(&self, enc: &mut Encoder) {
        enc.write_str(self);
    }
}

impl Decode for String {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CorruptCacheError> {
        dec.read_str()
    }
}

// -- Whole values -------------------------------------------------------------

/// Encode a single value with no framing.
pub fn to_bytes<T: Encode + ?Sized>(value: &T) -> Vec<u8> {
    let mut enc = Encoder::new();
    value.encode(&mut enc);
    enc.into_bytes()
}

/// Decode a single value, requiring the whole slice to be consumed.
pub fn from_bytes<T: Decode>(bytes: &[u8]) -> Result<T, CorruptCacheError> {
    let mut dec = Decoder::new(bytes);
    let value = T::decode(&mut dec)?;
    dec.finish()?;
    Ok(value)
}

/// Everything stored in one library cache file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRecord {
    pub metadata: LibraryMetadata,
    pub files: Vec<DocumentedFile>,
    /// Native pseudo-entities with their extension lists (standard library only)
    pub native_entities: Vec<DocumentedItem>,
}

/// Encode a full cache file: header, metadata, file records, native entities.
pub fn encode_library(
    metadata: &LibraryMetadata,
    files: &[DocumentedFile],
    native_entities: &[DocumentedItem],
) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.write_raw(MAGIC);
    enc.write_raw(&[FORMAT_VERSION]);
    metadata.encode(&mut enc);
    files.encode(&mut enc);
    native_entities.encode(&mut enc);
    enc.into_bytes()
}

/// Decode a full cache file.
pub fn decode_library(bytes: &[u8]) -> Result<LibraryRecord, CorruptCacheError> {
    let mut dec = Decoder::new(bytes);
    dec.read_header()?;
    let metadata = LibraryMetadata::decode(&mut dec)?;
    let files = Vec::<DocumentedFile>::decode(&mut dec)?;
    let native_entities = Vec::<DocumentedItem>::decode(&mut dec)?;
    dec.finish()?;
    Ok(LibraryRecord {
        metadata,
        files,
        native_entities,
    })
}

/// Decode only the metadata at the head of a cache file.
pub fn decode_metadata(bytes: &[u8]) -> Result<LibraryMetadata, CorruptCacheError> {
    let mut dec = Decoder::new(bytes);
    dec.read_header()?;
    LibraryMetadata::decode(&mut dec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    fn text(s: &str) -> Option<DocDescription> {
        Some(DocDescription::text(s))
    }

    fn function_item(doc: FunctionDoc, on_entity: Option<&str>) -> DocumentedItem {
        DocumentedItem::new(
            DocumentedType::Function(FunctionType {
                library_name: "ext".to_string(),
                import_path: "ext/widgets.ql".to_string(),
                name: "double".to_string(),
                params: vec!["x".to_string(), "y".to_string()],
                is_native: true,
                is_static: false,
                on_entity: on_entity.map(str::to_string),
            }),
            InnerDoc::Function(doc),
        )
    }

    fn full_function_doc() -> FunctionDoc {
        FunctionDoc {
            description: Some(DocDescription::new(vec![
                DescriptionItem::Text("Doubles ".to_string()),
                DescriptionItem::ParamRef("x".to_string()),
                DescriptionItem::Text(" into a ".to_string()),
                DescriptionItem::TypeRef("demo.Widget".to_string()),
                DescriptionItem::HostRef("java.lang.String".to_string()),
            ])),
            param_docs: vec![
                ParamDoc {
                    name: "x".to_string(),
                    field_type: Some(DocFieldType::script("int")),
                    description: text("the value"),
                },
                ParamDoc {
                    name: "y".to_string(),
                    field_type: None,
                    description: None,
                },
            ],
            return_doc: Some(ReturnDoc {
                field_type: Some(DocFieldType::host("java.lang.Integer")),
                description: text("twice x"),
            }),
            on_line: Some(DocOnLine {
                field_type: Some(DocFieldType::script("demo.Widget")),
                description: None,
            }),
            errors: Some(DocErrors {
                description: text("never"),
            }),
        }
    }

    fn entity_item() -> DocumentedItem {
        let constructor = DocumentedItem::new(
            DocumentedType::Constructor(ConstructorType {
                library_name: "demo".to_string(),
                import_path: "widget.ql".to_string(),
                name: "Widget".to_string(),
                params: vec!["x".to_string()],
            }),
            InnerDoc::Constructor(ConstructorDoc {
                description: text("Makes a widget"),
                param_docs: vec![],
            }),
        );
        let field = DocumentedItem::new(
            DocumentedType::Field(FieldType {
                library_name: "demo".to_string(),
                import_path: "widget.ql".to_string(),
                field_type: "int".to_string(),
                name: "x".to_string(),
            }),
            InnerDoc::Field(FieldDoc {
                description: None,
                field_type: Some(DocFieldType::script("int")),
            }),
        );
        DocumentedItem::new(
            DocumentedType::Entity(EntityType {
                library_name: "demo".to_string(),
                import_path: "widget.ql".to_string(),
                name: "Widget".to_string(),
            }),
            InnerDoc::Entity(EntityDoc::with_extensions(
                text("A widget."),
                vec![constructor, field],
                vec![function_item(FunctionDoc::default(), Some("Widget"))],
            )),
        )
    }

    fn metadata() -> LibraryMetadata {
        LibraryMetadata {
            name: "demo".to_string(),
            version: "1.2.0".to_string(),
            author: "Someone".to_string(),
            description: "Demo library".to_string(),
            source_url: None,
        }
    }

    #[test]
    fn function_with_every_optional_present_round_trips() {
        let item = function_item(full_function_doc(), Some("Widget"));
        assert_eq!(from_bytes::<DocumentedItem>(&to_bytes(&item)).unwrap(), item);
    }

    #[test]
    fn function_with_every_optional_absent_round_trips() {
        let item = function_item(FunctionDoc::default(), None);
        assert_eq!(from_bytes::<DocumentedItem>(&to_bytes(&item)).unwrap(), item);
    }

    #[test]
    fn nested_optional_field_types_round_trip() {
        // Present docs whose own optional parts are all absent.
        let doc = FunctionDoc {
            description: Some(DocDescription::default()),
            param_docs: vec![],
            return_doc: Some(ReturnDoc::default()),
            on_line: Some(DocOnLine::default()),
            errors: Some(DocErrors::default()),
        };
        let item = function_item(doc, Some(""));
        assert_eq!(from_bytes::<DocumentedItem>(&to_bytes(&item)).unwrap(), item);
    }

    #[test]
    fn absent_return_with_present_errors_keeps_its_shape() {
        let doc = FunctionDoc {
            description: None,
            param_docs: vec![],
            return_doc: None,
            on_line: None,
            errors: Some(DocErrors {
                description: text("fails on empty input"),
            }),
        };
        let item = function_item(doc, None);
        let decoded = from_bytes::<DocumentedItem>(&to_bytes(&item)).unwrap();
        let (_, decoded_doc) = decoded.as_function().unwrap();
        assert!(decoded_doc.return_doc.is_none());
        assert!(decoded_doc.on_line.is_none());
        assert_eq!(
            decoded_doc.errors.as_ref().unwrap().description,
            text("fails on empty input")
        );
    }

    #[test]
    fn entity_with_contained_items_and_extensions_round_trips() {
        let item = entity_item();
        assert_eq!(from_bytes::<DocumentedItem>(&to_bytes(&item)).unwrap(), item);
    }

    #[test]
    fn empty_lists_are_zero_counts_not_nil() {
        let description = DocDescription::default();
        assert_eq!(to_bytes(&description), vec![FIXARRAY]);
        let none: Option<DocDescription> = None;
        assert_eq!(
            to_bytes(&none),
            vec![NIL, NilPlaceholder::NoDescription as u8]
        );
    }

    #[test]
    fn library_round_trips_with_header() {
        let files = vec![
            DocumentedFile {
                file_name: "widget.ql".to_string(),
                import_path: "widget.ql".to_string(),
                items: vec![entity_item(), function_item(full_function_doc(), None)],
            },
            DocumentedFile {
                file_name: "empty.ql".to_string(),
                import_path: "nested/empty.ql".to_string(),
                items: vec![],
            },
        ];
        let mut meta = metadata();
        meta.source_url = Some("https://example.com/demo".to_string());

        let bytes = encode_library(&meta, &files, &[]);
        assert_eq!(&bytes[..4], MAGIC);

        let record = decode_library(&bytes).unwrap();
        assert_eq!(record.metadata, meta);
        assert_eq!(record.files, files);
        assert!(record.native_entities.is_empty());
        assert_eq!(decode_metadata(&bytes).unwrap(), meta);
    }

    #[test]
    fn long_strings_and_lists_use_wide_headers() {
        let long = "x".repeat(70_000);
        assert_eq!(from_bytes::<String>(&to_bytes(&long)).unwrap(), long);

        let many: Vec<String> = (0..300).map(|i| i.to_string()).collect();
        assert_eq!(from_bytes::<Vec<String>>(&to_bytes(&many)).unwrap(), many);
    }

    #[test]
    fn corrupt_variant_tag_is_rejected() {
        let item = function_item(FunctionDoc::default(), None);
        let mut bytes = to_bytes(&item);
        // First byte is the subject tag (fixint 3).
        assert_eq!(bytes[0], 3);
        bytes[0] = 9;
        assert_eq!(
            from_bytes::<DocumentedItem>(&bytes),
            Err(CorruptCacheError::UnknownTag {
                kind: "documented type",
                tag: 9,
                offset: 0
            })
        );

        bytes[0] = 0xff;
        assert!(matches!(
            from_bytes::<DocumentedItem>(&bytes),
            Err(CorruptCacheError::UnexpectedMarker { .. })
        ));
    }

    #[test]
    fn corrupt_description_item_tag_is_rejected() {
        let description = DocDescription::text("hi");
        let mut bytes = to_bytes(&description);
        // [fixarray 1][tag][fixstr...]
        bytes[1] = 4;
        assert!(matches!(
            from_bytes::<DocDescription>(&bytes),
            Err(CorruptCacheError::UnknownTag { kind: "description item", tag: 4, .. })
        ));
    }

    #[test]
    fn wrong_placeholder_kind_is_rejected() {
        let none: Option<DocErrors> = None;
        let mut bytes = to_bytes(&none);
        bytes[1] = NilPlaceholder::NoOnLine as u8;
        assert!(matches!(
            from_bytes::<Option<DocErrors>>(&bytes),
            Err(CorruptCacheError::PlaceholderMismatch {
                found: NilPlaceholder::NoOnLine,
                ..
            })
        ));

        bytes[1] = 42;
        assert!(matches!(
            from_bytes::<Option<DocErrors>>(&bytes),
            Err(CorruptCacheError::UnknownPlaceholder { byte: 42, .. })
        ));
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let bytes = encode_library(
            &metadata(),
            &[DocumentedFile {
                file_name: "widget.ql".to_string(),
                import_path: "widget.ql".to_string(),
                items: vec![entity_item()],
            }],
            &[],
        );
        for cut in [5, bytes.len() / 2, bytes.len() - 1] {
            assert!(matches!(
                decode_library(&bytes[..cut]),
                Err(CorruptCacheError::Truncated { .. })
            ));
        }
    }

    #[test]
    fn header_is_checked() {
        let mut bytes = encode_library(&metadata(), &[], &[]);
        bytes[FORMAT_VERSION_OFFSET] = 99;
        assert_eq!(
            decode_library(&bytes),
            Err(CorruptCacheError::UnsupportedVersion { found: 99 })
        );
        bytes[0] = b'X';
        assert_eq!(decode_metadata(&bytes), Err(CorruptCacheError::BadMagic));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = encode_library(&metadata(), &[], &[]);
        bytes.push(0);
        assert!(matches!(
            decode_library(&bytes),
            Err(CorruptCacheError::TrailingBytes { .. })
        ));
    }

    #[test]
    fn mismatched_subject_and_doc_is_rejected() {
        let mut enc = Encoder::new();
        // Entity subject followed by a field doc.
        enc.write_uint(tag::TYPE_ENTITY);
        enc.write_str("demo");
        enc.write_str("widget.ql");
        enc.write_str("Widget");
        enc.write_uint(tag::DOC_FIELD);
        enc.write_placeholder(NilPlaceholder::NoDescription);
        enc.write_placeholder(NilPlaceholder::NoFieldType);
        assert_eq!(
            from_bytes::<DocumentedItem>(&enc.into_bytes()),
            Err(CorruptCacheError::MismatchedItem {
                subject: ItemKind::Entity,
                doc: ItemKind::Field
            })
        );
    }

    const FORMAT_VERSION_OFFSET: usize = 4;
}
