use super::{tag, Decode, NilPlaceholder};
use super::{
    ARRAY16, ARRAY32, FALSE, FIXARRAY, FIXARRAY_MAX_LEN, FIXINT_MAX, FIXSTR, FIXSTR_MAX_LEN,
    FORMAT_VERSION, MAGIC, NIL, STR16, STR32, STR8, TRUE, UINT16, UINT32, UINT8,
};
use crate::error::CorruptCacheError;
use crate::metadata::LibraryMetadata;
use crate::model::*;

type Result<T> = std::result::Result<T, CorruptCacheError>;

/// Reads tokens from a borrowed byte slice.
#[derive(Debug)]
pub struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Fail unless every byte has been consumed.
    pub fn finish(&self) -> Result<()> {
        if self.remaining() == 0 {
            Ok(())
        } else {
            Err(CorruptCacheError::TrailingBytes { offset: self.pos })
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(CorruptCacheError::Truncated {
                offset: self.bytes.len(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn next_byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn peek(&self, ahead: usize) -> Result<u8> {
        self.bytes
            .get(self.pos + ahead)
            .copied()
            .ok_or(CorruptCacheError::Truncated {
                offset: self.bytes.len(),
            })
    }

    fn be_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn be_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a marker byte for a value that may not be absent.
    ///
    /// A nil token here means the stream holds a placeholder where a value
    /// is required.
    fn marker(&mut self, expected: &'static str) -> Result<(u8, usize)> {
        let offset = self.pos;
        let marker = self.next_byte()?;
        if marker == NIL {
            let byte = self.next_byte()?;
            let found = NilPlaceholder::from_byte(byte)
                .ok_or(CorruptCacheError::UnknownPlaceholder { byte, offset: offset + 1 })?;
            return Err(CorruptCacheError::PlaceholderMismatch {
                expected,
                found,
                offset,
            });
        }
        Ok((marker, offset))
    }

    pub fn read_uint(&mut self) -> Result<u32> {
        let (marker, offset) = self.marker("integer")?;
        match marker {
            0..=FIXINT_MAX => Ok(marker as u32),
            UINT8 => Ok(self.next_byte()? as u32),
            UINT16 => Ok(self.be_u16()? as u32),
            UINT32 => self.be_u32(),
            _ => Err(CorruptCacheError::UnexpectedMarker {
                expected: "integer",
                marker,
                offset,
            }),
        }
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let (marker, offset) = self.marker("boolean")?;
        match marker {
            TRUE => Ok(true),
            FALSE => Ok(false),
            _ => Err(CorruptCacheError::UnexpectedMarker {
                expected: "boolean",
                marker,
                offset,
            }),
        }
    }

    pub fn read_str(&mut self) -> Result<String> {
        let (marker, offset) = self.marker("string")?;
        let len = match marker {
            m if (FIXSTR..=FIXSTR | FIXSTR_MAX_LEN as u8).contains(&m) => (m & 0x1f) as usize,
            STR8 => self.next_byte()? as usize,
            STR16 => self.be_u16()? as usize,
            STR32 => self.be_u32()? as usize,
            _ => {
                return Err(CorruptCacheError::UnexpectedMarker {
                    expected: "string",
                    marker,
                    offset,
                })
            }
        };
        let start = self.pos;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| CorruptCacheError::InvalidUtf8 { offset: start })
    }

    pub fn read_array_header(&mut self) -> Result<usize> {
        let (marker, offset) = self.marker("array")?;
        match marker {
            m if (FIXARRAY..=FIXARRAY | FIXARRAY_MAX_LEN as u8).contains(&m) => {
                Ok((m & 0x0f) as usize)
            }
            ARRAY16 => Ok(self.be_u16()? as usize),
            ARRAY32 => Ok(self.be_u32()? as usize),
            _ => Err(CorruptCacheError::UnexpectedMarker {
                expected: "array",
                marker,
                offset,
            }),
        }
    }

    /// Consume a placeholder of the given kind if one is next.
    ///
    /// A placeholder of another kind is left in place: it belongs to an
    /// optional nested inside the value that follows.
    pub fn take_placeholder(&mut self, kind: NilPlaceholder) -> Result<bool> {
        if self.peek(0)? != NIL {
            return Ok(false);
        }
        let byte = self.peek(1)?;
        match NilPlaceholder::from_byte(byte) {
            Some(found) if found == kind => {
                self.pos += 2;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(CorruptCacheError::UnknownPlaceholder {
                byte,
                offset: self.pos + 1,
            }),
        }
    }

    fn read_optional_str(&mut self, absent: NilPlaceholder) -> Result<Option<String>> {
        if self.take_placeholder(absent)? {
            Ok(None)
        } else {
            self.read_str().map(Some)
        }
    }

    /// Check the magic bytes and format version at the start of a cache file.
    pub(crate) fn read_header(&mut self) -> Result<()> {
        if self.bytes.get(..MAGIC.len()) != Some(&MAGIC[..]) {
            return Err(CorruptCacheError::BadMagic);
        }
        self.pos = MAGIC.len();
        let found = self.next_byte()?;
        if found != FORMAT_VERSION {
            return Err(CorruptCacheError::UnsupportedVersion { found });
        }
        Ok(())
    }

    fn read_tag(&mut self, kind: &'static str, max: u32) -> Result<u32> {
        let offset = self.pos;
        let tag = self.read_uint()?;
        if tag > max {
            return Err(CorruptCacheError::UnknownTag { kind, tag, offset });
        }
        Ok(tag)
    }
}

impl Decode for LibraryMetadata {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(LibraryMetadata {
            name: dec.read_str()?,
            version: dec.read_str()?,
            author: dec.read_str()?,
            description: dec.read_str()?,
            source_url: dec.read_optional_str(NilPlaceholder::NoSourceUrl)?,
        })
    }
}

impl Decode for DocumentedFile {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(DocumentedFile {
            file_name: dec.read_str()?,
            import_path: dec.read_str()?,
            items: Vec::decode(dec)?,
        })
    }
}

impl Decode for DocumentedItem {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let subject = DocumentedType::decode(dec)?;
        let doc = InnerDoc::decode(dec)?;
        if subject.kind() != doc.kind() {
            return Err(CorruptCacheError::MismatchedItem {
                subject: subject.kind(),
                doc: doc.kind(),
            });
        }
        Ok(DocumentedItem::new(subject, doc))
    }
}

impl Decode for DocumentedType {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(match dec.read_tag("documented type", tag::TYPE_FUNCTION)? {
            tag::TYPE_ENTITY => DocumentedType::Entity(EntityType {
                library_name: dec.read_str()?,
                import_path: dec.read_str()?,
                name: dec.read_str()?,
            }),
            tag::TYPE_CONSTRUCTOR => DocumentedType::Constructor(ConstructorType {
                library_name: dec.read_str()?,
                import_path: dec.read_str()?,
                name: dec.read_str()?,
                params: Vec::decode(dec)?,
            }),
            tag::TYPE_FIELD => DocumentedType::Field(FieldType {
                library_name: dec.read_str()?,
                import_path: dec.read_str()?,
                field_type: dec.read_str()?,
                name: dec.read_str()?,
            }),
            _ => DocumentedType::Function(FunctionType {
                library_name: dec.read_str()?,
                import_path: dec.read_str()?,
                name: dec.read_str()?,
                params: Vec::decode(dec)?,
                is_native: dec.read_bool()?,
                is_static: dec.read_bool()?,
                on_entity: dec.read_optional_str(NilPlaceholder::NoOnType)?,
            }),
        })
    }
}

impl Decode for InnerDoc {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(match dec.read_tag("doc", tag::DOC_FUNCTION)? {
            tag::DOC_CONSTRUCTOR => InnerDoc::Constructor(ConstructorDoc {
                description: Option::decode(dec)?,
                param_docs: Vec::decode(dec)?,
            }),
            tag::DOC_ENTITY => {
                let description = Option::decode(dec)?;
                let contained_items = Vec::decode(dec)?;
                let on_extension_functions = Vec::decode(dec)?;
                InnerDoc::Entity(EntityDoc::with_extensions(
                    description,
                    contained_items,
                    on_extension_functions,
                ))
            }
            tag::DOC_FIELD => InnerDoc::Field(FieldDoc {
                description: Option::decode(dec)?,
                field_type: Option::decode(dec)?,
            }),
            _ => InnerDoc::Function(FunctionDoc {
                description: Option::decode(dec)?,
                param_docs: Vec::decode(dec)?,
                return_doc: Option::decode(dec)?,
                on_line: Option::decode(dec)?,
                errors: Option::decode(dec)?,
            }),
        })
    }
}

impl Decode for ParamDoc {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(ParamDoc {
            name: dec.read_str()?,
            field_type: Option::decode(dec)?,
            description: Option::decode(dec)?,
        })
    }
}

impl Decode for ReturnDoc {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(ReturnDoc {
            field_type: Option::decode(dec)?,
            description: Option::decode(dec)?,
        })
    }
}

impl Decode for DocOnLine {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(DocOnLine {
            field_type: Option::decode(dec)?,
            description: Option::decode(dec)?,
        })
    }
}

impl Decode for DocErrors {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(DocErrors {
            description: Option::decode(dec)?,
        })
    }
}

impl Decode for DocFieldType {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let origin = match dec.read_tag("type origin", tag::ORIGIN_HOST)? {
            tag::ORIGIN_SCRIPT => TypeOrigin::Script,
            _ => TypeOrigin::Host,
        };
        Ok(DocFieldType {
            origin,
            identifier: dec.read_str()?,
        })
    }
}

impl Decode for DocDescription {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(DocDescription {
            items: Vec::decode(dec)?,
        })
    }
}

impl Decode for DescriptionItem {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let kind = dec.read_tag("description item", tag::DESC_TYPE_REF)?;
        let value = dec.read_str()?;
        Ok(match kind {
            tag::DESC_TEXT => DescriptionItem::Text(value),
            tag::DESC_HOST_REF => DescriptionItem::HostRef(value),
            tag::DESC_PARAM_REF => DescriptionItem::ParamRef(value),
            _ => DescriptionItem::TypeRef(value),
        })
    }
}
