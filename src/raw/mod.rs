//! Raw object graph produced by an external MS-ONESTORE parser.
//!
//! A [`RawObjectGraph`] is the decoded-but-uninterpreted form of a section
//! file: a set of typed property bags ([`RawObject`]) linked by object
//! references, plus a blob store for file data. Interpreting those bags is
//! the job of [`crate::extract`].
//!
//! The container parser itself is pluggable through [`ContainerParser`].
//! With the `json` feature, [`JsonGraphParser`] reads graph dumps written
//! as JSON.

#[cfg(feature = "json")]
mod json;

#[cfg(feature = "json")]
pub use json::{GraphDump, JsonGraphParser};

use std::collections::HashMap;

#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a raw object within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize), serde(transparent))]
pub struct ObjectId(pub u64);

/// Object type (the JCID of the source object).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
pub enum ObjectKind {
    #[cfg_attr(feature = "json", serde(rename = "jcidSectionMetaData"))]
    SectionMetaData,
    #[cfg_attr(feature = "json", serde(rename = "jcidPageSeriesNode"))]
    PageSeries,
    #[cfg_attr(feature = "json", serde(rename = "jcidPageMetaData"))]
    PageMetaData,
    #[cfg_attr(feature = "json", serde(rename = "jcidPageNode"))]
    PageNode,
    #[cfg_attr(feature = "json", serde(rename = "jcidTitleNode"))]
    TitleNode,
    #[cfg_attr(feature = "json", serde(rename = "jcidOutlineNode"))]
    OutlineNode,
    #[cfg_attr(feature = "json", serde(rename = "jcidOutlineElementNode"))]
    OutlineElement,
    #[cfg_attr(feature = "json", serde(rename = "jcidRichTextOENode"))]
    RichText,
    #[cfg_attr(feature = "json", serde(rename = "jcidImageNode"))]
    Image,
    #[cfg_attr(feature = "json", serde(rename = "jcidTableNode"))]
    Table,
    #[cfg_attr(feature = "json", serde(rename = "jcidTableRowNode"))]
    TableRow,
    #[cfg_attr(feature = "json", serde(rename = "jcidTableCellNode"))]
    TableCell,
    #[cfg_attr(feature = "json", serde(rename = "jcidEmbeddedFileNode"))]
    EmbeddedFile,
    #[cfg_attr(feature = "json", serde(rename = "jcidNumberListNode"))]
    NumberList,
    #[cfg_attr(feature = "json", serde(rename = "jcidParagraphStyleObjectForText"))]
    ParagraphStyle,
    #[cfg_attr(
        feature = "json",
        serde(rename = "jcidPersistablePropertyContainerForTOCSection")
    )]
    TextFormatting,
    /// Any object type the extractor does not interpret (ink, tags, ...).
    #[cfg_attr(feature = "json", serde(other))]
    Other,
}

impl ObjectKind {
    /// Kinds that carry page content directly.
    pub fn is_content(self) -> bool {
        matches!(
            self,
            ObjectKind::RichText | ObjectKind::Image | ObjectKind::Table | ObjectKind::EmbeddedFile
        )
    }
}

/// Property identifiers understood by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
pub enum PropertyId {
    // Section and page metadata
    SectionDisplayName,
    CachedTitleString,
    PageLevel,
    Author,
    /// Time32: seconds since 1980-01-01 UTC.
    CreationTimeStamp,
    /// FILETIME: 100 ns ticks since 1601-01-01 UTC.
    LastModifiedTime,

    // Structure
    #[cfg_attr(feature = "json", serde(rename = "ElementChildNodesOfVersionHistory"))]
    ElementChildNodes,
    #[cfg_attr(feature = "json", serde(rename = "ContentChildNodesOfOutlineElement"))]
    ContentChildNodes,
    ListNodes,

    // Text
    RichEditTextUnicode,
    TextExtendedAscii,
    TextRunIndex,
    TextRunFormatting,
    ParagraphStyle,
    ParagraphStyleId,
    IsTitleText,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
    WzHyperlinkUrl,

    // Lists
    NumberListFormat,

    // Images
    ImageFilename,
    ImageAltText,
    PictureContainer,
    PictureWidth,
    PictureHeight,

    // Embedded files
    EmbeddedFileName,
    EmbeddedFileContainer,
    SourceFilepath,

    // Tables
    RowCount,
    ColumnCount,
    TableBordersVisible,

    #[cfg_attr(feature = "json", serde(other))]
    Unknown,
}

/// A single property value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "json",
    derive(Serialize, Deserialize),
    serde(tag = "type", content = "value", rename_all = "snake_case")
)]
pub enum PropertyValue {
    Bool(bool),
    Int(u64),
    Ints(Vec<u32>),
    Text(String),
    Bytes(#[cfg_attr(feature = "json", serde(with = "json::base64_bytes"))] Vec<u8>),
    Refs(Vec<ObjectId>),
    /// Key into the graph's blob store.
    Blob(String),
}

impl PropertyValue {
    /// Interpret the value as a boolean flag.
    ///
    /// Integers and byte strings are true when non-zero; text is true for
    /// `true`, `1` or `yes`.
    pub fn as_bool(&self) -> bool {
        match self {
            PropertyValue::Bool(b) => *b,
            PropertyValue::Int(n) => *n != 0,
            PropertyValue::Bytes(bytes) => bytes.iter().any(|&b| b != 0),
            PropertyValue::Text(s) => {
                matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
            }
            PropertyValue::Ints(_) | PropertyValue::Refs(_) | PropertyValue::Blob(_) => false,
        }
    }

    /// Interpret the value as an unsigned integer.
    ///
    /// Byte strings are read little-endian (up to 8 bytes); text yields its
    /// first run of ASCII digits.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            PropertyValue::Int(n) => Some(*n),
            PropertyValue::Bool(b) => Some(u64::from(*b)),
            PropertyValue::Bytes(bytes) if !bytes.is_empty() => {
                let mut buf = [0u8; 8];
                let len = bytes.len().min(8);
                buf[..len].copy_from_slice(&bytes[..len]);
                Some(u64::from_le_bytes(buf))
            }
            PropertyValue::Text(s) => {
                let digits: String = s
                    .chars()
                    .skip_while(|c| !c.is_ascii_digit())
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                digits.parse().ok()
            }
            _ => None,
        }
    }

    /// Object references held by this value.
    pub fn as_refs(&self) -> &[ObjectId] {
        match self {
            PropertyValue::Refs(refs) => refs,
            _ => &[],
        }
    }
}

/// A typed property bag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
pub struct RawObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    #[cfg_attr(feature = "json", serde(default))]
    pub properties: HashMap<PropertyId, PropertyValue>,
}

impl RawObject {
    /// Create an object with no properties.
    pub fn new(id: u64, kind: ObjectKind) -> Self {
        Self {
            id: ObjectId(id),
            kind,
            properties: HashMap::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with(mut self, prop: PropertyId, value: PropertyValue) -> Self {
        self.properties.insert(prop, value);
        self
    }

    /// Builder-style child reference list.
    pub fn with_children(self, children: &[u64]) -> Self {
        self.with(
            PropertyId::ElementChildNodes,
            PropertyValue::Refs(children.iter().copied().map(ObjectId).collect()),
        )
    }

    /// Builder-style content reference list (outline elements only).
    pub fn with_content(self, content: &[u64]) -> Self {
        self.with(
            PropertyId::ContentChildNodes,
            PropertyValue::Refs(content.iter().copied().map(ObjectId).collect()),
        )
    }

    pub fn get(&self, prop: PropertyId) -> Option<&PropertyValue> {
        self.properties.get(&prop)
    }

    /// Boolean property, `false` when absent.
    pub fn flag(&self, prop: PropertyId) -> bool {
        self.get(prop).is_some_and(PropertyValue::as_bool)
    }

    pub fn uint(&self, prop: PropertyId) -> Option<u64> {
        self.get(prop).and_then(PropertyValue::as_u64)
    }

    /// Reference list property, empty when absent.
    pub fn refs(&self, prop: PropertyId) -> &[ObjectId] {
        self.get(prop).map(PropertyValue::as_refs).unwrap_or(&[])
    }
}

/// Decoded-but-uninterpreted contents of one section file.
#[derive(Debug, Clone, Default)]
pub struct RawObjectGraph {
    roots: Vec<ObjectId>,
    objects: HashMap<ObjectId, RawObject>,
    blobs: HashMap<String, Vec<u8>>,
}

impl RawObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object. A later object with the same id replaces the earlier one.
    pub fn insert(&mut self, object: RawObject) {
        self.objects.insert(object.id, object);
    }

    /// Append a top-level object to the reading order.
    pub fn push_root(&mut self, id: u64) {
        self.roots.push(ObjectId(id));
    }

    pub fn insert_blob(&mut self, key: impl Into<String>, data: Vec<u8>) {
        self.blobs.insert(key.into(), data);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_object(mut self, object: RawObject) -> Self {
        self.insert(object);
        self
    }

    /// Builder-style [`push_root`](Self::push_root).
    pub fn with_root(mut self, id: u64) -> Self {
        self.push_root(id);
        self
    }

    /// Builder-style [`insert_blob`](Self::insert_blob).
    pub fn with_blob(mut self, key: impl Into<String>, data: Vec<u8>) -> Self {
        self.insert_blob(key, data);
        self
    }

    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    pub fn object(&self, id: ObjectId) -> Option<&RawObject> {
        self.objects.get(&id)
    }

    pub fn blob(&self, key: &str) -> Option<&[u8]> {
        self.blobs.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over all objects of a kind, in id order.
    pub fn objects_of_kind(&self, kind: ObjectKind) -> Vec<&RawObject> {
        let mut found: Vec<&RawObject> =
            self.objects.values().filter(|o| o.kind == kind).collect();
        found.sort_by_key(|o| o.id);
        found
    }

    /// Resolve a property value to bytes, following blob references.
    pub fn payload<'a>(&'a self, value: &'a PropertyValue) -> Option<&'a [u8]> {
        match value {
            PropertyValue::Bytes(bytes) => Some(bytes),
            PropertyValue::Blob(key) => self.blob(key),
            _ => None,
        }
    }
}

/// Error reported by a container parser.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// External MS-ONESTORE decoder.
///
/// Implementors turn the raw bytes of one section file into a
/// [`RawObjectGraph`]. Closures with the matching signature implement the
/// trait, which keeps test doubles short.
pub trait ContainerParser {
    fn parse(&self, bytes: &[u8]) -> Result<RawObjectGraph, ParseError>;
}

impl<F> ContainerParser for F
where
    F: Fn(&[u8]) -> Result<RawObjectGraph, ParseError>,
{
    fn parse(&self, bytes: &[u8]) -> Result<RawObjectGraph, ParseError> {
        self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_bool() {
        assert!(PropertyValue::Bool(true).as_bool());
        assert!(PropertyValue::Int(1).as_bool());
        assert!(!PropertyValue::Int(0).as_bool());
        assert!(PropertyValue::Bytes(vec![0, 1]).as_bool());
        assert!(PropertyValue::Text("Yes".into()).as_bool());
        assert!(!PropertyValue::Text("no".into()).as_bool());
        assert!(!PropertyValue::Refs(vec![ObjectId(1)]).as_bool());
    }

    #[test]
    fn test_as_u64() {
        assert_eq!(PropertyValue::Int(7).as_u64(), Some(7));
        assert_eq!(PropertyValue::Bytes(vec![0x24, 0x00]).as_u64(), Some(36));
        assert_eq!(PropertyValue::Bytes(vec![]).as_u64(), None);
        assert_eq!(PropertyValue::Text("level 3".into()).as_u64(), Some(3));
        assert_eq!(PropertyValue::Text("none".into()).as_u64(), None);
    }

    #[test]
    fn test_payload_follows_blob_refs() {
        let graph = RawObjectGraph::new().with_blob("{guid}", vec![1, 2, 3]);
        let inline = PropertyValue::Bytes(vec![9]);
        let blob = PropertyValue::Blob("{guid}".into());
        let missing = PropertyValue::Blob("{other}".into());

        assert_eq!(graph.payload(&inline), Some(&[9u8][..]));
        assert_eq!(graph.payload(&blob), Some(&[1u8, 2, 3][..]));
        assert_eq!(graph.payload(&missing), None);
    }

    #[test]
    fn test_closure_parser() {
        let parser = |bytes: &[u8]| {
            if bytes.is_empty() {
                Err(ParseError::new("empty file"))
            } else {
                Ok(RawObjectGraph::new())
            }
        };
        assert!(parser.parse(b"x").is_ok());
        assert_eq!(parser.parse(b"").unwrap_err().to_string(), "empty file");
    }
}
