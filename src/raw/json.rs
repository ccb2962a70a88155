//! JSON dumps of raw object graphs.
//!
//! Lets an out-of-process MS-ONESTORE decoder hand its output to this crate.
//! The dump format is:
//!
//! ```json
//! {
//!   "roots": [1],
//!   "objects": [
//!     { "id": 1, "kind": "jcidPageNode",
//!       "properties": { "CachedTitleString": { "type": "text", "value": "Title" } } }
//!   ],
//!   "blobs": { "{guid}": "iVBORw0KGgo=" }
//! }
//! ```
//!
//! Byte payloads (`bytes` properties and blobs) are standard base64.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ContainerParser, ObjectId, ParseError, RawObject, RawObjectGraph};

/// Serializable form of a [`RawObjectGraph`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDump {
    #[serde(default)]
    pub roots: Vec<ObjectId>,
    #[serde(default)]
    pub objects: Vec<RawObject>,
    #[serde(default)]
    pub blobs: BTreeMap<String, Blob>,
}

/// Base64-encoded binary payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blob(#[serde(with = "base64_bytes")] pub Vec<u8>);

impl From<GraphDump> for RawObjectGraph {
    fn from(dump: GraphDump) -> Self {
        let mut graph = RawObjectGraph::new();
        for object in dump.objects {
            graph.insert(object);
        }
        for id in dump.roots {
            graph.roots.push(id);
        }
        for (key, Blob(data)) in dump.blobs {
            graph.insert_blob(key, data);
        }
        graph
    }
}

/// [`ContainerParser`] for JSON graph dumps.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonGraphParser;

impl JsonGraphParser {
    pub fn new() -> Self {
        Self
    }
}

impl ContainerParser for JsonGraphParser {
    fn parse(&self, bytes: &[u8]) -> Result<RawObjectGraph, ParseError> {
        let dump: GraphDump = serde_json::from_slice(bytes)
            .map_err(|e| ParseError::new(format!("invalid object graph dump: {e}")))?;
        Ok(dump.into())
    }
}

pub(crate) mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.trim())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{ObjectKind, PropertyId, PropertyValue};

    #[test]
    fn test_parse_dump() {
        let json = br#"{
            "roots": [1],
            "objects": [
                {"id": 1, "kind": "jcidPageNode",
                 "properties": {
                    "CachedTitleString": {"type": "text", "value": "Hello"},
                    "ElementChildNodesOfVersionHistory": {"type": "refs", "value": [2]}
                 }},
                {"id": 2, "kind": "jcidImageNode",
                 "properties": {
                    "PictureContainer": {"type": "blob", "value": "{img}"},
                    "SomeFutureProperty": {"type": "int", "value": 4}
                 }},
                {"id": 3, "kind": "jcidInkNode"}
            ],
            "blobs": {"{img}": "R0lGODlh"}
        }"#;

        let graph = JsonGraphParser::new().parse(json).unwrap();
        assert_eq!(graph.roots(), &[ObjectId(1)]);
        assert_eq!(graph.len(), 3);

        let page = graph.object(ObjectId(1)).unwrap();
        assert_eq!(page.kind, ObjectKind::PageNode);
        assert_eq!(
            page.get(PropertyId::CachedTitleString),
            Some(&PropertyValue::Text("Hello".into()))
        );
        assert_eq!(page.refs(PropertyId::ElementChildNodes), &[ObjectId(2)]);

        let image = graph.object(ObjectId(2)).unwrap();
        let container = image.get(PropertyId::PictureContainer).unwrap();
        assert_eq!(graph.payload(container), Some(&b"GIF89a"[..]));

        assert_eq!(graph.object(ObjectId(3)).unwrap().kind, ObjectKind::Other);
    }

    #[test]
    fn test_bytes_property_is_base64() {
        let json = br#"{"objects": [{"id": 5, "kind": "jcidRichTextOENode",
            "properties": {"TextExtendedAscii": {"type": "bytes", "value": "SGk="}}}]}"#;
        let graph = JsonGraphParser::new().parse(json).unwrap();
        let text = graph.object(ObjectId(5)).unwrap();
        assert_eq!(
            text.get(PropertyId::TextExtendedAscii),
            Some(&PropertyValue::Bytes(b"Hi".to_vec()))
        );
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = JsonGraphParser::new().parse(b"\x00\x01not json").unwrap_err();
        assert!(err.message.starts_with("invalid object graph dump"));
    }
}
