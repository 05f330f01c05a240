//! Document representation: a thin wrapper over [`serde_json::Map`].

use serde_json::Map;
use serde_json::Value;
use uuid::Uuid;

use crate::error::Error;
use crate::error::Result;

/// Reserved field holding a document's primary key.
pub const ID_FIELD: &str = "_id";

/// Reserved object shape used to tag a base64-encoded byte string, since
/// `serde_json::Value` has no native bytes variant.
const BYTES_TAG: &str = "$bytes";

/// A JSON-like record. Backed by `serde_json::Map`, whose default
/// (non-`preserve_order`) implementation is a `BTreeMap`, giving documents a
/// stable, deterministic field order without an extra dependency.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// An empty document.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap an existing JSON object as a document.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Mutably borrow the underlying JSON object.
    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// Consume the document, returning the underlying JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Look up a field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a field, returning the previous value if any.
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// The document's `_id`, if set.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    /// The document's `_id`, or [`Error::MissingId`] if absent. Used by
    /// `save`/`delete`, which require an `_id`.
    pub fn require_id(&self) -> Result<&str> {
        self.id().ok_or(Error::MissingId)
    }

    /// Stamp a freshly generated, time-ordered primary key onto the
    /// document and return its canonical string form. Used by
    /// [`crate::table::Table::append`].
    pub fn assign_id(&mut self) -> String {
        let id = Uuid::now_v7().to_string();
        self.0.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        id
    }

    /// Encode a byte string as the reserved `{"$bytes": "..."}` shape.
    pub fn bytes_value(bytes: &[u8]) -> Value {
        let mut tagged = Map::new();
        tagged.insert(
            BYTES_TAG.to_string(),
            Value::String(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                bytes,
            )),
        );
        Value::Object(tagged)
    }

    /// Decode a `{"$bytes": "..."}` shape back into raw bytes, if `value`
    /// has that shape.
    pub fn as_bytes_value(value: &Value) -> Option<Vec<u8>> {
        let object = value.as_object()?;
        if object.len() != 1 {
            return None;
        }
        let encoded = object.get(BYTES_TAG)?.as_str()?;
        base64::Engine::decode(&base64::engine::general_purpose::STANDARD, encoded).ok()
    }

    /// Serialize to the compact JSON bytes stored in the primary table.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.0)?)
    }

    /// Deserialize from the bytes stored in the primary table.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let map: Map<String, Value> = serde_json::from_slice(bytes)?;
        Ok(Self(map))
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
