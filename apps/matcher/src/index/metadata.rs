//! Metadata storage. Scalars are stored as-is; lists and objects are stored as
//! serialized JSON text and decoded on read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

/// A list or object metadata value held as its JSON encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializedField(String);

impl SerializedField {
    pub fn encode(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::to_string(value).map(Self)
    }

    pub fn decode(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.0)
    }

    /// Decodes, degrading to an empty list when the stored text is corrupt.
    pub fn decode_or_default(&self, key: &str) -> Value {
        self.decode().unwrap_or_else(|e| {
            error!("Failed to decode metadata field '{key}': {e}");
            Value::Array(Vec::new())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StoredValue {
    Scalar(Value),
    Serialized(SerializedField),
}

impl StoredValue {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Array(_) | Value::Object(_) => SerializedField::encode(value).map(Self::Serialized),
            scalar => Ok(Self::Scalar(scalar.clone())),
        }
    }

    pub fn to_value(&self, key: &str) -> Value {
        match self {
            Self::Scalar(value) => value.clone(),
            Self::Serialized(field) => field.decode_or_default(key),
        }
    }
}

pub type StoredMetadata = BTreeMap<String, StoredValue>;

pub fn encode_metadata(metadata: &Map<String, Value>) -> Result<StoredMetadata, serde_json::Error> {
    metadata
        .iter()
        .map(|(key, value)| StoredValue::from_value(value).map(|stored| (key.clone(), stored)))
        .collect()
}

pub fn decode_metadata(stored: &StoredMetadata) -> Map<String, Value> {
    stored
        .iter()
        .map(|(key, value)| (key.clone(), value.to_value(key)))
        .collect()
}
