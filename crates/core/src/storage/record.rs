//! The generic record every entity is stored as.
//!
//! A record is a JSON document with a fixed key envelope (`PK`, `SK`, the two
//! GSI pairs and the timestamps) plus free-form domain attributes. Entity
//! modules convert their typed structs to and from records with
//! [`Record::from_entity`] and [`Record::into_entity`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{RepositoryError, Result};

// ============================================================================
// Attribute names
// ============================================================================

pub const PK: &str = "PK";
pub const SK: &str = "SK";
pub const GSI1PK: &str = "GSI1PK";
pub const GSI1SK: &str = "GSI1SK";
pub const GSI2PK: &str = "GSI2PK";
pub const GSI2SK: &str = "GSI2SK";
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";
/// Epoch seconds after which DynamoDB may expire the record.
pub const TTL: &str = "ttl";

/// Attributes that identify a record and can never be changed by an update.
pub const IMMUTABLE_ATTRIBUTES: [&str; 3] = [PK, SK, CREATED_AT];

// ============================================================================
// RecordKey
// ============================================================================

/// The composite primary key of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
}

impl RecordKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }

    /// Key whose sort key repeats the partition key, the layout used by
    /// every top-level entity.
    pub fn single(pk: impl Into<String>) -> Self {
        let pk = pk.into();
        Self { sk: pk.clone(), pk }
    }

    /// Entity type token: the partition key up to the first `#`.
    pub fn entity_type(&self) -> &str {
        entity_type_of(&self.pk)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.pk, self.sk)
    }
}

/// Returns the entity type token of a partition key value.
///
/// ```
/// use peeth_core::storage::entity_type_of;
///
/// assert_eq!(entity_type_of("CMS_PAGE#42"), "CMS_PAGE");
/// assert_eq!(entity_type_of("CMS_PAGE"), "CMS_PAGE");
/// ```
pub fn entity_type_of(pk: &str) -> &str {
    pk.split_once('#').map_or(pk, |(entity_type, _)| entity_type)
}

// ============================================================================
// Record
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    #[serde(rename = "GSI1PK", default, skip_serializing_if = "Option::is_none")]
    pub gsi1pk: Option<String>,
    #[serde(rename = "GSI1SK", default, skip_serializing_if = "Option::is_none")]
    pub gsi1sk: Option<String>,
    #[serde(rename = "GSI2PK", default, skip_serializing_if = "Option::is_none")]
    pub gsi2pk: Option<String>,
    #[serde(rename = "GSI2SK", default, skip_serializing_if = "Option::is_none")]
    pub gsi2sk: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Record {
    pub fn new(key: RecordKey) -> Self {
        Self {
            pk: key.pk,
            sk: key.sk,
            gsi1pk: None,
            gsi1sk: None,
            gsi2pk: None,
            gsi2sk: None,
            created_at: None,
            updated_at: None,
            attributes: Map::new(),
        }
    }

    /// Builds a record from any entity that serializes to a JSON object.
    ///
    /// `createdAt`/`updatedAt` fields of the entity land in the timestamp
    /// envelope; every other field becomes an attribute.
    pub fn from_entity<T: Serialize>(key: RecordKey, entity: &T) -> Result<Self> {
        let mut document = match serde_json::to_value(entity)? {
            Value::Object(map) => map,
            other => {
                return Err(RepositoryError::InvalidData(format!(
                    "entity must serialize to an object, got {other}"
                )))
            }
        };
        document.insert(PK.to_string(), Value::String(key.pk));
        document.insert(SK.to_string(), Value::String(key.sk));
        Self::from_document(document)
    }

    /// Deserializes the record's document into an entity type.
    pub fn into_entity<T: DeserializeOwned>(self) -> Result<T> {
        let document = self.into_document()?;
        Ok(serde_json::from_value(Value::Object(document))?)
    }

    pub fn from_document(document: Map<String, Value>) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(document))?)
    }

    /// Flattens the record into a single JSON object, envelope included.
    pub fn into_document(self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(RepositoryError::Serialization(format!(
                "record did not serialize to an object: {other}"
            ))),
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.pk.clone(), self.sk.clone())
    }

    pub fn entity_type(&self) -> &str {
        entity_type_of(&self.pk)
    }

    pub fn with_gsi1(mut self, pk: impl Into<String>, sk: impl Into<String>) -> Self {
        self.gsi1pk = Some(pk.into());
        self.gsi1sk = Some(sk.into());
        self
    }

    pub fn with_gsi2(mut self, pk: impl Into<String>, sk: impl Into<String>) -> Self {
        self.gsi2pk = Some(pk.into());
        self.gsi2sk = Some(sk.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.attributes.get(name).and_then(Value::as_i64)
    }

    /// Stamps the write timestamps: `createdAt` only when absent,
    /// `updatedAt` always.
    pub fn stamp(&mut self, now: DateTime<Utc>) {
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
        self.updated_at = Some(now);
    }
}
