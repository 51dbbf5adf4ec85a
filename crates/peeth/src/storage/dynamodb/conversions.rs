//! DynamoDB attribute conversion functions.
//!
//! Records are JSON documents, so conversion is a structural walk between
//! `serde_json::Value` and `AttributeValue`. Pure and testable without a
//! table.

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Number, Value};

use peeth_core::storage::{Record, RecordKey, RepositoryError, Result, PK, SK};

pub type Item = HashMap<String, AttributeValue>;

// ============================================================================
// Values
// ============================================================================

pub fn json_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(json_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_attribute(v)))
                .collect(),
        ),
    }
}

/// Binary values come back as standard base64 strings.
pub fn attribute_to_json(attribute: &AttributeValue) -> Result<Value> {
    let value = match attribute {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::N(n) => Value::Number(parse_number(n)?),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::B(blob) => Value::String(encode_blob(blob)),
        AttributeValue::L(items) => Value::Array(
            items
                .iter()
                .map(attribute_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        AttributeValue::M(map) => Value::Object(item_to_document(map)?),
        AttributeValue::Ss(strings) => {
            Value::Array(strings.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(numbers) => Value::Array(
            numbers
                .iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<Result<Vec<_>>>()?,
        ),
        AttributeValue::Bs(blobs) => Value::Array(
            blobs
                .iter()
                .map(|b| Value::String(encode_blob(b)))
                .collect(),
        ),
        other => {
            return Err(RepositoryError::InvalidData(format!(
                "Unsupported attribute value: {other:?}"
            )))
        }
    };
    Ok(value)
}

fn parse_number(n: &str) -> Result<Number> {
    if let Ok(i) = n.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = n.parse::<u64>() {
        return Ok(Number::from(u));
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| RepositoryError::InvalidData(format!("Invalid number attribute: {n}")))
}

fn encode_blob(blob: &Blob) -> String {
    STANDARD.encode(blob.as_ref())
}

// ============================================================================
// Items
// ============================================================================

pub fn document_to_item(document: &Map<String, Value>) -> Item {
    document
        .iter()
        .map(|(k, v)| (k.clone(), json_to_attribute(v)))
        .collect()
}

pub fn item_to_document(item: &Item) -> Result<Map<String, Value>> {
    item.iter()
        .map(|(k, v)| Ok((k.clone(), attribute_to_json(v)?)))
        .collect()
}

pub fn record_to_item(record: Record) -> Result<Item> {
    Ok(document_to_item(&record.into_document()?))
}

pub fn item_to_record(item: &Item) -> Result<Record> {
    Record::from_document(item_to_document(item)?)
}

pub fn key_to_item(key: &RecordKey) -> Item {
    HashMap::from([
        (PK.to_string(), AttributeValue::S(key.pk.clone())),
        (SK.to_string(), AttributeValue::S(key.sk.clone())),
    ])
}

/// Placeholder values map for an expression request.
pub fn values_to_attributes(values: HashMap<String, Value>) -> Option<Item> {
    if values.is_empty() {
        return None;
    }
    Some(
        values
            .into_iter()
            .map(|(k, v)| (k, json_to_attribute(&v)))
            .collect(),
    )
}
