//! Partial updates.
//!
//! Callers describe an update either as a native expression with placeholder
//! maps ([`Update::Native`]) or as a list of simple field changes
//! ([`Update::Fields`]). Both normalize to [`UpdateAction`]s, which the
//! document backend applies in place and the DynamoDB backend renders back
//! into an expression.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

use super::expression::parse_update_expression;
use super::record::{Record, IMMUTABLE_ATTRIBUTES, UPDATED_AT};
use super::{RecordKey, RepositoryError, Result};

/// One normalized change to a single top-level attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// Overwrite the attribute.
    Set { attribute: String, value: Value },
    /// Set the attribute only when it is missing.
    SetIfAbsent { attribute: String, value: Value },
    /// Append elements to a list attribute, creating it when missing.
    Append { attribute: String, values: Vec<Value> },
    /// Add a number to a numeric attribute, treating missing as zero.
    Add { attribute: String, value: Number },
    Remove { attribute: String },
}

impl UpdateAction {
    pub fn attribute(&self) -> &str {
        match self {
            UpdateAction::Set { attribute, .. }
            | UpdateAction::SetIfAbsent { attribute, .. }
            | UpdateAction::Append { attribute, .. }
            | UpdateAction::Add { attribute, .. }
            | UpdateAction::Remove { attribute } => attribute,
        }
    }
}

/// Native update expression with `#name` and `:value` placeholder maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeUpdate {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, Value>,
}

impl NativeUpdate {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            ..Default::default()
        }
    }

    pub fn name(mut self, placeholder: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.names.insert(placeholder.into(), attribute.into());
        self
    }

    pub fn value(mut self, placeholder: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(placeholder.into(), value.into());
        self
    }
}

/// Simplified field changes, built fluently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdate {
    actions: Vec<UpdateAction>,
}

impl FieldUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets every entry of a JSON object, the common "patch these fields" case.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        fields
            .into_iter()
            .fold(Self::new(), |update, (name, value)| update.set(name, value))
    }

    pub fn set(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.actions.push(UpdateAction::Set {
            attribute: attribute.into(),
            value: value.into(),
        });
        self
    }

    pub fn remove(mut self, attribute: impl Into<String>) -> Self {
        self.actions.push(UpdateAction::Remove {
            attribute: attribute.into(),
        });
        self
    }

    pub fn increment(mut self, attribute: impl Into<String>, by: i64) -> Self {
        self.actions.push(UpdateAction::Add {
            attribute: attribute.into(),
            value: Number::from(by),
        });
        self
    }

    pub fn append(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.actions.push(UpdateAction::Append {
            attribute: attribute.into(),
            values: vec![value.into()],
        });
        self
    }

    /// Changes that turn `before` into `after`, covering only the
    /// attributes whose values differ.
    ///
    /// Key attributes and the timestamps are skipped. Attributes the two
    /// records agree on are left out, so a concurrent write to them survives.
    pub fn diff(before: &Record, after: &Record) -> Result<Self> {
        let before = before.clone().into_document()?;
        let after = after.clone().into_document()?;
        let tracked = |name: &str| !IMMUTABLE_ATTRIBUTES.contains(&name) && name != UPDATED_AT;

        let mut update = Self::new();
        for (name, value) in after.iter().filter(|(name, _)| tracked(name)) {
            if before.get(name) != Some(value) {
                update = update.set(name.clone(), value.clone());
            }
        }
        for name in before.keys().filter(|name| tracked(name)) {
            if !after.contains_key(name) {
                update = update.remove(name.clone());
            }
        }
        Ok(update)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Native(NativeUpdate),
    Fields(FieldUpdate),
}

impl Update {
    /// Normalizes the update into validated actions.
    ///
    /// Fails with `InvalidData` when the expression does not parse, when
    /// nothing would change, or when an action targets `PK`, `SK` or
    /// `createdAt`.
    pub fn into_actions(self) -> Result<Vec<UpdateAction>> {
        let actions = match self {
            Update::Native(native) => {
                parse_update_expression(&native.expression, &native.names, &native.values)?
            }
            Update::Fields(fields) => fields.actions,
        };

        if actions.is_empty() {
            return Err(RepositoryError::InvalidData(
                "Update contains no changes".to_string(),
            ));
        }

        if let Some(action) = actions
            .iter()
            .find(|action| IMMUTABLE_ATTRIBUTES.contains(&action.attribute()))
        {
            return Err(RepositoryError::InvalidData(format!(
                "Attribute '{}' cannot be updated",
                action.attribute()
            )));
        }

        Ok(actions)
    }
}

impl From<FieldUpdate> for Update {
    fn from(fields: FieldUpdate) -> Self {
        Update::Fields(fields)
    }
}

impl From<NativeUpdate> for Update {
    fn from(native: NativeUpdate) -> Self {
        Update::Native(native)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOptions {
    pub key: RecordKey,
    pub update: Update,
}

impl UpdateOptions {
    pub fn new(key: RecordKey, update: impl Into<Update>) -> Self {
        Self {
            key,
            update: update.into(),
        }
    }
}

/// Applies normalized actions to a flattened record document.
pub fn apply_actions(document: &mut Map<String, Value>, actions: &[UpdateAction]) -> Result<()> {
    for action in actions {
        match action {
            UpdateAction::Set { attribute, value } => {
                document.insert(attribute.clone(), value.clone());
            }
            UpdateAction::SetIfAbsent { attribute, value } => {
                document
                    .entry(attribute.clone())
                    .or_insert_with(|| value.clone());
            }
            UpdateAction::Append { attribute, values } => {
                let entry = document
                    .entry(attribute.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                match entry {
                    Value::Array(items) => items.extend(values.iter().cloned()),
                    other => {
                        return Err(RepositoryError::InvalidData(format!(
                            "Cannot append to non-list attribute '{attribute}': {other}"
                        )))
                    }
                }
            }
            UpdateAction::Add { attribute, value } => {
                let current = match document.get(attribute) {
                    None | Some(Value::Null) => Number::from(0),
                    Some(Value::Number(n)) => n.clone(),
                    Some(other) => {
                        return Err(RepositoryError::InvalidData(format!(
                            "Cannot add to non-numeric attribute '{attribute}': {other}"
                        )))
                    }
                };
                document.insert(attribute.clone(), Value::Number(add_numbers(&current, value)?));
            }
            UpdateAction::Remove { attribute } => {
                document.remove(attribute);
            }
        }
    }
    Ok(())
}

/// Replaces any caller-supplied `updatedAt` change with a fresh stamp.
pub fn with_update_stamp(actions: Vec<UpdateAction>, now: DateTime<Utc>) -> Vec<UpdateAction> {
    let mut actions: Vec<_> = actions
        .into_iter()
        .filter(|action| action.attribute() != UPDATED_AT)
        .collect();
    actions.push(UpdateAction::Set {
        attribute: UPDATED_AT.to_string(),
        value: Value::String(now.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    });
    actions
}

fn add_numbers(a: &Number, b: &Number) -> Result<Number> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Ok(Number::from(sum));
        }
    }
    let sum = a.as_f64().unwrap_or_default() + b.as_f64().unwrap_or_default();
    Number::from_f64(sum)
        .ok_or_else(|| RepositoryError::InvalidData(format!("Numeric overflow adding {a} and {b}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_apply_set_remove_and_increment() {
        let mut doc = document(json!({"title": "old", "views": 2, "draft": true}));
        let actions = FieldUpdate::new()
            .set("title", "new")
            .remove("draft")
            .increment("views", 3)
            .into_actions_for_test();

        apply_actions(&mut doc, &actions).unwrap();

        assert_eq!(doc, document(json!({"title": "new", "views": 5})));
    }

    #[test]
    fn test_append_creates_missing_list() {
        let mut doc = Map::new();
        let actions = vec![UpdateAction::Append {
            attribute: "componentIds".to_string(),
            values: vec![json!("a"), json!("b")],
        }];

        apply_actions(&mut doc, &actions).unwrap();

        assert_eq!(doc["componentIds"], json!(["a", "b"]));
    }

    #[test]
    fn test_set_if_absent_keeps_existing_value() {
        let mut doc = document(json!({"status": "published"}));
        let actions = vec![UpdateAction::SetIfAbsent {
            attribute: "status".to_string(),
            value: json!("draft"),
        }];

        apply_actions(&mut doc, &actions).unwrap();

        assert_eq!(doc["status"], json!("published"));
    }

    #[test]
    fn test_add_to_string_is_rejected() {
        let mut doc = document(json!({"views": "many"}));
        let actions = FieldUpdate::new().increment("views", 1).into_actions_for_test();

        assert!(matches!(
            apply_actions(&mut doc, &actions),
            Err(RepositoryError::InvalidData(_))
        ));
    }

    #[test]
    fn test_key_attributes_cannot_be_updated() {
        let update = Update::Fields(FieldUpdate::new().set("PK", "USER#other"));
        assert!(matches!(
            update.into_actions(),
            Err(RepositoryError::InvalidData(_))
        ));
    }

    #[test]
    fn test_empty_update_is_rejected() {
        assert!(Update::Fields(FieldUpdate::new()).into_actions().is_err());
    }

    #[test]
    fn test_native_update_normalizes_to_actions() {
        let native = NativeUpdate::new("SET #t = :t REMOVE #d")
            .name("#t", "title")
            .name("#d", "draft")
            .value(":t", "Welcome");

        let actions = Update::Native(native).into_actions().unwrap();

        assert_eq!(
            actions,
            vec![
                UpdateAction::Set {
                    attribute: "title".to_string(),
                    value: json!("Welcome"),
                },
                UpdateAction::Remove {
                    attribute: "draft".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_diff_covers_only_changed_attributes() {
        let before = Record::new(RecordKey::single("CMS_PAGE#1"))
            .with_gsi1("CMS_PAGE", "ORDER#0000000001#1")
            .with_attribute("title", json!({"en": "Home"}))
            .with_attribute("description", json!({"en": "Old"}))
            .with_attribute("componentIds", json!(["a"]));
        let mut after = before
            .clone()
            .with_gsi1("CMS_PAGE", "ORDER#0000000004#1")
            .with_attribute("title", json!({"en": "Welcome"}));
        after.attributes.remove("description");
        after.updated_at = Some(Utc::now());

        let actions = Update::from(FieldUpdate::diff(&before, &after).unwrap())
            .into_actions()
            .unwrap();

        let touched: Vec<&str> = actions.iter().map(UpdateAction::attribute).collect();
        assert_eq!(touched, vec!["GSI1SK", "title", "description"]);
        assert!(matches!(actions[2], UpdateAction::Remove { .. }));
        assert!(FieldUpdate::diff(&before, &before).unwrap().is_empty());
    }

    #[test]
    fn test_update_stamp_replaces_caller_value() {
        let now = chrono::Utc::now();
        let actions = FieldUpdate::new()
            .set("updatedAt", "1999-01-01T00:00:00Z")
            .set("title", "x")
            .into_actions_for_test();

        let stamped = with_update_stamp(actions, now);

        assert_eq!(stamped.len(), 2);
        assert_eq!(stamped[1].attribute(), "updatedAt");
        let mut doc = Map::new();
        apply_actions(&mut doc, &stamped).unwrap();
        let parsed: DateTime<Utc> = serde_json::from_value(doc["updatedAt"].clone()).unwrap();
        assert_eq!(parsed, now);
    }

    impl FieldUpdate {
        fn into_actions_for_test(self) -> Vec<UpdateAction> {
            Update::Fields(self).into_actions().unwrap()
        }
    }
}
