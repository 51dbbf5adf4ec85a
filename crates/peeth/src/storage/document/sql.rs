//! SQL generation for the document store.
//!
//! Pure functions that turn collection names, key conditions and filters
//! into SQLite statements over `(_id, pk, sk, doc)` tables, where `doc` is
//! the full record as JSON. Attribute access goes through `json_extract`
//! with the JSON path bound as a parameter, so attribute names never reach
//! the SQL text.

use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use peeth_core::storage::{
    Filter, Index, KeyCondition, QueryOptions, RecordKey, RepositoryError, Result, SortCondition,
    SortOrder,
};

/// Collection for an entity type: lowercased token plus `s`
/// (`CMS_PAGE` -> `cms_pages`).
pub fn collection_name(entity_type: &str) -> Result<String> {
    let valid = !entity_type.is_empty()
        && entity_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(RepositoryError::InvalidData(format!(
            "Invalid entity type: '{entity_type}'"
        )));
    }
    Ok(format!("{}s", entity_type.to_lowercase()))
}

/// Composite document id, so a put on the same PK+SK replaces the document.
pub fn document_id(key: &RecordKey) -> String {
    key.to_string()
}

pub fn create_collection_sql(collection: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS "{collection}" (
    _id TEXT PRIMARY KEY,
    pk TEXT NOT NULL,
    sk TEXT NOT NULL,
    doc TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS "idx_{collection}_pk_sk" ON "{collection}"(pk, sk);
"#
    )
}

pub fn upsert_sql(collection: &str) -> String {
    format!(
        r#"INSERT INTO "{collection}" (_id, pk, sk, doc) VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(_id) DO UPDATE SET doc = excluded.doc"#
    )
}

pub fn select_by_id_sql(collection: &str) -> String {
    format!(r#"SELECT doc FROM "{collection}" WHERE _id = ?1"#)
}

pub fn update_doc_sql(collection: &str) -> String {
    format!(r#"UPDATE "{collection}" SET doc = ?2 WHERE _id = ?1"#)
}

pub fn delete_sql(collection: &str) -> String {
    format!(r#"DELETE FROM "{collection}" WHERE _id = ?1"#)
}

/// A statement with its numbered parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

pub fn select_query(collection: &str, options: &QueryOptions) -> Result<SqlQuery> {
    let mut builder = SqlBuilder::default();
    let mut conditions = vec![builder.key_condition(options.index, &options.key_condition)?];
    if let Some(filter) = &options.filter {
        conditions.push(builder.filter(filter)?);
    }

    let sort_column = builder.key_column(options.index, false)?;
    let direction = match options.order {
        SortOrder::Ascending => "ASC",
        SortOrder::Descending => "DESC",
    };

    let mut sql = format!(
        "SELECT doc FROM \"{collection}\" WHERE {} \
         ORDER BY {sort_column} {direction}, _id {direction}",
        conditions.join(" AND ")
    );
    if let Some(limit) = options.limit {
        let limit = builder.bind(SqlValue::Integer(limit as i64));
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    Ok(SqlQuery {
        sql,
        params: builder.params,
    })
}

pub fn scan_query(collection: &str, filter: Option<&Filter>) -> Result<SqlQuery> {
    let mut builder = SqlBuilder::default();
    let sql = match filter {
        Some(filter) => format!(
            r#"SELECT doc FROM "{collection}" WHERE {} ORDER BY _id"#,
            builder.filter(filter)?
        ),
        None => format!(r#"SELECT doc FROM "{collection}" ORDER BY _id"#),
    };
    Ok(SqlQuery {
        sql,
        params: builder.params,
    })
}

/// Collects numbered parameters (`?1`, `?2`, ...) so fragments can reuse a
/// parameter and be assembled in any order.
#[derive(Debug, Default)]
struct SqlBuilder {
    params: Vec<SqlValue>,
}

impl SqlBuilder {
    fn bind(&mut self, value: SqlValue) -> String {
        self.params.push(value);
        format!("?{}", self.params.len())
    }

    fn path(&mut self, attribute: &str) -> Result<String> {
        Ok(self.bind(SqlValue::Text(json_path(attribute)?)))
    }

    fn key_column(&mut self, index: Index, partition: bool) -> Result<String> {
        match (index, partition) {
            (Index::Primary, true) => Ok("pk".to_string()),
            (Index::Primary, false) => Ok("sk".to_string()),
            (index, true) => Ok(format!(
                "json_extract(doc, {})",
                self.path(index.partition_attribute())?
            )),
            (index, false) => Ok(format!(
                "json_extract(doc, {})",
                self.path(index.sort_attribute())?
            )),
        }
    }

    fn key_condition(&mut self, index: Index, condition: &KeyCondition) -> Result<String> {
        let partition_column = self.key_column(index, true)?;
        let partition_value = self.bind(SqlValue::Text(condition.partition.clone()));
        let partition = format!("{partition_column} = {partition_value}");

        let Some(sort) = &condition.sort else {
            return Ok(partition);
        };

        let column = self.key_column(index, false)?;
        let sort = match sort {
            SortCondition::Equals(v) => format!("{column} = {}", self.text(v)),
            SortCondition::LessThan(v) => format!("{column} < {}", self.text(v)),
            SortCondition::LessOrEqual(v) => format!("{column} <= {}", self.text(v)),
            SortCondition::GreaterThan(v) => format!("{column} > {}", self.text(v)),
            SortCondition::GreaterOrEqual(v) => format!("{column} >= {}", self.text(v)),
            SortCondition::Between(low, high) => {
                let low = self.text(low);
                let high = self.text(high);
                format!("{column} BETWEEN {low} AND {high}")
            }
            SortCondition::BeginsWith(prefix) => self.prefix_match(&column, prefix),
        };
        Ok(format!("{partition} AND {sort}"))
    }

    fn filter(&mut self, filter: &Filter) -> Result<String> {
        let sql = match filter {
            Filter::Equals(attr, Value::Null) => {
                format!("json_type(doc, {}) = 'null'", self.path(attr)?)
            }
            Filter::Equals(attr, value) => {
                let path = self.path(attr)?;
                format!("json_extract(doc, {path}) = {}", self.value(value))
            }
            Filter::NotEquals(attr, Value::Null) => {
                format!("json_type(doc, {}) IS NOT 'null'", self.path(attr)?)
            }
            Filter::NotEquals(attr, value) => {
                let path = self.path(attr)?;
                format!("json_extract(doc, {path}) IS NOT {}", self.value(value))
            }
            Filter::BeginsWith(attr, prefix) => {
                let path = self.path(attr)?;
                let column = format!("json_extract(doc, {path})");
                format!(
                    "(json_type(doc, {path}) = 'text' AND {})",
                    self.prefix_match(&column, prefix)
                )
            }
            Filter::Contains(attr, value) => {
                let path = self.path(attr)?;
                let element = self.value(value);
                let needle = match value {
                    Value::String(_) => element.clone(),
                    other => self.bind(SqlValue::Text(other.to_string())),
                };
                format!(
                    "(CASE json_type(doc, {path}) \
                     WHEN 'text' THEN instr(json_extract(doc, {path}), {needle}) > 0 \
                     WHEN 'array' THEN EXISTS (SELECT 1 FROM json_each(doc, {path}) \
                     WHERE json_each.value = {element}) \
                     ELSE 0 END)"
                )
            }
            Filter::Exists(attr) => format!("json_type(doc, {}) IS NOT NULL", self.path(attr)?),
            Filter::NotExists(attr) => format!("json_type(doc, {}) IS NULL", self.path(attr)?),
            Filter::And(filters) => self.group(filters, "AND")?,
            Filter::Or(filters) => self.group(filters, "OR")?,
        };
        Ok(sql)
    }

    fn group(&mut self, filters: &[Filter], joiner: &str) -> Result<String> {
        if filters.is_empty() {
            return Err(RepositoryError::InvalidData(format!(
                "{joiner} filter needs at least one condition"
            )));
        }
        let parts = filters
            .iter()
            .map(|f| self.filter(f).map(|sql| format!("({sql})")))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(&format!(" {joiner} ")))
    }

    fn prefix_match(&mut self, column: &str, prefix: &str) -> String {
        let length = self.bind(SqlValue::Integer(prefix.chars().count() as i64));
        let prefix = self.text(prefix);
        format!("substr({column}, 1, {length}) = {prefix}")
    }

    fn text(&mut self, value: &str) -> String {
        self.bind(SqlValue::Text(value.to_string()))
    }

    fn value(&mut self, value: &Value) -> String {
        self.bind(sql_value(value))
    }
}

/// JSON path for a top-level attribute, e.g. `$."GSI1PK"`.
fn json_path(attribute: &str) -> Result<String> {
    if attribute.is_empty() || attribute.contains('"') || attribute.contains('\\') {
        return Err(RepositoryError::InvalidData(format!(
            "Unsupported attribute name: '{attribute}'"
        )));
    }
    Ok(format!("$.\"{attribute}\""))
}

/// SQLite value matching what `json_extract` returns for the JSON value.
fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_names() {
        assert_eq!(collection_name("CMS_PAGE").unwrap(), "cms_pages");
        assert_eq!(collection_name("USER").unwrap(), "users");
        assert!(collection_name("users\"; DROP TABLE x; --").is_err());
        assert!(collection_name("").is_err());
    }

    #[test]
    fn test_primary_query_uses_key_columns() {
        let options = QueryOptions::new(Index::Primary, KeyCondition::partition("USER#1"));
        let query = select_query("users", &options).unwrap();

        assert_eq!(
            query.sql,
            r#"SELECT doc FROM "users" WHERE pk = ?1 ORDER BY sk ASC, _id ASC"#
        );
        assert_eq!(query.params, vec![SqlValue::Text("USER#1".to_string())]);
    }

    #[test]
    fn test_gsi_query_binds_paths_prefix_and_limit() {
        let options = QueryOptions::new(
            Index::Gsi1,
            KeyCondition::partition("PAGE#1").begins_with("ORDER#"),
        )
        .limit(5)
        .descending();

        let query = select_query("cms_components", &options).unwrap();

        assert!(query.sql.contains("json_extract(doc, ?1) = ?2"));
        assert!(query
            .sql
            .contains("substr(json_extract(doc, ?3), 1, ?4) = ?5"));
        assert!(query.sql.ends_with("DESC, _id DESC LIMIT ?7"));
        assert_eq!(query.params[0], SqlValue::Text("$.\"GSI1PK\"".to_string()));
        assert_eq!(query.params[3], SqlValue::Integer(6));
        assert_eq!(query.params[6], SqlValue::Integer(5));
    }

    #[test]
    fn test_filter_binds_booleans_as_integers() {
        let query = scan_query("cms_components", Some(&Filter::eq("visible", true))).unwrap();
        assert_eq!(query.params[1], SqlValue::Integer(1));
    }

    #[test]
    fn test_contains_reuses_string_parameter() {
        let query = scan_query(
            "contents",
            Some(&Filter::Contains("tags".to_string(), json!("bhakti"))),
        )
        .unwrap();
        assert_eq!(query.params.len(), 2);
        assert!(query.sql.contains("instr(json_extract(doc, ?1), ?2)"));
        assert!(query.sql.contains("json_each.value = ?2"));
    }

    #[test]
    fn test_rejects_quoted_attribute_names() {
        let filter = Filter::Exists("bad\"name".to_string());
        assert!(scan_query("users", Some(&filter)).is_err());
    }
}
