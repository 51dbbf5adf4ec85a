//! Query descriptions shared by every backend.
//!
//! These are plain data: each backend matches on them explicitly and turns
//! them into its own query language.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::{GSI1PK, GSI1SK, GSI2PK, GSI2SK, PK, SK};
use super::{ContinuationToken, Record};

/// Which key projection a query runs against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Index {
    #[default]
    Primary,
    Gsi1,
    Gsi2,
}

impl Index {
    /// Index name as provisioned on the table, `None` for the base table.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Index::Primary => None,
            Index::Gsi1 => Some("GSI1"),
            Index::Gsi2 => Some("GSI2"),
        }
    }

    pub fn partition_attribute(self) -> &'static str {
        match self {
            Index::Primary => PK,
            Index::Gsi1 => GSI1PK,
            Index::Gsi2 => GSI2PK,
        }
    }

    pub fn sort_attribute(self) -> &'static str {
        match self {
            Index::Primary => SK,
            Index::Gsi1 => GSI1SK,
            Index::Gsi2 => GSI2SK,
        }
    }
}

/// Condition on the sort key of the queried index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortCondition {
    Equals(String),
    LessThan(String),
    LessOrEqual(String),
    GreaterThan(String),
    GreaterOrEqual(String),
    Between(String, String),
    BeginsWith(String),
}

/// Partition equality plus an optional sort key condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCondition {
    pub partition: String,
    pub sort: Option<SortCondition>,
}

impl KeyCondition {
    pub fn partition(value: impl Into<String>) -> Self {
        Self {
            partition: value.into(),
            sort: None,
        }
    }

    pub fn with_sort(mut self, condition: SortCondition) -> Self {
        self.sort = Some(condition);
        self
    }

    pub fn begins_with(self, prefix: impl Into<String>) -> Self {
        self.with_sort(SortCondition::BeginsWith(prefix.into()))
    }
}

/// Post-key filter on record attributes.
///
/// `Contains` matches a substring of a string attribute or an element of a
/// list attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equals(String, Value),
    NotEquals(String, Value),
    BeginsWith(String, String),
    Contains(String, Value),
    Exists(String),
    NotExists(String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Equals(attribute.into(), value.into())
    }

    pub fn ne(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::NotEquals(attribute.into(), value.into())
    }

    /// Combines two filters with `AND`, flattening nested conjunctions.
    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            first => Filter::And(vec![first, other]),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Everything a `query` call needs besides the entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub index: Index,
    pub key_condition: KeyCondition,
    pub filter: Option<Filter>,
    pub limit: Option<usize>,
    pub start_key: Option<ContinuationToken>,
    pub order: SortOrder,
}

impl QueryOptions {
    pub fn new(index: Index, key_condition: KeyCondition) -> Self {
        Self {
            index,
            key_condition,
            filter: None,
            limit: None,
            start_key: None,
            order: SortOrder::Ascending,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, token: Option<ContinuationToken>) -> Self {
        self.start_key = token;
        self
    }

    pub fn descending(mut self) -> Self {
        self.order = SortOrder::Descending;
        self
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Record>,
    /// Present when more results exist and the backend can resume.
    pub last_key: Option<ContinuationToken>,
}
