//! Desired table schema. Pure data, no I/O.

use peeth_core::storage::{Index, TTL};

/// Table schema configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub gsis: Vec<GsiConfig>,
    /// Epoch-seconds attribute DynamoDB uses to expire items.
    pub ttl_attribute: Option<String>,
    pub billing_mode: BillingMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
}

/// Global Secondary Index configuration. Every index projects all attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsiConfig {
    pub name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingMode {
    PayPerRequest,
}

impl TableConfig {
    pub fn with_table_name(mut self, name: &str) -> Self {
        self.table_name = name.to_string();
        self
    }
}

impl KeyAttribute {
    fn string(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attribute_type: AttributeType::String,
        }
    }
}

impl GsiConfig {
    fn for_index(index: Index, name: &str) -> Self {
        Self {
            name: name.to_string(),
            partition_key: KeyAttribute::string(index.partition_attribute()),
            sort_key: Some(KeyAttribute::string(index.sort_attribute())),
        }
    }
}

/// Default table name for a deployment mode, matching the server.
pub fn default_table_name(deployment_mode: &str) -> String {
    format!("peeth-{deployment_mode}")
}

/// The single table every peeth entity lives in.
///
/// `GSI1` serves the by-type listings, `GSI2` the slug and email lookups.
/// Login challenges expire through the `ttl` attribute.
pub fn peeth_table_config() -> TableConfig {
    let gsis = [Index::Gsi1, Index::Gsi2]
        .into_iter()
        .filter_map(|index| index.name().map(|name| GsiConfig::for_index(index, name)))
        .collect();

    TableConfig {
        table_name: default_table_name("development"),
        partition_key: KeyAttribute::string(Index::Primary.partition_attribute()),
        sort_key: Some(KeyAttribute::string(Index::Primary.sort_attribute())),
        gsis,
        ttl_attribute: Some(TTL.to_string()),
        billing_mode: BillingMode::PayPerRequest,
    }
}
