//! Plan calculation. Everything here is pure; `deploy` applies the result.

use super::config::{GsiConfig, TableConfig};

/// What `describe_table` and `describe_time_to_live` report.
#[derive(Debug, Clone)]
pub struct TableState {
    pub status: TableStatus,
    pub gsis: Vec<GsiState>,
    /// Attribute TTL is enabled on, if any.
    pub ttl_attribute: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

#[derive(Debug, Clone)]
pub struct GsiState {
    pub name: String,
    pub status: GsiStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GsiStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// No table yet.
    CreateTable { config: TableConfig },
    /// The table exists but lacks indexes or TTL.
    UpdateTable {
        table_name: String,
        gsis_to_add: Vec<GsiConfig>,
        enable_ttl: Option<String>,
    },
    NoChanges { table_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyPlan {
    DeleteTable { table_name: String },
    AlreadyGone { table_name: String },
}

/// Works out the changes that take `current` to `desired`.
///
/// Indexes are only ever added. An index that exists but is not in
/// `desired` is left alone.
pub fn calculate_deploy_plan(current: Option<&TableState>, desired: &TableConfig) -> DeployPlan {
    let Some(state) = current else {
        return DeployPlan::CreateTable {
            config: desired.clone(),
        };
    };

    let gsis_to_add: Vec<GsiConfig> = desired
        .gsis
        .iter()
        .filter(|gsi| !state.gsis.iter().any(|existing| existing.name == gsi.name))
        .cloned()
        .collect();

    let enable_ttl = desired
        .ttl_attribute
        .clone()
        .filter(|wanted| state.ttl_attribute.as_ref() != Some(wanted));

    if gsis_to_add.is_empty() && enable_ttl.is_none() {
        DeployPlan::NoChanges {
            table_name: desired.table_name.clone(),
        }
    } else {
        DeployPlan::UpdateTable {
            table_name: desired.table_name.clone(),
            gsis_to_add,
            enable_ttl,
        }
    }
}

pub fn calculate_destroy_plan(current: Option<&TableState>, table_name: &str) -> DestroyPlan {
    match current {
        Some(_) => DestroyPlan::DeleteTable {
            table_name: table_name.to_string(),
        },
        None => DestroyPlan::AlreadyGone {
            table_name: table_name.to_string(),
        },
    }
}

/// Lines for the plan preview. The first character marks the change kind.
pub fn format_deploy_plan(plan: &DeployPlan) -> Vec<String> {
    match plan {
        DeployPlan::CreateTable { config } => {
            let mut lines = vec![
                format!("+ Create table: {}", config.table_name),
                format!("  Partition key: {} (S)", config.partition_key.name),
            ];
            if let Some(sk) = &config.sort_key {
                lines.push(format!("  Sort key: {} (S)", sk.name));
            }
            for gsi in &config.gsis {
                lines.push(format!("  + GSI: {}", gsi.name));
                lines.push(format!("    Partition key: {} (S)", gsi.partition_key.name));
                if let Some(sk) = &gsi.sort_key {
                    lines.push(format!("    Sort key: {} (S)", sk.name));
                }
            }
            if let Some(ttl) = &config.ttl_attribute {
                lines.push(format!("  + TTL on: {ttl}"));
            }
            lines.push("  Billing: PAY_PER_REQUEST".to_string());
            lines
        }
        DeployPlan::UpdateTable {
            table_name,
            gsis_to_add,
            enable_ttl,
        } => {
            let mut lines = vec![format!("~ Update table: {table_name}")];
            for gsi in gsis_to_add {
                lines.push(format!("  + Add GSI: {}", gsi.name));
            }
            if let Some(ttl) = enable_ttl {
                lines.push(format!("  + Enable TTL on: {ttl}"));
            }
            lines
        }
        DeployPlan::NoChanges { table_name } => {
            vec![format!("= Table '{table_name}' is up to date")]
        }
    }
}

pub fn format_destroy_plan(plan: &DestroyPlan) -> Vec<String> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            vec![format!("- Delete table: {table_name} (ALL DATA WILL BE LOST)")]
        }
        DestroyPlan::AlreadyGone { table_name } => {
            vec![format!("= Table '{table_name}' does not exist")]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamodb::config::peeth_table_config;

    fn state(gsis: &[&str], ttl: Option<&str>) -> TableState {
        TableState {
            status: TableStatus::Active,
            gsis: gsis
                .iter()
                .map(|name| GsiState {
                    name: name.to_string(),
                    status: GsiStatus::Active,
                })
                .collect(),
            ttl_attribute: ttl.map(str::to_string),
        }
    }

    #[test]
    fn test_missing_table_is_created() {
        let desired = peeth_table_config();
        let plan = calculate_deploy_plan(None, &desired);
        assert_eq!(plan, DeployPlan::CreateTable { config: desired });
    }

    #[test]
    fn test_complete_table_needs_nothing() {
        let current = state(&["GSI1", "GSI2"], Some("ttl"));
        let plan = calculate_deploy_plan(Some(&current), &peeth_table_config());
        assert!(matches!(plan, DeployPlan::NoChanges { .. }));
    }

    #[test]
    fn test_missing_gsi2_and_ttl_are_added() {
        let current = state(&["GSI1"], None);
        let plan = calculate_deploy_plan(Some(&current), &peeth_table_config());

        match plan {
            DeployPlan::UpdateTable {
                gsis_to_add,
                enable_ttl,
                ..
            } => {
                assert_eq!(gsis_to_add.len(), 1);
                assert_eq!(gsis_to_add[0].name, "GSI2");
                assert_eq!(enable_ttl.as_deref(), Some("ttl"));
            }
            other => panic!("expected an update, got {other:?}"),
        }
    }

    #[test]
    fn test_extra_indexes_are_kept() {
        let current = state(&["GSI1", "GSI2", "LEGACY"], Some("ttl"));
        let plan = calculate_deploy_plan(Some(&current), &peeth_table_config());
        assert!(matches!(plan, DeployPlan::NoChanges { .. }));
    }

    #[test]
    fn test_destroy_plan_and_preview() {
        let plan = calculate_destroy_plan(None, "peeth-test");
        assert_eq!(
            format_destroy_plan(&plan),
            vec!["= Table 'peeth-test' does not exist".to_string()]
        );

        let plan = calculate_destroy_plan(Some(&state(&[], None)), "peeth-test");
        assert!(format_destroy_plan(&plan)[0].starts_with('-'));
    }
}
