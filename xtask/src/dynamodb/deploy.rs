//! Applies deploy and destroy plans against DynamoDB.

use std::time::Duration;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, CreateGlobalSecondaryIndexAction, GlobalSecondaryIndex,
    GlobalSecondaryIndexUpdate, KeySchemaElement, KeyType, Projection, ProjectionType,
    ScalarAttributeType, TimeToLiveSpecification,
};
use aws_sdk_dynamodb::Client;

use super::client;
use super::config::{self, AttributeType, GsiConfig, KeyAttribute, TableConfig};
use super::error::{DynamodbError, Result};
use super::planning::{DeployPlan, DestroyPlan, GsiStatus, TableStatus};

const ACTIVATION_POLLS: u32 = 60;
const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub async fn execute_deploy_plan(client: &Client, plan: &DeployPlan) -> Result<()> {
    match plan {
        DeployPlan::CreateTable { config } => {
            create_table(client, config).await?;
            wait_for_table_active(client, &config.table_name).await?;
            if let Some(attribute) = &config.ttl_attribute {
                enable_ttl(client, &config.table_name, attribute).await?;
            }
        }
        DeployPlan::UpdateTable {
            table_name,
            gsis_to_add,
            enable_ttl: ttl_attribute,
        } => {
            // DynamoDB accepts one index creation per update.
            for gsi in gsis_to_add {
                add_gsi(client, table_name, gsi).await?;
                wait_for_table_active(client, table_name).await?;
            }
            if let Some(attribute) = ttl_attribute {
                enable_ttl(client, table_name, attribute).await?;
            }
        }
        DeployPlan::NoChanges { .. } => {}
    }
    Ok(())
}

pub async fn execute_destroy_plan(client: &Client, plan: &DestroyPlan) -> Result<()> {
    if let DestroyPlan::DeleteTable { table_name } = plan {
        client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(DynamodbError::aws)?;
    }
    Ok(())
}

async fn create_table(client: &Client, config: &TableConfig) -> Result<()> {
    let mut key_schema = vec![key_element(&config.partition_key, KeyType::Hash)?];
    let mut definitions = vec![attribute_definition(&config.partition_key)?];

    if let Some(sk) = &config.sort_key {
        key_schema.push(key_element(sk, KeyType::Range)?);
        definitions.push(attribute_definition(sk)?);
    }

    let mut request = client
        .create_table()
        .table_name(&config.table_name)
        .billing_mode(billing_mode(config.billing_mode));

    for gsi in &config.gsis {
        for key in gsi_keys(gsi) {
            if !definitions.iter().any(|d| d.attribute_name() == key.name) {
                definitions.push(attribute_definition(key)?);
            }
        }

        request = request.global_secondary_indexes(
            GlobalSecondaryIndex::builder()
                .index_name(&gsi.name)
                .set_key_schema(Some(gsi_key_schema(gsi)?))
                .projection(project_all())
                .build()
                .map_err(DynamodbError::aws)?,
        );
    }

    request
        .set_key_schema(Some(key_schema))
        .set_attribute_definitions(Some(definitions))
        .send()
        .await
        .map_err(DynamodbError::aws)?;
    Ok(())
}

async fn add_gsi(client: &Client, table_name: &str, gsi: &GsiConfig) -> Result<()> {
    let definitions = gsi_keys(gsi)
        .map(attribute_definition)
        .collect::<Result<Vec<_>>>()?;

    let create = CreateGlobalSecondaryIndexAction::builder()
        .index_name(&gsi.name)
        .set_key_schema(Some(gsi_key_schema(gsi)?))
        .projection(project_all())
        .build()
        .map_err(DynamodbError::aws)?;

    client
        .update_table()
        .table_name(table_name)
        .set_attribute_definitions(Some(definitions))
        .global_secondary_index_updates(
            GlobalSecondaryIndexUpdate::builder().create(create).build(),
        )
        .send()
        .await
        .map_err(DynamodbError::aws)?;
    Ok(())
}

async fn enable_ttl(client: &Client, table_name: &str, attribute: &str) -> Result<()> {
    let specification = TimeToLiveSpecification::builder()
        .enabled(true)
        .attribute_name(attribute)
        .build()
        .map_err(DynamodbError::aws)?;

    client
        .update_time_to_live()
        .table_name(table_name)
        .time_to_live_specification(specification)
        .send()
        .await
        .map_err(DynamodbError::aws)?;
    Ok(())
}

async fn wait_for_table_active(client: &Client, table_name: &str) -> Result<()> {
    for _ in 0..ACTIVATION_POLLS {
        if let Some(state) = client::get_table_state(client, table_name).await? {
            let gsis_active = state.gsis.iter().all(|g| g.status == GsiStatus::Active);
            if state.status == TableStatus::Active && gsis_active {
                return Ok(());
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    Err(DynamodbError::TableActivationTimeout {
        table_name: table_name.to_string(),
    })
}

fn gsi_keys(gsi: &GsiConfig) -> impl Iterator<Item = &KeyAttribute> {
    std::iter::once(&gsi.partition_key).chain(gsi.sort_key.as_ref())
}

fn gsi_key_schema(gsi: &GsiConfig) -> Result<Vec<KeySchemaElement>> {
    let mut schema = vec![key_element(&gsi.partition_key, KeyType::Hash)?];
    if let Some(sk) = &gsi.sort_key {
        schema.push(key_element(sk, KeyType::Range)?);
    }
    Ok(schema)
}

fn key_element(key: &KeyAttribute, key_type: KeyType) -> Result<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(&key.name)
        .key_type(key_type)
        .build()
        .map_err(DynamodbError::aws)
}

fn attribute_definition(key: &KeyAttribute) -> Result<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(&key.name)
        .attribute_type(scalar_type(key.attribute_type))
        .build()
        .map_err(DynamodbError::aws)
}

fn project_all() -> Projection {
    Projection::builder()
        .projection_type(ProjectionType::All)
        .build()
}

fn billing_mode(mode: config::BillingMode) -> BillingMode {
    match mode {
        config::BillingMode::PayPerRequest => BillingMode::PayPerRequest,
    }
}

fn scalar_type(attribute_type: AttributeType) -> ScalarAttributeType {
    match attribute_type {
        AttributeType::String => ScalarAttributeType::S,
    }
}
