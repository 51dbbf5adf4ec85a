//! DynamoDB implementation of [`Storage`].
//!
//! One table, keyed on `PK`/`SK`, with `GSI1` and `GSI2` projecting all
//! attributes. Every expression goes through [`ExpressionBuilder`], so
//! attribute names never hit DynamoDB's reserved words.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    DeleteRequest, KeysAndAttributes, PutRequest, ReturnValue, WriteRequest,
};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};

use peeth_core::keys::entity_label;
use peeth_core::storage::{
    get_chunks, with_update_stamp, write_chunks, BatchWriteOp, ContinuationToken,
    ExpressionBuilder, Filter, Index, Page, QueryOptions, Record, RecordKey, RepositoryError,
    Result, SortOrder, Storage, UpdateOptions, PK,
};

use super::conversions::{
    document_to_item, item_to_document, item_to_record, key_to_item, record_to_item,
    values_to_attributes,
};
use super::error::{
    map_batch_get_error, map_batch_write_error, map_build_error, map_delete_item_error,
    map_get_item_error, map_put_item_error, map_query_error, map_scan_error,
    map_update_item_error,
};
use crate::config::Config;

/// DynamoDB-backed storage over the single table.
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
}

impl DynamoDbStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Builds a client from the default credential chain, honoring the
    /// region and endpoint overrides (DynamoDB Local) in `config`.
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.aws_region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.aws_endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        tracing::info!(
            table = %config.dynamodb_table_name,
            endpoint = ?config.aws_endpoint_url,
            "DynamoDB client configured"
        );
        Self::new(Client::new(&sdk_config), &config.dynamodb_table_name)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// Keeps results on a shared index to one entity type.
///
/// GSI partitions like `SLUG#<slug>` hold several entity types; the base
/// table partition already pins the type.
fn scoped_filter(entity_type: &str, index: Index, filter: Option<Filter>) -> Option<Filter> {
    if index == Index::Primary {
        return filter;
    }
    let scope = entity_scope(entity_type);
    Some(match filter {
        Some(filter) => scope.and(filter),
        None => scope,
    })
}

fn entity_scope(entity_type: &str) -> Filter {
    Filter::BeginsWith(PK.to_string(), format!("{entity_type}#"))
}

fn request_limit(limit: Option<usize>) -> Option<i32> {
    limit.map(|l| i32::try_from(l).unwrap_or(i32::MAX))
}

fn write_request(op: &BatchWriteOp, now: DateTime<Utc>) -> Result<WriteRequest> {
    let request = match op {
        BatchWriteOp::Put(record) => {
            let mut record = record.clone();
            record.stamp(now);
            WriteRequest::builder()
                .put_request(
                    PutRequest::builder()
                        .set_item(Some(record_to_item(record)?))
                        .build()
                        .map_err(map_build_error)?,
                )
                .build()
        }
        BatchWriteOp::Delete(key) => WriteRequest::builder()
            .delete_request(
                DeleteRequest::builder()
                    .set_key(Some(key_to_item(key)))
                    .build()
                    .map_err(map_build_error)?,
            )
            .build(),
    };
    Ok(request)
}

#[async_trait]
impl Storage for DynamoDbStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<Record>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_item(key)))
            .send()
            .await
            .map_err(map_get_item_error)?;

        result.item().map(item_to_record).transpose()
    }

    async fn put(&self, mut record: Record) -> Result<Record> {
        record.stamp(Utc::now());
        let item = record_to_item(record.clone())?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| {
                map_put_item_error(e, entity_label(record.entity_type()), record.key().to_string())
            })?;

        tracing::debug!(pk = %record.pk, sk = %record.sk, "put item");
        Ok(record)
    }

    async fn delete(&self, key: &RecordKey) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_item(key)))
            .send()
            .await
            .map_err(map_delete_item_error)?;

        tracing::debug!(key = %key, "deleted item");
        Ok(())
    }

    async fn query(&self, entity_type: &str, options: QueryOptions) -> Result<Page> {
        let mut builder = ExpressionBuilder::new();
        let key_condition = builder.key_condition(options.index, &options.key_condition);
        let filter = scoped_filter(entity_type, options.index, options.filter)
            .map(|filter| builder.filter(&filter))
            .transpose()?;
        let attributes = builder.finish();

        let start_key = options
            .start_key
            .as_ref()
            .map(|token| token.to_key().map(|key| document_to_item(&key)))
            .transpose()?;

        let response = self
            .client
            .query()
            .table_name(&self.table_name)
            .set_index_name(options.index.name().map(str::to_string))
            .key_condition_expression(key_condition)
            .set_filter_expression(filter)
            .set_expression_attribute_names(Some(attributes.names))
            .set_expression_attribute_values(values_to_attributes(attributes.values))
            .set_limit(request_limit(options.limit))
            .scan_index_forward(options.order == SortOrder::Ascending)
            .set_exclusive_start_key(start_key)
            .send()
            .await
            .map_err(map_query_error)?;

        let items = response
            .items()
            .iter()
            .map(item_to_record)
            .collect::<Result<Vec<_>>>()?;

        let last_key = match response.last_evaluated_key() {
            Some(key) if !key.is_empty() => {
                Some(ContinuationToken::from_key(&item_to_document(key)?)?)
            }
            _ => None,
        };

        Ok(Page { items, last_key })
    }

    async fn scan(&self, entity_type: &str, filter: Option<Filter>) -> Result<Vec<Record>> {
        let filter = match filter {
            Some(filter) => entity_scope(entity_type).and(filter),
            None => entity_scope(entity_type),
        };
        let mut builder = ExpressionBuilder::new();
        let expression = builder.filter(&filter)?;
        let attributes = builder.finish();
        let values = values_to_attributes(attributes.values);

        let mut records = Vec::new();
        let mut last_evaluated_key = None;
        let mut pages = 0usize;

        loop {
            let response = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression(&expression)
                .set_expression_attribute_names(Some(attributes.names.clone()))
                .set_expression_attribute_values(values.clone())
                .set_exclusive_start_key(last_evaluated_key.take())
                .send()
                .await
                .map_err(map_scan_error)?;
            pages += 1;

            for item in response.items() {
                records.push(item_to_record(item)?);
            }

            match response.last_evaluated_key() {
                Some(key) if !key.is_empty() => last_evaluated_key = Some(key.clone()),
                _ => break,
            }
        }

        tracing::debug!(entity_type, pages, count = records.len(), "scan complete");
        Ok(records)
    }

    async fn update(&self, entity_type: &str, options: UpdateOptions) -> Result<Record> {
        if options.key.entity_type() != entity_type {
            return Err(RepositoryError::InvalidData(format!(
                "Key {} does not belong to {entity_type}",
                options.key
            )));
        }

        let actions = with_update_stamp(options.update.into_actions()?, Utc::now());
        let mut builder = ExpressionBuilder::new();
        let update_expression = builder.update(&actions);
        let condition = format!("attribute_exists({})", builder.name(PK));
        let attributes = builder.finish();

        let response = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_item(&options.key)))
            .update_expression(update_expression)
            .condition_expression(condition)
            .set_expression_attribute_names(Some(attributes.names))
            .set_expression_attribute_values(values_to_attributes(attributes.values))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| {
                map_update_item_error(e, entity_label(entity_type), options.key.to_string())
            })?;

        let item = response.attributes().ok_or_else(|| {
            RepositoryError::QueryFailed("UpdateItem returned no attributes".to_string())
        })?;
        item_to_record(item)
    }

    async fn batch_get(&self, keys: &[RecordKey]) -> Result<Vec<Record>> {
        let mut records = Vec::with_capacity(keys.len());

        for chunk in get_chunks(keys) {
            let request = KeysAndAttributes::builder()
                .set_keys(Some(chunk.iter().map(key_to_item).collect()))
                .build()
                .map_err(map_build_error)?;

            let response = self
                .client
                .batch_get_item()
                .request_items(&self.table_name, request)
                .send()
                .await
                .map_err(map_batch_get_error)?;

            let unprocessed = response
                .unprocessed_keys()
                .and_then(|pending| pending.get(&self.table_name))
                .map_or(0, |pending| pending.keys().len());
            if unprocessed > 0 {
                return Err(RepositoryError::QueryFailed(format!(
                    "BatchGetItem left {unprocessed} keys unprocessed"
                )));
            }

            if let Some(items) = response
                .responses()
                .and_then(|responses| responses.get(&self.table_name))
            {
                for item in items {
                    records.push(item_to_record(item)?);
                }
            }
        }

        Ok(records)
    }

    async fn batch_write(&self, ops: Vec<BatchWriteOp>) -> Result<()> {
        let now = Utc::now();

        for (index, chunk) in write_chunks(&ops).enumerate() {
            let requests = chunk
                .iter()
                .map(|op| write_request(op, now))
                .collect::<Result<Vec<_>>>()?;
            let size = requests.len();

            let response = self
                .client
                .batch_write_item()
                .request_items(&self.table_name, requests)
                .send()
                .await
                .map_err(map_batch_write_error)?;

            let unprocessed = response
                .unprocessed_items()
                .and_then(|pending| pending.get(&self.table_name))
                .map_or(0, Vec::len);
            if unprocessed > 0 {
                return Err(RepositoryError::QueryFailed(format!(
                    "BatchWriteItem left {unprocessed} of {size} requests unprocessed \
                     in chunk {index}"
                )));
            }

            tracing::debug!(chunk = index, size, "batch write chunk applied");
        }

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "dynamodb"
    }
}
