//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `RepositoryError` from `peeth_core::storage`.
//! Throttling and server faults become `QueryFailed`; nothing is retried here.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{BuildError, SdkError};
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemError;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use peeth_core::storage::RepositoryError;

const TABLE_NOT_FOUND: &str = "Table not found";
const THROUGHPUT_EXCEEDED: &str = "Throughput exceeded, please retry";
const REQUEST_LIMIT_EXCEEDED: &str = "Request limit exceeded, please retry";
const INTERNAL_SERVER_ERROR: &str = "DynamoDB internal server error";

fn query_failed(message: &str) -> RepositoryError {
    RepositoryError::QueryFailed(message.to_string())
}

/// Dispatch failures (no service response) mean the endpoint is unreachable.
fn dispatch_failure<E, R>(err: &SdkError<E, R>) -> Option<RepositoryError> {
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => Some(
            RepositoryError::ConnectionFailed("DynamoDB endpoint unreachable".to_string()),
        ),
        _ => None,
    }
}

/// Map a GetItem SDK error to RepositoryError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> RepositoryError {
    if let Some(connection) = dispatch_failure(&err) {
        return connection;
    }
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => query_failed(TABLE_NOT_FOUND),
        GetItemError::ProvisionedThroughputExceededException(_) => {
            query_failed(THROUGHPUT_EXCEEDED)
        }
        GetItemError::RequestLimitExceeded(_) => query_failed(REQUEST_LIMIT_EXCEEDED),
        GetItemError::InternalServerError(_) => query_failed(INTERNAL_SERVER_ERROR),
        err => RepositoryError::QueryFailed(format!("GetItem failed: {err:?}")),
    }
}

/// Map a PutItem SDK error to RepositoryError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    entity_type: &'static str,
    id: impl Into<String>,
) -> RepositoryError {
    if let Some(connection) = dispatch_failure(&err) {
        return connection;
    }
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => RepositoryError::AlreadyExists {
            entity_type,
            id: id.into(),
        },
        PutItemError::ResourceNotFoundException(_) => query_failed(TABLE_NOT_FOUND),
        PutItemError::ProvisionedThroughputExceededException(_) => {
            query_failed(THROUGHPUT_EXCEEDED)
        }
        PutItemError::RequestLimitExceeded(_) => query_failed(REQUEST_LIMIT_EXCEEDED),
        PutItemError::ItemCollectionSizeLimitExceededException(_) => {
            query_failed("Item collection size limit exceeded")
        }
        PutItemError::InternalServerError(_) => query_failed(INTERNAL_SERVER_ERROR),
        err => RepositoryError::QueryFailed(format!("PutItem failed: {err:?}")),
    }
}

/// Map an UpdateItem SDK error to RepositoryError.
///
/// Updates carry an `attribute_exists` condition, so a failed condition
/// means the record is missing.
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
    entity_type: &'static str,
    id: impl Into<String>,
) -> RepositoryError {
    if let Some(connection) = dispatch_failure(&err) {
        return connection;
    }
    match err.into_service_error() {
        UpdateItemError::ConditionalCheckFailedException(_) => RepositoryError::NotFound {
            entity_type,
            id: id.into(),
        },
        UpdateItemError::ResourceNotFoundException(_) => query_failed(TABLE_NOT_FOUND),
        UpdateItemError::ProvisionedThroughputExceededException(_) => {
            query_failed(THROUGHPUT_EXCEEDED)
        }
        UpdateItemError::RequestLimitExceeded(_) => query_failed(REQUEST_LIMIT_EXCEEDED),
        UpdateItemError::TransactionConflictException(_) => {
            query_failed("Transaction conflict, please retry")
        }
        UpdateItemError::InternalServerError(_) => query_failed(INTERNAL_SERVER_ERROR),
        err => RepositoryError::QueryFailed(format!("UpdateItem failed: {err:?}")),
    }
}

/// Map a DeleteItem SDK error to RepositoryError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
) -> RepositoryError {
    if let Some(connection) = dispatch_failure(&err) {
        return connection;
    }
    match err.into_service_error() {
        DeleteItemError::ResourceNotFoundException(_) => query_failed(TABLE_NOT_FOUND),
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            query_failed(THROUGHPUT_EXCEEDED)
        }
        DeleteItemError::RequestLimitExceeded(_) => query_failed(REQUEST_LIMIT_EXCEEDED),
        DeleteItemError::InternalServerError(_) => query_failed(INTERNAL_SERVER_ERROR),
        err => RepositoryError::QueryFailed(format!("DeleteItem failed: {err:?}")),
    }
}

/// Map a Query SDK error to RepositoryError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
) -> RepositoryError {
    if let Some(connection) = dispatch_failure(&err) {
        return connection;
    }
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => query_failed(TABLE_NOT_FOUND),
        QueryError::ProvisionedThroughputExceededException(_) => query_failed(THROUGHPUT_EXCEEDED),
        QueryError::RequestLimitExceeded(_) => query_failed(REQUEST_LIMIT_EXCEEDED),
        QueryError::InternalServerError(_) => query_failed(INTERNAL_SERVER_ERROR),
        err => RepositoryError::QueryFailed(format!("Query failed: {err:?}")),
    }
}

/// Map a Scan SDK error to RepositoryError.
pub fn map_scan_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<ScanError, R>,
) -> RepositoryError {
    if let Some(connection) = dispatch_failure(&err) {
        return connection;
    }
    match err.into_service_error() {
        ScanError::ResourceNotFoundException(_) => query_failed(TABLE_NOT_FOUND),
        ScanError::ProvisionedThroughputExceededException(_) => query_failed(THROUGHPUT_EXCEEDED),
        ScanError::RequestLimitExceeded(_) => query_failed(REQUEST_LIMIT_EXCEEDED),
        ScanError::InternalServerError(_) => query_failed(INTERNAL_SERVER_ERROR),
        err => RepositoryError::QueryFailed(format!("Scan failed: {err:?}")),
    }
}

/// Map a BatchGetItem SDK error to RepositoryError.
pub fn map_batch_get_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchGetItemError, R>,
) -> RepositoryError {
    if let Some(connection) = dispatch_failure(&err) {
        return connection;
    }
    match err.into_service_error() {
        BatchGetItemError::ResourceNotFoundException(_) => query_failed(TABLE_NOT_FOUND),
        BatchGetItemError::ProvisionedThroughputExceededException(_) => {
            query_failed(THROUGHPUT_EXCEEDED)
        }
        BatchGetItemError::RequestLimitExceeded(_) => query_failed(REQUEST_LIMIT_EXCEEDED),
        BatchGetItemError::InternalServerError(_) => query_failed(INTERNAL_SERVER_ERROR),
        err => RepositoryError::QueryFailed(format!("BatchGetItem failed: {err:?}")),
    }
}

/// Map a BatchWriteItem SDK error to RepositoryError.
pub fn map_batch_write_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchWriteItemError, R>,
) -> RepositoryError {
    if let Some(connection) = dispatch_failure(&err) {
        return connection;
    }
    match err.into_service_error() {
        BatchWriteItemError::ResourceNotFoundException(_) => query_failed(TABLE_NOT_FOUND),
        BatchWriteItemError::ProvisionedThroughputExceededException(_) => {
            query_failed(THROUGHPUT_EXCEEDED)
        }
        BatchWriteItemError::RequestLimitExceeded(_) => query_failed(REQUEST_LIMIT_EXCEEDED),
        BatchWriteItemError::ItemCollectionSizeLimitExceededException(_) => {
            query_failed("Item collection size limit exceeded")
        }
        BatchWriteItemError::InternalServerError(_) => query_failed(INTERNAL_SERVER_ERROR),
        err => RepositoryError::QueryFailed(format!("BatchWriteItem failed: {err:?}")),
    }
}

/// Request builders only fail when a required field is missing.
pub fn map_build_error(err: BuildError) -> RepositoryError {
    RepositoryError::InvalidData(format!("Invalid DynamoDB request: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_maps_to_connection_failed() {
        let err: SdkError<GetItemError, ()> = SdkError::timeout_error("no response");
        assert!(matches!(
            map_get_item_error(err),
            RepositoryError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_build_error_maps_to_invalid_data() {
        let err = BuildError::missing_field("item", "PutRequest needs an item");
        assert!(matches!(
            map_build_error(err),
            RepositoryError::InvalidData(_)
        ));
    }
}
