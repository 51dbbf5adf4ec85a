mod batch;
mod error;
mod expression;
mod http_mapping;
mod query;
mod record;
mod token;
mod traits;
mod update;

pub use batch::{get_chunks, write_chunks, BatchWriteOp, BATCH_GET_LIMIT, BATCH_WRITE_LIMIT};
pub use error::{RepositoryError, Result};
pub use expression::{parse_update_expression, ExpressionAttributes, ExpressionBuilder};
pub use http_mapping::repository_error_to_status_code;
pub use query::{Filter, Index, KeyCondition, Page, QueryOptions, SortCondition, SortOrder};
pub use record::{
    entity_type_of, Record, RecordKey, CREATED_AT, GSI1PK, GSI1SK, GSI2PK, GSI2SK,
    IMMUTABLE_ATTRIBUTES, PK, SK, TTL, UPDATED_AT,
};
pub use token::ContinuationToken;
pub use traits::Storage;
pub use update::{
    apply_actions, with_update_stamp, FieldUpdate, NativeUpdate, Update, UpdateAction,
    UpdateOptions,
};
