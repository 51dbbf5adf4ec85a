//! Entity services: the imperative shell around the pure domain modules.
//!
//! Each service holds the shared `Arc<dyn Storage>` and turns domain
//! requests into storage calls using the key conventions in
//! `peeth_core::keys`.

mod cms;
mod content;
mod users;

#[cfg(all(test, feature = "document"))]
mod test_support;

pub use cms::CmsService;
pub use content::ContentService;
pub use users::UserService;

use peeth_core::error::{ServiceError, ServiceResult};
use peeth_core::storage::{
    FieldUpdate, Index, KeyCondition, QueryOptions, Record, RepositoryError, Storage,
    UpdateOptions,
};

/// Runs a query and follows continuation tokens until the partition is
/// exhausted.
async fn query_all(
    storage: &dyn Storage,
    entity_type: &str,
    options: QueryOptions,
) -> ServiceResult<Vec<Record>> {
    let mut records = Vec::new();
    let mut options = options;

    loop {
        let page = storage.query(entity_type, options.clone()).await?;
        records.extend(page.items);
        match page.last_key {
            Some(token) => options = options.start_after(Some(token)),
            None => break,
        }
    }

    Ok(records)
}

/// Looks up the record of `entity_type` holding a GSI2 partition value
/// (`SLUG#<slug>`, `EMAIL#<email>`).
async fn find_by_gsi2(
    storage: &dyn Storage,
    entity_type: &str,
    gsi2pk: String,
) -> ServiceResult<Option<Record>> {
    let condition = KeyCondition::partition(gsi2pk).begins_with(format!("{entity_type}#"));
    let page = storage
        .query(entity_type, QueryOptions::new(Index::Gsi2, condition).limit(1))
        .await?;
    Ok(page.items.into_iter().next())
}

/// Uniqueness pre-check against GSI2.
///
/// Not atomic: two concurrent writers can both pass. `owner` is the PK of
/// the record being updated, which may keep its own value.
async fn ensure_unique(
    storage: &dyn Storage,
    entity_type: &str,
    gsi2pk: String,
    field: &'static str,
    value: &str,
    owner: Option<&str>,
) -> ServiceResult<()> {
    match find_by_gsi2(storage, entity_type, gsi2pk).await? {
        Some(existing) if Some(existing.pk.as_str()) != owner => Err(ServiceError::Duplicate {
            field,
            value: value.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Writes the attributes that differ between `before` and `after` as an
/// in-place update of `before`'s record.
///
/// Returns `before` untouched when nothing differs. A record deleted since
/// it was read surfaces as `NotFound` for `entity_type`.
async fn write_changes(
    storage: &dyn Storage,
    entity_type: &'static str,
    id: impl ToString,
    before: Record,
    after: &Record,
) -> ServiceResult<Record> {
    let update = FieldUpdate::diff(&before, after)?;
    if update.is_empty() {
        return Ok(before);
    }

    let options = UpdateOptions::new(before.key(), update);
    match storage.update(entity_type, options).await {
        Ok(record) => Ok(record),
        Err(RepositoryError::NotFound { .. }) => Err(ServiceError::not_found(entity_type, id)),
        Err(e) => Err(e.into()),
    }
}
