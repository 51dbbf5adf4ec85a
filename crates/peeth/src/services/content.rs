use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use peeth_core::content::{
    content_to_record, record_to_content, Content, ContentListResponse, CreateContentRequest,
    ListContentQuery, UpdateContentRequest,
};
use peeth_core::error::{ServiceError, ServiceResult};
use peeth_core::keys::{self, CONTENT};
use peeth_core::storage::{ContinuationToken, Filter, Index, KeyCondition, QueryOptions, Storage};

use super::{ensure_unique, find_by_gsi2, write_changes};

/// Articles, teachings, events and announcements.
#[derive(Clone)]
pub struct ContentService {
    storage: Arc<dyn Storage>,
}

impl ContentService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn create(
        &self,
        request: CreateContentRequest,
        author_id: Option<Uuid>,
    ) -> ServiceResult<Content> {
        request.validate()?;
        self.ensure_slug_free(&request.slug, None).await?;

        let content = request.into_content(author_id);
        let stored = self.storage.put(content_to_record(&content)?).await?;
        let content = record_to_content(stored)?;

        tracing::info!(
            content_id = %content.id,
            content_type = content.content_type.as_str(),
            slug = %content.slug,
            "content created"
        );
        Ok(content)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Content> {
        match self.storage.get(&keys::content_key(id)).await? {
            Some(record) => Ok(record_to_content(record)?),
            None => Err(ServiceError::not_found(CONTENT, id)),
        }
    }

    pub async fn get_by_slug(&self, slug: &str) -> ServiceResult<Content> {
        match find_by_gsi2(self.storage.as_ref(), CONTENT, keys::slug_gsi2_pk(slug)).await? {
            Some(record) => Ok(record_to_content(record)?),
            None => Err(ServiceError::not_found(CONTENT, slug)),
        }
    }

    /// One page of content, newest first within a type.
    ///
    /// Without a type the GSI1 sort key groups results by type name first.
    /// The status filter runs after the limit on DynamoDB, so a page can
    /// come back short while `next_cursor` is still set.
    pub async fn list(&self, query: &ListContentQuery) -> ServiceResult<ContentListResponse> {
        let mut condition = KeyCondition::partition(CONTENT);
        if let Some(content_type) = query.content_type {
            condition = condition.begins_with(keys::content_type_prefix(content_type.as_str()));
        }

        let mut options = QueryOptions::new(Index::Gsi1, condition)
            .descending()
            .limit(query.page_size())
            .start_after(query.cursor.clone().map(ContinuationToken::from));
        if let Some(status) = query.status {
            options = options.filter(Filter::eq("status", status.as_str()));
        }

        let page = self.storage.query(CONTENT, options).await?;
        let items = page
            .items
            .into_iter()
            .map(record_to_content)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ContentListResponse {
            items,
            next_cursor: page.last_key.map(|token| token.as_str().to_string()),
        })
    }

    /// Writes only the attributes the request changes. A new slug moves
    /// the GSI2 entry with it.
    pub async fn update(&self, id: Uuid, request: UpdateContentRequest) -> ServiceResult<Content> {
        request.validate()?;
        let current = self.get(id).await?;

        if let Some(slug) = request.changed_slug(&current) {
            let owner = keys::content_key(id).pk;
            self.ensure_slug_free(slug, Some(&owner)).await?;
        }
        let mut content = current.clone();
        request.apply_to(&mut content)?;

        self.write(current, &content).await
    }

    /// Moves draft content to published, stamping `publishedAt` once.
    pub async fn publish(&self, id: Uuid) -> ServiceResult<Content> {
        let current = self.get(id).await?;
        let mut content = current.clone();
        content.publish(Utc::now())?;

        let content = self.write(current, &content).await?;
        tracing::info!(content_id = %id, slug = %content.slug, "content published");
        Ok(content)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        self.get(id).await?;
        self.storage.delete(&keys::content_key(id)).await?;
        tracing::info!(content_id = %id, "content deleted");
        Ok(())
    }

    async fn write(&self, current: Content, changed: &Content) -> ServiceResult<Content> {
        let stored = write_changes(
            self.storage.as_ref(),
            CONTENT,
            current.id,
            content_to_record(&current)?,
            &content_to_record(changed)?,
        )
        .await?;
        Ok(record_to_content(stored)?)
    }

    async fn ensure_slug_free(&self, slug: &str, owner: Option<&str>) -> ServiceResult<()> {
        ensure_unique(
            self.storage.as_ref(),
            CONTENT,
            keys::slug_gsi2_pk(slug),
            "slug",
            slug,
            owner,
        )
        .await
    }
}
