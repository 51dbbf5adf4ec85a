use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use peeth_core::cms::{
    apply_component_order, component_to_record, next_display_order, page_to_record,
    record_to_component, record_to_page, CmsComponent, CmsPage, CreateComponentRequest,
    CreatePageRequest, PageWithComponents, ReorderComponentsRequest, UpdateComponentRequest,
    UpdatePageRequest,
};
use peeth_core::error::{ServiceError, ServiceResult};
use peeth_core::keys::{self, CMS_COMPONENT, CMS_PAGE};
use peeth_core::storage::{
    BatchWriteOp, FieldUpdate, Index, KeyCondition, QueryOptions, Storage, UpdateOptions,
};

use super::{ensure_unique, find_by_gsi2, query_all, write_changes};

const COMPONENT_IDS: &str = "componentIds";

/// CMS pages and their components.
#[derive(Clone)]
pub struct CmsService {
    storage: Arc<dyn Storage>,
}

impl CmsService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    // ========================================================================
    // Pages
    // ========================================================================

    pub async fn create_page(&self, request: CreatePageRequest) -> ServiceResult<CmsPage> {
        request.validate()?;
        self.ensure_slug_free(&request.slug, None).await?;

        let page = request.into_page();
        let stored = self.storage.put(page_to_record(&page)?).await?;
        let page = record_to_page(stored)?;

        tracing::info!(page_id = %page.id, slug = %page.slug, "CMS page created");
        Ok(page)
    }

    pub async fn get_page(&self, id: Uuid) -> ServiceResult<CmsPage> {
        match self.storage.get(&keys::cms_page_key(id)).await? {
            Some(record) => Ok(record_to_page(record)?),
            None => Err(ServiceError::not_found(CMS_PAGE, id)),
        }
    }

    pub async fn get_page_by_slug(&self, slug: &str) -> ServiceResult<CmsPage> {
        match find_by_gsi2(self.storage.as_ref(), CMS_PAGE, keys::slug_gsi2_pk(slug)).await? {
            Some(record) => Ok(record_to_page(record)?),
            None => Err(ServiceError::not_found(CMS_PAGE, slug)),
        }
    }

    /// Attaches the page's components in display order.
    pub async fn with_components(&self, page: CmsPage) -> ServiceResult<PageWithComponents> {
        let components = self.find_components_by_page(page.id).await?;
        Ok(PageWithComponents { page, components })
    }

    /// Every page, ascending by display order.
    pub async fn list_pages(&self) -> ServiceResult<Vec<CmsPage>> {
        let options = QueryOptions::new(Index::Gsi1, KeyCondition::partition(CMS_PAGE));
        let records = query_all(self.storage.as_ref(), CMS_PAGE, options).await?;
        Ok(records
            .into_iter()
            .map(record_to_page)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Writes only the attributes the request changes, with the GSI keys
    /// following a new slug or display order.
    pub async fn update_page(
        &self,
        id: Uuid,
        request: UpdatePageRequest,
    ) -> ServiceResult<CmsPage> {
        request.validate()?;
        let current = self.get_page(id).await?;

        if let Some(slug) = request.changed_slug(&current) {
            let owner = keys::cms_page_key(id).pk;
            self.ensure_slug_free(slug, Some(&owner)).await?;
        }
        let mut page = current.clone();
        request.apply_to(&mut page);

        let stored = write_changes(
            self.storage.as_ref(),
            CMS_PAGE,
            id,
            page_to_record(&current)?,
            &page_to_record(&page)?,
        )
        .await?;
        Ok(record_to_page(stored)?)
    }

    /// Deletes the page's components first, then the page.
    pub async fn delete_page(&self, id: Uuid) -> ServiceResult<()> {
        let page = self.get_page(id).await?;
        let components = self.find_components_by_page(id).await?;
        let count = components.len();

        let ops = components
            .iter()
            .map(|c| BatchWriteOp::Delete(keys::cms_component_key(c.id)))
            .collect();
        self.storage.batch_write(ops).await?;
        self.storage.delete(&keys::cms_page_key(id)).await?;

        tracing::info!(page_id = %id, slug = %page.slug, components = count, "CMS page deleted");
        Ok(())
    }

    async fn ensure_slug_free(&self, slug: &str, owner: Option<&str>) -> ServiceResult<()> {
        ensure_unique(
            self.storage.as_ref(),
            CMS_PAGE,
            keys::slug_gsi2_pk(slug),
            "slug",
            slug,
            owner,
        )
        .await
    }

    // ========================================================================
    // Components
    // ========================================================================

    /// Adds a component to an existing page, by default after the last one.
    pub async fn create_component(
        &self,
        page_id: Uuid,
        request: CreateComponentRequest,
    ) -> ServiceResult<CmsComponent> {
        self.get_page(page_id).await?;
        let existing = self.find_components_by_page(page_id).await?;

        let component = request.into_component(page_id, next_display_order(&existing));
        let stored = self.storage.put(component_to_record(&component)?).await?;
        let component = record_to_component(stored)?;

        self.storage
            .update(
                CMS_PAGE,
                UpdateOptions::new(
                    keys::cms_page_key(page_id),
                    FieldUpdate::new().append(COMPONENT_IDS, component.id.to_string()),
                ),
            )
            .await?;

        tracing::debug!(
            page_id = %page_id,
            component_id = %component.id,
            order = component.display_order,
            "CMS component created"
        );
        Ok(component)
    }

    pub async fn get_component(&self, id: Uuid) -> ServiceResult<CmsComponent> {
        match self.storage.get(&keys::cms_component_key(id)).await? {
            Some(record) => Ok(record_to_component(record)?),
            None => Err(ServiceError::not_found(CMS_COMPONENT, id)),
        }
    }

    /// A page's components, ascending by display order.
    pub async fn find_components_by_page(
        &self,
        page_id: Uuid,
    ) -> ServiceResult<Vec<CmsComponent>> {
        let options = QueryOptions::new(
            Index::Gsi1,
            KeyCondition::partition(keys::page_components_pk(page_id)),
        );
        let records = query_all(self.storage.as_ref(), CMS_COMPONENT, options).await?;
        Ok(records
            .into_iter()
            .map(record_to_component)
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn update_component(
        &self,
        id: Uuid,
        request: UpdateComponentRequest,
    ) -> ServiceResult<CmsComponent> {
        let current = self.get_component(id).await?;
        let mut component = current.clone();
        request.apply_to(&mut component);

        let stored = write_changes(
            self.storage.as_ref(),
            CMS_COMPONENT,
            id,
            component_to_record(&current)?,
            &component_to_record(&component)?,
        )
        .await?;
        Ok(record_to_component(stored)?)
    }

    /// Deletes a component and drops it from its page's `componentIds`.
    pub async fn delete_component(&self, id: Uuid) -> ServiceResult<()> {
        let component = self.get_component(id).await?;
        self.storage.delete(&keys::cms_component_key(id)).await?;

        match self.get_page(component.page_id).await {
            Ok(page) => {
                let remaining: Vec<Uuid> = page
                    .component_ids
                    .into_iter()
                    .filter(|component_id| *component_id != id)
                    .collect();
                self.set_component_ids(component.page_id, &remaining).await?;
            }
            Err(ServiceError::NotFound { .. }) => {
                tracing::warn!(
                    component_id = %id,
                    page_id = %component.page_id,
                    "component had no page"
                );
            }
            Err(e) => return Err(e),
        }

        Ok(())
    }

    /// Rewrites every component's display order (and so its GSI1 sort key)
    /// to match `component_ids`, then stores the new order on the page.
    pub async fn reorder_components(
        &self,
        page_id: Uuid,
        request: ReorderComponentsRequest,
    ) -> ServiceResult<Vec<CmsComponent>> {
        self.get_page(page_id).await?;
        let components = self.find_components_by_page(page_id).await?;
        let ordered = apply_component_order(components, &request.component_ids)?;

        let ops = ordered
            .iter()
            .map(|c| component_to_record(c).map(BatchWriteOp::Put))
            .collect::<Result<Vec<_>, _>>()?;
        self.storage.batch_write(ops).await?;
        self.set_component_ids(page_id, &request.component_ids).await?;

        tracing::debug!(page_id = %page_id, count = ordered.len(), "CMS components reordered");
        Ok(ordered)
    }

    async fn set_component_ids(&self, page_id: Uuid, ids: &[Uuid]) -> ServiceResult<()> {
        let ids: Vec<Value> = ids.iter().map(|id| Value::String(id.to_string())).collect();
        self.storage
            .update(
                CMS_PAGE,
                UpdateOptions::new(
                    keys::cms_page_key(page_id),
                    FieldUpdate::new().set(COMPONENT_IDS, ids),
                ),
            )
            .await?;
        Ok(())
    }
}
