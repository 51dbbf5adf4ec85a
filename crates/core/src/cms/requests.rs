//! API request types for CMS operations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{CmsComponent, CmsPage, ComponentField, ComponentType};
use crate::text::LocalizedText;
use crate::validation::{validate_required, validate_slug, ValidationError, MAX_TITLE_LEN};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePageRequest {
    pub slug: String,
    pub title: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl CreatePageRequest {
    pub fn new(slug: impl Into<String>, title: impl Into<LocalizedText>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            description: None,
            display_order: None,
            published: None,
        }
    }

    pub fn with_display_order(mut self, display_order: u32) -> Self {
        self.display_order = Some(display_order);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_slug(&self.slug)?;
        validate_required("title", &self.title.en, MAX_TITLE_LEN)
    }

    pub fn into_page(self) -> CmsPage {
        let mut page = CmsPage::new(self.slug, self.title)
            .with_display_order(self.display_order.unwrap_or_default());
        page.description = self.description;
        page.published = self.published.unwrap_or(false);
        page
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl UpdatePageRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(slug) = &self.slug {
            validate_slug(slug)?;
        }
        if let Some(title) = &self.title {
            validate_required("title", &title.en, MAX_TITLE_LEN)?;
        }
        Ok(())
    }

    /// Returns the new slug when the update changes it.
    pub fn changed_slug<'a>(&'a self, page: &CmsPage) -> Option<&'a str> {
        self.slug.as_deref().filter(|slug| *slug != page.slug)
    }

    pub fn apply_to(self, page: &mut CmsPage) {
        if let Some(slug) = self.slug {
            page.slug = slug;
        }
        if let Some(title) = self.title {
            page.title = title;
        }
        if let Some(description) = self.description {
            page.description = Some(description);
        }
        if let Some(display_order) = self.display_order {
            page.display_order = display_order;
        }
        if let Some(published) = self.published {
            page.published = published;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComponentRequest {
    pub component_type: ComponentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<u32>,
    #[serde(default)]
    pub fields: Vec<ComponentField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl CreateComponentRequest {
    pub fn new(component_type: ComponentType) -> Self {
        Self {
            component_type,
            display_order: None,
            fields: Vec::new(),
            visible: None,
        }
    }

    pub fn with_display_order(mut self, display_order: u32) -> Self {
        self.display_order = Some(display_order);
        self
    }

    pub fn with_field(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.fields.push(ComponentField::new(key, value));
        self
    }

    /// Builds the component, placing it at `next_order` when no explicit
    /// order was requested.
    pub fn into_component(self, page_id: Uuid, next_order: u32) -> CmsComponent {
        let mut component = CmsComponent::new(
            page_id,
            self.component_type,
            self.display_order.unwrap_or(next_order),
        );
        component.fields = self.fields;
        component.visible = self.visible.unwrap_or(true);
        component
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateComponentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<ComponentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<ComponentField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl UpdateComponentRequest {
    pub fn apply_to(self, component: &mut CmsComponent) {
        if let Some(component_type) = self.component_type {
            component.component_type = component_type;
        }
        if let Some(display_order) = self.display_order {
            component.display_order = display_order;
        }
        if let Some(fields) = self.fields {
            component.fields = fields;
        }
        if let Some(visible) = self.visible {
            component.visible = visible;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderComponentsRequest {
    pub component_ids: Vec<Uuid>,
}
