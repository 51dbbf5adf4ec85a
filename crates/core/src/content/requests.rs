//! API request and response types for content operations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{Content, ContentStatus, ContentType};
use crate::text::LocalizedText;
use crate::validation::{validate_required, validate_slug, ValidationError, MAX_TITLE_LEN};

/// Page size used when a listing does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentRequest {
    pub slug: String,
    pub content_type: ContentType,
    pub title: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<LocalizedText>,
    pub body: LocalizedText,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateContentRequest {
    pub fn new(
        slug: impl Into<String>,
        content_type: ContentType,
        title: impl Into<LocalizedText>,
        body: impl Into<LocalizedText>,
    ) -> Self {
        Self {
            slug: slug.into(),
            content_type,
            title: title.into(),
            summary: None,
            body: body.into(),
            tags: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_slug(&self.slug)?;
        validate_required("title", &self.title.en, MAX_TITLE_LEN)
    }

    pub fn into_content(self, author_id: Option<Uuid>) -> Content {
        let mut content = Content::new(self.slug, self.content_type, self.title, self.body);
        content.summary = self.summary;
        content.tags = self.tags;
        content.author_id = author_id;
        content
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
}

impl UpdateContentRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(slug) = &self.slug {
            validate_slug(slug)?;
        }
        if let Some(title) = &self.title {
            validate_required("title", &title.en, MAX_TITLE_LEN)?;
        }
        Ok(())
    }

    pub fn changed_slug<'a>(&'a self, content: &Content) -> Option<&'a str> {
        self.slug.as_deref().filter(|slug| *slug != content.slug)
    }

    /// Applies the changes, enforcing the status lifecycle.
    pub fn apply_to(self, content: &mut Content) -> Result<(), ValidationError> {
        if let Some(status) = self.status {
            if status == ContentStatus::Published {
                content.publish(chrono::Utc::now())?;
            } else {
                content.status = content.status.transition_to(status)?;
            }
        }
        if let Some(slug) = self.slug {
            content.slug = slug;
        }
        if let Some(title) = self.title {
            content.title = title;
        }
        if let Some(summary) = self.summary {
            content.summary = Some(summary);
        }
        if let Some(body) = self.body {
            content.body = body;
        }
        if let Some(tags) = self.tags {
            content.tags = tags;
        }
        Ok(())
    }
}

/// Query string of the content listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListContentQuery {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl ListContentQuery {
    pub fn page_size(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentListResponse {
    pub items: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}
