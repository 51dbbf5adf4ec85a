use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::text::LocalizedText;
use crate::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Article,
    Teaching,
    Event,
    Announcement,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Teaching => "teaching",
            ContentType::Event => "event",
            ContentType::Announcement => "announcement",
        }
    }
}

/// Publication lifecycle: draft -> published -> archived.
///
/// A draft may also be archived directly, and an archived item may be
/// reopened as a draft. Published items cannot return to draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }

    pub fn can_transition_to(self, next: ContentStatus) -> bool {
        use ContentStatus::*;
        matches!(
            (self, next),
            (Draft, Published) | (Draft, Archived) | (Published, Archived) | (Archived, Draft)
        )
    }

    pub fn transition_to(self, next: ContentStatus) -> Result<ContentStatus, ValidationError> {
        if self == next {
            return Ok(self);
        }
        if !self.can_transition_to(next) {
            return Err(ValidationError::InvalidTransition {
                from: self.as_str(),
                to: next.as_str(),
            });
        }
        Ok(next)
    }
}

/// A published piece of site content: article, teaching, event or
/// announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: Uuid,
    pub slug: String,
    pub content_type: ContentType,
    pub title: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<LocalizedText>,
    pub body: LocalizedText,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<Uuid>,
    pub status: ContentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Content {
    pub fn new(
        slug: impl Into<String>,
        content_type: ContentType,
        title: impl Into<LocalizedText>,
        body: impl Into<LocalizedText>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            slug: slug.into(),
            content_type,
            title: title.into(),
            summary: None,
            body: body.into(),
            tags: Vec::new(),
            author_id: None,
            status: ContentStatus::Draft,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the item to `published`, stamping `publishedAt` the first time.
    pub fn publish(&mut self, at: DateTime<Utc>) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(ContentStatus::Published)?;
        self.published_at.get_or_insert(at);
        Ok(())
    }

    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Published
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use ContentStatus::*;
        assert!(Draft.can_transition_to(Published));
        assert!(Published.can_transition_to(Archived));
        assert!(Archived.can_transition_to(Draft));
        assert!(!Published.can_transition_to(Draft));
        assert!(!Archived.can_transition_to(Published));
        assert_eq!(Published.transition_to(Published), Ok(Published));
        assert_eq!(
            Published.transition_to(Draft),
            Err(ValidationError::InvalidTransition {
                from: "published",
                to: "draft"
            })
        );
    }

    #[test]
    fn test_publish_stamps_once() {
        let mut content = Content::new("gita", ContentType::Teaching, "Gita", "Chapter one");
        let first = Utc::now();
        content.publish(first).unwrap();
        content.publish(first + chrono::Duration::hours(1)).unwrap();

        assert!(content.is_published());
        assert_eq!(content.published_at, Some(first));
    }

    #[test]
    fn test_archived_content_cannot_be_published() {
        let mut content = Content::new("old", ContentType::Event, "Old", "Past event");
        content.status = ContentStatus::Archived;
        assert!(content.publish(Utc::now()).is_err());
    }
}
