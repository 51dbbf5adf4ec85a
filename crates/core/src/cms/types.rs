use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::text::LocalizedText;

/// A CMS-managed page of the public site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmsPage {
    pub id: Uuid,
    pub slug: String,
    pub title: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    pub display_order: u32,
    pub published: bool,
    /// Denormalized ordering pointer; the components themselves are found
    /// through their own index.
    #[serde(default)]
    pub component_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CmsPage {
    pub fn new(slug: impl Into<String>, title: impl Into<LocalizedText>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            slug: slug.into(),
            title: title.into(),
            description: None,
            display_order: 0,
            published: false,
            component_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_display_order(mut self, display_order: u32) -> Self {
        self.display_order = display_order;
        self
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    HeroSection,
    TextBlock,
    ImageGallery,
    UpcomingEvents,
    VideoEmbed,
    Quote,
    CallToAction,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::HeroSection => "hero_section",
            ComponentType::TextBlock => "text_block",
            ComponentType::ImageGallery => "image_gallery",
            ComponentType::UpcomingEvents => "upcoming_events",
            ComponentType::VideoEmbed => "video_embed",
            ComponentType::Quote => "quote",
            ComponentType::CallToAction => "call_to_action",
        }
    }
}

/// One editable field of a component, e.g. `heading` or `backgroundImage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentField {
    pub key: String,
    pub value: Value,
}

impl ComponentField {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A block placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmsComponent {
    pub id: Uuid,
    pub page_id: Uuid,
    pub component_type: ComponentType,
    pub display_order: u32,
    #[serde(default)]
    pub fields: Vec<ComponentField>,
    pub visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CmsComponent {
    pub fn new(page_id: Uuid, component_type: ComponentType, display_order: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            page_id,
            component_type,
            display_order,
            fields: Vec::new(),
            visible: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(ComponentField::new(key, value));
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
    }
}

/// A page together with its components in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWithComponents {
    #[serde(flatten)]
    pub page: CmsPage,
    pub components: Vec<CmsComponent>,
}
