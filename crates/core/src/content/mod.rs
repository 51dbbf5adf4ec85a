//! Articles, teachings, events and announcements.

mod requests;
mod types;

pub use requests::{
    ContentListResponse, CreateContentRequest, ListContentQuery, UpdateContentRequest,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use types::{Content, ContentStatus, ContentType};

use crate::keys;
use crate::storage::{Record, Result};

pub fn content_to_record(content: &Content) -> Result<Record> {
    let (gsi1pk, gsi1sk) =
        keys::content_gsi1(content.content_type.as_str(), content.created_at, content.id);
    let (gsi2pk, gsi2sk) = keys::content_gsi2(&content.slug, content.id);
    Ok(Record::from_entity(keys::content_key(content.id), content)?
        .with_gsi1(gsi1pk, gsi1sk)
        .with_gsi2(gsi2pk, gsi2sk))
}

pub fn record_to_content(record: Record) -> Result<Content> {
    record.into_entity()
}
