//! Single-table key conventions.
//!
//! Pure functions for the partition, sort and GSI values of every entity.
//! Both storage backends persist whatever these produce, so changing a
//! pattern here changes the stored layout everywhere.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::storage::RecordKey;

// ============================================================================
// Entity types and prefixes
// ============================================================================

pub const CMS_PAGE: &str = "CMS_PAGE";
pub const CMS_COMPONENT: &str = "CMS_COMPONENT";
pub const CONTENT: &str = "CONTENT";
pub const USER: &str = "USER";
pub const OTP: &str = "OTP";

pub const PAGE_PREFIX: &str = "PAGE#";
pub const SLUG_PREFIX: &str = "SLUG#";
pub const EMAIL_PREFIX: &str = "EMAIL#";
pub const ORDER_PREFIX: &str = "ORDER#";

/// Width of zero-padded order values in sort keys. Wide enough for any `u32`.
pub const ORDER_WIDTH: usize = 10;

/// Static label for an entity type token, used in error messages.
pub fn entity_label(entity_type: &str) -> &'static str {
    match entity_type {
        CMS_PAGE => CMS_PAGE,
        CMS_COMPONENT => CMS_COMPONENT,
        CONTENT => CONTENT,
        USER => USER,
        OTP => OTP,
        _ => "Record",
    }
}

// ============================================================================
// Shared patterns
// ============================================================================

/// Pattern: `<ENTITY_TYPE>#<id>`
pub fn entity_pk(entity_type: &str, id: impl std::fmt::Display) -> String {
    format!("{entity_type}#{id}")
}

/// Zero-pads an order value so lexicographic and numeric order agree.
///
/// ```
/// assert_eq!(peeth_core::keys::padded_order(7), "0000000007");
/// ```
pub fn padded_order(order: u32) -> String {
    format!("{order:0width$}", width = ORDER_WIDTH)
}

/// Pattern: `ORDER#<0000000000>#<id>`
pub fn order_sk(order: u32, id: Uuid) -> String {
    format!("{ORDER_PREFIX}{}#{id}", padded_order(order))
}

/// Fixed-width RFC 3339 timestamp, safe to sort as a string.
pub fn sortable_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Pattern: `SLUG#<slug>`
pub fn slug_gsi2_pk(slug: &str) -> String {
    format!("{SLUG_PREFIX}{slug}")
}

// ============================================================================
// CMS page keys
// ============================================================================

/// Pattern: `CMS_PAGE#<page_id>` for both PK and SK.
pub fn cms_page_key(page_id: Uuid) -> RecordKey {
    RecordKey::single(entity_pk(CMS_PAGE, page_id))
}

/// GSI1 lists every page by display order.
///
/// Pattern: `CMS_PAGE` / `ORDER#<0000000000>#<page_id>`
pub fn cms_page_gsi1(display_order: u32, page_id: Uuid) -> (String, String) {
    (CMS_PAGE.to_string(), order_sk(display_order, page_id))
}

/// GSI2 resolves a slug to its page.
///
/// Pattern: `SLUG#<slug>` / `CMS_PAGE#<page_id>`
pub fn cms_page_gsi2(slug: &str, page_id: Uuid) -> (String, String) {
    (slug_gsi2_pk(slug), entity_pk(CMS_PAGE, page_id))
}

// ============================================================================
// CMS component keys
// ============================================================================

/// Pattern: `CMS_COMPONENT#<component_id>` for both PK and SK.
pub fn cms_component_key(component_id: Uuid) -> RecordKey {
    RecordKey::single(entity_pk(CMS_COMPONENT, component_id))
}

/// Pattern: `PAGE#<page_id>`
pub fn page_components_pk(page_id: Uuid) -> String {
    format!("{PAGE_PREFIX}{page_id}")
}

/// GSI1 lists a page's components by display order.
///
/// Pattern: `PAGE#<page_id>` / `ORDER#<0000000000>#<component_id>`
pub fn cms_component_gsi1(
    page_id: Uuid,
    display_order: u32,
    component_id: Uuid,
) -> (String, String) {
    (
        page_components_pk(page_id),
        order_sk(display_order, component_id),
    )
}

// ============================================================================
// Content keys
// ============================================================================

/// Pattern: `CONTENT#<content_id>` for both PK and SK.
pub fn content_key(content_id: Uuid) -> RecordKey {
    RecordKey::single(entity_pk(CONTENT, content_id))
}

/// GSI1 lists content by type, then creation time.
///
/// Pattern: `CONTENT` / `<type>#<createdAt>#<content_id>`
pub fn content_gsi1(
    content_type: &str,
    created_at: DateTime<Utc>,
    content_id: Uuid,
) -> (String, String) {
    (
        CONTENT.to_string(),
        format!(
            "{content_type}#{}#{content_id}",
            sortable_timestamp(created_at)
        ),
    )
}

/// Sort key prefix selecting one content type on GSI1.
pub fn content_type_prefix(content_type: &str) -> String {
    format!("{content_type}#")
}

/// Pattern: `SLUG#<slug>` / `CONTENT#<content_id>`
pub fn content_gsi2(slug: &str, content_id: Uuid) -> (String, String) {
    (slug_gsi2_pk(slug), entity_pk(CONTENT, content_id))
}

// ============================================================================
// User keys
// ============================================================================

/// Pattern: `USER#<user_id>` for both PK and SK.
pub fn user_key(user_id: Uuid) -> RecordKey {
    RecordKey::single(entity_pk(USER, user_id))
}

/// Pattern: `USER` / `<createdAt>#<user_id>`
pub fn user_gsi1(created_at: DateTime<Utc>, user_id: Uuid) -> (String, String) {
    (
        USER.to_string(),
        format!("{}#{user_id}", sortable_timestamp(created_at)),
    )
}

/// Pattern: `EMAIL#<email>`, email lowercased.
pub fn email_gsi2_pk(email: &str) -> String {
    format!("{EMAIL_PREFIX}{}", email.to_lowercase())
}

/// Pattern: `EMAIL#<email>` / `USER#<user_id>`
pub fn user_gsi2(email: &str, user_id: Uuid) -> (String, String) {
    (email_gsi2_pk(email), entity_pk(USER, user_id))
}

// ============================================================================
// OTP challenge keys
// ============================================================================

/// Pattern: `OTP#<email>` for both PK and SK, email lowercased.
pub fn otp_key(email: &str) -> RecordKey {
    RecordKey::single(entity_pk(OTP, email.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_order_sort_keys_sort_numerically() {
        let id = Uuid::nil();
        let mut keys = vec![order_sk(10, id), order_sk(2, id), order_sk(100, id)];
        keys.sort();
        assert_eq!(
            keys,
            vec![order_sk(2, id), order_sk(10, id), order_sk(100, id)]
        );
        assert!(keys[0].starts_with("ORDER#0000000002#"));
    }

    #[test]
    fn test_largest_orders_keep_numeric_order() {
        let id = Uuid::nil();
        let below = order_sk(999_999, id);
        let above = order_sk(1_000_000, id);
        let max = order_sk(u32::MAX, id);

        assert!(below < above);
        assert!(above < max);
        assert_eq!(padded_order(u32::MAX).len(), ORDER_WIDTH);
    }

    #[test]
    fn test_page_keys() {
        let id = Uuid::new_v4();
        let key = cms_page_key(id);
        assert_eq!(key.pk, format!("CMS_PAGE#{id}"));
        assert_eq!(key.pk, key.sk);

        let (pk, sk) = cms_page_gsi2("home", id);
        assert_eq!(pk, "SLUG#home");
        assert_eq!(sk, format!("CMS_PAGE#{id}"));
    }

    #[test]
    fn test_component_gsi1_groups_by_page() {
        let page_id = Uuid::new_v4();
        let component_id = Uuid::new_v4();
        let (pk, sk) = cms_component_gsi1(page_id, 3, component_id);
        assert_eq!(pk, format!("PAGE#{page_id}"));
        assert_eq!(sk, format!("ORDER#0000000003#{component_id}"));
    }

    #[test]
    fn test_content_gsi1_has_fixed_width_timestamp() {
        let id = Uuid::nil();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 6, 30, 0).unwrap();
        let (pk, sk) = content_gsi1("article", at, id);
        assert_eq!(pk, "CONTENT");
        assert_eq!(sk, format!("article#2024-05-01T06:30:00.000Z#{id}"));
        assert!(sk.starts_with(&content_type_prefix("article")));
    }

    #[test]
    fn test_email_keys_are_lowercased() {
        assert_eq!(email_gsi2_pk("Seva@Example.org"), "EMAIL#seva@example.org");
        assert_eq!(otp_key("Seva@Example.org").pk, "OTP#seva@example.org");
    }
}
