//! Pure CMS operations: record conversion and ordering rules.

use uuid::Uuid;

use super::types::{CmsComponent, CmsPage};
use crate::keys;
use crate::storage::{Record, Result};
use crate::validation::ValidationError;

pub fn page_to_record(page: &CmsPage) -> Result<Record> {
    let (gsi1pk, gsi1sk) = keys::cms_page_gsi1(page.display_order, page.id);
    let (gsi2pk, gsi2sk) = keys::cms_page_gsi2(&page.slug, page.id);
    Ok(Record::from_entity(keys::cms_page_key(page.id), page)?
        .with_gsi1(gsi1pk, gsi1sk)
        .with_gsi2(gsi2pk, gsi2sk))
}

pub fn record_to_page(record: Record) -> Result<CmsPage> {
    record.into_entity()
}

pub fn component_to_record(component: &CmsComponent) -> Result<Record> {
    let (gsi1pk, gsi1sk) =
        keys::cms_component_gsi1(component.page_id, component.display_order, component.id);
    Ok(Record::from_entity(keys::cms_component_key(component.id), component)?
        .with_gsi1(gsi1pk, gsi1sk))
}

pub fn record_to_component(record: Record) -> Result<CmsComponent> {
    record.into_entity()
}

/// Order for a component appended after the existing ones.
pub fn next_display_order(components: &[CmsComponent]) -> u32 {
    components
        .iter()
        .map(|c| c.display_order.saturating_add(1))
        .max()
        .unwrap_or(0)
}

/// Assigns display orders 0..n following `ordered_ids`.
///
/// `ordered_ids` must name every component of the page exactly once.
pub fn apply_component_order(
    components: Vec<CmsComponent>,
    ordered_ids: &[Uuid],
) -> std::result::Result<Vec<CmsComponent>, ValidationError> {
    if ordered_ids.len() != components.len() {
        return Err(ValidationError::ComponentOrderMismatch);
    }

    let mut remaining = components;
    let mut ordered = Vec::with_capacity(ordered_ids.len());
    for (position, id) in ordered_ids.iter().enumerate() {
        let index = remaining
            .iter()
            .position(|c| c.id == *id)
            .ok_or(ValidationError::ComponentOrderMismatch)?;
        let mut component = remaining.swap_remove(index);
        component.display_order = position as u32;
        ordered.push(component);
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::ComponentType;
    use crate::storage::{GSI1PK, GSI2PK};
    use serde_json::json;

    fn components(page_id: Uuid, n: u32) -> Vec<CmsComponent> {
        (0..n)
            .map(|i| CmsComponent::new(page_id, ComponentType::TextBlock, i))
            .collect()
    }

    #[test]
    fn test_page_record_carries_both_indexes() {
        let page = CmsPage::new("home", "Home").with_display_order(2);
        let record = page_to_record(&page).unwrap();

        assert_eq!(record.pk, format!("CMS_PAGE#{}", page.id));
        assert_eq!(record.gsi1pk.as_deref(), Some("CMS_PAGE"));
        assert_eq!(
            record.gsi1sk.as_deref(),
            Some(format!("ORDER#0000000002#{}", page.id).as_str())
        );
        assert_eq!(record.gsi2pk.as_deref(), Some("SLUG#home"));
        assert_eq!(record_to_page(record).unwrap(), page);
    }

    #[test]
    fn test_component_record_groups_under_page() {
        let page_id = Uuid::new_v4();
        let component = CmsComponent::new(page_id, ComponentType::HeroSection, 0)
            .with_field("heading", json!({"en": "Welcome"}));

        let record = component_to_record(&component).unwrap();
        let document = record.clone().into_document().unwrap();

        assert_eq!(document[GSI1PK], json!(format!("PAGE#{page_id}")));
        assert!(!document.contains_key(GSI2PK));
        assert_eq!(record_to_component(record).unwrap(), component);
    }

    #[test]
    fn test_next_display_order() {
        assert_eq!(next_display_order(&[]), 0);
        assert_eq!(next_display_order(&components(Uuid::nil(), 3)), 3);
    }

    #[test]
    fn test_apply_component_order_renumbers() {
        let page_id = Uuid::new_v4();
        let existing = components(page_id, 3);
        let reversed: Vec<Uuid> = existing.iter().rev().map(|c| c.id).collect();

        let ordered = apply_component_order(existing, &reversed).unwrap();

        let ids: Vec<Uuid> = ordered.iter().map(|c| c.id).collect();
        let orders: Vec<u32> = ordered.iter().map(|c| c.display_order).collect();
        assert_eq!(ids, reversed);
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_apply_component_order_rejects_partial_or_foreign_ids() {
        let page_id = Uuid::new_v4();
        let existing = components(page_id, 2);

        let partial = vec![existing[0].id];
        assert_eq!(
            apply_component_order(existing.clone(), &partial),
            Err(ValidationError::ComponentOrderMismatch)
        );

        let foreign = vec![existing[0].id, Uuid::new_v4()];
        assert_eq!(
            apply_component_order(existing.clone(), &foreign),
            Err(ValidationError::ComponentOrderMismatch)
        );

        let duplicated = vec![existing[0].id, existing[0].id];
        assert_eq!(
            apply_component_order(existing, &duplicated),
            Err(ValidationError::ComponentOrderMismatch)
        );
    }
}
