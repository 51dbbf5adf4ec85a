//! CMS pages and their ordered components.

mod operations;
mod requests;
mod types;

pub use operations::{
    apply_component_order, component_to_record, next_display_order, page_to_record,
    record_to_component, record_to_page,
};
pub use requests::{
    CreateComponentRequest, CreatePageRequest, ReorderComponentsRequest, UpdateComponentRequest,
    UpdatePageRequest,
};
pub use types::{CmsComponent, CmsPage, ComponentField, ComponentType, PageWithComponents};
