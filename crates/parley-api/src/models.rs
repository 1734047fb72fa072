//! Model list lookups

use crate::types::{DEFAULT_MODEL, ModelDescriptor};

/// Look up a model by exact slug.
pub fn find_by_slug<'a>(models: &'a [ModelDescriptor], slug: &str) -> Option<&'a ModelDescriptor> {
    models.iter().find(|m| m.slug == slug)
}

/// Find a model by a user-typed query: exact slug, then slug substring,
/// then title substring. Case-insensitive.
pub fn find_model<'a>(models: &'a [ModelDescriptor], query: &str) -> Option<&'a ModelDescriptor> {
    let query = query.to_lowercase();

    if let Some(model) = models.iter().find(|m| m.slug.to_lowercase() == query) {
        return Some(model);
    }

    if let Some(model) = models
        .iter()
        .find(|m| m.slug.to_lowercase().contains(&query))
    {
        return Some(model);
    }

    models
        .iter()
        .find(|m| m.title.to_lowercase().contains(&query))
}

/// Whether `slug` can be sent: the sentinel always can, anything else must
/// be in the list. An empty list accepts everything (not fetched yet).
pub fn is_selectable(models: &[ModelDescriptor], slug: &str) -> bool {
    slug == DEFAULT_MODEL || models.is_empty() || find_by_slug(models, slug).is_some()
}
