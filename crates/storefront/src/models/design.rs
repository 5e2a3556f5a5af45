//! Catalog design types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use threadline_core::{DesignId, Fields};

/// Field holding a design's display name; used for duplicate detection.
pub const NAME_FIELD: &str = "name";

/// A catalog design submitted for import.
///
/// ```yaml
/// - id: rose-hoop          # optional, derived from name when absent
///   name: Rose Hoop
///   price: "42.00"
///   fabrics: [linen, cotton]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignInput {
    /// Explicit catalog ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name. Must be non-empty and unique across the catalog.
    pub name: String,

    /// Remaining catalog fields, stored as given.
    #[serde(flatten)]
    pub fields: Fields,
}

impl DesignInput {
    /// The ID this design will be stored under.
    ///
    /// Uses the explicit `id` if present, otherwise a slug of `name`. Returns
    /// `None` when neither yields a usable path segment.
    #[must_use]
    pub fn resolved_id(&self) -> Option<DesignId> {
        let id = match &self.id {
            Some(id) => id.trim().to_owned(),
            None => slugify(&self.name),
        };
        (!id.is_empty() && !id.contains('/')).then(|| DesignId::new(id))
    }

    /// The stored document body: catalog fields plus `name`.
    #[must_use]
    pub fn into_fields(self) -> Fields {
        let mut fields = self.fields;
        fields.insert(NAME_FIELD.to_owned(), Value::String(self.name));
        fields
    }
}

/// Lowercase ASCII slug: alphanumerics kept, everything else collapsed to `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
