//! Guest bag item types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use threadline_core::Fields;

/// A designed-garment draft captured while the visitor was signed out.
///
/// Only `id` and `_displayDetails` are known to the storefront; every other
/// field is order configuration (fabric, color, measurements, ...) and is
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestBagItem {
    /// Locally generated identifier, meaningless outside the guest session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// Presentation-only snapshot used to render the bag.
    #[serde(
        rename = "_displayDetails",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_details: Option<Value>,

    /// Order configuration.
    #[serde(flatten)]
    pub order: Fields,
}

impl From<Fields> for GuestBagItem {
    /// Split a submitted draft into its local and order fields.
    fn from(mut fields: Fields) -> Self {
        Self {
            id: fields.remove("id"),
            display_details: fields.remove("_displayDetails"),
            order: fields,
        }
    }
}

impl GuestBagItem {
    /// The fields persisted as a draft: everything except `id` and
    /// `_displayDetails`.
    #[must_use]
    pub fn into_draft_fields(self) -> Fields {
        self.order
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_strips_local_fields() {
        let item: GuestBagItem = serde_json::from_value(json!({
            "id": "g1",
            "_displayDetails": {"title": "Rose hoop"},
            "fabric": "silk",
            "color": "red",
            "measurements": {"chest": 96}
        }))
        .unwrap();

        let draft = item.into_draft_fields();
        assert_eq!(
            Value::Object(draft),
            json!({"fabric": "silk", "color": "red", "measurements": {"chest": 96}})
        );
    }

    #[test]
    fn test_item_without_local_fields() {
        let item: GuestBagItem = serde_json::from_value(json!({"fabric": "linen"})).unwrap();
        assert!(item.id.is_none());
        assert!(item.display_details.is_none());
        assert_eq!(item.into_draft_fields().len(), 1);
    }

    #[test]
    fn test_numeric_local_id_accepted() {
        let item: GuestBagItem = serde_json::from_value(json!({"id": 17, "color": "blue"})).unwrap();
        assert_eq!(item.id, Some(json!(17)));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(serde_json::from_value::<GuestBagItem>(json!("silk")).is_err());
    }
}
