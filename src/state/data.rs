/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the storage layer and the UI layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A locally persisted snapshot of one post
///
/// Stored as one element of the JSON array under the drafts key.
/// Field names match the camelCase layout of the stored records.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    /// Millisecond creation time, unique within the collection
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Comma-delimited by convention, never parsed here
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub category: String,
    /// External URL or `data:` URI
    #[serde(default)]
    pub image: String,
    /// Editor content, opaque to the store
    #[serde(default)]
    pub content: String,
    /// Set on first save, never overwritten
    #[serde(default)]
    pub publish_time: Option<DateTime<Utc>>,
    /// Refreshed on every save
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    /// Title for list display
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }

    /// True when every user-editable field is empty
    #[cfg(test)]
    pub fn is_blank(&self) -> bool {
        self.title.is_empty()
            && self.tags.is_empty()
            && self.slug.is_empty()
            && self.category.is_empty()
            && self.image.is_empty()
            && self.content.is_empty()
    }
}

/// Sort drafts for display, most recently updated first
pub fn sort_recent_first(drafts: &mut [Draft]) {
    drafts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_uses_camel_case_field_names() {
        let draft = Draft {
            id: "1700000000000".to_string(),
            title: "Hello".to_string(),
            publish_time: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            ..Default::default()
        };

        let json = serde_json::to_value(&draft).unwrap();

        assert_eq!(json["id"], "1700000000000");
        assert!(json.get("publishTime").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("publish_time").is_none());
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let draft: Draft =
            serde_json::from_str(r#"{"id":"42","updatedAt":"2024-05-01T10:00:00.000Z"}"#).unwrap();

        assert_eq!(draft.id, "42");
        assert_eq!(draft.title, "");
        assert_eq!(draft.content, "");
        assert_eq!(draft.publish_time, None);
        assert!(draft.is_blank());
    }

    #[test]
    fn test_display_title_falls_back() {
        let mut draft = Draft::default();
        assert_eq!(draft.display_title(), "(Untitled)");

        draft.title = "My post".to_string();
        assert_eq!(draft.display_title(), "My post");
    }

    #[test]
    fn test_sort_recent_first() {
        let at = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
        let mut drafts = vec![
            Draft { id: "a".into(), updated_at: at(1), ..Default::default() },
            Draft { id: "b".into(), updated_at: at(3), ..Default::default() },
            Draft { id: "c".into(), updated_at: at(2), ..Default::default() },
        ];

        sort_recent_first(&mut drafts);

        let ids: Vec<_> = drafts.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }
}
