//! DTU entity

use crate::core::ids::DtuId;
use crate::revision::RevisionChanges;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An atomic knowledge unit (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dtu {
    pub id: DtuId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl Dtu {
    pub fn new(id: impl Into<DtuId>, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            tags: Vec::new(),
            updated_at: now,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Overwrite only the fields present in `changes` and stamp `updated_at`.
    pub fn apply_changes(&mut self, changes: &RevisionChanges, now: DateTime<Utc>) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(content) = &changes.content {
            self.content = content.clone();
        }
        if let Some(tags) = &changes.tags {
            self.tags = tags.clone();
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_changes_leaves_unset_fields() {
        let mut dtu = Dtu::new("dtu-1", "Old", Utc::now())
            .with_content("body")
            .with_tags(["a"]);
        dtu.apply_changes(&RevisionChanges::default().title("New"), Utc::now());
        assert_eq!(dtu.title, "New");
        assert_eq!(dtu.content, "body");
        assert_eq!(dtu.tags, vec!["a".to_string()]);
    }

    #[test]
    fn test_apply_changes_tags_and_content() {
        let mut dtu = Dtu::new("dtu-1", "T", Utc::now());
        let before = dtu.updated_at;
        dtu.apply_changes(
            &RevisionChanges::default().content("c").tags(["x", "y"]),
            before + chrono::Duration::seconds(1),
        );
        assert_eq!(dtu.title, "T");
        assert_eq!(dtu.content, "c");
        assert_eq!(dtu.tags.len(), 2);
        assert!(dtu.updated_at > before);
    }
}
