use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub(crate) mod timestamp;

/// A note as stored by the backend.
///
/// The backend is Mongo-flavoured: the id travels as `_id` and the owner as `user`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Note {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,

    #[serde(rename = "user")]
    pub owner: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub content: String,

    /// Display order is kept; duplicates carry no meaning.
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub is_archived: bool,
}

impl Note {
    /// Clamp `updated_at` so it never precedes `created_at`.
    pub(crate) fn normalized(mut self) -> Self {
        if self.updated_at < self.created_at {
            tracing::warn!(id = %self.id, "note updated_at precedes created_at; clamping");
            self.updated_at = self.created_at;
        }
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Fields for a note that does not exist on the server yet.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_archived: bool,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

impl From<&Note> for NoteDraft {
    fn from(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            tags: note.tags.clone(),
            is_archived: note.is_archived,
        }
    }
}

/// Partial edit of an existing note. `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_archived: Option<bool>,
}

impl NotePatch {
    pub fn archive() -> Self {
        Self {
            is_archived: Some(true),
            ..Default::default()
        }
    }

    /// Resolve the patch against the last known values of a note.
    pub(crate) fn apply_to(self, base: &Note) -> NoteDraft {
        NoteDraft {
            title: self.title.unwrap_or_else(|| base.title.clone()),
            content: self.content.unwrap_or_else(|| base.content.clone()),
            tags: self.tags.unwrap_or_else(|| base.tags.clone()),
            is_archived: self.is_archived.unwrap_or(base.is_archived),
        }
    }
}

impl From<NoteDraft> for NotePatch {
    fn from(d: NoteDraft) -> Self {
        Self {
            title: Some(d.title),
            content: Some(d.content),
            tags: Some(d.tags),
            is_archived: Some(d.is_archived),
        }
    }
}

/// Trim tags, drop empty ones and keep only the first occurrence of each.
pub(crate) fn clean_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || out.iter().any(|t| t == tag) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}

#[cfg(test)]
pub(crate) fn sample_note(id: &str, title: &str, created_at: DateTime<Utc>) -> Note {
    Note {
        id: id.to_string(),
        owner: "alice".to_string(),
        title: title.to_string(),
        content: String::new(),
        tags: vec![],
        created_at,
        updated_at: created_at,
        is_archived: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_note_contract_deserialize() {
        // Shape returned by GET /notes/user/{user}.
        let json = r#"{
            "_id": "65f0c0ffee",
            "title": "Groceries",
            "content": "milk, eggs",
            "user": "alice",
            "created_at": "2024-05-01T10:00:00.123000",
            "updated_at": "2024-05-02T08:30:00",
            "tags": ["home", "todo"],
            "is_archived": false
        }"#;
        let note: Note = serde_json::from_str(json).expect("note should parse");
        assert_eq!(note.id, "65f0c0ffee");
        assert_eq!(note.owner, "alice");
        assert_eq!(note.tags, vec!["home", "todo"]);
        assert!(!note.is_archived);
        assert!(note.updated_at > note.created_at);
    }

    #[test]
    fn test_note_missing_optional_fields_default() {
        let json = r#"{
            "id": "n1",
            "user": "bob",
            "title": "t",
            "content": "c",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z"
        }"#;
        let note: Note = serde_json::from_str(json).expect("note should parse");
        assert_eq!(note.id, "n1");
        assert!(note.tags.is_empty());
        assert!(!note.is_archived);
    }

    #[test]
    fn test_normalized_clamps_updated_at() {
        let created = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let mut note = sample_note("n1", "t", created);
        note.updated_at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let note = note.normalized();
        assert_eq!(note.updated_at, created);
    }

    #[test]
    fn test_patch_keeps_unset_fields() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut base = sample_note("n1", "Title", created);
        base.content = "body".to_string();
        base.tags = vec!["work".to_string()];

        let draft = NotePatch::archive().apply_to(&base);
        assert_eq!(draft.title, "Title");
        assert_eq!(draft.content, "body");
        assert_eq!(draft.tags, vec!["work"]);
        assert!(draft.is_archived);
    }

    #[test]
    fn test_clean_tags() {
        let tags = vec![
            " work ".to_string(),
            "".to_string(),
            "home".to_string(),
            "work".to_string(),
        ];
        assert_eq!(clean_tags(&tags), vec!["work", "home"]);
    }
}
