use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// An essay being composed from a source document.
///
/// The server is loose about field names (`doc_id` vs `document_id`, `topic`
/// vs `title`) and stores the outline in whatever shape the generation model
/// produced, so `outline` stays a raw [`Value`] here. The canonical form is
/// derived on demand by the outline normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Essay {
    pub id: String,
    #[serde(alias = "document_id")]
    pub doc_id: String,
    #[serde(default, alias = "title")]
    pub topic: Option<String>,
    #[serde(default)]
    pub outline: Value,
    /// Sections generated so far, keyed by header.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: HashMap<String, String>,
    #[serde(default, deserialize_with = "super::timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Essay {
    /// Topic text, or the empty string when the server sent none.
    pub fn topic(&self) -> &str {
        self.topic.as_deref().unwrap_or("")
    }
}

/// One planned section of an essay.
///
/// `header` doubles as the key into the content store and as the argument to
/// section generation requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub header: String,
    /// Guidance shown before the section is generated.
    #[serde(default)]
    pub description: String,
}

impl OutlineEntry {
    pub fn new(header: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            description: description.into(),
        }
    }
}

/// Shape of the outline-generation response.
///
/// The service answers with the inserted row set, so a one-element array is
/// as valid as a bare essay object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EssayEnvelope {
    Single(Essay),
    Rows(Vec<Essay>),
}

impl EssayEnvelope {
    /// First essay carried by the envelope, if any.
    pub fn into_essay(self) -> Option<Essay> {
        match self {
            Self::Single(essay) => Some(essay),
            Self::Rows(rows) => rows.into_iter().next(),
        }
    }
}

/// Shape of the essay listing response: bare array or wrapped under `essays`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EssayList {
    Bare(Vec<Essay>),
    Wrapped { essays: Vec<Essay> },
}

impl EssayList {
    pub fn into_vec(self) -> Vec<Essay> {
        match self {
            Self::Bare(essays) | Self::Wrapped { essays } => essays,
        }
    }
}

/// Treat a `null` content column the same as a missing one.
fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_server_column_names() {
        let essay: Essay = serde_json::from_value(json!({
            "id": "e-1",
            "document_id": "doc-1",
            "title": "AI in medicine",
            "outline": "[]",
            "content": null,
            "status": "drafting"
        }))
        .expect("decode");

        assert_eq!(essay.doc_id, "doc-1");
        assert_eq!(essay.topic(), "AI in medicine");
        assert!(essay.content.is_empty());
        assert!(essay.created_at.is_none());
    }

    #[test]
    fn envelope_takes_first_inserted_row() {
        let envelope: EssayEnvelope = serde_json::from_value(json!([
            { "id": "e-1", "doc_id": "doc-1" }
        ]))
        .expect("decode");

        assert_eq!(envelope.into_essay().map(|e| e.id), Some("e-1".to_string()));
    }

    #[test]
    fn empty_row_set_has_no_essay() {
        let envelope: EssayEnvelope = serde_json::from_value(json!([])).expect("decode");
        assert!(envelope.into_essay().is_none());
    }
}
