use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded research document.
///
/// Ingestion (extraction, chunking, embedding) happens server side; the client
/// only observes the resulting `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(alias = "doc_id")]
    pub id: String,
    #[serde(default, alias = "filename")]
    pub file_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub chunks_count: Option<u64>,
    #[serde(default, deserialize_with = "super::timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Response to a document upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub doc_id: String,
    /// `processing`, `completed` or `failed`.
    pub status: String,
    #[serde(default)]
    pub chunks_count: u64,
}

/// Document listing: `{"documents": [...]}` or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DocumentList {
    Wrapped { documents: Vec<Document> },
    Bare(Vec<Document>),
}

impl DocumentList {
    pub fn into_vec(self) -> Vec<Document> {
        match self {
            Self::Wrapped { documents } | Self::Bare(documents) => documents,
        }
    }
}

/// Single document lookup: `{"document": {...}, "chunks_count": n}` or bare.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DocumentDetail {
    Wrapped {
        document: Document,
        #[serde(default)]
        chunks_count: Option<u64>,
    },
    Bare(Document),
}

impl DocumentDetail {
    /// Flatten into a [`Document`], carrying the outer chunk count inward.
    pub fn into_document(self) -> Document {
        match self {
            Self::Wrapped {
                mut document,
                chunks_count,
            } => {
                if chunks_count.is_some() {
                    document.chunks_count = chunks_count;
                }
                document
            }
            Self::Bare(document) => document,
        }
    }
}
