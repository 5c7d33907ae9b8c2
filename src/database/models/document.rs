use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub folder: String,
    #[serde(skip_serializing)]
    pub content: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

/// Document listing entry without the file bytes.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentMeta {
    pub id: String,
    pub filename: String,
    pub folder: String,
    pub size: i64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub filename: String,
    pub folder: String,
    pub content: Vec<u8>,
}

pub const DEFAULT_FOLDER: &str = "General";

impl NewDocument {
    /// Keeps only the final path component of the client filename and
    /// files label-less uploads under the default folder.
    pub fn new(filename: &str, folder: Option<&str>, content: Vec<u8>) -> Self {
        let filename = filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(filename)
            .trim()
            .to_string();

        let folder = folder
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_FOLDER)
            .to_string();

        Self {
            filename,
            folder,
            content,
        }
    }
}
