use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{Document, DocumentMeta, NewDocument};

#[derive(Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
}

impl DocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, document: NewDocument) -> Result<DocumentMeta> {
        let meta = sqlx::query_as::<_, DocumentMeta>(
            r#"
            INSERT INTO documents (id, filename, folder, content, uploaded_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, filename, folder, length(content) AS size, uploaded_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(document.filename)
        .bind(document.folder)
        .bind(document.content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(meta)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(
            "SELECT id, filename, folder, content, uploaded_at FROM documents WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    pub async fn list(&self) -> Result<Vec<DocumentMeta>> {
        let documents = sqlx::query_as::<_, DocumentMeta>(
            r#"
            SELECT id, filename, folder, length(content) AS size, uploaded_at
            FROM documents
            ORDER BY folder, filename
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
