use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::database::models::{SessionRecord, WorkSession};

const SESSION_COLUMNS: &str = "id, user_id, clock_in, clock_out, hours, wage";

#[derive(Clone)]
pub struct WorkSessionRepository {
    pool: SqlitePool,
}

impl WorkSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Most recent session for the user, open or closed.
    pub async fn find_latest_for_user(&self, user_id: i64) -> Result<Option<WorkSession>> {
        let session = sqlx::query_as::<_, WorkSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions WHERE user_id = ? ORDER BY clock_in DESC, id DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Opens a session unless the user already has one open. Returns `None`
    /// when an open session exists, including one inserted by a concurrent
    /// request that the unique index rejected.
    pub async fn open_session(
        &self,
        user_id: i64,
        clock_in: DateTime<Utc>,
    ) -> Result<Option<WorkSession>> {
        let mut tx = self.pool.begin().await?;

        let open: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM work_sessions WHERE user_id = ? AND clock_out IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if open.is_some() {
            tx.rollback().await?;
            return Ok(None);
        }

        let inserted = sqlx::query_as::<_, WorkSession>(&format!(
            "INSERT INTO work_sessions (user_id, clock_in) VALUES (?, ?) RETURNING {SESSION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(clock_in)
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(session) => {
                tx.commit().await?;
                Ok(Some(session))
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                log::warn!("Concurrent clock-in rejected for user {}", user_id);
                tx.rollback().await?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Closes an open session. Returns `None` if the session was already closed.
    pub async fn close_session(
        &self,
        session_id: i64,
        clock_out: DateTime<Utc>,
        hours: f64,
        wage: f64,
    ) -> Result<Option<WorkSession>> {
        let session = sqlx::query_as::<_, WorkSession>(&format!(
            r#"
            UPDATE work_sessions
            SET clock_out = ?, hours = ?, wage = ?
            WHERE id = ? AND clock_out IS NULL
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(clock_out)
        .bind(hours)
        .bind(wage)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<WorkSession>> {
        let sessions = sqlx::query_as::<_, WorkSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions WHERE user_id = ? ORDER BY clock_in DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Sessions joined with usernames, oldest first. `None` returns every user.
    pub async fn list_records(&self, user_id: Option<i64>) -> Result<Vec<SessionRecord>> {
        let records = match user_id {
            Some(user_id) => {
                sqlx::query_as::<_, SessionRecord>(
                    r#"
                    SELECT u.username, w.clock_in, w.clock_out, w.hours, w.wage
                    FROM work_sessions w
                    JOIN users u ON w.user_id = u.id
                    WHERE w.user_id = ?
                    ORDER BY w.clock_in ASC
                    "#,
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, SessionRecord>(
                    r#"
                    SELECT u.username, w.clock_in, w.clock_out, w.hours, w.wage
                    FROM work_sessions w
                    JOIN users u ON w.user_id = u.id
                    ORDER BY w.clock_in ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(records)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM work_sessions")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
