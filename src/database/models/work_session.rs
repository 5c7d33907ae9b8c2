use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One clock-in/clock-out pair. `clock_out`, `hours` and `wage` stay empty
/// while the session is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkSession {
    pub id: i64,
    pub user_id: i64,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
    pub hours: Option<f64>,
    pub wage: Option<f64>,
}

impl WorkSession {
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }
}

/// Session joined with its owner's username, as consumed by reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionRecord {
    pub username: String,
    pub clock_in: Option<DateTime<Utc>>,
    pub clock_out: Option<DateTime<Utc>>,
    pub hours: Option<f64>,
    pub wage: Option<f64>,
}
