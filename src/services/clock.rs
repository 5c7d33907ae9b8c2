use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::database::models::WorkSession;
use crate::database::repositories::WorkSessionRepository;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "session", rename_all = "snake_case")]
pub enum ClockState {
    ClockedOut,
    ClockedIn(WorkSession),
}

impl ClockState {
    pub fn is_clocked_in(&self) -> bool {
        matches!(self, ClockState::ClockedIn(_))
    }
}

/// Elapsed time between two instants in fractional hours.
pub fn compute_hours(clock_in: DateTime<Utc>, clock_out: DateTime<Utc>) -> f64 {
    (clock_out - clock_in).num_milliseconds() as f64 / 3_600_000.0
}

pub fn compute_wage(hours: f64, rate: f64) -> f64 {
    hours * rate
}

/// Clock-in/clock-out transitions for one employee at a time.
#[derive(Clone)]
pub struct ClockService {
    sessions: WorkSessionRepository,
    config: Config,
}

impl ClockService {
    pub fn new(sessions: WorkSessionRepository, config: Config) -> Self {
        Self { sessions, config }
    }

    pub async fn status(&self, user_id: i64) -> Result<ClockState, AppError> {
        let latest = self.sessions.find_latest_for_user(user_id).await?;

        Ok(match latest {
            Some(session) if session.is_open() => ClockState::ClockedIn(session),
            _ => ClockState::ClockedOut,
        })
    }

    pub async fn clock_in(&self, user_id: i64, now: DateTime<Utc>) -> Result<WorkSession, AppError> {
        if self.status(user_id).await?.is_clocked_in() {
            return Err(AppError::Conflict("Already clocked in".to_string()));
        }

        let session = self
            .sessions
            .open_session(user_id, now)
            .await?
            .ok_or_else(|| AppError::Conflict("Already clocked in".to_string()))?;

        log::info!("User {} clocked in (session {})", user_id, session.id);
        Ok(session)
    }

    pub async fn clock_out(
        &self,
        user_id: i64,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<WorkSession, AppError> {
        let open = match self.status(user_id).await? {
            ClockState::ClockedIn(session) => session,
            ClockState::ClockedOut => {
                return Err(AppError::Conflict("Not clocked in".to_string()));
            }
        };

        let hours = compute_hours(open.clock_in, now);
        if hours < 0.0 {
            return Err(AppError::BadRequest(
                "Clock-out time precedes clock-in".to_string(),
            ));
        }
        let wage = compute_wage(hours, self.config.rate_for(username));

        let session = self
            .sessions
            .close_session(open.id, now, hours, wage)
            .await?
            .ok_or_else(|| AppError::Conflict("Session already closed".to_string()))?;

        log::info!(
            "User {} clocked out (session {}, {:.2} h, {:.2})",
            user_id,
            session.id,
            hours,
            wage
        );
        Ok(session)
    }
}
