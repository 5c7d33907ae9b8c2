use actix_web::{HttpResponse, http::header};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::report::{self, ReportSettings, WeekNav};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    // 200 with data
    pub fn success(data: T) -> HttpResponse {
        HttpResponse::Ok().json(Self::ok(data))
    }
}

impl ApiResponse<()> {
    // Error response (no data)
    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }
}

pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

#[derive(Debug, Default, Deserialize)]
pub struct WeekQuery {
    pub week: Option<String>,
}

/// Resolves the `week` parameter to an anchored week start, defaulting to
/// the current week in the configured timezone. Weeks without a neighbour
/// on both sides are rejected, so navigating and windowing them cannot fail.
pub fn selected_week(week: Option<&str>, settings: &ReportSettings) -> Result<NaiveDate, AppError> {
    let week_start = match week.map(str::trim).filter(|w| !w.is_empty()) {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| AppError::BadRequest(format!("Invalid week: {}", raw)))?;
            report::week_start_date(date, settings.week_start)
                .ok_or_else(|| week_out_of_range(raw))?
        }
        None => report::week_start_for(Utc::now(), settings)
            .ok_or_else(|| week_out_of_range("current week"))?,
    };

    let navigable = report::shift_week(week_start, WeekNav::Prev).is_some()
        && report::shift_week(week_start, WeekNav::Next).is_some();
    if !navigable {
        return Err(week_out_of_range(week_start));
    }
    Ok(week_start)
}

pub fn week_out_of_range(week: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("Week out of range: {}", week))
}
