use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::AppError;
use crate::handlers::shared::{
    ApiResponse, WeekQuery, see_other, selected_week, week_out_of_range,
};
use crate::services::auth::Claims;
use crate::services::clock::ClockState;
use crate::services::report::{self, SessionView, Totals, WeekNav};

const TAX_INFO: &str = "This is what you will receive at the end of the week. \
The flat tax is deducted once at the end of the week, not each day.";

#[derive(Debug, Serialize, Deserialize)]
pub struct EmployeeDashboard {
    pub username: String,
    pub clocked_in: bool,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub sessions: Vec<SessionView>,
    pub week_total: Totals,
    pub tax_info: String,
}

#[derive(Debug, Deserialize)]
pub struct DashboardForm {
    pub action: Option<String>,
    pub week_nav: Option<String>,
    pub week: Option<String>,
}

pub async fn index(
    claims: Claims,
    state: web::Data<AppState>,
    query: web::Query<WeekQuery>,
) -> Result<HttpResponse, AppError> {
    if claims.is_admin() {
        return Ok(see_other("/admin"));
    }

    let settings = state.config.report_settings();
    let week_start = selected_week(query.week.as_deref(), &settings)?;

    let clock_state = state.clock_service.status(claims.user_id()).await?;
    let sessions = state
        .work_session_repository
        .list_for_user(claims.user_id())
        .await?;
    let records = state
        .work_session_repository
        .list_records(Some(claims.user_id()))
        .await?;

    let weekly = report::build_weekly_report(
        &records,
        week_start,
        &settings,
        std::slice::from_ref(&claims.username),
    )
    .ok_or_else(|| week_out_of_range(week_start))?;
    let week_total = weekly
        .employees
        .get(&claims.username)
        .map(|week| week.total)
        .unwrap_or_default();

    Ok(ApiResponse::success(EmployeeDashboard {
        username: claims.username.clone(),
        clocked_in: matches!(clock_state, ClockState::ClockedIn(_)),
        week_start,
        week_end: weekly.week_end,
        sessions: sessions
            .iter()
            .map(|s| report::session_view(s, settings.timezone))
            .collect(),
        week_total,
        tax_info: TAX_INFO.to_string(),
    }))
}

pub async fn submit(
    claims: Claims,
    state: web::Data<AppState>,
    form: web::Form<DashboardForm>,
) -> Result<HttpResponse, AppError> {
    if claims.is_admin() {
        return Ok(see_other("/admin"));
    }

    let form = form.into_inner();

    if let Some(action) = form.action.as_deref() {
        let now = Utc::now();
        match action {
            "Clock In" => {
                state.clock_service.clock_in(claims.user_id(), now).await?;
            }
            "Clock Out" => {
                state
                    .clock_service
                    .clock_out(claims.user_id(), &claims.username, now)
                    .await?;
            }
            other => {
                return Err(AppError::BadRequest(format!("Unknown action: {}", other)));
            }
        }
        return Ok(see_other("/"));
    }

    if let Some(nav) = form.week_nav.as_deref() {
        let direction = nav.parse::<WeekNav>().map_err(AppError::BadRequest)?;
        let settings = state.config.report_settings();
        let current = selected_week(form.week.as_deref(), &settings)?;
        let target =
            report::shift_week(current, direction).ok_or_else(|| week_out_of_range(current))?;
        return Ok(see_other(&format!("/?week={}", target.format("%Y-%m-%d"))));
    }

    Err(AppError::BadRequest(
        "Expected an action or week_nav field".to_string(),
    ))
}
