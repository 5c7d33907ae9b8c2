use actix_multipart::Multipart;
use actix_web::{
    FromRequest, HttpRequest, HttpResponse,
    http::header::{self, ContentDisposition, DispositionParam, DispositionType},
    web,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::database::models::DocumentMeta;
use crate::error::AppError;
use crate::handlers::documents::{read_upload_form, store_upload};
use crate::handlers::shared::{
    ApiResponse, WeekQuery, see_other, selected_week, week_out_of_range,
};
use crate::middleware::RequestIdExt;
use crate::services::auth::AdminClaims;
use crate::services::export::{self, PAYROLL_FILENAME, XLSX_CONTENT_TYPE};
use crate::services::report::{self, WeekNav, WeeklyReport};

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminDashboard {
    pub report: WeeklyReport,
    pub documents: Vec<DocumentMeta>,
}

#[derive(Debug, Deserialize)]
pub struct AdminForm {
    pub week_nav: Option<String>,
    pub week: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetForm {
    pub pin: Option<String>,
}

pub async fn dashboard(
    _admin: AdminClaims,
    state: web::Data<AppState>,
    query: web::Query<WeekQuery>,
) -> Result<HttpResponse, AppError> {
    let settings = state.config.report_settings();
    let week_start = selected_week(query.week.as_deref(), &settings)?;

    let records = state.work_session_repository.list_records(None).await?;
    let report = report::build_weekly_report(
        &records,
        week_start,
        &settings,
        &state.config.employee_names(),
    )
    .ok_or_else(|| week_out_of_range(week_start))?;
    let documents = state.document_repository.list().await?;

    Ok(ApiResponse::success(AdminDashboard { report, documents }))
}

/// Week navigation (urlencoded) or document upload (multipart).
pub async fn submit(
    _admin: AdminClaims,
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    if is_multipart {
        let multipart = Multipart::new(req.headers(), payload);
        let form = read_upload_form(multipart, state.config.max_upload_bytes).await?;
        if !form.upload {
            return Err(AppError::BadRequest("Missing upload field".to_string()));
        }
        store_upload(&state, form).await?;
        return Ok(see_other("/admin"));
    }

    let form = web::Form::<AdminForm>::from_request(&req, &mut payload.into_inner())
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid form: {}", e)))?
        .into_inner();

    let nav = form
        .week_nav
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Expected week_nav or an upload".to_string()))?;
    let direction = nav.parse::<WeekNav>().map_err(AppError::BadRequest)?;

    let settings = state.config.report_settings();
    let current = selected_week(form.week.as_deref(), &settings)?;
    let target =
        report::shift_week(current, direction).ok_or_else(|| week_out_of_range(current))?;

    Ok(see_other(&format!(
        "/admin?week={}",
        target.format("%Y-%m-%d")
    )))
}

pub async fn export_payroll(
    _admin: AdminClaims,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let records = state.work_session_repository.list_records(None).await?;
    let rows = report::weekly_payroll_rows(&records, &state.config.report_settings());
    let workbook = export::payroll_workbook(&rows)?;

    log::info!("Exported payroll with {} rows", rows.len());

    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(PAYROLL_FILENAME.to_string())],
        })
        .body(workbook))
}

pub async fn reset(
    AdminClaims(admin): AdminClaims,
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<ResetForm>,
) -> Result<HttpResponse, AppError> {
    let request_id = req.request_id().unwrap_or_default();

    if form.pin.as_deref() != Some(state.config.reset_pin.as_str()) {
        log::warn!("[{}] Reset with wrong PIN by {}", request_id, admin.username);
        return Err(AppError::Forbidden("Invalid PIN. Reset denied.".to_string()));
    }

    let deleted = state.work_session_repository.delete_all().await?;
    log::info!(
        "[{}] {} reset the ledger, {} sessions deleted",
        request_id,
        admin.username,
        deleted
    );

    Ok(see_other("/admin"))
}
