use actix_web::{HttpRequest, HttpResponse, http::header, web};
use serde::Deserialize;

use crate::AppState;
use crate::error::AppError;
use crate::middleware::RequestIdExt;

const LOGIN_PAGE: &str = include_str!("../../static/login.html");

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login_form() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(LOGIN_PAGE)
}

pub async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();

    let session = match state.auth_service.login(&form.username, &form.password).await {
        Ok(session) => session,
        Err(e) => {
            log::warn!(
                "[{}] Failed login for {}",
                req.request_id().unwrap_or_default(),
                form.username
            );
            return Err(e);
        }
    };

    log::info!(
        "[{}] {} logged in as {}",
        req.request_id().unwrap_or_default(),
        session.user.username,
        session.user.role
    );

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .cookie(state.auth_service.session_cookie(session.token))
        .finish())
}

pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/login"))
        .cookie(state.auth_service.removal_cookie())
        .finish()
}
