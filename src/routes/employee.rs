use actix_web::web;

use crate::handlers::{dashboard, health, session};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health))
        .route("/login", web::get().to(session::login_form))
        .route("/login", web::post().to(session::login))
        .route("/logout", web::get().to(session::logout))
        .route("/", web::get().to(dashboard::index))
        .route("/", web::post().to(dashboard::submit));
}
