use actix_web::web;

use crate::handlers::admin;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/admin", web::get().to(admin::dashboard))
        .route("/admin", web::post().to(admin::submit))
        .route("/export", web::get().to(admin::export_payroll))
        .route("/reset", web::post().to(admin::reset));
}
