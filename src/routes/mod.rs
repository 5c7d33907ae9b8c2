use actix_web::web;

pub mod admin;
pub mod documents;
pub mod employee;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(employee::configure)
        .configure(admin::configure)
        .configure(documents::configure);
}
