use actix_web::web;

use crate::handlers::documents;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/upload_document", web::get().to(documents::list_documents))
        .route("/upload_document", web::post().to(documents::upload_document))
        .route("/view_document/{id}", web::get().to(documents::view_document))
        .route("/delete_document/{id}", web::post().to(documents::delete_document));
}
