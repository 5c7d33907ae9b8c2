use actix_multipart::Multipart;
use actix_web::{
    HttpResponse,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web,
};
use futures_util::StreamExt;
use uuid::Uuid;

use crate::AppState;
use crate::database::models::NewDocument;
use crate::error::AppError;
use crate::handlers::shared::{ApiResponse, see_other};
use crate::services::auth::AdminClaims;

/// Fields collected from a document upload form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub upload: bool,
    pub folder: Option<String>,
    pub file: Option<(String, Vec<u8>)>,
}

/// Drains a multipart body into an [`UploadForm`], rejecting bodies whose
/// combined size exceeds `max_bytes`.
pub async fn read_upload_form(
    mut multipart: Multipart,
    max_bytes: usize,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    let mut total = 0usize;

    while let Some(item) = multipart.next().await {
        let mut field =
            item.map_err(|e| AppError::BadRequest(format!("Malformed upload: {}", e)))?;

        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or_default().to_string(),
                cd.get_filename().map(str::to_string),
            ),
            None => (String::new(), None),
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("Malformed upload: {}", e)))?;
            total += chunk.len();
            if total > max_bytes {
                return Err(AppError::BadRequest(format!(
                    "Upload exceeds {} bytes",
                    max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "upload" => form.upload = true,
            "folder" => form.folder = Some(String::from_utf8_lossy(&bytes).into_owned()),
            "file" => {
                if let Some(filename) = filename.filter(|f| !f.trim().is_empty()) {
                    form.file = Some((filename, bytes));
                }
            }
            other => log::debug!("Ignoring upload field {}", other),
        }
    }

    Ok(form)
}

/// Stores the file from an upload form; a form without a file is a 400.
pub async fn store_upload(state: &AppState, form: UploadForm) -> Result<(), AppError> {
    let (filename, content) = form
        .file
        .ok_or_else(|| AppError::BadRequest("No file selected".to_string()))?;

    let document = NewDocument::new(&filename, form.folder.as_deref(), content);
    if document.filename.is_empty() {
        return Err(AppError::BadRequest("No file selected".to_string()));
    }

    let meta = state.document_repository.create(document).await?;
    log::info!(
        "Stored document {} ({}, {} bytes) in folder {}",
        meta.id,
        meta.filename,
        meta.size,
        meta.folder
    );

    Ok(())
}

fn parse_document_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("Document {}", raw)))
}

pub async fn list_documents(
    _admin: AdminClaims,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let documents = state.document_repository.list().await?;
    Ok(ApiResponse::success(documents))
}

pub async fn upload_document(
    _admin: AdminClaims,
    state: web::Data<AppState>,
    multipart: Multipart,
) -> Result<HttpResponse, AppError> {
    let form = read_upload_form(multipart, state.config.max_upload_bytes).await?;
    store_upload(&state, form).await?;
    Ok(see_other("/admin"))
}

pub async fn view_document(
    _admin: AdminClaims,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_document_id(&path)?;
    let document = state
        .document_repository
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {}", id)))?;

    let content_type = mime_guess::from_path(&document.filename).first_or_octet_stream();

    Ok(HttpResponse::Ok()
        .content_type(content_type.essence_str())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Inline,
            parameters: vec![DispositionParam::Filename(document.filename.clone())],
        })
        .body(document.content))
}

pub async fn delete_document(
    AdminClaims(admin): AdminClaims,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_document_id(&path)?;

    if !state.document_repository.delete(id).await? {
        return Err(AppError::NotFound(format!("Document {}", id)));
    }

    log::info!("Document {} deleted by {}", id, admin.username);
    Ok(see_other("/admin"))
}
