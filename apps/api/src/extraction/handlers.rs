//! Axum route handlers for candidate intake.

use anyhow::Context;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::documents::{supported_extension, SUPPORTED_EXTENSIONS};
use crate::errors::AppError;
use crate::models::candidate::{CandidateIdentity, CandidateRecord, ExtractedCv};
use crate::state::AppState;
use crate::storage::StorageError;

/// Request body limit for the intake route.
pub const MAX_CV_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct CandidateQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessCvResponse {
    /// `None` when the candidate could not be saved; see `errors`.
    pub candidate_id: Option<Uuid>,
    pub candidate_name: String,
    pub candidate_email: String,
    pub cv_link: String,
    pub summary: String,
    pub extracted_cv_data: ExtractedCv,
    pub errors: Vec<String>,
}

/// A CV received as `multipart/form-data`.
struct CvUpload {
    identity: CandidateIdentity,
    file_name: String,
    bytes: Bytes,
}

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {e}"))
}

/// Reads the `file` part plus the optional `name`, `email`, `user_id` and
/// `user_email` text parts. Unknown parts are ignored.
async fn read_cv_upload(mut multipart: Multipart) -> Result<CvUpload, AppError> {
    let mut identity = CandidateIdentity::default();
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(part) = field.name().map(str::to_string) else {
            continue;
        };
        match part.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                file = Some((file_name, bytes));
            }
            "name" => identity.name = field.text().await.map_err(bad_multipart)?,
            "email" => identity.email = field.text().await.map_err(bad_multipart)?,
            "user_id" => identity.user_id = Some(field.text().await.map_err(bad_multipart)?),
            "user_email" => {
                identity.user_email = Some(field.text().await.map_err(bad_multipart)?)
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| AppError::Validation("file part is required".to_string()))?;
    Ok(CvUpload {
        identity,
        file_name,
        bytes,
    })
}

/// Writes the upload to a temp file named `cv-*.{extension}`; removed on drop.
async fn stage_upload(bytes: &[u8], extension: &str) -> Result<NamedTempFile, AppError> {
    let staged = tempfile::Builder::new()
        .prefix("cv-")
        .suffix(&format!(".{extension}"))
        .tempfile()
        .context("Failed to create staging file for CV upload")?;
    tokio::fs::write(staged.path(), bytes)
        .await
        .context("Failed to stage CV upload")?;
    Ok(staged)
}

/// POST /api/v1/candidates
///
/// Runs Graph 1 on an uploaded CV (`multipart/form-data`, part `file`).
/// Only pdf, txt and md files are accepted. Degraded runs still return 201
/// with the accumulated errors.
pub async fn handle_process_cv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProcessCvResponse>), AppError> {
    let upload = read_cv_upload(multipart).await?;
    let extension =
        supported_extension(std::path::Path::new(&upload.file_name)).ok_or_else(|| {
            AppError::Validation(format!(
                "Unsupported CV file '{}'; expected one of: {}",
                upload.file_name,
                SUPPORTED_EXTENSIONS.join(", ")
            ))
        })?;
    if upload.bytes.is_empty() {
        return Err(AppError::Validation("Uploaded CV is empty".to_string()));
    }

    let staged = stage_upload(&upload.bytes, &extension).await?;
    let run = state
        .extraction
        .run(upload.identity, &staged.path().to_string_lossy())
        .await;
    drop(staged);

    let status = if run.candidate_id.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(ProcessCvResponse {
            candidate_id: run.candidate_id,
            candidate_name: run.candidate_name,
            candidate_email: run.candidate_email,
            cv_link: run.cv_link,
            summary: run.summary,
            extracted_cv_data: run.extracted_cv_data,
            errors: run.errors.as_slice().to_vec(),
        }),
    ))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<CandidateRecord>, AppError> {
    state
        .candidates
        .get(candidate_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Candidate not found: {candidate_id}")))
}

/// GET /api/v1/candidates?email=...
///
/// Every candidate document submitted under the email, oldest first.
pub async fn handle_find_candidates(
    State(state): State<AppState>,
    Query(query): Query<CandidateQuery>,
) -> Result<Json<Vec<CandidateRecord>>, AppError> {
    let email = query.email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("email cannot be empty".to_string()));
    }
    Ok(Json(state.candidates.find_by_email(email).await?))
}

/// GET /api/v1/candidates/:id/cv
///
/// Streams the stored CV back from object storage.
pub async fn handle_download_cv(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let candidate = state
        .candidates
        .get(candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate not found: {candidate_id}")))?;
    if candidate.cv_object_name.is_empty() {
        return Err(AppError::NotFound(format!(
            "No stored CV for candidate {candidate_id}"
        )));
    }

    let bytes: Bytes = state
        .storage
        .download(&candidate.cv_object_name)
        .await
        .map_err(|e| match e {
            StorageError::NotFound(name) => AppError::NotFound(format!("CV object missing: {name}")),
            other => AppError::Internal(anyhow::Error::new(other)),
        })?;

    Ok(([(header::CONTENT_TYPE, content_type_for(&candidate.cv_object_name))], bytes))
}

fn content_type_for(object_name: &str) -> &'static str {
    match object_name.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("md") => "text/markdown; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
