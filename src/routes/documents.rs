use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app_state::AppState;
use crate::error::IntakeError;
use crate::models::document::{FileId, RawFile};
use crate::models::view::{DocumentView, RejectionView, SubmitResponse};
use crate::services::engine::AnalysisLink;

/// POST /api/v1/documents — Submit a batch of documents.
///
/// Every multipart part carrying a file name is one document. Only its name,
/// declared content type and length are kept; the bytes are discarded.
pub async fn submit_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SubmitResponse>, StatusCode> {
    let mut files = Vec::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let Some(name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let media_type = field.content_type().map(str::to_owned);

        let mut size_bytes = 0u64;
        while let Some(chunk) = field.chunk().await.map_err(|_| StatusCode::BAD_REQUEST)? {
            size_bytes += chunk.len() as u64;
        }

        files.push(RawFile {
            name,
            size_bytes,
            media_type,
        });
    }

    if files.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let outcome = state.intake.submit(files);

    Ok(Json(SubmitResponse {
        accepted: outcome.accepted.iter().map(DocumentView::from).collect(),
        rejected: outcome.rejected.iter().map(RejectionView::from).collect(),
    }))
}

/// GET /api/v1/documents — All tracked documents in submission order.
pub async fn list_documents(State(state): State<AppState>) -> Json<Vec<DocumentView>> {
    Json(state.intake.list().iter().map(DocumentView::from).collect())
}

/// GET /api/v1/documents/{id}
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<FileId>,
) -> Result<Json<DocumentView>, IntakeError> {
    let file = state.intake.get(&id)?;
    Ok(Json(DocumentView::from(&file)))
}

/// DELETE /api/v1/documents/{id} — Stop tracking a document.
pub async fn remove_document(
    State(state): State<AppState>,
    Path(id): Path<FileId>,
) -> Result<StatusCode, IntakeError> {
    state.intake.remove(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/documents/{id}/analysis — Link to the analysis viewer.
pub async fn analysis_link(
    State(state): State<AppState>,
    Path(id): Path<FileId>,
) -> Result<Json<AnalysisLink>, IntakeError> {
    state.intake.analysis_link(&id).map(Json)
}
