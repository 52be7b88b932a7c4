//! Axum route handlers for candidate ingestion.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, NewCandidate};
use crate::errors::AppError;
use crate::ingest::extract::{candidate_name_from_filename, email_in, extract_text, phone_in};
use crate::ingest::index_candidate;
use crate::matching::profile::{parse_profile, ParsedProfile};
use crate::models::candidate::CandidateRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCandidateRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub resume_text: String,
}

#[derive(Debug, Deserialize)]
pub struct AttachTranscriptRequest {
    pub transcript: String,
}

#[derive(Debug, Serialize)]
pub struct CandidateResponse {
    pub candidate: CandidateRow,
    pub profile: ParsedProfile,
    pub chunks_indexed: usize,
}

/// POST /api/v1/candidates
///
/// Stores a candidate from raw resume text, parses its profile, and indexes
/// its chunks.
pub async fn handle_create_candidate(
    State(state): State<AppState>,
    Json(request): Json<CreateCandidateRequest>,
) -> Result<Json<CandidateResponse>, AppError> {
    if request.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text cannot be empty".to_string()));
    }
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }

    store_candidate(
        &state,
        &NewCandidate {
            name: request.name.trim(),
            email: request.email.as_deref(),
            phone: request.phone.as_deref(),
            resume_text: &request.resume_text,
        },
    )
    .await
    .map(Json)
}

/// POST /api/v1/candidates/upload
///
/// Multipart resume upload (PDF, DOCX, or TXT). The candidate name comes
/// from the filename; email and phone are pulled from the extracted text.
pub async fn handle_upload_candidate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CandidateResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read upload: {e}")))?;

        let resume_text = extract_text(&filename, &bytes)?;
        if resume_text.trim().is_empty() {
            return Err(AppError::UnprocessableEntity(format!(
                "no text could be extracted from '{filename}'"
            )));
        }

        let name = candidate_name_from_filename(&filename);
        let email = email_in(&resume_text);
        let phone = phone_in(&resume_text);

        let response = store_candidate(
            &state,
            &NewCandidate {
                name: &name,
                email: email.as_deref(),
                phone: phone.as_deref(),
                resume_text: &resume_text,
            },
        )
        .await?;
        return Ok(Json(response));
    }

    Err(AppError::Validation(
        "multipart body contained no file field".to_string(),
    ))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<CandidateRow>, AppError> {
    let candidate = db::get_candidate(&state.db, candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;
    Ok(Json(candidate))
}

/// POST /api/v1/candidates/:id/transcript
///
/// Attaches an interview transcript supplied by the transcription
/// collaborator. The candidate's matchable text changes, so its profile is
/// re-parsed and its chunks re-indexed.
pub async fn handle_attach_transcript(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
    Json(request): Json<AttachTranscriptRequest>,
) -> Result<Json<CandidateResponse>, AppError> {
    if request.transcript.trim().is_empty() {
        return Err(AppError::Validation("transcript cannot be empty".to_string()));
    }

    let candidate = db::set_transcript(&state.db, candidate_id, &request.transcript)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;

    let profile = parse_profile(&candidate.matchable_text());
    let chunks_indexed = index_candidate(
        state.embedder.as_ref(),
        &state.index,
        &state.config.index_dir,
        &candidate,
    )
    .await;

    Ok(Json(CandidateResponse {
        candidate,
        profile,
        chunks_indexed,
    }))
}

async fn store_candidate(
    state: &AppState,
    new: &NewCandidate<'_>,
) -> Result<CandidateResponse, AppError> {
    let profile = parse_profile(new.resume_text);
    let candidate = db::insert_candidate(&state.db, new, &profile).await?;

    let chunks_indexed = index_candidate(
        state.embedder.as_ref(),
        &state.index,
        &state.config.index_dir,
        &candidate,
    )
    .await;

    Ok(CandidateResponse {
        candidate,
        profile,
        chunks_indexed,
    })
}
