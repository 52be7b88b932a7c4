//! Axum route handlers for jobs and candidate-job matching.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::matching::profile::parse_profile;
use crate::matching::scorer::{rank_candidates, score_pair, CandidateDoc, ScoreComponents};
use crate::models::job::JobRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub top_k: Option<usize>,
}

/// One ranked candidate in a match response.
#[derive(Debug, Serialize)]
pub struct RankedCandidate {
    pub candidate_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub score: f64,
    pub components: ScoreComponents,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub job_id: Uuid,
    pub pool_size: usize,
    pub matches: Vec<RankedCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct ScorePairRequest {
    pub candidate_text: String,
    pub job_text: String,
}

#[derive(Debug, Serialize)]
pub struct ScorePairResponse {
    pub score: f64,
    pub components: ScoreComponents,
}

/// POST /api/v1/matching/score
///
/// Scores one ad-hoc candidate/job text pair without touching stored
/// records. Useful for previewing a match before ingesting either side.
pub async fn handle_score_pair(
    State(state): State<AppState>,
    Json(request): Json<ScorePairRequest>,
) -> Result<Json<ScorePairResponse>, AppError> {
    if request.candidate_text.trim().is_empty() {
        return Err(AppError::Validation("candidate_text cannot be empty".to_string()));
    }
    if request.job_text.trim().is_empty() {
        return Err(AppError::Validation("job_text cannot be empty".to_string()));
    }

    let (score, components) = score_pair(
        state.embedder.as_ref(),
        &state.config.weights,
        &request.candidate_text,
        &request.job_text,
    )
    .await;

    Ok(Json(ScorePairResponse { score, components }))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<Json<JobRow>, AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    if request.description.trim().is_empty() {
        return Err(AppError::Validation("description cannot be empty".to_string()));
    }

    let job = db::insert_job(
        &state.db,
        request.title.trim(),
        &request.description,
        request.requirements.as_deref(),
    )
    .await?;
    Ok(Json(job))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    let job = db::get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    Ok(Json(job))
}

/// GET /api/v1/jobs/:id/matches?top_k=N
///
/// Ranks the full candidate pool against one job, persists a score row per
/// ranked candidate, and returns the top-k that pass the eligibility gate.
/// An empty pool is an empty result, not an error.
pub async fn handle_match_candidates(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<MatchQuery>,
) -> Result<Json<MatchResponse>, AppError> {
    let job = db::get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let candidates = db::list_candidates(&state.db).await?;
    let pool_size = candidates.len();
    if candidates.is_empty() {
        warn!("No candidates stored; returning empty match list for job {job_id}");
        return Ok(Json(MatchResponse {
            job_id,
            pool_size,
            matches: Vec::new(),
        }));
    }

    let job_text = job.matchable_text();
    let job_profile = parse_profile(&job_text);

    let docs: Vec<CandidateDoc> = candidates
        .iter()
        .map(|candidate| {
            let text = candidate.matchable_text();
            let profile = parse_profile(&text);
            CandidateDoc {
                id: candidate.id,
                text,
                profile,
            }
        })
        .collect();

    let top_k = query.top_k.unwrap_or(state.config.top_k_candidates);
    let ranked = rank_candidates(
        state.embedder.as_ref(),
        &state.config.weights,
        &state.config.gate,
        &job_text,
        &job_profile,
        &docs,
        top_k,
    )
    .await;

    // Score persistence is best-effort per candidate: one failed write must
    // not discard an otherwise complete ranking.
    for result in &ranked {
        if let Err(e) = db::upsert_score(&state.db, result.candidate_id, job_id, result.score).await
        {
            warn!(
                "Could not persist score for candidate {}: {e}",
                result.candidate_id
            );
        }
    }

    info!(
        "Matched {} of {} candidates to job '{}'",
        ranked.len(),
        pool_size,
        job.title
    );

    let matches = ranked
        .into_iter()
        .map(|result| {
            let row = candidates.iter().find(|c| c.id == result.candidate_id);
            RankedCandidate {
                candidate_id: result.candidate_id,
                name: row.map(|c| c.name.clone()).unwrap_or_default(),
                email: row.and_then(|c| c.email.clone()),
                score: result.score,
                components: result.components,
            }
        })
        .collect();

    Ok(Json(MatchResponse {
        job_id,
        pool_size,
        matches,
    }))
}
