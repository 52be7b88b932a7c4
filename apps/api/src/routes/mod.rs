pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::ingest::handlers as ingest_handlers;
use crate::matching::handlers as matching_handlers;
use crate::qa::handlers as qa_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidate ingestion
        .route(
            "/api/v1/candidates",
            post(ingest_handlers::handle_create_candidate),
        )
        .route(
            "/api/v1/candidates/upload",
            post(ingest_handlers::handle_upload_candidate),
        )
        .route(
            "/api/v1/candidates/:id",
            get(ingest_handlers::handle_get_candidate),
        )
        .route(
            "/api/v1/candidates/:id/transcript",
            post(ingest_handlers::handle_attach_transcript),
        )
        // Jobs and matching
        .route("/api/v1/jobs", post(matching_handlers::handle_create_job))
        .route("/api/v1/jobs/:id", get(matching_handlers::handle_get_job))
        .route(
            "/api/v1/jobs/:id/matches",
            get(matching_handlers::handle_match_candidates),
        )
        .route(
            "/api/v1/matching/score",
            post(matching_handlers::handle_score_pair),
        )
        // Retrieval QA
        .route("/api/v1/qa", post(qa_handlers::handle_ask))
        .with_state(state)
}
