//! Axum route handler for Retrieval QA.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::qa::{answer_question, QaAnswer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QaRequest {
    pub question: String,
}

/// POST /api/v1/qa
///
/// Answers a free-text question about the candidate pool. Degraded states
/// (no index, model failure) come back as readable answers, never as 5xx.
pub async fn handle_ask(
    State(state): State<AppState>,
    Json(request): Json<QaRequest>,
) -> Result<Json<QaAnswer>, AppError> {
    if request.question.trim().is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }

    let answer = answer_question(
        &request.question,
        state.embedder.as_ref(),
        &state.index,
        &state.llm,
        state.config.qa_top_k,
    )
    .await;

    Ok(Json(answer))
}
