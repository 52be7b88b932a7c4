//! PostgreSQL pool plus the queries the matching engine needs from the CRUD
//! collaborator: list candidates, fetch a job, upsert a score. Schema
//! management lives outside this service.

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::matching::profile::ParsedProfile;
use crate::models::candidate::CandidateRow;
use crate::models::job::JobRow;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

pub struct NewCandidate<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub resume_text: &'a str,
}

/// Inserts a candidate along with the profile parsed from its resume text.
pub async fn insert_candidate(
    pool: &PgPool,
    new: &NewCandidate<'_>,
    profile: &ParsedProfile,
) -> Result<CandidateRow, sqlx::Error> {
    let skills: Vec<String> = profile.skills.iter().cloned().collect();
    let certifications: Vec<String> = profile.certifications.iter().cloned().collect();

    sqlx::query_as::<_, CandidateRow>(
        "INSERT INTO candidates \
         (id, name, email, phone, resume_text, skills, experience_years, education, certifications) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(new.name)
    .bind(new.email)
    .bind(new.phone)
    .bind(new.resume_text)
    .bind(skills)
    .bind(profile.experience_years)
    .bind(profile.education.to_string())
    .bind(certifications)
    .fetch_one(pool)
    .await
}

pub async fn list_candidates(pool: &PgPool) -> Result<Vec<CandidateRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates ORDER BY created_at")
        .fetch_all(pool)
        .await
}

pub async fn get_candidate(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<CandidateRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Attaches an interview transcript; the caller re-parses and re-indexes the
/// candidate afterwards, since its matchable text changed.
pub async fn set_transcript(
    pool: &PgPool,
    id: Uuid,
    transcript: &str,
) -> Result<Option<CandidateRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateRow>(
        "UPDATE candidates SET video_transcript = $2, updated_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(transcript)
    .fetch_optional(pool)
    .await
}

pub async fn insert_job(
    pool: &PgPool,
    title: &str,
    description: &str,
    requirements: Option<&str>,
) -> Result<JobRow, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        "INSERT INTO jobs (id, title, description, requirements, status) \
         VALUES ($1, $2, $3, $4, 'active') \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(description)
    .bind(requirements)
    .fetch_one(pool)
    .await
}

pub async fn get_job(pool: &PgPool, id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Records the score of one (candidate, job) pair, replacing any earlier
/// score for the same pair.
pub async fn upsert_score(
    pool: &PgPool,
    candidate_id: Uuid,
    job_id: Uuid,
    score: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO candidate_scores (id, candidate_id, job_id, similarity_score) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (candidate_id, job_id) \
         DO UPDATE SET similarity_score = EXCLUDED.similarity_score",
    )
    .bind(Uuid::new_v4())
    .bind(candidate_id)
    .bind(job_id)
    .bind(score)
    .execute(pool)
    .await?;
    Ok(())
}
