//! Scorer — combines structural feature overlap, experience ratio,
//! education/certification match, and semantic similarity into one ranked
//! score with fixed weights and eligibility gates.
//!
//! Every component lies in [0, 1]; the final score is a convex combination,
//! so it does too. Input-absence cases (no job skills, no required years)
//! resolve to documented defaults, never errors.

use std::collections::BTreeSet;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::index::embedder::Embedder;
use crate::index::vector_index::cosine_similarity;
use crate::matching::profile::{parse_profile, EducationLevel, ParsedProfile};

// ────────────────────────────────────────────────────────────────────────────
// Weights and gates
// ────────────────────────────────────────────────────────────────────────────

/// The four scoring weights as one atomic value. Changing one weight means
/// supplying all four — they are only ever configured as a whole, and must
/// sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub skill: f64,
    pub experience: f64,
    pub education_cert: f64,
    pub semantic: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            skill: 0.3,
            experience: 0.2,
            education_cert: 0.1,
            semantic: 0.4,
        }
    }
}

impl ScoreWeights {
    /// Parses `"skill,experience,education_cert,semantic"`, e.g.
    /// `"0.3,0.2,0.1,0.4"`. Rejects anything that is not four non-negative
    /// numbers summing to 1.0.
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<f64>()
                    .with_context(|| format!("invalid weight '{}'", p.trim()))
            })
            .collect::<Result<_>>()?;

        ensure!(
            parts.len() == 4,
            "expected 4 weights (skill,experience,education_cert,semantic), got {}",
            parts.len()
        );
        ensure!(
            parts.iter().all(|w| *w >= 0.0),
            "weights must be non-negative"
        );

        let sum: f64 = parts.iter().sum();
        ensure!(
            (sum - 1.0).abs() < 1e-6,
            "weights must sum to 1.0 (got {sum})"
        );

        Ok(Self {
            skill: parts[0],
            experience: parts[1],
            education_cert: parts[2],
            semantic: parts[3],
        })
    }

    pub fn combine(&self, c: &ScoreComponents) -> f64 {
        self.skill * c.skill
            + self.experience * c.experience
            + self.education_cert * c.education_cert
            + self.semantic * c.semantic
    }
}

/// Hard pass/fail filter applied before ranking, independent of the final
/// score. Candidates failing either threshold are scored but dropped from
/// the output — not ranked at the bottom.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EligibilityGate {
    pub skill_threshold: f64,
    pub experience_threshold: f64,
}

impl Default for EligibilityGate {
    fn default() -> Self {
        Self {
            skill_threshold: 0.3,
            experience_threshold: 0.5,
        }
    }
}

impl EligibilityGate {
    pub fn admits(&self, c: &ScoreComponents) -> bool {
        c.skill >= self.skill_threshold && c.experience >= self.experience_threshold
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Results
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub skill: f64,
    pub experience: f64,
    pub education_cert: f64,
    pub semantic: f64,
}

/// Score of one (candidate, job) pair. Persisting it is the CRUD layer's
/// responsibility, not the engine's.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub candidate_id: Uuid,
    pub score: f64,
    pub components: ScoreComponents,
}

/// One candidate as seen by the batch ranker: the full matchable text plus
/// the profile parsed from it.
#[derive(Debug, Clone)]
pub struct CandidateDoc {
    pub id: Uuid,
    pub text: String,
    pub profile: ParsedProfile,
}

// ────────────────────────────────────────────────────────────────────────────
// Component scores
// ────────────────────────────────────────────────────────────────────────────

/// Fraction of the job's skills the candidate covers; 0.0 when the job lists
/// no skills.
pub fn skill_match_score(candidate: &BTreeSet<String>, job: &BTreeSet<String>) -> f64 {
    if job.is_empty() {
        return 0.0;
    }
    job.intersection(candidate).count() as f64 / job.len() as f64
}

/// Ratio of actual to required years, capped at 1.0. A job requiring no
/// experience (absent or zero) scores 1.0 for everyone. A candidate whose
/// experience could not be parsed scores 0.0 against a positive requirement —
/// that policy lives here, not in the parser.
pub fn experience_score(actual: Option<f64>, required: Option<f64>) -> f64 {
    match required {
        None => 1.0,
        Some(r) if r <= 0.0 => 1.0,
        Some(r) => match actual {
            Some(a) => (a / r).clamp(0.0, 1.0),
            None => 0.0,
        },
    }
}

/// Two independent halves: 0.5 when the candidate's degree meets or exceeds
/// the job's requirement (a job without one grants this half to everyone),
/// plus 0.5 when any required certification is present.
pub fn education_cert_score(
    candidate_education: EducationLevel,
    required_education: EducationLevel,
    candidate_certs: &BTreeSet<String>,
    required_certs: &BTreeSet<String>,
) -> f64 {
    let education = if candidate_education >= required_education {
        0.5
    } else {
        0.0
    };
    let certification = if required_certs.iter().any(|c| candidate_certs.contains(c)) {
        0.5
    } else {
        0.0
    };
    education + certification
}

/// Scores one candidate against one job given an already-computed semantic
/// similarity.
pub fn score_components(
    candidate_profile: &ParsedProfile,
    job_profile: &ParsedProfile,
    semantic: f64,
) -> ScoreComponents {
    ScoreComponents {
        skill: skill_match_score(&candidate_profile.skills, &job_profile.skills),
        experience: experience_score(
            candidate_profile.experience_years,
            job_profile.experience_years,
        ),
        education_cert: education_cert_score(
            candidate_profile.education,
            job_profile.education,
            &candidate_profile.certifications,
            &job_profile.certifications,
        ),
        semantic,
    }
}

/// Scores one ad-hoc (candidate, job) text pair outside any stored pool.
/// Profiles are parsed fresh from both texts; an embedding failure degrades
/// the semantic component to 0.0 with a log line.
pub async fn score_pair(
    embedder: &dyn Embedder,
    weights: &ScoreWeights,
    candidate_text: &str,
    job_text: &str,
) -> (f64, ScoreComponents) {
    let candidate_profile = parse_profile(candidate_text);
    let job_profile = parse_profile(job_text);

    let texts = [candidate_text.to_string(), job_text.to_string()];
    let semantic = match embedder.embed_batch(&texts).await {
        Ok(v) if v.len() == 2 => f64::from(cosine_similarity(&v[0], &v[1])),
        Ok(v) => {
            warn!(
                "Embedding returned {} vectors for 2 texts; semantic score defaults to 0.0",
                v.len()
            );
            0.0
        }
        Err(e) => {
            warn!("Embedding failed, semantic score defaults to 0.0: {e}");
            0.0
        }
    };

    let components = score_components(&candidate_profile, &job_profile, semantic);
    (weights.combine(&components), components)
}

// ────────────────────────────────────────────────────────────────────────────
// Batch ranking
// ────────────────────────────────────────────────────────────────────────────

/// Ranks a candidate pool against one job.
///
/// The job text and every candidate text go out in a single `embed_batch`
/// call. If that call fails, the batch degrades: every semantic component
/// becomes 0.0 (logged once) and ranking proceeds on the structural
/// components — an embedding outage never aborts a ranking.
pub async fn rank_candidates(
    embedder: &dyn Embedder,
    weights: &ScoreWeights,
    gate: &EligibilityGate,
    job_text: &str,
    job_profile: &ParsedProfile,
    candidates: &[CandidateDoc],
    top_k: usize,
) -> Vec<MatchResult> {
    if candidates.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let mut texts = Vec::with_capacity(candidates.len() + 1);
    texts.push(job_text.to_string());
    texts.extend(candidates.iter().map(|c| c.text.clone()));

    let vectors = match embedder.embed_batch(&texts).await {
        Ok(v) if v.len() == texts.len() => Some(v),
        Ok(v) => {
            warn!(
                "Embedding batch returned {} vectors for {} texts; semantic scores default to 0.0",
                v.len(),
                texts.len()
            );
            None
        }
        Err(e) => {
            warn!("Embedding batch failed, semantic scores default to 0.0: {e}");
            None
        }
    };

    let (job_vector, candidate_vectors) = match vectors {
        Some(mut v) => {
            let rest = v.split_off(1);
            (v.into_iter().next(), rest)
        }
        None => (None, Vec::new()),
    };

    let mut results: Vec<MatchResult> = candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let semantic = match (&job_vector, candidate_vectors.get(i)) {
                (Some(job_vec), Some(candidate_vec)) => {
                    f64::from(cosine_similarity(job_vec, candidate_vec))
                }
                _ => 0.0,
            };
            let components = score_components(&candidate.profile, job_profile, semantic);
            MatchResult {
                candidate_id: candidate.id,
                score: weights.combine(&components),
                components,
            }
        })
        .filter(|result| gate.admits(&result.components))
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(top_k);
    results
}
