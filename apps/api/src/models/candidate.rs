use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub resume_text: String,
    /// Interview transcript supplied by the transcription collaborator.
    pub video_transcript: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: Option<f64>,
    pub education: String,
    pub certifications: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CandidateRow {
    /// Everything the matching engine sees for this candidate: the resume
    /// text plus the interview transcript, when one has been attached.
    pub fn matchable_text(&self) -> String {
        match self.video_transcript.as_deref() {
            Some(transcript) if !transcript.trim().is_empty() => {
                format!("{}\n\nInterview transcript:\n{}", self.resume_text, transcript)
            }
            _ => self.resume_text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(transcript: Option<&str>) -> CandidateRow {
        CandidateRow {
            id: Uuid::from_u128(1),
            name: "Jane Doe".to_string(),
            email: Some("jane@example.com".to_string()),
            phone: None,
            resume_text: "Resume body".to_string(),
            video_transcript: transcript.map(str::to_string),
            skills: vec![],
            experience_years: None,
            education: "none".to_string(),
            certifications: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_matchable_text_without_transcript() {
        assert_eq!(row(None).matchable_text(), "Resume body");
        assert_eq!(row(Some("  ")).matchable_text(), "Resume body");
    }

    #[test]
    fn test_matchable_text_appends_transcript() {
        let text = row(Some("I enjoy Python")).matchable_text();
        assert!(text.starts_with("Resume body"));
        assert!(text.contains("Interview transcript:"));
        assert!(text.contains("I enjoy Python"));
    }
}
