use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    /// active | closed | draft
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl JobRow {
    /// The job text the matching engine scores against.
    pub fn matchable_text(&self) -> String {
        let mut text = format!("{}\n{}", self.title, self.description);
        if let Some(requirements) = self.requirements.as_deref() {
            if !requirements.trim().is_empty() {
                text.push_str("\nRequirements: ");
                text.push_str(requirements);
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matchable_text_includes_requirements() {
        let job = JobRow {
            id: Uuid::from_u128(1),
            title: "Backend Engineer".to_string(),
            description: "Build services.".to_string(),
            requirements: Some("3 years Python".to_string()),
            status: "active".to_string(),
            created_at: Utc::now(),
        };
        let text = job.matchable_text();
        assert!(text.starts_with("Backend Engineer\n"));
        assert!(text.contains("Requirements: 3 years Python"));
    }
}
