//! Feature Parser — extracts structured signals (skills, experience, education,
//! certifications) from raw resume or job text.
//!
//! Pure functions of the input text and the static vocabularies below; no I/O,
//! no model calls. The same parser runs over both resumes and job postings —
//! for a job, `experience_years` is read as the *required* years.

use std::collections::BTreeSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Known skill terms, matched case-insensitively as substrings.
/// Multi-word terms must appear verbatim (lowercased) in the text.
pub const SKILL_VOCABULARY: &[&str] = &[
    "python",
    "java",
    "javascript",
    "typescript",
    "c++",
    "rust",
    "go",
    "sql",
    "mysql",
    "postgresql",
    "mongodb",
    "redis",
    "elasticsearch",
    "react",
    "angular",
    "vue",
    "node.js",
    "django",
    "flask",
    "spring boot",
    "rest api",
    "graphql",
    "aws",
    "azure",
    "gcp",
    "docker",
    "kubernetes",
    "jenkins",
    "terraform",
    "machine learning",
    "deep learning",
    "data science",
    "nlp",
    "computer vision",
    "pytorch",
    "tensorflow",
    "scikit-learn",
    "pandas",
    "spark",
    "html",
    "css",
    "git",
    "linux",
];

/// Known certification terms, matched the same way as skills.
pub const CERT_VOCABULARY: &[&str] = &[
    "aws certified",
    "aws certification",
    "aws solutions architect",
    "azure fundamentals",
    "azure administrator",
    "google cloud certified",
    "gcp certified",
    "tensorflow certification",
    "cka",
    "ckad",
    "pmp",
];

/// Degree keywords and the level each one signals. Every group is scanned and
/// the highest level found wins, so a resume mentioning both a bachelor's and
/// a PhD classifies as PhD regardless of mention order.
const DEGREE_KEYWORDS: &[(&str, EducationLevel)] = &[
    ("phd", EducationLevel::PhD),
    ("ph.d", EducationLevel::PhD),
    ("doctorate", EducationLevel::PhD),
    ("master", EducationLevel::Master),
    ("m.tech", EducationLevel::Master),
    ("msc", EducationLevel::Master),
    ("m.sc", EducationLevel::Master),
    ("mba", EducationLevel::Master),
    ("bachelor", EducationLevel::Bachelor),
    ("b.tech", EducationLevel::Bachelor),
    ("bsc", EducationLevel::Bachelor),
    ("b.sc", EducationLevel::Bachelor),
    ("b.e.", EducationLevel::Bachelor),
    ("undergraduate", EducationLevel::Bachelor),
];

/// First "<N> year(s)" (or "yrs") mention, with an optional "+" and decimals.
static YEARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*\+?\s*(?:years?|yrs?)\b").unwrap());

/// Highest academic degree detected in a document. Variant order is the
/// contract: `None < Bachelor < Master < PhD`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EducationLevel {
    #[default]
    None,
    Bachelor,
    Master,
    PhD,
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EducationLevel::None => "none",
            EducationLevel::Bachelor => "bachelor",
            EducationLevel::Master => "master",
            EducationLevel::PhD => "phd",
        };
        f.write_str(s)
    }
}

/// Structured signals extracted from one document.
///
/// `experience_years` is `None` when no years pattern matched — "could not
/// parse" is deliberately distinct from an explicit `Some(0.0)`, and the
/// scorer owns the policy for the `None` case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedProfile {
    pub skills: BTreeSet<String>,
    pub experience_years: Option<f64>,
    pub education: EducationLevel,
    pub certifications: BTreeSet<String>,
}

/// Parses a document into a [`ParsedProfile`]. Deterministic; recompute
/// whenever the source text changes.
pub fn parse_profile(text: &str) -> ParsedProfile {
    let lower = text.to_lowercase();

    ParsedProfile {
        skills: match_vocabulary(&lower, SKILL_VOCABULARY),
        experience_years: parse_experience_years(&lower),
        education: parse_education(&lower),
        certifications: match_vocabulary(&lower, CERT_VOCABULARY),
    }
}

fn match_vocabulary(lower: &str, vocabulary: &[&str]) -> BTreeSet<String> {
    vocabulary
        .iter()
        .filter(|term| lower.contains(*term))
        .map(|term| term.to_string())
        .collect()
}

fn parse_experience_years(lower: &str) -> Option<f64> {
    YEARS_RE
        .captures(lower)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn parse_education(lower: &str) -> EducationLevel {
    DEGREE_KEYWORDS
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword))
        .map(|(_, level)| *level)
        .max()
        .unwrap_or(EducationLevel::None)
}
