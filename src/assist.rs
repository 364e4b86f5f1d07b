//! Writing helpers for the résumé editor.
//!
//! Keyword heuristics only: a per-role skill table, a handful of technology
//! words spotted in free text, and a templated one-line profile. Requests are
//! read as leniently as records, so these helpers never fail.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::record::{lenient, RawExperience};
use crate::sanitize::clean_text;

/// Skills proposed for a target role before anything is inferred.
const ROLE_SKILLS: &[(&str, &[&str])] = &[
    (
        "developpeur",
        &["JavaScript", "TypeScript", "React", "Node.js", "MongoDB", "Git", "REST", "CI/CD"],
    ),
    ("data", &["Python", "Pandas", "NumPy", "SQL", "Scikit-learn", "TensorFlow", "Data Viz"]),
    ("design", &["Figma", "UI/UX", "Prototypage", "Design System", "Accessibility"]),
];

/// Tokens that reveal a skill, and the skill they reveal.
const INFERRED_SKILLS: &[(&[&str], &str)] = &[
    (&["react"], "React"),
    (&["node", "nodejs"], "Node.js"),
    (&["mongo", "mongodb"], "MongoDB"),
    (&["python"], "Python"),
    (&["sql"], "SQL"),
];

const SUMMARY_SKILLS: usize = 4;
const MAX_RECOMMENDATIONS: usize = 6;

// ============================================================================
// REQUESTS / RESPONSES
// ============================================================================

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SkillsRequest {
    #[serde(default, deserialize_with = "lenient::text")]
    pub resume: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub experience: Vec<RawExperience>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub target_role: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SkillSuggestions {
    pub skills: Vec<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    #[serde(default, rename = "nom", alias = "lastName", deserialize_with = "lenient::text")]
    pub last_name: Option<String>,
    #[serde(default, rename = "prenom", alias = "firstName", deserialize_with = "lenient::text")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub years: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub top_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub last_role: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Summary {
    pub summary: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TailorRequest {
    #[serde(default, deserialize_with = "lenient::list")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub job_description: Option<String>,
}

/// How a skill list lines up against a job description.
#[derive(Debug, Serialize, PartialEq)]
pub struct JobFit {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub recommendations: Vec<String>,
}

// ============================================================================
// TOKENS
// ============================================================================

fn non_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9àâçéèêëîïôûùüÿñæœ\s]").expect("valid token pattern"))
}

/// Lower-cased words; punctuation splits words.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    non_word()
        .replace_all(&lower, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Role skills first, then skills spotted in the summary and experience.
pub fn suggest_skills(request: &SkillsRequest) -> SkillSuggestions {
    let mut text = request.resume.clone().unwrap_or_default();
    for exp in &request.experience {
        for part in [&exp.role, &exp.description].into_iter().flatten() {
            text.push(' ');
            text.push_str(part);
        }
    }
    let tokens: HashSet<String> = tokenize(&text).into_iter().collect();

    let role = request.target_role.as_deref().unwrap_or("").trim().to_lowercase();
    let base = ROLE_SKILLS
        .iter()
        .find(|(name, _)| *name == role)
        .map(|(_, skills)| *skills)
        .unwrap_or(&[]);
    let inferred = INFERRED_SKILLS
        .iter()
        .filter(|(words, _)| words.iter().any(|w| tokens.contains(*w)))
        .map(|(_, skill)| *skill);

    let mut seen = HashSet::new();
    let skills = base
        .iter()
        .copied()
        .chain(inferred)
        .filter(|skill| seen.insert(*skill))
        .map(str::to_string)
        .collect();
    SkillSuggestions { skills }
}

/// One-line profile built from name, seniority, last role and top skills.
pub fn generate_summary(request: &SummaryRequest) -> Summary {
    let name = [request.first_name.as_deref(), request.last_name.as_deref()]
        .into_iter()
        .map(clean_text)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let years = request
        .years
        .as_deref()
        .map(str::trim)
        .filter(|y| y.parse::<f64>().map_or(false, |n| n > 0.0))
        .unwrap_or("X");

    let role = clean_text(request.last_role.as_deref());
    let role = if role.is_empty() { "votre domaine".to_string() } else { role };

    let skills = request
        .top_skills
        .iter()
        .map(|s| clean_text(Some(s)))
        .filter(|s| !s.is_empty())
        .take(SUMMARY_SKILLS)
        .collect::<Vec<_>>()
        .join(", ");

    Summary {
        summary: format!(
            "{} — {} ans d'expérience en {}, spécialisé(e) en {}. Focus sur impact, qualité et collaboration.",
            name, years, role, skills
        ),
    }
}

/// Splits `skills` by whether the job description mentions them, either as a
/// whole word or as a substring (`CI/CD`, `Node.js`). Comparison ignores case.
pub fn tailor_for_job(request: &TailorRequest) -> JobFit {
    let description = request.job_description.as_deref().unwrap_or("").to_lowercase();
    let tokens: HashSet<String> = tokenize(&description).into_iter().collect();

    let (matched, missing): (Vec<String>, Vec<String>) = request
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .partition(|skill| {
            let skill = skill.to_lowercase();
            tokens.contains(&skill) || description.contains(&skill)
        });

    let recommendations = matched.iter().take(MAX_RECOMMENDATIONS).cloned().collect();
    JobFit { matched, missing, recommendations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("React/Node.js, SQL!"), vec!["react", "node", "js", "sql"]);
        assert_eq!(tokenize("  Expérience  ÉLEVÉE "), vec!["expérience", "élevée"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_suggest_skills_role_then_inferred() {
        let suggestions = suggest_skills(&request(json!({
            "resume": "Pipelines Python et SQL.",
            "experience": [{ "poste": "Dev React", "description": "API Node, base Mongo" }],
            "targetRole": " Data "
        })));
        assert_eq!(
            suggestions.skills,
            vec![
                "Python", "Pandas", "NumPy", "SQL", "Scikit-learn", "TensorFlow", "Data Viz",
                "React", "Node.js", "MongoDB",
            ]
        );
    }

    #[test]
    fn test_suggest_skills_unknown_role_and_bad_types() {
        let suggestions = suggest_skills(&request(json!({
            "resume": 42,
            "experience": "nope",
            "targetRole": "astronaute"
        })));
        assert!(suggestions.skills.is_empty());

        let suggestions = suggest_skills(&request(json!({ "resume": "mysql sql" })));
        assert_eq!(suggestions.skills, vec!["SQL"]);
    }

    #[test]
    fn test_generate_summary() {
        let summary = generate_summary(&request(json!({
            "nom": "Dupont",
            "prenom": "Jean",
            "years": 5,
            "topSkills": ["Rust", "SQL", "Kafka", "Go", "Python"],
            "lastRole": "Data engineer"
        })));
        assert_eq!(
            summary.summary,
            "Jean Dupont — 5 ans d'expérience en Data engineer, spécialisé(e) en Rust, SQL, Kafka, Go. \
             Focus sur impact, qualité et collaboration."
        );
    }

    #[test]
    fn test_generate_summary_defaults() {
        let summary = generate_summary(&request(json!({ "prenom": "Jean", "years": 0 })));
        assert_eq!(
            summary.summary,
            "Jean — X ans d'expérience en votre domaine, spécialisé(e) en . \
             Focus sur impact, qualité et collaboration."
        );
    }

    #[test]
    fn test_tailor_for_job() {
        let fit = tailor_for_job(&request(json!({
            "skills": ["Rust", "Node.js", "CI/CD", "Figma", " ", "kafka"],
            "jobDescription": "Backend Rust, Kafka streaming, Node.js services and CI/CD."
        })));
        assert_eq!(fit.matched, vec!["Rust", "Node.js", "CI/CD", "kafka"]);
        assert_eq!(fit.missing, vec!["Figma"]);
        assert_eq!(fit.recommendations, fit.matched);
    }

    #[test]
    fn test_tailor_caps_recommendations() {
        let skills: Vec<String> = (0..8).map(|i| format!("skill{}", i)).collect();
        let description = skills.join(" ");
        let fit = tailor_for_job(&request(json!({ "skills": skills, "jobDescription": description })));
        assert_eq!(fit.matched.len(), 8);
        assert_eq!(fit.recommendations.len(), MAX_RECOMMENDATIONS);
        assert!(fit.missing.is_empty());

        let fit = tailor_for_job(&TailorRequest::default());
        assert!(fit.matched.is_empty() && fit.recommendations.is_empty());
    }
}
