//! Untrusted input record.
//!
//! Every field is deserialized leniently: a value of the wrong JSON type
//! becomes absent (or empty) instead of failing the whole payload. Nothing
//! here is cleaned; that is the sanitizer's job.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::theme::ThemeRequest;

// ============================================================================
// RAW RECORD
// ============================================================================

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default, rename = "_id", alias = "id", deserialize_with = "lenient::text")]
    pub id: Option<String>,

    // --- Identity (required in the source schema) ---
    #[serde(default, rename = "nom", alias = "lastName", deserialize_with = "lenient::text")]
    pub last_name: Option<String>,
    #[serde(default, rename = "prenom", alias = "firstName", deserialize_with = "lenient::text")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(default, rename = "tel", alias = "phone", deserialize_with = "lenient::text")]
    pub phone: Option<String>,

    // --- Free text ---
    #[serde(default, deserialize_with = "lenient::text")]
    pub job_title: Option<String>,
    #[serde(default, rename = "resume", alias = "summary", deserialize_with = "lenient::text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub photo: Option<String>,
    #[serde(default, rename = "adresse", alias = "address", deserialize_with = "lenient::text")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub country: Option<String>,
    #[serde(default, rename = "disponibilite", alias = "availability", deserialize_with = "lenient::text")]
    pub availability: Option<String>,

    // --- Links ---
    #[serde(default, deserialize_with = "lenient::text")]
    pub linkedin: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub github: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub twitter: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub portfolio: Option<String>,

    // --- Flat lists ---
    #[serde(default, deserialize_with = "lenient::list")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub soft_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub tools: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub hobbies: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub languages: Vec<RawLanguage>,

    // --- Structured lists ---
    #[serde(default, deserialize_with = "lenient::list")]
    pub experience: Vec<RawExperience>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub education: Vec<RawEducation>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub projects: Vec<RawProject>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub certifications: Vec<RawCertification>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub awards: Vec<RawAward>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub most_proud_of: Vec<RawHighlight>,

    #[serde(default, deserialize_with = "lenient::object")]
    pub theme: ThemeRequest,
}

// ============================================================================
// LIST ENTRIES
// ============================================================================

/// A language is either a bare string or a `{name, level}` pair.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum RawLanguage {
    Bare(String),
    Leveled {
        #[serde(default, deserialize_with = "lenient::text")]
        name: Option<String>,
        #[serde(default, deserialize_with = "lenient::text")]
        level: Option<String>,
    },
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RawExperience {
    #[serde(default, rename = "poste", alias = "role", deserialize_with = "lenient::text")]
    pub role: Option<String>,
    #[serde(default, rename = "entreprise", alias = "company", deserialize_with = "lenient::text")]
    pub company: Option<String>,
    #[serde(default, rename = "dateDebut", alias = "startDate", deserialize_with = "lenient::text")]
    pub start: Option<String>,
    #[serde(default, rename = "dateFin", alias = "endDate", deserialize_with = "lenient::text")]
    pub end: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RawEducation {
    #[serde(default, rename = "diplome", alias = "degree", deserialize_with = "lenient::text")]
    pub degree: Option<String>,
    #[serde(default, rename = "ecole", alias = "school", deserialize_with = "lenient::text")]
    pub school: Option<String>,
    #[serde(default, rename = "dateDebut", alias = "startDate", deserialize_with = "lenient::text")]
    pub start: Option<String>,
    #[serde(default, rename = "dateFin", alias = "endDate", deserialize_with = "lenient::text")]
    pub end: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RawProject {
    #[serde(default, rename = "titre", alias = "title", deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub technologies: Vec<String>,
    #[serde(default, rename = "lien", alias = "link", deserialize_with = "lenient::text")]
    pub link: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RawCertification {
    #[serde(default, rename = "nom", alias = "name", deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, rename = "organisme", alias = "organization", deserialize_with = "lenient::text")]
    pub organization: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RawAward {
    #[serde(default, rename = "titre", alias = "title", deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, rename = "organisme", alias = "organization", deserialize_with = "lenient::text")]
    pub organization: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
}

/// A "most proud of" entry.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RawHighlight {
    #[serde(default, rename = "titre", alias = "title", deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
}

// ============================================================================
// LENIENT DESERIALIZERS
// ============================================================================

pub(crate) mod lenient {
    use super::*;

    /// Strings pass through, numbers are stringified, anything else is absent.
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Arrays keep the elements that fit `T`; non-arrays become empty.
    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        })
    }

    /// Falls back to `T::default()` when the value does not fit.
    pub fn object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }
}
