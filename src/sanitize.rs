//! Input normalization.
//!
//! `normalize` turns an untrusted [`RawRecord`] into a [`NormalizedRecord`]
//! whose strings can be handed straight to the drawing calls. It never fails:
//! bad values are cleaned, dropped, or replaced with a placeholder.

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::record::{
    RawAward, RawCertification, RawEducation, RawExperience, RawHighlight, RawLanguage, RawProject,
    RawRecord,
};

/// Shown in place of a required field the record does not provide.
pub const PLACEHOLDER: &str = "Non renseigné";

const MIN_ENTRY_CHARS: usize = 2;
const MIN_PHONE_DIGITS: usize = 6;

// ============================================================================
// NORMALIZED RECORD
// ============================================================================

/// A required field: either a cleaned value or missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Required {
    Given(String),
    Missing,
}

impl Required {
    fn from_cleaned(value: String) -> Self {
        if value.is_empty() {
            Required::Missing
        } else {
            Required::Given(value)
        }
    }

    /// The display text, the placeholder when missing.
    pub fn as_str(&self) -> &str {
        match self {
            Required::Given(v) => v,
            Required::Missing => PLACEHOLDER,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Required::Missing)
    }
}

impl std::fmt::Display for Required {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Required {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Required::Given(v) => serializer.serialize_some(v),
            Required::Missing => serializer.serialize_none(),
        }
    }
}

/// Display-ready record. Serializes back to the raw key layout, so it can be
/// fed through [`normalize`] again.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(rename = "nom")]
    pub last_name: Required,
    #[serde(rename = "prenom")]
    pub first_name: Required,
    pub email: Required,
    #[serde(rename = "tel")]
    pub phone: Required,

    pub job_title: String,
    #[serde(rename = "resume")]
    pub summary: String,
    pub photo: Option<String>,
    #[serde(rename = "adresse")]
    pub address: String,
    pub city: String,
    pub country: String,
    #[serde(rename = "disponibilite")]
    pub availability: String,

    pub linkedin: String,
    pub github: String,
    pub twitter: String,
    pub website: String,
    pub portfolio: String,

    pub skills: Vec<String>,
    pub soft_skills: Vec<String>,
    pub tools: Vec<String>,
    pub hobbies: Vec<String>,
    pub languages: Vec<String>,

    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub projects: Vec<Project>,
    pub certifications: Vec<Certification>,
    pub awards: Vec<Award>,
    pub most_proud_of: Vec<Highlight>,
}

impl NormalizedRecord {
    /// "First Last", as printed in the header.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Identity used for artifact names, if the record carries one.
    pub fn identity(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Experience {
    #[serde(rename = "poste")]
    pub role: String,
    #[serde(rename = "entreprise")]
    pub company: String,
    #[serde(rename = "dateDebut")]
    pub start: Option<NaiveDate>,
    #[serde(rename = "dateFin")]
    pub end: Option<NaiveDate>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Education {
    #[serde(rename = "diplome")]
    pub degree: String,
    #[serde(rename = "ecole")]
    pub school: String,
    #[serde(rename = "dateDebut")]
    pub start: Option<NaiveDate>,
    #[serde(rename = "dateFin")]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    #[serde(rename = "titre")]
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    #[serde(rename = "lien")]
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Certification {
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "organisme")]
    pub organization: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Award {
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(rename = "organisme")]
    pub organization: String,
    pub date: Option<NaiveDate>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    #[serde(rename = "titre")]
    pub title: String,
    pub description: String,
}

/// `"2019 - 2021"`, with blanks for absent years (`" - 2021"`, `" - "`).
pub fn year_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    let year = |d: Option<NaiveDate>| d.map(|d| d.format("%Y").to_string()).unwrap_or_default();
    format!("{} - {}", year(start), year(end))
}

// ============================================================================
// NORMALIZE
// ============================================================================

pub fn normalize(raw: &RawRecord) -> NormalizedRecord {
    NormalizedRecord {
        id: raw.id.as_deref().map(clean_identity).filter(|id| !id.is_empty()),
        last_name: Required::from_cleaned(clean_text(raw.last_name.as_deref())),
        first_name: Required::from_cleaned(clean_text(raw.first_name.as_deref())),
        email: Required::from_cleaned(clean_email(raw.email.as_deref())),
        phone: Required::from_cleaned(format_phone(raw.phone.as_deref()).unwrap_or_default()),

        job_title: clean_text(raw.job_title.as_deref()),
        summary: clean_text(raw.summary.as_deref()),
        photo: raw.photo.as_deref().map(clean_reference).filter(|p| !p.is_empty()),
        address: clean_text(raw.address.as_deref()),
        city: clean_text(raw.city.as_deref()),
        country: clean_text(raw.country.as_deref()),
        availability: clean_text(raw.availability.as_deref()),

        linkedin: clean_link(raw.linkedin.as_deref()),
        github: clean_link(raw.github.as_deref()),
        twitter: clean_link(raw.twitter.as_deref()),
        website: clean_link(raw.website.as_deref()),
        portfolio: clean_link(raw.portfolio.as_deref()),

        skills: clean_list(&raw.skills),
        soft_skills: clean_list(&raw.soft_skills),
        tools: clean_list(&raw.tools),
        hobbies: clean_list(&raw.hobbies),
        languages: clean_languages(&raw.languages),

        experience: raw.experience.iter().filter_map(normalize_experience).collect(),
        education: raw.education.iter().filter_map(normalize_education).collect(),
        projects: raw.projects.iter().filter_map(normalize_project).collect(),
        certifications: raw.certifications.iter().filter_map(normalize_certification).collect(),
        awards: raw.awards.iter().filter_map(normalize_award).collect(),
        most_proud_of: raw.most_proud_of.iter().filter_map(normalize_highlight).collect(),
    }
}

fn normalize_experience(e: &RawExperience) -> Option<Experience> {
    let entry = Experience {
        role: clean_text(e.role.as_deref()),
        company: clean_text(e.company.as_deref()),
        start: e.start.as_deref().and_then(parse_date),
        end: e.end.as_deref().and_then(parse_date),
        description: clean_text(e.description.as_deref()),
    };
    any_filled(&[&entry.role, &entry.company, &entry.description]).then_some(entry)
}

fn normalize_education(e: &RawEducation) -> Option<Education> {
    let entry = Education {
        degree: clean_text(e.degree.as_deref()),
        school: clean_text(e.school.as_deref()),
        start: e.start.as_deref().and_then(parse_date),
        end: e.end.as_deref().and_then(parse_date),
    };
    any_filled(&[&entry.degree, &entry.school]).then_some(entry)
}

fn normalize_project(p: &RawProject) -> Option<Project> {
    let entry = Project {
        title: clean_text(p.title.as_deref()),
        description: clean_text(p.description.as_deref()),
        technologies: clean_list(&p.technologies),
        link: clean_link(p.link.as_deref()),
    };
    (any_filled(&[&entry.title, &entry.description, &entry.link]) || !entry.technologies.is_empty())
        .then_some(entry)
}

fn normalize_certification(c: &RawCertification) -> Option<Certification> {
    let entry = Certification {
        name: clean_text(c.name.as_deref()),
        organization: clean_text(c.organization.as_deref()),
        date: c.date.as_deref().and_then(parse_date),
    };
    any_filled(&[&entry.name, &entry.organization]).then_some(entry)
}

fn normalize_award(a: &RawAward) -> Option<Award> {
    let entry = Award {
        title: clean_text(a.title.as_deref()),
        organization: clean_text(a.organization.as_deref()),
        date: a.date.as_deref().and_then(parse_date),
        description: clean_text(a.description.as_deref()),
    };
    any_filled(&[&entry.title, &entry.organization, &entry.description]).then_some(entry)
}

fn normalize_highlight(h: &RawHighlight) -> Option<Highlight> {
    let entry = Highlight {
        title: clean_text(h.title.as_deref()),
        description: clean_text(h.description.as_deref()),
    };
    any_filled(&[&entry.title, &entry.description]).then_some(entry)
}

fn any_filled(fields: &[&String]) -> bool {
    fields.iter().any(|f| !f.is_empty())
}

// ============================================================================
// TEXT CLEANING
// ============================================================================

fn disallowed_text() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\p{L}0-9 .,+\-'/()]").expect("valid text allow-list"))
}

fn disallowed_email() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\p{L}0-9 .,+\-'/()@_]").expect("valid email allow-list"))
}

fn disallowed_link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[^\p{L}0-9 .,+\-'/()@_:?=&%#~]").expect("valid link allow-list")
    })
}

fn phone_groups() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2,3})(\d{2,3})(\d{2,3})(\d+)?").expect("valid phone pattern"))
}

/// Whitespace becomes a single space, `|`/`;` are removed, characters outside
/// `disallowed` are dropped, then the result is collapsed and trimmed again.
fn clean_with(value: Option<&str>, disallowed: &Regex) -> String {
    let Some(value) = value else {
        return String::new();
    };
    let spaced: String = value
        .chars()
        .filter(|c| *c != '|' && *c != ';')
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    let kept = disallowed.replace_all(&spaced, "");
    kept.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ")
}

pub fn clean_text(value: Option<&str>) -> String {
    clean_with(value, disallowed_text())
}

/// Like [`clean_text`] but keeps `@` and `_`, lower-cased.
pub fn clean_email(value: Option<&str>) -> String {
    clean_with(value, disallowed_email()).to_lowercase()
}

/// Keeps the URL punctuation `: ? = & % # ~ @ _` on top of the text set.
pub fn clean_link(value: Option<&str>) -> String {
    clean_with(value, disallowed_link())
}

/// Photo references are paths or URLs; only control characters go.
fn clean_reference(value: &str) -> String {
    value.chars().filter(|c| !c.is_control()).collect::<String>().trim().to_string()
}

fn clean_identity(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Digits only, grouped in clusters of 2 or 3. `None` below six digits.
pub fn format_phone(value: Option<&str>) -> Option<String> {
    let digits: String = value?.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < MIN_PHONE_DIGITS {
        return None;
    }
    let Some(caps) = phone_groups().captures(&digits) else {
        return Some(digits);
    };
    let matched = caps.get(0).map_or(0, |m| m.end());
    let mut grouped = caps
        .iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    grouped.push_str(&digits[matched..]);
    Some(grouped)
}

/// Cleans every entry, drops short ones and later duplicates. Duplicate
/// detection is case-sensitive.
pub fn clean_list(values: &[String]) -> Vec<String> {
    dedup(values.iter().map(|v| clean_text(Some(v))))
}

fn clean_languages(values: &[RawLanguage]) -> Vec<String> {
    let rendered = values.iter().map(|lang| match lang {
        RawLanguage::Bare(s) => clean_text(Some(s)),
        RawLanguage::Leveled { name, level } => {
            let name = clean_text(name.as_deref());
            let level = clean_text(level.as_deref());
            if name.is_empty() {
                String::new()
            } else if level.is_empty() {
                name
            } else {
                format!("{} ({})", name, level)
            }
        }
    });
    dedup(rendered)
}

fn dedup(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| v.chars().count() >= MIN_ENTRY_CHARS)
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

// ============================================================================
// DATES
// ============================================================================

/// Parses the date shapes a record may carry. Anything unrecognised is `None`,
/// never a partially valid date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(d);
    }
    if value.bytes().all(|b| b.is_ascii_digit()) {
        return match value.len() {
            4 => NaiveDate::from_ymd_opt(value.parse().ok()?, 1, 1),
            8 => NaiveDate::parse_from_str(value, "%Y%m%d").ok(),
            // Epoch milliseconds.
            10.. => DateTime::<Utc>::from_timestamp_millis(value.parse().ok()?).map(|dt| dt.date_naive()),
            _ => None,
        };
    }
    if let Some((year, month)) = value.split_once('-') {
        if year.len() == 4 && (1..=2).contains(&month.len()) {
            return NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_clean_text_allow_list() {
        assert_eq!(clean_text(Some("  Jean\t\n  <b>Dupont</b> ")), "Jean bDupont/b");
        assert_eq!(clean_text(Some("a | b ; c")), "a b c");
        assert_eq!(clean_text(Some("Zoë O'Neil-Smith (CTO), 2+2")), "Zoë O'Neil-Smith (CTO), 2+2");
        assert_eq!(clean_text(Some("x\u{0007}y")), "xy");
        assert_eq!(clean_text(Some("user@mail.com")), "usermail.com");
        assert_eq!(clean_text(None), "");
    }

    #[test]
    fn test_clean_email() {
        assert_eq!(clean_email(Some("JEAN@X.COM ")), "jean@x.com");
        assert_eq!(clean_email(Some("first_last@ex-ample.org;")), "first_last@ex-ample.org");
    }

    #[test]
    fn test_clean_link_keeps_urls() {
        assert_eq!(
            clean_link(Some(" https://github.com/jdupont?tab=repos ")),
            "https://github.com/jdupont?tab=repos"
        );
        assert_eq!(clean_link(Some("javascript:<alert>")), "javascript:alert");
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone(Some("01-23 45 67 89")).as_deref(), Some("012 345 678 9"));
        assert_eq!(format_phone(Some("123456")).as_deref(), Some("12 34 56"));
        assert_eq!(format_phone(Some("+33 6 12 34 56 78")).as_deref(), Some("336 123 456 78"));
        assert_eq!(format_phone(Some("12345")), None);
        assert_eq!(format_phone(Some("call me")), None);
        assert_eq!(format_phone(None), None);
    }

    #[test]
    fn test_required_placeholders() {
        let record = normalize(&RawRecord::default());
        assert_eq!(record.last_name.as_str(), PLACEHOLDER);
        assert_eq!(record.first_name.as_str(), PLACEHOLDER);
        assert_eq!(record.email.as_str(), PLACEHOLDER);
        assert_eq!(record.phone.as_str(), PLACEHOLDER);

        let record = normalize(&raw(json!({ "nom": " ;; ", "tel": "12" })));
        assert!(record.last_name.is_missing());
        assert!(record.phone.is_missing());
    }

    #[test]
    fn test_list_dedup_is_order_preserving_and_case_sensitive() {
        let record = normalize(&raw(json!({
            "skills": ["SQL", "sql", "AB", "SQL", "R", " Rust ", "Rust", ""],
            "hobbies": ["x", "Échecs", "Échecs;"]
        })));
        assert_eq!(record.skills, vec!["SQL", "sql", "AB", "Rust"]);
        assert_eq!(record.hobbies, vec!["Échecs"]);
    }

    #[test]
    fn test_languages() {
        let record = normalize(&raw(json!({
            "languages": [
                "Français",
                { "name": "Anglais", "level": "C1" },
                { "name": "Espagnol" },
                { "level": "B2" },
                { "name": "Anglais", "level": "C1" }
            ]
        })));
        assert_eq!(record.languages, vec!["Français", "Anglais (C1)", "Espagnol"]);
    }

    #[test]
    fn test_structured_entries_filtered() {
        let record = normalize(&raw(json!({
            "experience": [
                { "poste": "Dev", "entreprise": "Acme", "dateDebut": "2019-03-01", "dateFin": "not a date" },
                { "dateDebut": "2020-01-01" },
                { "description": "<>" }
            ],
            "education": [{ "ecole": "INSA", "dateFin": "2018" }, { "diplome": "" }],
            "certifications": [{ "date": "2021-01-01" }, { "nom": "AWS SAA", "date": "2021-06-15T00:00:00.000Z" }]
        })));

        assert_eq!(record.experience.len(), 1);
        assert_eq!(record.experience[0].start, NaiveDate::from_ymd_opt(2019, 3, 1));
        assert_eq!(record.experience[0].end, None);
        assert_eq!(record.education.len(), 1);
        assert_eq!(record.education[0].end, NaiveDate::from_ymd_opt(2018, 1, 1));
        assert_eq!(record.certifications.len(), 1);
        assert_eq!(record.certifications[0].date, NaiveDate::from_ymd_opt(2021, 6, 15));
    }

    #[test]
    fn test_parse_date_shapes() {
        assert_eq!(parse_date("2020-02-29"), NaiveDate::from_ymd_opt(2020, 2, 29));
        assert_eq!(parse_date("2021-02-30"), None);
        assert_eq!(parse_date("2022-07"), NaiveDate::from_ymd_opt(2022, 7, 1));
        assert_eq!(parse_date("2022-13"), None);
        assert_eq!(parse_date("2019-05-01T10:00:00+02:00"), NaiveDate::from_ymd_opt(2019, 5, 1));
        assert_eq!(parse_date("1577836800000"), NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(parse_date("yesterday"), None);

        assert_eq!(parse_date("20190301"), NaiveDate::from_ymd_opt(2019, 3, 1));
        assert_eq!(parse_date("20191301"), None);
        assert_eq!(parse_date("201903"), None);
        assert_eq!(parse_date("12345"), None);
    }

    #[test]
    fn test_year_range() {
        let d = |y| NaiveDate::from_ymd_opt(y, 1, 1);
        assert_eq!(year_range(d(2019), d(2021)), "2019 - 2021");
        assert_eq!(year_range(None, d(2021)), " - 2021");
        assert_eq!(year_range(None, None), " - ");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let messy = raw(json!({
            "_id": "64f0c2a9e1",
            "nom": "  Dupont|| ",
            "prenom": "Jean\n",
            "email": "JEAN@X.COM ",
            "tel": "01-23 45 67 89",
            "jobTitle": "Dev ; <i>Senior</i>",
            "photo": " /uploads/me.png ",
            "linkedin": "https://linkedin.com/in/jd",
            "skills": ["SQL", "sql", "AB", "a"],
            "languages": [{ "name": "Anglais", "level": "C1" }],
            "experience": [{ "poste": "Dev", "entreprise": "Acme", "dateDebut": "2019-03-01T00:00:00Z" }],
            "projects": [{ "titre": "CV", "technologies": ["Rust", "Rust", "x"], "lien": "https://x.io" }],
            "awards": [{ "titre": "Prix", "date": "2020" }],
            "mostProudOf": [{ "description": "Marathon en 3h30" }]
        }));

        let once = normalize(&messy);
        let again: RawRecord = serde_json::from_value(serde_json::to_value(&once).unwrap()).unwrap();
        let twice = normalize(&again);
        assert_eq!(once, twice);
    }
}
