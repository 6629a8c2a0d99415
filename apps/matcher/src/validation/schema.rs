//! CandidateRecord: the typed resume shape the model must produce.
//!
//! Serde enforces presence and types. `FieldRules` adds what serde cannot:
//! email and URL formats, the fixed date format, and start/end ordering.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::enrichment::Gender;
use crate::validation::Violation;

/// The only accepted date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub basics: Basics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work: Option<Vec<Work>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volunteer: Option<Vec<Volunteer>>,
    pub education: Vec<Education>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awards: Option<Vec<Award>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificates: Option<Vec<Certificate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publications: Option<Vec<Publication>>,
    pub skills: Vec<Skill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<Language>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<Interest>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Reference>>,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basics {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles: Option<Vec<Profile>>,
    /// Enrichment only; attached after validation, never requested from the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub country_code: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub network: String,
    pub username: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub start_date: String,
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volunteer {
    pub organization: String,
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub start_date: String,
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_type: Option<String>,
    pub start_date: String,
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courses: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Award {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub date: String,
    pub awarder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub date: String,
    pub issuer: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub publisher: String,
    pub release_date: String,
    pub url: String,
    pub summary: String,
}

/// Skills arrive either as bare names or as free-form objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Skill {
    Name(String),
    Detailed(Map<String, Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fluency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interest {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Field rules
// ────────────────────────────────────────────────────────────────────────────

/// Checks beyond what deserialization enforces. `path` is the item's location,
/// e.g. `work[2]`; violations are attributed to `section`.
pub trait FieldRules {
    fn check(&self, _section: &str, _path: &str, _violations: &mut Vec<Violation>) {}
}

impl FieldRules for Basics {
    fn check(&self, section: &str, path: &str, violations: &mut Vec<Violation>) {
        check_email(section, &format!("{path}.email"), &self.email, violations);
        if let Some(url) = &self.url {
            check_url(section, &format!("{path}.url"), url, violations);
        }
        for (i, profile) in self.profiles.iter().flatten().enumerate() {
            check_url(
                section,
                &format!("{path}.profiles[{i}].url"),
                &profile.url,
                violations,
            );
        }
    }
}

impl FieldRules for Work {
    fn check(&self, section: &str, path: &str, violations: &mut Vec<Violation>) {
        check_optional_url(section, path, self.url.as_deref(), violations);
        check_date_range(
            section,
            path,
            Some(&self.start_date),
            Some(&self.end_date),
            violations,
        );
    }
}

impl FieldRules for Volunteer {
    fn check(&self, section: &str, path: &str, violations: &mut Vec<Violation>) {
        check_optional_url(section, path, self.url.as_deref(), violations);
        check_date_range(
            section,
            path,
            Some(&self.start_date),
            Some(&self.end_date),
            violations,
        );
    }
}

impl FieldRules for Education {
    fn check(&self, section: &str, path: &str, violations: &mut Vec<Violation>) {
        check_optional_url(section, path, self.url.as_deref(), violations);
        check_date_range(
            section,
            path,
            Some(&self.start_date),
            Some(&self.end_date),
            violations,
        );
    }
}

impl FieldRules for Award {
    fn check(&self, section: &str, path: &str, violations: &mut Vec<Violation>) {
        check_date(section, &format!("{path}.date"), &self.date, violations);
    }
}

impl FieldRules for Certificate {
    fn check(&self, section: &str, path: &str, violations: &mut Vec<Violation>) {
        check_date(section, &format!("{path}.date"), &self.date, violations);
        check_url(section, &format!("{path}.url"), &self.url, violations);
    }
}

impl FieldRules for Publication {
    fn check(&self, section: &str, path: &str, violations: &mut Vec<Violation>) {
        check_date(
            section,
            &format!("{path}.releaseDate"),
            &self.release_date,
            violations,
        );
        check_url(section, &format!("{path}.url"), &self.url, violations);
    }
}

impl FieldRules for Project {
    fn check(&self, section: &str, path: &str, violations: &mut Vec<Violation>) {
        check_optional_url(section, path, self.url.as_deref(), violations);
        check_date_range(
            section,
            path,
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            violations,
        );
    }
}

impl FieldRules for Skill {}
impl FieldRules for Language {}
impl FieldRules for Interest {}
impl FieldRules for Reference {}

fn push(violations: &mut Vec<Violation>, section: &str, path: &str, message: String) {
    violations.push(Violation {
        section: section.to_string(),
        path: path.to_string(),
        message,
    });
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

fn check_date(section: &str, path: &str, value: &str, violations: &mut Vec<Violation>) {
    if parse_date(value).is_none() {
        push(
            violations,
            section,
            path,
            format!("date '{value}' does not match format YYYY-MM-DD"),
        );
    }
}

/// Each present date must parse; when both parse, start must not be after end.
fn check_date_range(
    section: &str,
    path: &str,
    start: Option<&str>,
    end: Option<&str>,
    violations: &mut Vec<Violation>,
) {
    let before = violations.len();
    if let Some(start) = start {
        check_date(section, &format!("{path}.startDate"), start, violations);
    }
    if let Some(end) = end {
        check_date(section, &format!("{path}.endDate"), end, violations);
    }
    if violations.len() > before {
        return;
    }
    if let (Some(s), Some(e)) = (start.and_then(parse_date), end.and_then(parse_date)) {
        if s > e {
            push(
                violations,
                section,
                path,
                format!("startDate {s} cannot be after endDate {e}"),
            );
        }
    }
}

fn check_optional_url(
    section: &str,
    path: &str,
    url: Option<&str>,
    violations: &mut Vec<Violation>,
) {
    if let Some(url) = url {
        check_url(section, &format!("{path}.url"), url, violations);
    }
}

fn check_url(section: &str, path: &str, value: &str, violations: &mut Vec<Violation>) {
    let valid = Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false);
    if !valid {
        push(
            violations,
            section,
            path,
            format!("'{value}' is not a valid http(s) URL"),
        );
    }
}

fn check_email(section: &str, path: &str, value: &str, violations: &mut Vec<Violation>) {
    if !is_valid_email(value) {
        push(
            violations,
            section,
            path,
            format!("'{value}' is not a valid email address"),
        );
    }
}

fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}
