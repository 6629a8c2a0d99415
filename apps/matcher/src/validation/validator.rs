//! Schema validation for extracted candidate documents.
//!
//! Each top-level section is deserialized on its own, and list sections item
//! by item, so one pass enumerates every violation instead of stopping at the
//! first. Violations are grouped by the top-level section that encloses them.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::validation::schema::{
    Award, Basics, CandidateRecord, Certificate, Education, FieldRules, Interest, Language,
    Project, Publication, Reference, Skill, Volunteer, Work,
};

/// Pseudo-section for violations about the document as a whole.
const DOCUMENT: &str = "document";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Enclosing top-level section, e.g. `work` for `work[1].endDate`.
    pub section: String,
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationFailure {
    pub violations: Vec<Violation>,
    /// Offending sections present in the document, mapped to their original content.
    pub invalid_sections: Map<String, Value>,
}

impl ValidationFailure {
    fn new(fields: &Map<String, Value>, violations: Vec<Violation>) -> Self {
        let mut invalid_sections = Map::new();
        for violation in &violations {
            if invalid_sections.contains_key(&violation.section) {
                continue;
            }
            // Sections absent from the document cannot be repaired; skip them.
            if let Some(content) = fields.get(&violation.section) {
                invalid_sections.insert(violation.section.clone(), content.clone());
            }
        }
        Self {
            violations,
            invalid_sections,
        }
    }

    /// Names of every section with at least one violation, present or not.
    pub fn failing_sections(&self) -> Vec<&str> {
        let mut sections: Vec<&str> = self.violations.iter().map(|v| v.section.as_str()).collect();
        sections.dedup();
        sections
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.path, v.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{} violation(s): {details}", self.violations.len())
    }
}

#[derive(Debug)]
pub enum ValidationVerdict {
    Valid(CandidateRecord),
    Invalid(ValidationFailure),
}

/// Validates a candidate document and, on success, returns the normalized record.
pub fn validate(document: &Value) -> ValidationVerdict {
    let empty = Map::new();
    let mut violations = Vec::new();
    let fields = match document.as_object() {
        Some(fields) => fields,
        None => {
            violations.push(Violation {
                section: DOCUMENT.to_string(),
                path: "$".to_string(),
                message: format!("expected a JSON object, found {}", kind_of(document)),
            });
            &empty
        }
    };

    let basics = required_object::<Basics>(fields, "basics", &mut violations);
    let work = parse_list::<Work>(fields, "work", &mut violations);
    let volunteer = parse_list::<Volunteer>(fields, "volunteer", &mut violations);
    let education = required_list::<Education>(fields, "education", &mut violations);
    let awards = parse_list::<Award>(fields, "awards", &mut violations);
    let certificates = parse_list::<Certificate>(fields, "certificates", &mut violations);
    let publications = parse_list::<Publication>(fields, "publications", &mut violations);
    let skills = required_list::<Skill>(fields, "skills", &mut violations);
    let languages = parse_list::<Language>(fields, "languages", &mut violations);
    let interests = parse_list::<Interest>(fields, "interests", &mut violations);
    let references = parse_list::<Reference>(fields, "references", &mut violations);
    let projects = required_list::<Project>(fields, "projects", &mut violations);

    if violations.is_empty() {
        if let (Some(basics), Some(education), Some(skills), Some(projects)) =
            (basics, education, skills, projects)
        {
            return ValidationVerdict::Valid(CandidateRecord {
                basics,
                work,
                volunteer,
                education,
                awards,
                certificates,
                publications,
                skills,
                languages,
                interests,
                references,
                projects,
            });
        }
    }

    ValidationVerdict::Invalid(ValidationFailure::new(fields, violations))
}

/// Absent and explicit `null` sections are treated alike.
fn section_value<'a>(fields: &'a Map<String, Value>, section: &str) -> Option<&'a Value> {
    fields.get(section).filter(|v| !v.is_null())
}

fn violation(violations: &mut Vec<Violation>, section: &str, path: &str, message: String) {
    violations.push(Violation {
        section: section.to_string(),
        path: path.to_string(),
        message,
    });
}

fn parse_item<T: DeserializeOwned + FieldRules>(
    section: &str,
    path: &str,
    value: &Value,
    violations: &mut Vec<Violation>,
) -> Option<T> {
    match T::deserialize(value) {
        Ok(item) => {
            let before = violations.len();
            item.check(section, path, violations);
            (violations.len() == before).then_some(item)
        }
        Err(e) => {
            violation(violations, section, path, e.to_string());
            None
        }
    }
}

fn required_object<T: DeserializeOwned + FieldRules>(
    fields: &Map<String, Value>,
    section: &str,
    violations: &mut Vec<Violation>,
) -> Option<T> {
    let Some(value) = section_value(fields, section) else {
        violation(violations, section, section, "section is required".to_string());
        return None;
    };
    if !value.is_object() {
        violation(
            violations,
            section,
            section,
            format!("expected an object, found {}", kind_of(value)),
        );
        return None;
    }
    parse_item(section, section, value, violations)
}

fn required_list<T: DeserializeOwned + FieldRules>(
    fields: &Map<String, Value>,
    section: &str,
    violations: &mut Vec<Violation>,
) -> Option<Vec<T>> {
    if section_value(fields, section).is_none() {
        violation(violations, section, section, "section is required".to_string());
        return None;
    }
    parse_list(fields, section, violations)
}

/// `None` when the section is absent or has any invalid item.
fn parse_list<T: DeserializeOwned + FieldRules>(
    fields: &Map<String, Value>,
    section: &str,
    violations: &mut Vec<Violation>,
) -> Option<Vec<T>> {
    let value = section_value(fields, section)?;
    let Some(items) = value.as_array() else {
        violation(
            violations,
            section,
            section,
            format!("expected a list, found {}", kind_of(value)),
        );
        return None;
    };

    let mut parsed = Vec::with_capacity(items.len());
    let mut all_valid = true;
    for (i, item) in items.iter().enumerate() {
        match parse_item::<T>(section, &format!("{section}[{i}]"), item, violations) {
            Some(item) => parsed.push(item),
            None => all_valid = false,
        }
    }
    all_valid.then_some(parsed)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
