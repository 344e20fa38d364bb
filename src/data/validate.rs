use std::collections::HashSet;
use std::fmt;
use std::fs;

use serde_json::{Map, Value};

use crate::data::player::{Axis, MAX_RATING, MIN_RATING};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == ValidationSeverity::Error)
            .count()
    }
}

/// Checks a roster file without stopping at the first problem, so the whole file can be fixed
/// in one pass. Unreadable or non-JSON input is an `Err`; everything else lands in the report.
pub fn validate_roster_file(path: &str) -> Result<ValidationReport, String> {
    let raw = fs::read_to_string(path).map_err(|err| format!("unable to read '{path}': {err}"))?;
    validate_roster_json(&raw).map_err(|err| format!("'{path}': {err}"))
}

pub fn validate_roster_json(raw: &str) -> Result<ValidationReport, String> {
    let payload: Value =
        serde_json::from_str(raw).map_err(|err| format!("unable to parse json: {err}"))?;

    let entries = payload
        .get("players")
        .and_then(Value::as_array)
        .or_else(|| payload.as_array())
        .ok_or_else(|| "expected top-level JSON array or { players: [...] }".to_string())?;

    let mut report = ValidationReport::default();
    let mut seen_ids = HashSet::new();

    if entries.is_empty() {
        report.push(ValidationSeverity::Warning, "players", "roster is empty");
    }

    for (index, entry) in entries.iter().enumerate() {
        let base_context = format!("entry[{index}]");
        let Some(object) = entry.as_object() else {
            report.push(
                ValidationSeverity::Error,
                base_context,
                "entry is not an object",
            );
            continue;
        };

        let player_id = match object.get("id").and_then(Value::as_str) {
            Some(id) if !id.trim().is_empty() => {
                if !seen_ids.insert(id.to_string()) {
                    report.push(
                        ValidationSeverity::Error,
                        format!("{base_context}.id"),
                        format!("duplicate id '{id}'"),
                    );
                }
                id.to_string()
            }
            _ => {
                report.push(
                    ValidationSeverity::Error,
                    format!("{base_context}.id"),
                    "missing non-empty 'id'",
                );
                "<missing-id>".to_string()
            }
        };

        validate_ratings(&mut report, object, &player_id, index);
    }

    Ok(report)
}

fn validate_ratings(
    report: &mut ValidationReport,
    object: &Map<String, Value>,
    player_id: &str,
    entry_index: usize,
) {
    for axis in Axis::ALL {
        let context = format!("entry[{entry_index}] id='{player_id}'.{axis}");
        match object.get(axis.as_str()) {
            None => report.push(ValidationSeverity::Error, context, "missing rating"),
            Some(value) => match value.as_u64() {
                Some(rating)
                    if (u64::from(MIN_RATING)..=u64::from(MAX_RATING)).contains(&rating) => {}
                Some(rating) => report.push(
                    ValidationSeverity::Error,
                    context,
                    format!("rating {rating} outside {MIN_RATING}..={MAX_RATING}"),
                ),
                None => report.push(
                    ValidationSeverity::Error,
                    context,
                    format!("expected integer rating, got {value}"),
                ),
            },
        }
    }

    let known: HashSet<&str> = Axis::ALL.iter().map(Axis::as_str).collect();
    for key in object.keys() {
        if key != "id" && key != "name" && !known.contains(key.as_str()) {
            report.push(
                ValidationSeverity::Warning,
                format!("entry[{entry_index}] id='{player_id}'.{key}"),
                "unknown field is ignored",
            );
        }
    }
}
