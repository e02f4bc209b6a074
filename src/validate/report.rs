//! Validation issue and report types

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// One semantic defect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Stable upper-snake identifier, e.g. `INVALID_LOD_STRUCTURE`
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub rendering_impact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
    /// Slash-delimited path into the document
    pub location: String,
}

impl ValidationIssue {
    pub fn error(code: &str, location: impl Into<String>, message: impl Into<String>, impact: &str) -> Self {
        Self::new(Severity::Error, code, location, message, impact)
    }

    pub fn warning(code: &str, location: impl Into<String>, message: impl Into<String>, impact: &str) -> Self {
        Self::new(Severity::Warning, code, location, message, impact)
    }

    fn new(
        severity: Severity,
        code: &str,
        location: impl Into<String>,
        message: impl Into<String>,
        impact: &str,
    ) -> Self {
        Self {
            code: code.to_string(),
            severity,
            message: message.into(),
            rendering_impact: impact.to_string(),
            fix: None,
            location: location.into(),
        }
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }

    /// Re-root the location under `prefix`
    pub(crate) fn nested_under(mut self, prefix: &str) -> Self {
        self.location = crate::diff::join(prefix, &self.location);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} at {}: {}", self.severity, self.code, self.location, self.message)
    }
}

/// Outcome of validating one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// No error-severity issues
    pub passed: bool,
    pub errors: usize,
    pub warnings: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let errors = issues.iter().filter(|i| i.is_error()).count();
        Self { passed: errors == 0, errors, warnings: issues.len() - errors, issues }
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    pub fn codes(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.code.as_str()).collect()
    }
}

/// What happened to one file in a directory scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOutcome {
    Validated(ValidationReport),
    /// The file could not be loaded or decoded
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileValidation {
    /// Path relative to the scanned directory
    pub path: String,
    pub outcome: ValidationOutcome,
}

impl FileValidation {
    pub fn passed(&self) -> bool {
        matches!(&self.outcome, ValidationOutcome::Validated(report) if report.passed)
    }
}

/// Result of validating every asset under a directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirValidationReport {
    pub directory: String,
    /// Every file loaded and passed
    pub passed: bool,
    pub errors: usize,
    pub warnings: usize,
    pub files: Vec<FileValidation>,
}

impl DirValidationReport {
    pub fn from_files(directory: String, files: Vec<FileValidation>) -> Self {
        let reports = files.iter().filter_map(|f| match &f.outcome {
            ValidationOutcome::Validated(report) => Some(report),
            ValidationOutcome::Failed(_) => None,
        });
        let (errors, warnings) = reports.fold((0, 0), |(e, w), r| (e + r.errors, w + r.warnings));
        Self { directory, passed: files.iter().all(FileValidation::passed), errors, warnings, files }
    }

    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| matches!(f.outcome, ValidationOutcome::Failed(_))).count()
    }
}

/// Issue sink shared by the rule passes
#[derive(Debug, Default)]
pub(crate) struct Issues(Vec<ValidationIssue>);

impl Issues {
    pub fn push(&mut self, issue: ValidationIssue) {
        self.0.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        self.0.extend(issues);
    }

    pub fn into_vec(self) -> Vec<ValidationIssue> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let report = ValidationReport::from_issues(vec![
            ValidationIssue::error("A", "root", "bad", "breaks"),
            ValidationIssue::warning("B", "root", "odd", "maybe"),
            ValidationIssue::warning("C", "", "odd", "maybe").with_fix("do x"),
        ]);
        assert!(!report.passed);
        assert_eq!((report.errors, report.warnings), (1, 2));
        assert!(report.has_code("C"));
        assert_eq!(report.issues[2].fix.as_deref(), Some("do x"));
    }

    #[test]
    fn test_nested_location() {
        let issue = ValidationIssue::error("A", "meshes/0", "m", "i").nested_under("tiles/1/glb");
        assert_eq!(issue.location, "tiles/1/glb/meshes/0");
        assert_eq!(issue.to_string(), "[error] A at tiles/1/glb/meshes/0: m");
    }
}
