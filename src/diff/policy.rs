// src/diff/policy.rs
// Tolerance policy for structural comparison. Validated when built so traversal never sees bad values.

use std::collections::BTreeSet;

/// Default absolute tolerance for float comparison
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("float tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),

    #[error("ignored field name must not be empty")]
    EmptyFieldName,
}

/// Comparison policy
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    float_tolerance: f64,
    ignored_field_names: BTreeSet<String>,
    strict_type_check: bool,
    record_tolerance_diffs: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            float_tolerance: DEFAULT_TOLERANCE,
            ignored_field_names: BTreeSet::new(),
            strict_type_check: false,
            record_tolerance_diffs: false,
        }
    }
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Result<Self, PolicyError> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(PolicyError::InvalidTolerance(tolerance));
        }
        self.float_tolerance = tolerance;
        Ok(self)
    }

    /// Skip `name` wherever it occurs as an object key
    pub fn ignore_field(mut self, name: impl Into<String>) -> Result<Self, PolicyError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PolicyError::EmptyFieldName);
        }
        self.ignored_field_names.insert(name);
        Ok(self)
    }

    pub fn ignore_fields<I, S>(self, names: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().try_fold(self, |policy, name| policy.ignore_field(name))
    }

    /// Treat `Int` vs `Float` as a type mismatch
    pub fn strict_types(mut self, strict: bool) -> Self {
        self.strict_type_check = strict;
        self
    }

    /// Also list leaves that only matched within tolerance
    pub fn record_tolerance_diffs(mut self, record: bool) -> Self {
        self.record_tolerance_diffs = record;
        self
    }

    pub fn float_tolerance(&self) -> f64 {
        self.float_tolerance
    }

    pub fn ignored_field_names(&self) -> &BTreeSet<String> {
        &self.ignored_field_names
    }

    pub fn strict_type_check(&self) -> bool {
        self.strict_type_check
    }

    pub fn records_tolerance_diffs(&self) -> bool {
        self.record_tolerance_diffs
    }

    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignored_field_names.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_tolerance() {
        assert_eq!(Policy::new().with_tolerance(-1.0), Err(PolicyError::InvalidTolerance(-1.0)));
        assert!(Policy::new().with_tolerance(f64::INFINITY).is_err());
        assert!(Policy::new().with_tolerance(f64::NAN).is_err());
        assert_eq!(Policy::new().with_tolerance(0.0).unwrap().float_tolerance(), 0.0);
    }

    #[test]
    fn test_ignore_fields() {
        let policy = Policy::new().ignore_fields(["generator", "created"]).unwrap();
        assert!(policy.is_ignored("generator"));
        assert!(!policy.is_ignored("version"));
        let names: Vec<&str> = policy.ignored_field_names().iter().map(String::as_str).collect();
        assert_eq!(names, ["created", "generator"]);
        assert_eq!(Policy::new().ignore_field(""), Err(PolicyError::EmptyFieldName));
    }
}
