//! Diff report types

use serde::{Deserialize, Serialize};

use crate::document::ContainerKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Counts against `identical`
    Different,
    /// Float leaf matched only within tolerance
    ToleranceDiff,
}

/// One reported difference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffItem {
    /// Slash-delimited path to the parent of `field`
    pub path: String,
    pub field: String,
    pub value1: String,
    pub value2: String,
    pub kind: DiffKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DiffItem {
    /// Path and field joined, e.g. `featureTable/RTC_CENTER/1`
    pub fn full_path(&self) -> String {
        super::join(&self.path, &self.field)
    }
}

/// Result of comparing two documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    pub file1: String,
    pub file2: String,
    pub container_kind: ContainerKind,
    pub identical: bool,
    pub total_items: usize,
    pub matched_items: usize,
    pub tolerance_matched: usize,
    pub differences: Vec<DiffItem>,
    #[serde(default)]
    pub tolerance_diffs: Vec<DiffItem>,
}

impl DiffReport {
    /// One-line summary
    pub fn summary(&self) -> String {
        if self.identical {
            format!(
                "identical ({} items, {} within tolerance)",
                self.total_items, self.tolerance_matched
            )
        } else {
            format!(
                "{} difference(s) in {} items ({} matched, {} within tolerance)",
                self.differences.len(),
                self.total_items,
                self.matched_items,
                self.tolerance_matched
            )
        }
    }
}

/// What happened to one file pair in a directory comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    Compared(DiffReport),
    /// Either side failed to load or decode
    Failed(String),
}

/// One file present in both trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Path relative to both roots
    pub path: String,
    pub outcome: FileOutcome,
}

impl FileDiff {
    pub fn is_identical(&self) -> bool {
        matches!(&self.outcome, FileOutcome::Compared(report) if report.identical)
    }
}

/// Result of comparing two output trees file by file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirDiffReport {
    pub dir1: String,
    pub dir2: String,
    pub identical: bool,
    /// Files found in only one tree; `field` holds the relative path
    pub unmatched: Vec<DiffItem>,
    pub files: Vec<FileDiff>,
}

impl DirDiffReport {
    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| matches!(f.outcome, FileOutcome::Failed(_))).count()
    }

    pub fn summary(&self) -> String {
        let differing = self.files.iter().filter(|f| !f.is_identical()).count();
        format!(
            "{} file(s) compared, {} differ, {} failed to load, {} unmatched",
            self.files.len(),
            differing - self.failed(),
            self.failed(),
            self.unmatched.len()
        )
    }
}
