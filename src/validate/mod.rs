//! Semantic validation of decoded documents
//!
//! Each rule pass reads a [`Document`] and returns owned [`ValidationIssue`]s; nothing aborts
//! early, so one report lists every defect that would break or degrade rendering.

mod bounds;
mod content;
mod gltf;
mod report;
mod tileset;

pub use bounds::VolumeShape;
pub use gltf::{AccessorType, ComponentType, DrawMode};
pub use report::{
    DirValidationReport, FileValidation, Severity, ValidationIssue, ValidationOutcome, ValidationReport,
};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::document::{ContainerKind, Document};
use crate::error::Result;
use crate::tiles3d::{find_content_files, load_document};

/// Extensions the validator accepts in `extensionsUsed` without a warning
pub const DEFAULT_SUPPORTED_EXTENSIONS: &[&str] = &[
    "KHR_materials_pbrSpecularGlossiness",
    "KHR_materials_unlit",
    "KHR_materials_transmission",
    "KHR_texture_transform",
    "KHR_draco_mesh_compression",
    "KHR_mesh_quantization",
    "KHR_texture_basisu",
    "EXT_meshopt_compression",
    "EXT_mesh_gpu_instancing",
    "CESIUM_RTC",
    "EXT_structural_metadata",
    "EXT_mesh_features",
];

/// Rule set to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    /// `.gltf`, GLB, or the embedded GLB of B3DM/I3DM
    GltfDocument,
    /// tileset.json
    TilesetDocument,
    /// B3DM, I3DM, PNTS or CMPT payload
    TileContent,
}

impl ValidationKind {
    /// Pick a rule set from the container kind and, for JSON, the top-level keys
    pub fn infer(doc: &Document) -> Self {
        match doc.kind {
            ContainerKind::Json => {
                let root = doc.root.as_ref();
                let is_tileset = root.map_or(false, |r| r.get("root").is_some() || r.get("geometricError").is_some());
                if is_tileset {
                    Self::TilesetDocument
                } else {
                    Self::GltfDocument
                }
            }
            ContainerKind::Glb => Self::GltfDocument,
            ContainerKind::B3dm | ContainerKind::I3dm | ContainerKind::Pnts | ContainerKind::Cmpt => {
                Self::TileContent
            }
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GltfDocument => f.write_str("glTF"),
            Self::TilesetDocument => f.write_str("tileset"),
            Self::TileContent => f.write_str("tile content"),
        }
    }
}

/// Validator settings
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOptions {
    pub supported_extensions: BTreeSet<String>,
    /// Check the filesystem for tile content referenced by a tileset
    pub check_content_files: bool,
    /// Directory content URIs resolve against; defaults to the tileset's own directory
    pub base_dir: Option<PathBuf>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            supported_extensions: DEFAULT_SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            check_content_files: true,
            base_dir: None,
        }
    }
}

/// Validate with default options
pub fn validate(doc: &Document, kind: ValidationKind) -> ValidationReport {
    validate_with(doc, kind, &ValidationOptions::default())
}

pub fn validate_with(doc: &Document, kind: ValidationKind, options: &ValidationOptions) -> ValidationReport {
    let issues = match kind {
        ValidationKind::GltfDocument => match doc.gltf_document() {
            Some(gltf) => {
                let prefix = if doc.kind.is_tile_format() { "glb" } else { "" };
                gltf::validate_gltf(gltf, &options.supported_extensions)
                    .into_iter()
                    .map(|issue| issue.nested_under(prefix))
                    .collect()
            }
            None => vec![ValidationIssue::error(
                "NO_GLTF_CONTENT",
                "",
                format!("{} document carries no embedded glTF", doc.kind),
                "Nothing to render",
            )],
        },
        ValidationKind::TilesetDocument => tileset::validate_tileset(doc, options),
        ValidationKind::TileContent => content::validate_tile_content(doc, options),
    };

    let report = ValidationReport::from_issues(issues);
    info!(
        "validate {} as {}: {} error(s), {} warning(s)",
        doc.display_name(),
        kind,
        report.errors,
        report.warnings
    );
    report
}

/// Load a file and validate it; the rule set is inferred when `kind` is `None`
pub fn validate_file<P: AsRef<Path>>(
    path: P,
    kind: Option<ValidationKind>,
    options: &ValidationOptions,
) -> Result<ValidationReport> {
    let doc = load_document(path)?;
    let kind = kind.unwrap_or_else(|| ValidationKind::infer(&doc));
    Ok(validate_with(&doc, kind, options))
}

/// Validate every `tileset.json`, glTF/GLB and tile content file under `dir`, each with its
/// inferred rule set. Other JSON files are skipped. A file that fails to load is recorded and the
/// scan continues.
pub fn validate_dir<P: AsRef<Path>>(dir: P, options: &ValidationOptions) -> Result<DirValidationReport> {
    let dir = dir.as_ref();
    let mut files = Vec::new();
    for (name, path) in find_content_files(dir)? {
        if !is_validation_target(&path) {
            continue;
        }
        let outcome = match validate_file(&path, None, options) {
            Ok(report) => ValidationOutcome::Validated(report),
            Err(err) => {
                warn!("{}: {}", name, err);
                ValidationOutcome::Failed(err.to_string())
            }
        };
        files.push(FileValidation { path: name, outcome });
    }

    let report = DirValidationReport::from_files(dir.display().to_string(), files);
    info!(
        "validate {}: {} file(s), {} error(s), {} warning(s)",
        report.directory,
        report.files.len(),
        report.errors,
        report.warnings
    );
    Ok(report)
}

fn is_validation_target(path: &Path) -> bool {
    let is_json = path.extension().map_or(false, |e| e.eq_ignore_ascii_case("json"));
    !is_json || path.file_name().map_or(false, |n| n == "tileset.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Node;

    #[test]
    fn test_infer_kind() {
        let tileset = Document::json(Node::from_json_str(r#"{"root":{}}"#).unwrap());
        assert_eq!(ValidationKind::infer(&tileset), ValidationKind::TilesetDocument);
        let gltf = Document::json(Node::from_json_str(r#"{"asset":{"version":"2.0"}}"#).unwrap());
        assert_eq!(ValidationKind::infer(&gltf), ValidationKind::GltfDocument);
        assert_eq!(ValidationKind::infer(&Document::new(ContainerKind::Cmpt)), ValidationKind::TileContent);
    }

    #[test]
    fn test_sphere_with_negative_radius() {
        let json = r#"{"asset":{"version":"1.0"},"root":{"refine":"ADD","geometricError":0,
            "boundingVolume":{"sphere":[0,0,0,-1]}}}"#;
        let doc = Document::json(Node::from_json_str(json).unwrap());
        let report = validate(&doc, ValidationKind::TilesetDocument);
        assert!(!report.passed);
        assert_eq!((report.errors, report.warnings), (1, 0));
    }

    #[test]
    fn test_validate_dir() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, data: &str| {
            let path = dir.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, data).unwrap();
        };
        write(
            "tileset.json",
            r#"{"asset":{"version":"1.0"},"root":{"refine":"ADD","geometricError":0,
                "boundingVolume":{"sphere":[0,0,0,1]}}}"#,
        );
        write("nested/model.gltf", r#"{"asset":{}}"#);
        write("nested/notes.json", "not json");

        let report = validate_dir(dir.path(), &ValidationOptions::default()).unwrap();
        let paths: Vec<_> = report.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["nested/model.gltf", "tileset.json"]);
        assert!(!report.passed);
        assert!(!report.files[0].passed());
        assert!(report.files[1].passed());
        assert_eq!(report.errors, 1);
        assert_eq!(report.failed(), 0);

        write("broken.b3dm", "b3dm");
        let report = validate_dir(dir.path(), &ValidationOptions::default()).unwrap();
        assert_eq!(report.files[0].path, "broken.b3dm");
        assert!(matches!(report.files[0].outcome, ValidationOutcome::Failed(_)));
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_no_gltf_content() {
        let report = validate(&Document::new(ContainerKind::Pnts), ValidationKind::GltfDocument);
        assert_eq!(report.codes(), ["NO_GLTF_CONTENT"]);
    }
}
