//! tileset.json rules: root tile requirements, LOD ordering, content references, transforms

use glam::DMat4;
use log::{debug, warn};
use std::path::{Path, PathBuf};

use super::bounds::check_bounding_volume;
use super::report::{Issues, ValidationIssue};
use super::ValidationOptions;
use crate::diff::join;
use crate::document::{ContainerKind, Document, Node};

const LOD: &str = "Renderer may not calculate LOD correctly";
const CULLING: &str = "Renderer may not cull tiles correctly";
const CONTENT_LOAD: &str = "Renderer will fail to load tile content";

/// Leading scale factor below this is reported as degenerate
const NEAR_ZERO_SCALE: f64 = 1e-6;
/// Determinant magnitude below this is reported as singular
const SINGULAR_DETERMINANT: f64 = 1e-12;

pub(crate) fn validate_tileset(doc: &Document, options: &ValidationOptions) -> Vec<ValidationIssue> {
    let mut issues = Issues::default();

    let tileset = match (&doc.kind, &doc.root) {
        (ContainerKind::Json, Some(root)) if root.as_object().is_some() => root,
        _ => {
            issues.push(ValidationIssue::error(
                "NOT_A_TILESET",
                "",
                format!("{} document is not a tileset JSON object", doc.kind),
                "Renderer cannot load this tileset",
            ));
            return issues.into_vec();
        }
    };

    let Some(root) = tileset.get("root") else {
        issues.push(ValidationIssue::error(
            "MISSING_ROOT_TILE",
            "root",
            "tileset.json missing 'root' tile",
            "Renderer cannot load this tileset",
        ));
        return issues.into_vec();
    };

    let base_dir = if options.check_content_files {
        options
            .base_dir
            .clone()
            .or_else(|| doc.source.as_deref().and_then(Path::parent).map(Path::to_path_buf))
    } else {
        None
    };
    if options.check_content_files && base_dir.is_none() {
        debug!("no base directory for {}, content file checks skipped", doc.display_name());
    }

    let walker = TileWalker { base_dir };
    walker.tile(root, "root", None, &mut issues);
    issues.into_vec()
}

struct TileWalker {
    base_dir: Option<PathBuf>,
}

impl TileWalker {
    /// Depth-first over the tile tree. `parent_error` is `None` for the root.
    fn tile(&self, tile: &Node, location: &str, parent_error: Option<f64>, issues: &mut Issues) {
        let is_root = parent_error.is_none();

        match tile.get("refine") {
            None if is_root => issues.push(
                ValidationIssue::error(
                    "MISSING_REFINE_PROPERTY",
                    location,
                    "Root tile missing 'refine' property",
                    "Renderer may not render correctly or may crash",
                )
                .with_fix("Add 'refine': 'ADD' or 'refine': 'REPLACE' to the root tile"),
            ),
            None => {}
            Some(Node::Str(r)) if r == "ADD" || r == "REPLACE" => {}
            Some(other) => issues.push(ValidationIssue::error(
                "INVALID_REFINE_VALUE",
                join(location, "refine"),
                format!("refine must be \"ADD\" or \"REPLACE\", got {}", other),
                "Renderer may not render correctly or may crash",
            )),
        }

        match tile.get("boundingVolume") {
            None => issues.push(
                ValidationIssue::error(
                    "MISSING_BOUNDING_VOLUME",
                    location,
                    "Tile missing 'boundingVolume'",
                    CULLING,
                )
                .with_fix("Add a 'boundingVolume' with a box, sphere or region"),
            ),
            Some(volume) => check_bounding_volume(volume, &join(location, "boundingVolume"), issues),
        }
        if let Some(volume) = tile.get("viewerRequestVolume") {
            check_bounding_volume(volume, &join(location, "viewerRequestVolume"), issues);
        }

        let geometric_error = self.geometric_error(tile, location, issues);

        if let (Some(child), Some(parent)) = (geometric_error, parent_error) {
            if child > parent {
                issues.push(
                    ValidationIssue::error(
                        "INVALID_LOD_STRUCTURE",
                        join(location, "geometricError"),
                        format!("Child tile has larger geometricError than parent: {} > {}", child, parent),
                        LOD,
                    )
                    .with_fix("Child tiles should have smaller geometricError than parent"),
                );
            }
        }

        let contents = content_entries(tile, location);
        for (content, content_location) in &contents {
            self.content(content, content_location, issues);
        }

        if let Some(transform) = tile.get("transform") {
            check_transform(transform, &join(location, "transform"), issues);
        }

        let children = tile.get("children").and_then(Node::as_array).unwrap_or(&[]);
        if !is_root && contents.is_empty() && children.is_empty() {
            issues.push(ValidationIssue::warning(
                "EMPTY_TILE",
                location,
                "Tile has no content or children",
                "Renderer may skip this tile",
            ));
        }

        // an unusable parent error skips the LOD comparison below this tile
        let next_parent = geometric_error.unwrap_or(f64::INFINITY);
        for (i, child) in children.iter().enumerate() {
            let child_location = format!("{}/children/{}", location, i);
            self.tile(child, &child_location, Some(next_parent), issues);
        }
    }

    fn geometric_error(&self, tile: &Node, location: &str, issues: &mut Issues) -> Option<f64> {
        let Some(value) = tile.get("geometricError") else {
            issues.push(
                ValidationIssue::error(
                    "MISSING_GEOMETRIC_ERROR",
                    location,
                    "Tile missing 'geometricError'",
                    LOD,
                )
                .with_fix("Add 'geometricError' value"),
            );
            return None;
        };
        match value.as_f64() {
            Some(v) if v >= 0.0 => Some(v),
            _ => {
                issues.push(
                    ValidationIssue::error(
                        "INVALID_GEOMETRIC_ERROR",
                        join(location, "geometricError"),
                        format!("geometricError must be a non-negative number, got: {}", value),
                        LOD,
                    )
                    .with_fix("geometricError must be non-negative"),
                );
                None
            }
        }
    }

    fn content(&self, content: &Node, location: &str, issues: &mut Issues) {
        if let Some(volume) = content.get("boundingVolume") {
            check_bounding_volume(volume, &join(location, "boundingVolume"), issues);
        }

        let uri = content.get("uri").or_else(|| content.get("url")).and_then(Node::as_str);
        let Some(uri) = uri.filter(|u| !u.is_empty()) else {
            issues.push(ValidationIssue::error(
                "MISSING_CONTENT_URI",
                location,
                "Tile content has no 'uri'",
                CONTENT_LOAD,
            ));
            return;
        };

        if is_remote(uri) {
            warn!("skipping remote content {}", uri);
            return;
        }
        let Some(base_dir) = &self.base_dir else { return };

        let path = base_dir.join(strip_query(uri));
        if !path.exists() {
            issues.push(
                ValidationIssue::error(
                    "MISSING_CONTENT_FILE",
                    join(location, "uri"),
                    format!("Content file not found: {}", uri),
                    CONTENT_LOAD,
                )
                .with_fix(format!("Ensure file exists: {}", path.display())),
            );
        }
    }
}

/// `content` (single) plus each entry of `contents`, with their locations
fn content_entries<'a>(tile: &'a Node, location: &str) -> Vec<(&'a Node, String)> {
    let mut entries = Vec::new();
    if let Some(content) = tile.get("content") {
        entries.push((content, join(location, "content")));
    }
    if let Some(contents) = tile.get("contents").and_then(Node::as_array) {
        for (i, content) in contents.iter().enumerate() {
            entries.push((content, format!("{}/contents/{}", location, i)));
        }
    }
    entries
}

fn is_remote(uri: &str) -> bool {
    uri.contains("://") || uri.starts_with("data:")
}

fn strip_query(uri: &str) -> &str {
    uri.split(['?', '#']).next().unwrap_or(uri)
}

fn check_transform(transform: &Node, location: &str, issues: &mut Issues) {
    let values: Option<Vec<f64>> = transform
        .as_array()
        .filter(|items| items.len() == 16)
        .and_then(|items| items.iter().map(Node::as_f64).collect());

    let Some(values) = values.filter(|v| v.iter().all(|x| x.is_finite())) else {
        issues.push(ValidationIssue::error(
            "INVALID_TRANSFORM",
            location,
            format!("transform must be an array of 16 finite numbers, got {}", transform.preview(80)),
            "Renderer will place tile content incorrectly",
        ));
        return;
    };

    let scale_x = values[0];
    if scale_x.abs() < NEAR_ZERO_SCALE {
        issues.push(ValidationIssue::warning(
            "NEAR_ZERO_SCALE",
            location,
            format!("Transform has near-zero scale factor: {}", scale_x),
            "May cause rendering artifacts",
        ));
        return;
    }

    let mut cols = [0.0; 16];
    cols.copy_from_slice(&values);
    let determinant = DMat4::from_cols_array(&cols).determinant();
    if determinant.abs() < SINGULAR_DETERMINANT {
        issues.push(ValidationIssue::warning(
            "SINGULAR_TRANSFORM",
            location,
            format!("Transform matrix is singular (determinant {:e})", determinant),
            "May cause rendering artifacts",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(json: &str) -> Vec<ValidationIssue> {
        let doc = Document::json(Node::from_json_str(json).unwrap());
        validate_tileset(&doc, &ValidationOptions::default())
    }

    fn codes(json: &str) -> Vec<String> {
        run(json).into_iter().map(|i| i.code).collect()
    }

    #[test]
    fn test_minimal_tileset_passes() {
        let json = r#"{"asset":{"version":"1.0"},"geometricError":100,
            "root":{"refine":"ADD","geometricError":10,"boundingVolume":{"sphere":[0,0,0,5]}}}"#;
        assert!(run(json).is_empty());
    }

    #[test]
    fn test_missing_root_fields() {
        assert_eq!(codes(r#"{"asset":{}}"#), ["MISSING_ROOT_TILE"]);
        let issues = run(r#"{"root":{}}"#);
        let codes: Vec<&str> = issues.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, ["MISSING_REFINE_PROPERTY", "MISSING_BOUNDING_VOLUME", "MISSING_GEOMETRIC_ERROR"]);
        assert!(issues[0].fix.is_some());
    }

    #[test]
    fn test_negative_geometric_error() {
        let json = r#"{"root":{"refine":"REPLACE","geometricError":-1,"boundingVolume":{"sphere":[0,0,0,1]}}}"#;
        assert_eq!(codes(json), ["INVALID_GEOMETRIC_ERROR"]);
    }

    #[test]
    fn test_lod_and_empty_tiles() {
        let json = r#"{"root":{"refine":"ADD","geometricError":10,"boundingVolume":{"sphere":[0,0,0,1]},
            "children":[
                {"geometricError":20,"boundingVolume":{"sphere":[0,0,0,1]},"content":{"uri":"https://example.com/a.b3dm"}},
                {"geometricError":5,"boundingVolume":{"sphere":[0,0,0,1]},"children":[]}
            ]}}"#;
        let issues = run(json);
        let found: Vec<(&str, &str)> = issues.iter().map(|i| (i.code.as_str(), i.location.as_str())).collect();
        assert_eq!(
            found,
            [
                ("INVALID_LOD_STRUCTURE", "root/children/0/geometricError"),
                ("EMPTY_TILE", "root/children/1"),
            ]
        );
        assert!(!issues[1].is_error());
    }

    #[test]
    fn test_lod_skipped_without_child_error() {
        let json = r#"{"root":{"refine":"ADD","geometricError":10,"boundingVolume":{"sphere":[0,0,0,1]},
            "children":[{"boundingVolume":{"sphere":[0,0,0,1]},"content":{"uri":"a.pnts"}}]}}"#;
        assert_eq!(codes(json), ["MISSING_GEOMETRIC_ERROR"]);
    }

    #[test]
    fn test_refine_value() {
        let json = r#"{"root":{"refine":"add","geometricError":1,"boundingVolume":{"sphere":[0,0,0,1]}}}"#;
        assert_eq!(codes(json), ["INVALID_REFINE_VALUE"]);
    }

    #[test]
    fn test_transforms() {
        let base = r#"{"root":{"refine":"ADD","geometricError":1,"boundingVolume":{"sphere":[0,0,0,1]},"transform":TRANSFORM}}"#;
        let identity = "[1,0,0,0,0,1,0,0,0,0,1,0,0,0,0,1]";
        assert!(run(&base.replace("TRANSFORM", identity)).is_empty());
        assert_eq!(codes(&base.replace("TRANSFORM", "[1,0,0]")), ["INVALID_TRANSFORM"]);
        assert_eq!(
            codes(&base.replace("TRANSFORM", "[0,0,0,0,0,1,0,0,0,0,1,0,0,0,0,1]")),
            ["NEAR_ZERO_SCALE"]
        );
        assert_eq!(
            codes(&base.replace("TRANSFORM", "[1,0,0,0,1,0,0,0,0,0,1,0,0,0,0,1]")),
            ["SINGULAR_TRANSFORM"]
        );
    }

    #[test]
    fn test_content_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("present.b3dm"), b"b3dm").unwrap();
        let json = r#"{"root":{"refine":"ADD","geometricError":10,"boundingVolume":{"sphere":[0,0,0,1]},
            "contents":[{"uri":"present.b3dm?v=2"},{"uri":"missing.b3dm"},{"uri":""}]}}"#;
        let doc = Document::json(Node::from_json_str(json).unwrap());
        let options = ValidationOptions { base_dir: Some(dir.path().to_path_buf()), ..Default::default() };
        let issues = validate_tileset(&doc, &options);
        let found: Vec<(&str, &str)> = issues.iter().map(|i| (i.code.as_str(), i.location.as_str())).collect();
        assert_eq!(
            found,
            [
                ("MISSING_CONTENT_FILE", "root/contents/1/uri"),
                ("MISSING_CONTENT_URI", "root/contents/2"),
            ]
        );
    }

    #[test]
    fn test_not_a_tileset() {
        let doc = Document::new(ContainerKind::B3dm);
        assert_eq!(
            validate_tileset(&doc, &ValidationOptions::default())
                .into_iter()
                .map(|i| i.code)
                .collect::<Vec<_>>(),
            ["NOT_A_TILESET"]
        );
    }
}
