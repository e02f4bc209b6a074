//! Tile content rules: feature-table semantics and binary body references for B3DM, I3DM and
//! PNTS, the embedded glTF, and composite inner tiles.

use super::gltf::validate_gltf;
use super::report::{Issues, ValidationIssue};
use super::ValidationOptions;
use crate::diff::join;
use crate::document::{ContainerKind, Document, Node};
use crate::tiles3d::{BATCH_TABLE, BATCH_TABLE_BINARY, FEATURE_TABLE, FEATURE_TABLE_BINARY};

const LOAD_FAILS: &str = "Renderer will fail to load tile content";
const BAD_READ: &str = "Renderer will read past the end of the binary body";

/// Known feature-table semantic with a binary body representation
#[derive(Debug, Clone, Copy)]
struct Semantic {
    name: &'static str,
    /// One element per feature (point, instance) rather than one per tile
    per_feature: bool,
    element_size: u64,
}

const fn per_feature(name: &'static str, element_size: u64) -> Semantic {
    Semantic { name, per_feature: true, element_size }
}

const fn global(name: &'static str, element_size: u64) -> Semantic {
    Semantic { name, per_feature: false, element_size }
}

const B3DM_SEMANTICS: &[Semantic] = &[global("BATCH_LENGTH", 4), global("RTC_CENTER", 12)];

const I3DM_SEMANTICS: &[Semantic] = &[
    per_feature("POSITION", 12),
    per_feature("POSITION_QUANTIZED", 6),
    per_feature("NORMAL_UP", 12),
    per_feature("NORMAL_RIGHT", 12),
    per_feature("NORMAL_UP_OCT32P", 4),
    per_feature("NORMAL_RIGHT_OCT32P", 4),
    per_feature("SCALE", 4),
    per_feature("SCALE_NON_UNIFORM", 12),
    per_feature("BATCH_ID", 2),
    global("INSTANCES_LENGTH", 4),
    global("RTC_CENTER", 12),
    global("QUANTIZED_VOLUME_OFFSET", 12),
    global("QUANTIZED_VOLUME_SCALE", 12),
];

const PNTS_SEMANTICS: &[Semantic] = &[
    per_feature("POSITION", 12),
    per_feature("POSITION_QUANTIZED", 6),
    per_feature("RGBA", 4),
    per_feature("RGB", 3),
    per_feature("RGB565", 2),
    per_feature("NORMAL", 12),
    per_feature("NORMAL_OCT16P", 2),
    per_feature("BATCH_ID", 2),
    global("POINTS_LENGTH", 4),
    global("RTC_CENTER", 12),
    global("QUANTIZED_VOLUME_OFFSET", 12),
    global("QUANTIZED_VOLUME_SCALE", 12),
    global("CONSTANT_RGBA", 4),
    global("BATCH_LENGTH", 4),
];

fn component_size(component_type: &str) -> Option<u64> {
    Some(match component_type {
        "BYTE" | "UNSIGNED_BYTE" => 1,
        "SHORT" | "UNSIGNED_SHORT" => 2,
        "INT" | "UNSIGNED_INT" | "FLOAT" => 4,
        "DOUBLE" => 8,
        _ => return None,
    })
}

fn component_count(ty: &str) -> Option<u64> {
    Some(match ty {
        "SCALAR" => 1,
        "VEC2" => 2,
        "VEC3" => 3,
        "VEC4" => 4,
        _ => return None,
    })
}

pub(crate) fn validate_tile_content(doc: &Document, options: &ValidationOptions) -> Vec<ValidationIssue> {
    let mut issues = Issues::default();

    match doc.kind {
        ContainerKind::B3dm | ContainerKind::I3dm | ContainerKind::Pnts => {
            check_tables(doc, &mut issues);
            if let Some(glb) = doc.nested("glb") {
                issues.extend(
                    validate_gltf(glb, &options.supported_extensions)
                        .into_iter()
                        .map(|issue| issue.nested_under("glb")),
                );
            }
        }
        ContainerKind::Cmpt => {
            for (name, inner) in doc.nested_documents() {
                issues.extend(
                    validate_tile_content(inner, options)
                        .into_iter()
                        .map(|issue| issue.nested_under(name)),
                );
            }
        }
        ContainerKind::Json | ContainerKind::Glb => issues.push(ValidationIssue::error(
            "UNSUPPORTED_CONTENT_KIND",
            "",
            format!("{} is not a tile content format (expected b3dm, i3dm, pnts or cmpt)", doc.kind),
            LOAD_FAILS,
        )),
    }

    issues.into_vec()
}

fn check_tables(doc: &Document, issues: &mut Issues) {
    let empty = Node::Null;
    let feature_table = doc.chunk_node(FEATURE_TABLE).unwrap_or(&empty);
    let feature_binary = doc.chunk_node(FEATURE_TABLE_BINARY).and_then(Node::as_bytes).unwrap_or(&[]);

    let (semantics, count_key) = match doc.kind {
        ContainerKind::B3dm => (B3DM_SEMANTICS, "BATCH_LENGTH"),
        ContainerKind::I3dm => (I3DM_SEMANTICS, "INSTANCES_LENGTH"),
        _ => (PNTS_SEMANTICS, "POINTS_LENGTH"),
    };

    let feature_count = length_value(feature_table, count_key);
    if feature_count.is_none() {
        let code = match doc.kind {
            ContainerKind::B3dm => "MISSING_BATCH_LENGTH",
            ContainerKind::I3dm => "MISSING_INSTANCES_LENGTH",
            _ => "MISSING_POINTS_LENGTH",
        };
        issues.push(ValidationIssue::error(
            code,
            join(FEATURE_TABLE, count_key),
            format!("Feature table missing {} (must be a non-negative integer)", count_key),
            LOAD_FAILS,
        ));
    }

    if matches!(doc.kind, ContainerKind::I3dm | ContainerKind::Pnts) {
        check_positions(feature_table, issues);
    }
    if doc.kind == ContainerKind::Pnts
        && feature_table.get("BATCH_ID").is_some()
        && length_value(feature_table, "BATCH_LENGTH").is_none()
    {
        issues.push(ValidationIssue::error(
            "MISSING_BATCH_LENGTH",
            join(FEATURE_TABLE, "BATCH_LENGTH"),
            "Feature table defines BATCH_ID but no BATCH_LENGTH",
            LOAD_FAILS,
        ));
    }

    if let Some(rtc) = feature_table.get("RTC_CENTER") {
        let inline_ok = rtc
            .as_array()
            .map_or(false, |v| v.len() == 3 && v.iter().all(|c| c.as_f64().map_or(false, f64::is_finite)));
        if !inline_ok && rtc.get("byteOffset").is_none() {
            issues.push(ValidationIssue::error(
                "INVALID_RTC_CENTER",
                join(FEATURE_TABLE, "RTC_CENTER"),
                format!("RTC_CENTER must be an array of 3 numbers, got {}", rtc.preview(80)),
                "Tile will be positioned incorrectly",
            ));
        }
    }

    check_binary_refs(
        feature_table,
        feature_binary,
        semantics,
        feature_count,
        FEATURE_TABLE,
        "FEATURE_TABLE_BINARY_OUT_OF_BOUNDS",
        issues,
    );

    let batch_table = doc.chunk_node(BATCH_TABLE).unwrap_or(&empty);
    let batch_binary = doc.chunk_node(BATCH_TABLE_BINARY).and_then(Node::as_bytes).unwrap_or(&[]);
    let batch_length = match doc.kind {
        ContainerKind::B3dm => feature_count,
        _ if feature_table.get("BATCH_ID").is_some() => length_value(feature_table, "BATCH_LENGTH"),
        _ => feature_count,
    };
    check_binary_refs(
        batch_table,
        batch_binary,
        &[],
        batch_length,
        BATCH_TABLE,
        "BATCH_TABLE_BINARY_OUT_OF_BOUNDS",
        issues,
    );
    if let Some(expected) = batch_length {
        check_batch_arrays(batch_table, expected, issues);
    }
}

fn length_value(table: &Node, key: &str) -> Option<u64> {
    table.get(key).and_then(Node::as_u64)
}

fn check_positions(feature_table: &Node, issues: &mut Issues) {
    let has_position = feature_table.get("POSITION").is_some();
    let has_quantized = feature_table.get("POSITION_QUANTIZED").is_some();

    if !has_position && !has_quantized {
        issues.push(ValidationIssue::error(
            "MISSING_POSITION_SEMANTIC",
            FEATURE_TABLE,
            "Feature table must define POSITION or POSITION_QUANTIZED",
            LOAD_FAILS,
        ));
    }

    if has_quantized && !has_position {
        let missing: Vec<&str> = ["QUANTIZED_VOLUME_OFFSET", "QUANTIZED_VOLUME_SCALE"]
            .into_iter()
            .filter(|key| feature_table.get(key).is_none())
            .collect();
        if !missing.is_empty() {
            issues.push(ValidationIssue::error(
                "MISSING_QUANTIZED_VOLUME",
                FEATURE_TABLE,
                format!("POSITION_QUANTIZED requires {}", missing.join(" and ")),
                LOAD_FAILS,
            ));
        }
    }
}

/// Every `{"byteOffset": n}` property must fit inside `binary` for its element count
fn check_binary_refs(
    table: &Node,
    binary: &[u8],
    semantics: &[Semantic],
    feature_count: Option<u64>,
    table_name: &str,
    code: &str,
    issues: &mut Issues,
) {
    let Some(properties) = table.as_object() else { return };

    for (name, property) in properties {
        let Some(offset_node) = property.get("byteOffset") else { continue };
        let location = join(table_name, name);

        let Some(offset) = offset_node.as_u64() else {
            issues.push(ValidationIssue::error(
                code,
                location,
                format!("{}.byteOffset must be a non-negative integer, got {}", name, offset_node),
                BAD_READ,
            ));
            continue;
        };

        let known = semantics.iter().find(|s| s.name == name);
        let declared_size = property
            .get("componentType")
            .and_then(Node::as_str)
            .and_then(component_size)
            .map(|size| {
                let components = property.get("type").and_then(Node::as_str).and_then(component_count);
                size * components.unwrap_or(1)
            });

        let (element_size, per_feature) = match (known, declared_size) {
            // BATCH_ID may override its default component type
            (Some(s), Some(size)) if s.name == "BATCH_ID" => (size, true),
            (Some(s), _) => (s.element_size, s.per_feature),
            (None, Some(size)) => (size, true),
            (None, None) => continue,
        };
        let count = if per_feature {
            match feature_count {
                Some(n) => n,
                None => continue,
            }
        } else {
            1
        };

        let end = offset.saturating_add(element_size.saturating_mul(count));
        if end > binary.len() as u64 {
            issues.push(ValidationIssue::error(
                code,
                location,
                format!(
                    "{} needs bytes {}..{} ({} x {} bytes) but the binary body has {} bytes",
                    name,
                    offset,
                    end,
                    count,
                    element_size,
                    binary.len()
                ),
                BAD_READ,
            ));
        }
    }
}

/// JSON-array batch properties must hold one value per feature
fn check_batch_arrays(batch_table: &Node, expected: u64, issues: &mut Issues) {
    let Some(properties) = batch_table.as_object() else { return };
    for (name, property) in properties {
        if name == "extensions" || name == "extras" {
            continue;
        }
        if let Some(values) = property.as_array() {
            if values.len() as u64 != expected {
                issues.push(ValidationIssue::error(
                    "BATCH_TABLE_LENGTH_MISMATCH",
                    join(BATCH_TABLE, name),
                    format!("batch table property '{}' has {} values, expected {}", name, values.len(), expected),
                    "Feature metadata will be misattributed",
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chunk;

    fn tile(kind: ContainerKind, feature_table: &str, binary: usize, batch_table: &str) -> Document {
        let mut doc = Document::new(kind);
        let parse = |text: &str| if text.is_empty() { Node::Null } else { Node::from_json_str(text).unwrap() };
        doc.chunks = vec![
            Chunk::node(FEATURE_TABLE, parse(feature_table)),
            Chunk::node(FEATURE_TABLE_BINARY, Node::Bytes(vec![0; binary])),
            Chunk::node(BATCH_TABLE, parse(batch_table)),
            Chunk::node(BATCH_TABLE_BINARY, Node::Bytes(Vec::new())),
        ];
        doc
    }

    fn codes(doc: &Document) -> Vec<String> {
        validate_tile_content(doc, &ValidationOptions::default()).into_iter().map(|i| i.code).collect()
    }

    #[test]
    fn test_pnts_valid() {
        let doc = tile(ContainerKind::Pnts, r#"{"POINTS_LENGTH":2,"POSITION":{"byteOffset":0},"RGB":{"byteOffset":24}}"#, 30, "");
        assert!(codes(&doc).is_empty());
    }

    #[test]
    fn test_pnts_out_of_bounds() {
        let doc = tile(ContainerKind::Pnts, r#"{"POINTS_LENGTH":3,"POSITION":{"byteOffset":0}}"#, 24, "");
        let issues = validate_tile_content(&doc, &ValidationOptions::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "FEATURE_TABLE_BINARY_OUT_OF_BOUNDS");
        assert_eq!(issues[0].location, "featureTable/POSITION");
    }

    #[test]
    fn test_required_semantics() {
        assert_eq!(codes(&tile(ContainerKind::B3dm, "", 0, "")), ["MISSING_BATCH_LENGTH"]);
        assert_eq!(
            codes(&tile(ContainerKind::I3dm, r#"{"POSITION_QUANTIZED":{"byteOffset":0}}"#, 0, "")),
            ["MISSING_INSTANCES_LENGTH", "MISSING_QUANTIZED_VOLUME"]
        );
        assert_eq!(
            codes(&tile(ContainerKind::Pnts, r#"{"POINTS_LENGTH":0}"#, 0, "")),
            ["MISSING_POSITION_SEMANTIC"]
        );
    }

    #[test]
    fn test_rtc_center() {
        let doc = tile(ContainerKind::B3dm, r#"{"BATCH_LENGTH":0,"RTC_CENTER":[1,2]}"#, 0, "");
        assert_eq!(codes(&doc), ["INVALID_RTC_CENTER"]);
        let doc = tile(ContainerKind::B3dm, r#"{"BATCH_LENGTH":0,"RTC_CENTER":{"byteOffset":0}}"#, 12, "");
        assert!(codes(&doc).is_empty());
    }

    #[test]
    fn test_batch_table_lengths() {
        let doc = tile(ContainerKind::B3dm, r#"{"BATCH_LENGTH":2}"#, 0, r#"{"name":["a","b","c"],"height":[1,2]}"#);
        assert_eq!(codes(&doc), ["BATCH_TABLE_LENGTH_MISMATCH"]);

        let doc = tile(
            ContainerKind::B3dm,
            r#"{"BATCH_LENGTH":2}"#,
            0,
            r#"{"id":{"byteOffset":0,"componentType":"UNSIGNED_INT","type":"SCALAR"}}"#,
        );
        assert_eq!(codes(&doc), ["BATCH_TABLE_BINARY_OUT_OF_BOUNDS"]);
    }

    #[test]
    fn test_cmpt_and_wrong_kind() {
        let mut cmpt = Document::new(ContainerKind::Cmpt);
        cmpt.chunks.push(Chunk::document("tiles/0", tile(ContainerKind::B3dm, "", 0, "")));
        let issues = validate_tile_content(&cmpt, &ValidationOptions::default());
        assert_eq!(issues[0].location, "tiles/0/featureTable/BATCH_LENGTH");

        assert_eq!(codes(&Document::new(ContainerKind::Glb)), ["UNSUPPORTED_CONTENT_KIND"]);
    }
}
