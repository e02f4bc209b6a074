//! glTF 2.0 rules: reference integrity, accessor shape, draw-mode parity, material ranges

use std::collections::BTreeSet;

use super::report::{Issues, ValidationIssue};
use crate::document::{ContainerKind, Document, Node};

const LOADER_FAILS: &str = "Will cause loader to fail";
const BUFFER_ACCESS: &str = "Will cause buffer access error during rendering";
const RENDER_ERROR: &str = "Will cause rendering error";
const MATERIAL_LOOK: &str = "May cause incorrect material appearance";
const TEXTURE_MISSING: &str = "Texture will not render";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl AccessorType {
    pub const NAMES: [&'static str; 7] = ["MAT2", "MAT3", "MAT4", "SCALAR", "VEC2", "VEC3", "VEC4"];

    pub fn parse(tag: &str) -> Option<Self> {
        Some(match tag {
            "SCALAR" => Self::Scalar,
            "VEC2" => Self::Vec2,
            "VEC3" => Self::Vec3,
            "VEC4" => Self::Vec4,
            "MAT2" => Self::Mat2,
            "MAT3" => Self::Mat3,
            "MAT4" => Self::Mat4,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Byte = 5120,
    UnsignedByte = 5121,
    Short = 5122,
    UnsignedShort = 5123,
    UnsignedInt = 5125,
    Float = 5126,
}

impl ComponentType {
    pub const ALL: [ComponentType; 6] = [
        Self::Byte,
        Self::UnsignedByte,
        Self::Short,
        Self::UnsignedShort,
        Self::UnsignedInt,
        Self::Float,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| *c as i64 == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Byte => "BYTE",
            Self::UnsignedByte => "UNSIGNED_BYTE",
            Self::Short => "SHORT",
            Self::UnsignedShort => "UNSIGNED_SHORT",
            Self::UnsignedInt => "UNSIGNED_INT",
            Self::Float => "FLOAT",
        }
    }

    /// Component types allowed for `POSITION` (plain or quantized)
    pub fn valid_for_position(self) -> bool {
        self != Self::UnsignedInt
    }
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Points = 0,
    Lines = 1,
    LineLoop = 2,
    LineStrip = 3,
    Triangles = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
}

impl DrawMode {
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            0 => Self::Points,
            1 => Self::Lines,
            2 => Self::LineLoop,
            3 => Self::LineStrip,
            4 => Self::Triangles,
            5 => Self::TriangleStrip,
            6 => Self::TriangleFan,
            _ => return None,
        })
    }

    /// `(code, label, requirement)` when `count` vertices cannot form this topology
    pub fn check_count(self, count: u64) -> Option<(&'static str, &'static str, &'static str)> {
        let (ok, code, label, requirement) = match self {
            Self::Points => return None,
            Self::Triangles => (count % 3 == 0, "INVALID_TRIANGLE_COUNT", "triangle", "multiple of 3 for TRIANGLES"),
            Self::TriangleStrip => (count >= 3, "INVALID_TRIANGLE_STRIP_COUNT", "triangle strip", "at least 3 for TRIANGLE_STRIP"),
            Self::TriangleFan => (count >= 3, "INVALID_TRIANGLE_FAN_COUNT", "triangle fan", "at least 3 for TRIANGLE_FAN"),
            Self::Lines => (count % 2 == 0, "INVALID_LINES_COUNT", "lines", "multiple of 2 for LINES"),
            Self::LineStrip => (count >= 2, "INVALID_LINE_STRIP_COUNT", "line strip", "at least 2 for LINE_STRIP"),
            Self::LineLoop => (count >= 2, "INVALID_LINE_LOOP_COUNT", "line loop", "at least 2 for LINE_LOOP"),
        };
        (!ok).then_some((code, label, requirement))
    }
}

/// Elements of a top-level array; a missing or non-array key counts as empty
fn array<'a>(root: &'a Node, key: &str) -> &'a [Node] {
    root.get(key).and_then(Node::as_array).unwrap_or(&[])
}

/// Valid index into a collection of `len` entries
fn resolve(value: &Node, len: usize) -> Option<usize> {
    value.as_index().filter(|&i| i < len)
}

/// Run both glTF passes on a JSON or GLB document
pub(crate) fn validate_gltf(doc: &Document, supported_extensions: &BTreeSet<String>) -> Vec<ValidationIssue> {
    let empty = Node::Null;
    let root = doc.root.as_ref().unwrap_or(&empty);
    let mut issues = Issues::default();

    check_asset(root, &mut issues);
    check_buffers(root, doc, &mut issues);
    check_accessors(root, &mut issues);
    check_meshes(root, &mut issues);
    check_required_extensions(root, &mut issues);

    check_materials(root, &mut issues);
    check_textures(root, &mut issues);
    check_used_extensions(root, supported_extensions, &mut issues);

    issues.into_vec()
}

fn check_asset(root: &Node, issues: &mut Issues) {
    let Some(asset) = root.get("asset") else {
        issues.push(ValidationIssue::error("MISSING_REQUIRED_FIELD", "asset", "Missing required field: asset", LOADER_FAILS));
        return;
    };
    match asset.get("version") {
        None => issues.push(ValidationIssue::error(
            "MISSING_ASSET_VERSION",
            "asset/version",
            "Missing required field: asset.version",
            LOADER_FAILS,
        )),
        Some(Node::Str(v)) if v.starts_with("2.") => {}
        Some(other) => issues.push(ValidationIssue::error(
            "UNSUPPORTED_GLTF_VERSION",
            "asset/version",
            format!("Unsupported glTF version: {}", other),
            "Renderer may not load this version",
        )),
    }
}

fn check_buffers(root: &Node, doc: &Document, issues: &mut Issues) {
    let buffers = array(root, "buffers");

    for (i, view) in array(root, "bufferViews").iter().enumerate() {
        let location = format!("bufferViews/{}", i);
        let buffer_ref = view.get("buffer");
        let Some(buffer_idx) = buffer_ref.and_then(|r| resolve(r, buffers.len())) else {
            issues.push(ValidationIssue::error(
                "INVALID_BUFFER_REFERENCE",
                location,
                format!(
                    "bufferView[{}] references invalid buffer: {}",
                    i,
                    buffer_ref.map_or("<missing>".to_string(), Node::to_string)
                ),
                BUFFER_ACCESS,
            ));
            continue;
        };

        let offset = view.get("byteOffset").and_then(Node::as_u64).unwrap_or(0);
        let length = view.get("byteLength").and_then(Node::as_u64).unwrap_or(0);
        if let Some(size) = buffers[buffer_idx].get("byteLength").and_then(Node::as_u64) {
            if offset.saturating_add(length) > size {
                issues.push(ValidationIssue::error(
                    "BUFFER_VIEW_OUT_OF_BOUNDS",
                    location,
                    format!(
                        "bufferView[{}] exceeds buffer bounds: offset={}, length={}, buffer_size={}",
                        i, offset, length, size
                    ),
                    BUFFER_ACCESS,
                ));
            }
        }
    }

    // GLB-stored buffer: index 0 without a uri lives in the BIN chunk
    if doc.kind != ContainerKind::Glb {
        return;
    }
    let Some(first) = buffers.first() else { return };
    if first.get("uri").is_some() {
        return;
    }
    let declared = first.get("byteLength").and_then(Node::as_u64).unwrap_or(0);
    match doc.bin_chunk() {
        None => issues.push(ValidationIssue::error(
            "GLB_MISSING_BIN_CHUNK",
            "buffers/0",
            "buffer[0] has no uri but the GLB has no BIN chunk",
            BUFFER_ACCESS,
        )),
        Some(bin) if (bin.len() as u64) < declared => issues.push(ValidationIssue::error(
            "GLB_BIN_CHUNK_TOO_SHORT",
            "buffers/0",
            format!("buffer[0] byteLength {} exceeds BIN chunk size {}", declared, bin.len()),
            BUFFER_ACCESS,
        )),
        Some(_) => {}
    }
}

fn check_accessors(root: &Node, issues: &mut Issues) {
    let view_count = array(root, "bufferViews").len();

    for (i, accessor) in array(root, "accessors").iter().enumerate() {
        let location = format!("accessors/{}", i);

        if let Some(view_ref) = accessor.get("bufferView") {
            if resolve(view_ref, view_count).is_none() {
                issues.push(ValidationIssue::error(
                    "INVALID_BUFFER_VIEW_REFERENCE",
                    location.clone(),
                    format!("accessor[{}] references invalid bufferView: {}", i, view_ref),
                    RENDER_ERROR,
                ));
            }
        }

        let count = accessor.get("count");
        if !count.and_then(Node::as_u64).map_or(false, |c| c > 0) {
            issues.push(ValidationIssue::error(
                "INVALID_ACCESSOR_COUNT",
                location.clone(),
                format!("accessor[{}] has invalid count: {}", i, count.map_or("<missing>".into(), Node::to_string)),
                RENDER_ERROR,
            ));
        }

        match accessor.get("type") {
            None => issues.push(ValidationIssue::error(
                "MISSING_ACCESSOR_TYPE",
                location.clone(),
                format!("accessor[{}] missing required field: type", i),
                RENDER_ERROR,
            )),
            Some(t) if t.as_str().and_then(AccessorType::parse).is_some() => {}
            Some(t) => issues.push(ValidationIssue::error(
                "INVALID_ACCESSOR_TYPE",
                location.clone(),
                format!(
                    "accessor[{}] has invalid type: {} (must be one of: {})",
                    i,
                    t,
                    AccessorType::NAMES.join(", ")
                ),
                RENDER_ERROR,
            )),
        }

        match accessor.get("componentType") {
            None => issues.push(ValidationIssue::error(
                "MISSING_ACCESSOR_COMPONENT_TYPE",
                location,
                format!("accessor[{}] missing required field: componentType", i),
                RENDER_ERROR,
            )),
            Some(c) if c.as_i64().and_then(ComponentType::from_code).is_some() => {}
            Some(c) => {
                let valid: Vec<String> = ComponentType::ALL
                    .iter()
                    .map(|t| format!("{} ({})", *t as i64, t.name()))
                    .collect();
                issues.push(ValidationIssue::error(
                    "INVALID_ACCESSOR_COMPONENT_TYPE",
                    location,
                    format!("accessor[{}] has invalid componentType: {} (must be one of: {})", i, c, valid.join(", ")),
                    RENDER_ERROR,
                ));
            }
        }
    }
}

fn check_meshes(root: &Node, issues: &mut Issues) {
    let accessors = array(root, "accessors");
    let material_count = array(root, "materials").len();

    for (i, mesh) in array(root, "meshes").iter().enumerate() {
        for (j, primitive) in array(mesh, "primitives").iter().enumerate() {
            let location = format!("meshes/{}/primitives/{}", i, j);
            let label = format!("mesh[{}].primitive[{}]", i, j);

            let mut indexed_count = None;
            let has_indices = match primitive.get("indices") {
                Some(indices_ref) => {
                    match resolve(indices_ref, accessors.len()) {
                        Some(idx) => indexed_count = accessors[idx].get("count").and_then(Node::as_u64),
                        None => issues.push(ValidationIssue::error(
                            "INVALID_INDICES_REFERENCE",
                            location.clone(),
                            format!("{} references invalid accessor: {}", label, indices_ref),
                            "Will cause rendering crash",
                        )),
                    }
                    true
                }
                None => false,
            };

            let position_count = check_attributes(primitive, accessors, &location, &label, issues);

            let mode = match primitive.get("mode") {
                None => Some(DrawMode::Triangles),
                Some(m) => {
                    let mode = m.as_i64().and_then(DrawMode::from_code);
                    if mode.is_none() {
                        issues.push(ValidationIssue::error(
                            "INVALID_PRIMITIVE_MODE",
                            location.clone(),
                            format!("{} has invalid mode: {} (must be 0 to 6)", label, m),
                            RENDER_ERROR,
                        ));
                    }
                    mode
                }
            };

            let count = if has_indices { indexed_count } else { position_count };
            if let (Some(mode), Some(count)) = (mode, count) {
                if let Some((code, name, requirement)) = mode.check_count(count) {
                    issues.push(ValidationIssue::error(
                        code,
                        location.clone(),
                        format!("{} has invalid {} count: {} (must be {} mode)", label, name, count, requirement),
                        RENDER_ERROR,
                    ));
                }
            }

            if let Some(material_ref) = primitive.get("material") {
                if resolve(material_ref, material_count).is_none() {
                    issues.push(ValidationIssue::error(
                        "INVALID_MATERIAL_REFERENCE",
                        location,
                        format!("{} references invalid material: {}", label, material_ref),
                        "Will cause rendering error or fallback to default material",
                    ));
                }
            }
        }
    }
}

/// Attribute checks; returns the POSITION accessor count when it resolves
fn check_attributes(
    primitive: &Node,
    accessors: &[Node],
    location: &str,
    label: &str,
    issues: &mut Issues,
) -> Option<u64> {
    let Some(attributes) = primitive.get("attributes").and_then(Node::as_object) else {
        issues.push(ValidationIssue::error(
            "MISSING_PRIMITIVE_ATTRIBUTES",
            location,
            format!("{} missing required field: attributes", label),
            RENDER_ERROR,
        ));
        return None;
    };

    let mut position_count = None;
    match attributes.get("POSITION") {
        None => issues.push(ValidationIssue::error(
            "MISSING_POSITION_ATTRIBUTE",
            location,
            format!("{} missing required attribute: POSITION", label),
            RENDER_ERROR,
        )),
        Some(position_ref) => match resolve(position_ref, accessors.len()) {
            None => issues.push(ValidationIssue::error(
                "INVALID_POSITION_REFERENCE",
                location,
                format!("{} POSITION references invalid accessor: {}", label, position_ref),
                RENDER_ERROR,
            )),
            Some(idx) => {
                let accessor = &accessors[idx];
                position_count = accessor.get("count").and_then(Node::as_u64);

                let ty = accessor.get("type").and_then(Node::as_str);
                if ty.and_then(AccessorType::parse) != Some(AccessorType::Vec3) {
                    issues.push(ValidationIssue::error(
                        "INVALID_POSITION_TYPE",
                        location,
                        format!("{} POSITION accessor has invalid type: {} (must be VEC3)", label, ty.unwrap_or("<missing>")),
                        RENDER_ERROR,
                    ));
                }

                let component = accessor.get("componentType").and_then(Node::as_i64);
                if !component.and_then(ComponentType::from_code).map_or(false, ComponentType::valid_for_position) {
                    issues.push(ValidationIssue::error(
                        "INVALID_POSITION_COMPONENT_TYPE",
                        location,
                        format!(
                            "{} POSITION accessor has invalid componentType: {} (must be FLOAT, UNSIGNED_SHORT, SHORT, UNSIGNED_BYTE, or BYTE)",
                            label,
                            component.map_or("<missing>".to_string(), |c| c.to_string())
                        ),
                        RENDER_ERROR,
                    ));
                }
            }
        },
    }

    for (name, accessor_ref) in attributes.iter().filter(|(name, _)| name.as_str() != "POSITION") {
        if resolve(accessor_ref, accessors.len()).is_none() {
            issues.push(ValidationIssue::error(
                "INVALID_ATTRIBUTE_REFERENCE",
                location,
                format!("{} attribute '{}' references invalid accessor: {}", label, name, accessor_ref),
                RENDER_ERROR,
            ));
        }
    }

    position_count
}

fn check_required_extensions(root: &Node, issues: &mut Issues) {
    let used: BTreeSet<&str> = array(root, "extensionsUsed").iter().filter_map(Node::as_str).collect();
    for (i, ext) in array(root, "extensionsRequired").iter().enumerate() {
        if !ext.as_str().map_or(false, |name| used.contains(name)) {
            issues.push(ValidationIssue::error(
                "EXTENSION_NOT_DECLARED",
                format!("extensionsRequired/{}", i),
                format!("Required extension {} is not listed in extensionsUsed", ext),
                LOADER_FAILS,
            ));
        }
    }
}

fn check_materials(root: &Node, issues: &mut Issues) {
    for (i, material) in array(root, "materials").iter().enumerate() {
        let Some(pbr) = material.get("pbrMetallicRoughness") else { continue };
        for (key, code, name) in [
            ("metallicFactor", "INVALID_METALLIC_FACTOR", "metallicFactor"),
            ("roughnessFactor", "INVALID_ROUGHNESS_FACTOR", "roughnessFactor"),
        ] {
            let Some(value) = pbr.get(key).and_then(Node::as_f64) else { continue };
            if !(0.0..=1.0).contains(&value) {
                issues.push(ValidationIssue::warning(
                    code,
                    format!("materials/{}/pbrMetallicRoughness/{}", i, key),
                    format!("material[{}] has invalid {}: {} (must be in [0, 1])", i, name, value),
                    MATERIAL_LOOK,
                ));
            }
        }
    }
}

fn check_textures(root: &Node, issues: &mut Issues) {
    let image_count = array(root, "images").len();
    for (i, texture) in array(root, "textures").iter().enumerate() {
        let location = format!("textures/{}", i);
        match texture.get("source") {
            // image supplied through an extension such as KHR_texture_basisu
            None if texture.get("extensions").is_some() => {}
            None => issues.push(ValidationIssue::warning(
                "MISSING_TEXTURE_SOURCE",
                location,
                format!("texture[{}] missing source", i),
                TEXTURE_MISSING,
            )),
            Some(source) if resolve(source, image_count).is_some() => {}
            Some(source) => issues.push(ValidationIssue::warning(
                "INVALID_TEXTURE_SOURCE",
                location,
                format!("texture[{}] references invalid image: {}", i, source),
                TEXTURE_MISSING,
            )),
        }
    }
}

fn check_used_extensions(root: &Node, supported: &BTreeSet<String>, issues: &mut Issues) {
    for (i, ext) in array(root, "extensionsUsed").iter().enumerate() {
        let Some(name) = ext.as_str() else { continue };
        if !supported.contains(name) {
            issues.push(ValidationIssue::warning(
                "UNSUPPORTED_EXTENSION",
                format!("extensionsUsed/{}", i),
                format!("Extension '{}' may not be supported by all renderers", name),
                "May fail to load in some renderers",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(json: &str) -> Vec<ValidationIssue> {
        let doc = Document::json(Node::from_json_str(json).unwrap());
        let supported = ["KHR_materials_unlit".to_string()].into_iter().collect();
        validate_gltf(&doc, &supported)
    }

    fn codes(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.code.as_str()).collect()
    }

    const TRIANGLE: &str = r#"{
        "asset": {"version": "2.0"},
        "buffers": [{"byteLength": 48}],
        "bufferViews": [{"buffer": 0, "byteLength": 36}, {"buffer": 0, "byteOffset": 36, "byteLength": 12}],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"},
            {"bufferView": 1, "componentType": 5125, "count": 3, "type": "SCALAR"}
        ],
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1}]}]
    }"#;

    #[test]
    fn test_valid_triangle() {
        assert!(run(TRIANGLE).is_empty());
    }

    #[test]
    fn test_missing_asset() {
        assert_eq!(codes(&run("{}")), ["MISSING_REQUIRED_FIELD"]);
        assert_eq!(codes(&run(r#"{"asset":{}}"#)), ["MISSING_ASSET_VERSION"]);
        assert_eq!(codes(&run(r#"{"asset":{"version":"1.0"}}"#)), ["UNSUPPORTED_GLTF_VERSION"]);
    }

    #[test]
    fn test_triangle_parity() {
        let json = TRIANGLE.replace(r#""count": 3, "type": "SCALAR""#, r#""count": 4, "type": "SCALAR""#);
        let issues = run(&json);
        assert_eq!(codes(&issues), ["INVALID_TRIANGLE_COUNT"]);
        assert_eq!(issues[0].location, "meshes/0/primitives/0");
        assert!(issues[0].is_error());
    }

    #[test]
    fn test_non_indexed_uses_position_count() {
        let json = r#"{
            "asset": {"version": "2.0"},
            "accessors": [{"componentType": 5126, "count": 2, "type": "VEC3"}],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "mode": 5}]}]
        }"#;
        assert_eq!(codes(&run(json)), ["INVALID_TRIANGLE_STRIP_COUNT"]);
    }

    #[test]
    fn test_bad_references_reported_independently() {
        let json = r#"{
            "asset": {"version": "2.0"},
            "buffers": [{"byteLength": 8}],
            "bufferViews": [{"buffer": 3, "byteLength": 4}, {"buffer": 0, "byteOffset": 4, "byteLength": 8}],
            "accessors": [{"bufferView": 9, "componentType": 5125, "count": 0, "type": "VEC5"}],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0, "NORMAL": 7}, "indices": 4, "material": 0, "mode": 9}]}]
        }"#;
        let issues = run(json);
        assert_eq!(
            codes(&issues),
            [
                "INVALID_BUFFER_REFERENCE",
                "BUFFER_VIEW_OUT_OF_BOUNDS",
                "INVALID_BUFFER_VIEW_REFERENCE",
                "INVALID_ACCESSOR_COUNT",
                "INVALID_ACCESSOR_TYPE",
                "INVALID_INDICES_REFERENCE",
                "INVALID_POSITION_TYPE",
                "INVALID_POSITION_COMPONENT_TYPE",
                "INVALID_ATTRIBUTE_REFERENCE",
                "INVALID_PRIMITIVE_MODE",
                "INVALID_MATERIAL_REFERENCE",
            ]
        );
    }

    #[test]
    fn test_position_attribute_required() {
        let with_primitive = |primitive: &str| {
            run(&format!(r#"{{"asset":{{"version":"2.0"}},"meshes":[{{"primitives":[{}]}}]}}"#, primitive))
        };
        assert_eq!(codes(&with_primitive("{}")), ["MISSING_PRIMITIVE_ATTRIBUTES"]);
        assert_eq!(codes(&with_primitive(r#"{"attributes":{}}"#)), ["MISSING_POSITION_ATTRIBUTE"]);

        let issues = with_primitive(r#"{"attributes":{"POSITION":3}}"#);
        assert_eq!(codes(&issues), ["INVALID_POSITION_REFERENCE"]);
        assert_eq!(issues[0].location, "meshes/0/primitives/0");
        assert!(issues[0].is_error());
    }

    #[test]
    fn test_glb_bin_chunk() {
        use crate::tiles3d::{decode, fixtures::glb};

        let check = |json: &str, bin: Option<&[u8]>| {
            let doc = decode(&glb(json, bin), ContainerKind::Glb).unwrap();
            validate_gltf(&doc, &BTreeSet::new())
        };
        let json = r#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":48}]}"#;

        let issues = check(json, None);
        assert_eq!(codes(&issues), ["GLB_MISSING_BIN_CHUNK"]);
        assert_eq!(issues[0].location, "buffers/0");
        assert_eq!(codes(&check(json, Some(&[0u8; 16]))), ["GLB_BIN_CHUNK_TOO_SHORT"]);
        assert!(check(json, Some(&[0u8; 48])).is_empty());

        let external = r#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":48,"uri":"mesh.bin"}]}"#;
        assert!(check(external, None).is_empty());
    }

    #[test]
    fn test_extensions() {
        let json = r#"{
            "asset": {"version": "2.0"},
            "extensionsUsed": ["KHR_materials_unlit", "VENDOR_thing"],
            "extensionsRequired": ["KHR_draco_mesh_compression"]
        }"#;
        let issues = run(json);
        assert_eq!(codes(&issues), ["EXTENSION_NOT_DECLARED", "UNSUPPORTED_EXTENSION"]);
        assert!(!issues[1].is_error());
    }

    #[test]
    fn test_material_and_texture_warnings() {
        let json = r#"{
            "asset": {"version": "2.0"},
            "materials": [{"pbrMetallicRoughness": {"metallicFactor": 1.5, "roughnessFactor": -0.1}}],
            "images": [{"uri": "a.png"}],
            "textures": [{}, {"source": 2}, {"source": 0}]
        }"#;
        let issues = run(json);
        assert_eq!(
            codes(&issues),
            ["INVALID_METALLIC_FACTOR", "INVALID_ROUGHNESS_FACTOR", "MISSING_TEXTURE_SOURCE", "INVALID_TEXTURE_SOURCE"]
        );
        assert!(issues.iter().all(|i| !i.is_error()));
    }

    #[test]
    fn test_draw_mode_rules() {
        assert!(DrawMode::Triangles.check_count(6).is_none());
        assert!(DrawMode::Lines.check_count(3).is_some());
        assert!(DrawMode::LineLoop.check_count(1).is_some());
        assert!(DrawMode::Points.check_count(1).is_none());
        assert_eq!(DrawMode::from_code(7), None);
    }
}
