//! Bounding volume rules for tileset tiles

use std::f64::consts::{FRAC_PI_2, PI};

use super::report::{Issues, ValidationIssue};
use crate::diff::join;
use crate::document::Node;

const CULLING: &str = "Renderer may not cull tiles correctly";

/// Bounding volume shapes defined by 3D Tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeShape {
    /// Oriented box: center plus three half-axes
    Box,
    /// Center plus radius
    Sphere,
    /// west, south, east, north (radians), minHeight, maxHeight (meters)
    Region,
}

impl VolumeShape {
    pub const ALL: [VolumeShape; 3] = [Self::Box, Self::Sphere, Self::Region];

    pub fn key(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Sphere => "sphere",
            Self::Region => "region",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Self::Box => 12,
            Self::Sphere => 4,
            Self::Region => 6,
        }
    }

    fn format_code(self) -> &'static str {
        match self {
            Self::Box => "INVALID_BOUNDING_VOLUME_BOX_FORMAT",
            Self::Sphere => "INVALID_BOUNDING_VOLUME_SPHERE_FORMAT",
            Self::Region => "INVALID_BOUNDING_VOLUME_REGION_FORMAT",
        }
    }

    fn layout(self) -> &'static str {
        match self {
            Self::Box => "[centerX, centerY, centerZ, xAxis(3), yAxis(3), zAxis(3)]",
            Self::Sphere => "[centerX, centerY, centerZ, radius]",
            Self::Region => "[west, south, east, north, minHeight, maxHeight]",
        }
    }
}

/// Check one `boundingVolume` object found at `location`
pub(crate) fn check_bounding_volume(volume: &Node, location: &str, issues: &mut Issues) {
    let Some(map) = volume.as_object() else {
        issues.push(ValidationIssue::error(
            "INVALID_BOUNDING_VOLUME_TYPE",
            location,
            format!("boundingVolume must be an object, got {}", volume.kind()),
            CULLING,
        ));
        return;
    };
    if map.is_empty() {
        issues.push(ValidationIssue::error("EMPTY_BOUNDING_VOLUME", location, "boundingVolume is empty", CULLING));
        return;
    }

    let shapes: Vec<VolumeShape> = VolumeShape::ALL.into_iter().filter(|s| map.contains_key(s.key())).collect();
    match shapes.len() {
        // extension-defined volumes carry no core shape
        0 if map.contains_key("extensions") => {}
        0 => issues.push(ValidationIssue::error(
            "INVALID_BOUNDING_VOLUME_TYPE",
            location,
            format!(
                "boundingVolume must contain one of: box, sphere, region. Got keys: {}",
                map.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
            CULLING,
        )),
        1 => {}
        _ => issues.push(ValidationIssue::error(
            "AMBIGUOUS_BOUNDING_VOLUME",
            location,
            format!(
                "boundingVolume defines more than one shape: {}",
                shapes.iter().map(|s| s.key()).collect::<Vec<_>>().join(", ")
            ),
            CULLING,
        )),
    }

    for shape in shapes {
        let shape_location = join(location, shape.key());
        if let Some(values) = numbers(shape, &map[shape.key()], &shape_location, issues) {
            match shape {
                VolumeShape::Box => {}
                VolumeShape::Sphere => check_sphere(&values, &shape_location, issues),
                VolumeShape::Region => check_region(&values, &shape_location, issues),
            }
        }
    }
}

/// Components as floats, or `None` after reporting a format, type or NaN problem
fn numbers(shape: VolumeShape, value: &Node, location: &str, issues: &mut Issues) -> Option<Vec<f64>> {
    let items = match value.as_array() {
        Some(items) if items.len() == shape.arity() => items,
        other => {
            let got = other.map_or_else(|| "not a list".to_string(), |items| items.len().to_string());
            issues.push(ValidationIssue::error(
                shape.format_code(),
                location,
                format!(
                    "boundingVolume.{} must be an array of {} numbers {}, got length {}",
                    shape.key(),
                    shape.arity(),
                    shape.layout(),
                    got
                ),
                CULLING,
            ));
            return None;
        }
    };

    let mut values = Vec::with_capacity(items.len());
    let mut valid = true;
    for (i, item) in items.iter().enumerate() {
        match item.as_f64() {
            None => {
                valid = false;
                issues.push(ValidationIssue::error(
                    "INVALID_BOUNDING_VOLUME_VALUE",
                    join(location, &i.to_string()),
                    format!("boundingVolume.{}[{}] is not a number: {}", shape.key(), i, item),
                    CULLING,
                ));
            }
            Some(v) if v.is_nan() => {
                valid = false;
                issues.push(ValidationIssue::error(
                    "INVALID_BOUNDING_VOLUME_NAN",
                    join(location, &i.to_string()),
                    format!("boundingVolume.{}[{}] is NaN", shape.key(), i),
                    CULLING,
                ));
            }
            Some(v) => values.push(v),
        }
    }
    valid.then_some(values)
}

fn check_sphere(values: &[f64], location: &str, issues: &mut Issues) {
    let radius = values[3];
    if radius < 0.0 {
        issues.push(ValidationIssue::error(
            "INVALID_BOUNDING_VOLUME_SPHERE_RADIUS",
            join(location, "3"),
            format!("boundingVolume.sphere radius must be non-negative, got: {}", radius),
            CULLING,
        ));
    }
}

fn check_region(values: &[f64], location: &str, issues: &mut Issues) {
    let [west, south, east, north, min_height, max_height] = [values[0], values[1], values[2], values[3], values[4], values[5]];

    let ranges = [
        ("INVALID_BOUNDING_VOLUME_REGION_WEST", "west", west, PI, "[-π, π]"),
        ("INVALID_BOUNDING_VOLUME_REGION_SOUTH", "south", south, FRAC_PI_2, "[-π/2, π/2]"),
        ("INVALID_BOUNDING_VOLUME_REGION_EAST", "east", east, PI, "[-π, π]"),
        ("INVALID_BOUNDING_VOLUME_REGION_NORTH", "north", north, FRAC_PI_2, "[-π/2, π/2]"),
    ];
    for (i, (code, name, value, limit, range)) in ranges.into_iter().enumerate() {
        if !(-limit..=limit).contains(&value) {
            issues.push(ValidationIssue::error(
                code,
                join(location, &i.to_string()),
                format!("boundingVolume.region {} must be in {} radians, got: {}", name, range, value),
                CULLING,
            ));
        }
    }

    let orderings = [
        ("INVALID_BOUNDING_VOLUME_REGION_LONGITUDE", "west", west, "east", east),
        ("INVALID_BOUNDING_VOLUME_REGION_LATITUDE", "south", south, "north", north),
        ("INVALID_BOUNDING_VOLUME_REGION_HEIGHT", "minHeight", min_height, "maxHeight", max_height),
    ];
    for (code, low_name, low, high_name, high) in orderings {
        if low > high {
            issues.push(ValidationIssue::error(
                code,
                location,
                format!("boundingVolume.region {} ({}) must be <= {} ({})", low_name, low, high_name, high),
                CULLING,
            ));
        }
    }
}
