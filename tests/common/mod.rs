// tests/common/mod.rs
// Byte writers for container fixtures shared by the integration tests

#![allow(dead_code)]

pub const TRIANGLE_GLTF: &str = r#"{
    "asset": {"version": "2.0"},
    "buffers": [{"byteLength": 48}],
    "bufferViews": [{"buffer": 0, "byteLength": 36}, {"buffer": 0, "byteOffset": 36, "byteLength": 12}],
    "accessors": [
        {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"},
        {"bufferView": 1, "componentType": 5125, "count": 3, "type": "SCALAR"}
    ],
    "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1}]}]
}"#;

fn pad4(mut bytes: Vec<u8>, fill: u8) -> Vec<u8> {
    while bytes.len() % 4 != 0 {
        bytes.push(fill);
    }
    bytes
}

fn push_words(out: &mut Vec<u8>, words: &[u32]) {
    for word in words {
        out.extend_from_slice(&word.to_le_bytes());
    }
}

pub fn glb(json: &str, bin: Option<&[u8]>) -> Vec<u8> {
    let json = pad4(json.as_bytes().to_vec(), b' ');
    let mut body = Vec::new();
    push_words(&mut body, &[json.len() as u32]);
    body.extend_from_slice(b"JSON");
    body.extend(json);
    if let Some(bin) = bin {
        let bin = pad4(bin.to_vec(), 0);
        push_words(&mut body, &[bin.len() as u32]);
        body.extend_from_slice(b"BIN\0");
        body.extend(bin);
    }
    let mut out = b"glTF".to_vec();
    push_words(&mut out, &[2, (12 + body.len()) as u32]);
    out.extend(body);
    out
}

/// Triangle GLB with a BIN chunk large enough for its buffer
pub fn triangle_glb() -> Vec<u8> {
    glb(TRIANGLE_GLTF, Some(&[0u8; 48]))
}

fn table_tile(magic: &[u8; 4], feature_json: &str, feature_bin: &[u8], extra: Option<u32>, payload: &[u8]) -> Vec<u8> {
    let ft = pad4(feature_json.as_bytes().to_vec(), b' ');
    let header_len = if extra.is_some() { 32 } else { 28 };
    let total = header_len + ft.len() + feature_bin.len() + payload.len();

    let mut out = magic.to_vec();
    push_words(&mut out, &[1, total as u32, ft.len() as u32, feature_bin.len() as u32, 0, 0]);
    if let Some(word) = extra {
        push_words(&mut out, &[word]);
    }
    out.extend(ft);
    out.extend_from_slice(feature_bin);
    out.extend_from_slice(payload);
    out
}

pub fn b3dm(feature_json: &str, glb: &[u8]) -> Vec<u8> {
    table_tile(b"b3dm", feature_json, &[], None, glb)
}

pub fn i3dm(feature_json: &str, feature_bin: &[u8], gltf_format: u32, payload: &[u8]) -> Vec<u8> {
    table_tile(b"i3dm", feature_json, feature_bin, Some(gltf_format), payload)
}

pub fn pnts(feature_json: &str, feature_bin: &[u8]) -> Vec<u8> {
    table_tile(b"pnts", feature_json, feature_bin, None, &[])
}

pub fn cmpt(tiles: &[Vec<u8>]) -> Vec<u8> {
    let total = 16 + tiles.iter().map(Vec::len).sum::<usize>();
    let mut out = b"cmpt".to_vec();
    push_words(&mut out, &[1, total as u32, tiles.len() as u32]);
    for tile in tiles {
        out.extend_from_slice(tile);
    }
    out
}

/// Composite whose inner tiles are each preceded by their byte length
pub fn cmpt_prefixed(tiles: &[Vec<u8>]) -> Vec<u8> {
    let framed: Vec<Vec<u8>> = tiles
        .iter()
        .map(|tile| {
            let mut out = (tile.len() as u32).to_le_bytes().to_vec();
            out.extend_from_slice(tile);
            out
        })
        .collect();
    cmpt(&framed)
}

/// Two points, float32 positions
pub fn point_positions(shift: f32) -> Vec<u8> {
    [0.0f32, 0.0, 0.0, 1.0 + shift, 2.0, 3.0].iter().flat_map(|v| v.to_le_bytes()).collect()
}
