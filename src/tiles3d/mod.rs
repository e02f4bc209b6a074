//! 3D Tiles and glTF container decoding
//!
//! Parses tileset/glTF JSON, GLB, B3DM, I3DM, PNTS and CMPT into a typed [`Document`].
//! Binary sub-chunks are kept as opaque bytes; embedded GLB payloads and composite inner
//! tiles are decoded recursively up to [`MAX_NESTING_DEPTH`] levels.

mod b3dm;
mod cmpt;
mod error;
mod glb;
mod header;
mod pnts;
mod tables;

pub use b3dm::{decode_b3dm, decode_i3dm};
pub use cmpt::decode_cmpt;
pub use error::{DecodeError, Tiles3dResult};
pub use glb::decode_glb;
pub use header::{B3dmHeader, CmptHeader, GlbHeader, I3dmHeader, PntsHeader, TableHeader};
pub use pnts::decode_pnts;

pub(crate) use tables::{BATCH_TABLE, BATCH_TABLE_BINARY, FEATURE_TABLE, FEATURE_TABLE_BINARY};

use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::document::{ContainerKind, Document};
use crate::error::{Error, Result};

/// Deepest nesting level (embedded GLB, composite inner tile) the decoder follows
pub const MAX_NESTING_DEPTH: usize = 16;

/// Decode `bytes` as the given container format
pub fn decode(bytes: &[u8], kind: ContainerKind) -> Tiles3dResult<Document> {
    decode_at_depth(bytes, kind, 0)
}

/// Decode after classifying the buffer by its leading magic bytes.
///
/// Falls back to JSON when the first non-whitespace byte is `{`.
pub fn decode_sniffed(bytes: &[u8]) -> Tiles3dResult<Document> {
    decode(bytes, sniff(bytes)?)
}

fn sniff(bytes: &[u8]) -> Tiles3dResult<ContainerKind> {
    if let Some(kind) = ContainerKind::from_magic(bytes) {
        return Ok(kind);
    }
    let text = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);
    match text.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => Ok(ContainerKind::Json),
        _ => Err(DecodeError::UnknownFormat { found: error::tag_string(bytes) }),
    }
}

pub(crate) fn decode_at_depth(bytes: &[u8], kind: ContainerKind, depth: usize) -> Tiles3dResult<Document> {
    if depth > MAX_NESTING_DEPTH {
        return Err(DecodeError::TooDeep { limit: MAX_NESTING_DEPTH });
    }

    let doc = match kind {
        ContainerKind::Json => decode_json(bytes)?,
        ContainerKind::Glb => glb::decode_glb(bytes)?,
        ContainerKind::B3dm => b3dm::decode_b3dm(bytes, depth)?,
        ContainerKind::I3dm => b3dm::decode_i3dm(bytes, depth)?,
        ContainerKind::Pnts => pnts::decode_pnts(bytes)?,
        ContainerKind::Cmpt => cmpt::decode_cmpt(bytes, depth)?,
    };
    debug!(
        "decoded {} at depth {} ({} bytes, {} chunks)",
        kind,
        depth,
        bytes.len(),
        doc.chunks.len()
    );
    Ok(doc)
}

fn decode_json(bytes: &[u8]) -> Tiles3dResult<Document> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)
        .map_err(|_| DecodeError::InvalidUtf8 { chunk: "document".into() })?;
    let root = crate::document::Node::from_json_str(text).map_err(|e| DecodeError::json("document", e))?;
    Ok(Document::json(root))
}

/// Read and decode a file, dispatching on its extension (or magic when the extension is unknown)
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    let doc = match ContainerKind::from_path(path) {
        Some(kind) => decode(&bytes, kind),
        None => decode_sniffed(&bytes),
    }
    .map_err(|e| Error::decode(path, e))?;
    Ok(doc.with_source(path))
}

/// Every decodable file under `dir`, keyed by its `/`-separated path relative to `dir`
pub fn find_content_files<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<String, PathBuf>> {
    let dir = dir.as_ref();
    let mut files = BTreeMap::new();
    walk_dir(dir, dir, &mut files)?;
    debug!("{}: {} content file(s)", dir.display(), files.len());
    Ok(files)
}

fn walk_dir(root: &Path, dir: &Path, files: &mut BTreeMap<String, PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if path.is_dir() {
            walk_dir(root, &path, files)?;
        } else if ContainerKind::from_path(&path).is_some() {
            let relative = path.strip_prefix(root).unwrap_or(path.as_path());
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.insert(key, path);
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Byte-level builders for container fixtures

    fn pad4(mut bytes: Vec<u8>, fill: u8) -> Vec<u8> {
        while bytes.len() % 4 != 0 {
            bytes.push(fill);
        }
        bytes
    }

    pub fn glb(json: &str, bin: Option<&[u8]>) -> Vec<u8> {
        let json = pad4(json.as_bytes().to_vec(), b' ');
        let mut body = Vec::new();
        body.extend_from_slice(&(json.len() as u32).to_le_bytes());
        body.extend_from_slice(b"JSON");
        body.extend(json);
        if let Some(bin) = bin {
            let bin = pad4(bin.to_vec(), 0);
            body.extend_from_slice(&(bin.len() as u32).to_le_bytes());
            body.extend_from_slice(b"BIN\0");
            body.extend(bin);
        }
        let mut out = b"glTF".to_vec();
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&((12 + body.len()) as u32).to_le_bytes());
        out.extend(body);
        out
    }

    /// B3DM/PNTS/I3DM layout; `gltf_format` adds the I3DM header word
    pub fn tile(
        magic: &[u8; 4],
        feature_json: &str,
        feature_bin: &[u8],
        batch_json: &str,
        gltf_format: Option<u32>,
        payload: &[u8],
    ) -> Vec<u8> {
        let ft = pad4(feature_json.as_bytes().to_vec(), b' ');
        let bt = pad4(batch_json.as_bytes().to_vec(), b' ');
        let header_len = if gltf_format.is_some() { 32 } else { 28 };
        let total = header_len + ft.len() + feature_bin.len() + bt.len() + payload.len();

        let mut out = magic.to_vec();
        for word in [1, total as u32, ft.len() as u32, feature_bin.len() as u32, bt.len() as u32, 0] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        if let Some(format) = gltf_format {
            out.extend_from_slice(&format.to_le_bytes());
        }
        out.extend(ft);
        out.extend_from_slice(feature_bin);
        out.extend(bt);
        out.extend_from_slice(payload);
        out
    }

    pub fn cmpt(tiles: &[Vec<u8>]) -> Vec<u8> {
        let total = 16 + tiles.iter().map(Vec::len).sum::<usize>();
        let mut out = b"cmpt".to_vec();
        for word in [1, total as u32, tiles.len() as u32] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        for tile in tiles {
            out.extend_from_slice(tile);
        }
        out
    }

    /// CMPT whose inner tiles each carry a `u32` length prefix
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

    pub const MINIMAL_GLTF: &str = r#"{"asset":{"version":"2.0"}}"#;
}
