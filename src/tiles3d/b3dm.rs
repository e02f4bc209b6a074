//! B3DM (Batched 3D Model) and I3DM (Instanced 3D Model) parsers
//!
//! Both carry the four feature/batch table sub-chunks followed by a glTF payload. I3DM adds a
//! `gltfFormat` flag selecting between an embedded GLB and a URI string.

use log::debug;

use super::error::{DecodeError, Tiles3dResult};
use super::header::{check_table_lengths, read_header, B3dmHeader, Cursor, I3dmHeader, RawHeader};
use super::tables::read_tables;
use crate::document::{Chunk, ContainerKind, Document, Node};

pub(crate) const GLB_CHUNK: &str = "glb";
pub(crate) const GLTF_URI_CHUNK: &str = "gltfUri";

/// Decode a B3DM buffer; the embedded GLB is decoded one nesting level down
pub fn decode_b3dm(data: &[u8], depth: usize) -> Tiles3dResult<Document> {
    let (header, body) = read_header::<B3dmHeader>(data)?;
    let lengths = header.0.lengths();
    check_table_lengths(ContainerKind::B3dm, body_offset::<B3dmHeader>(), header.0.byte_length, &lengths)?;

    let mut cursor = Cursor::new(body, body_offset::<B3dmHeader>());
    let mut doc = Document::new(ContainerKind::B3dm);
    doc.header = Some(header.describe());
    doc.chunks = read_tables(&mut cursor, &lengths)?;

    let glb = super::decode_at_depth(cursor.rest(), ContainerKind::Glb, depth + 1)?;
    debug!("  {}: embedded GLB, {} bytes", GLB_CHUNK, cursor.remaining());
    doc.chunks.push(Chunk::document(GLB_CHUNK, glb));
    Ok(doc)
}

/// Decode an I3DM buffer
pub fn decode_i3dm(data: &[u8], depth: usize) -> Tiles3dResult<Document> {
    let (header, body) = read_header::<I3dmHeader>(data)?;
    let lengths = header.lengths();
    check_table_lengths(ContainerKind::I3dm, body_offset::<I3dmHeader>(), header.byte_length, &lengths)?;

    let mut cursor = Cursor::new(body, body_offset::<I3dmHeader>());
    let mut doc = Document::new(ContainerKind::I3dm);
    doc.header = Some(header.describe());
    doc.chunks = read_tables(&mut cursor, &lengths)?;

    let payload = cursor.rest();
    match header.gltf_format {
        0 => {
            let uri = std::str::from_utf8(payload)
                .map_err(|_| DecodeError::InvalidUtf8 { chunk: GLTF_URI_CHUNK.to_string() })?
                .trim_end_matches(|c: char| c == '\0' || c == ' ');
            debug!("  {}: {:?}", GLTF_URI_CHUNK, uri);
            doc.chunks.push(Chunk::node(GLTF_URI_CHUNK, Node::Str(uri.to_string())));
        }
        1 => {
            let glb = super::decode_at_depth(payload, ContainerKind::Glb, depth + 1)?;
            debug!("  {}: embedded GLB, {} bytes", GLB_CHUNK, payload.len());
            doc.chunks.push(Chunk::document(GLB_CHUNK, glb));
        }
        other => {
            return Err(DecodeError::InvalidHeaderField { field: "gltfFormat".into(), value: other });
        }
    }
    Ok(doc)
}

fn body_offset<H: RawHeader>() -> usize {
    std::mem::size_of::<H>()
}
