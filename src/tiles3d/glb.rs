//! GLB (binary glTF 2.0) container parser

use log::{debug, warn};

use super::error::{tag_string, DecodeError, Tiles3dResult};
use super::header::{read_header, Cursor, GlbHeader, RawHeader};
use super::tables::decode_json_chunk;
use crate::document::{Chunk, ContainerKind, Document, Node};

const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

pub(crate) const BINARY_CHUNK: &str = "binary";

/// Decode a GLB buffer. The JSON chunk becomes the document root.
pub fn decode_glb(data: &[u8]) -> Tiles3dResult<Document> {
    let (header, body) = read_header::<GlbHeader>(data)?;
    let mut cursor = Cursor::new(body, GlbHeader::SIZE);

    let (first_type, first_data) = read_chunk(&mut cursor)
        .transpose()
        .unwrap_or_else(|| Err(DecodeError::MissingJsonChunk { found: "<none>".into() }))?;
    if first_type != CHUNK_JSON {
        return Err(DecodeError::MissingJsonChunk { found: tag_string(&first_type.to_le_bytes()) });
    }
    let root = decode_json_chunk("JSON chunk", first_data)?;

    let mut doc = Document::new(ContainerKind::Glb);
    doc.header = Some(header.describe());
    doc.root = Some(root);

    while let Some((chunk_type, chunk_data)) = read_chunk(&mut cursor)? {
        let base = if chunk_type == CHUNK_BIN {
            BINARY_CHUNK.to_string()
        } else {
            let tag = tag_string(&chunk_type.to_le_bytes());
            warn!("GLB: unknown chunk type {:?} ({} bytes) kept as raw bytes", tag, chunk_data.len());
            tag
        };
        let name = unique_name(&doc, base);
        debug!("  GLB chunk {}: {} bytes", name, chunk_data.len());
        doc.chunks.push(Chunk::node(name, Node::Bytes(chunk_data.to_vec())));
    }

    Ok(doc)
}

/// Next `(type, data)` triple, `None` at the end of the declared length
fn read_chunk<'a>(cursor: &mut Cursor<'a>) -> Tiles3dResult<Option<(u32, &'a [u8])>> {
    if cursor.remaining() == 0 {
        return Ok(None);
    }
    let length = cursor.read_u32("GLB chunk length")?;
    let chunk_type = cursor.read_u32("GLB chunk type")?;
    let data = cursor.take(length as usize, "GLB chunk data")?;
    Ok(Some((chunk_type, data)))
}

fn unique_name(doc: &Document, base: String) -> String {
    if doc.chunk(&base).is_none() {
        return base;
    }
    (1..)
        .map(|n| format!("{}/{}", base, n))
        .find(|candidate| doc.chunk(candidate).is_none())
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glb(chunks: &[(u32, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (ty, data) in chunks {
            body.extend_from_slice(&(data.len() as u32).to_le_bytes());
            body.extend_from_slice(&ty.to_le_bytes());
            body.extend_from_slice(data);
        }
        let mut out = b"glTF".to_vec();
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&((12 + body.len()) as u32).to_le_bytes());
        out.extend(body);
        out
    }

    #[test]
    fn test_json_and_bin() {
        let data = glb(&[(CHUNK_JSON, br#"{"asset":{"version":"2.0"}}"#), (CHUNK_BIN, &[1, 2, 3, 4])]);
        let doc = decode_glb(&data).unwrap();
        assert_eq!(doc.kind, ContainerKind::Glb);
        assert!(doc.root.as_ref().and_then(|r| r.get("asset")).is_some());
        assert_eq!(doc.bin_chunk(), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn test_first_chunk_must_be_json() {
        let data = glb(&[(CHUNK_BIN, &[0; 4])]);
        assert_eq!(decode_glb(&data).unwrap_err().code(), "MISSING_JSON_CHUNK");

        let data = glb(&[]);
        assert_eq!(decode_glb(&data).unwrap_err().code(), "MISSING_JSON_CHUNK");
    }

    #[test]
    fn test_chunk_past_declared_length() {
        let mut data = glb(&[(CHUNK_JSON, b"{}  ")]);
        // claim 16 bytes of JSON while only 4 follow
        data[12..16].copy_from_slice(&16u32.to_le_bytes());
        assert_eq!(decode_glb(&data).unwrap_err().code(), "TRUNCATED");
    }

    #[test]
    fn test_unknown_and_repeated_chunks() {
        let data = glb(&[
            (CHUNK_JSON, b"{}"),
            (CHUNK_BIN, &[1]),
            (CHUNK_BIN, &[2]),
            (u32::from_le_bytes(*b"XTRA"), &[3]),
        ]);
        let doc = decode_glb(&data).unwrap();
        let names: Vec<&str> = doc.chunks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["binary", "binary/1", "XTRA"]);
    }
}
