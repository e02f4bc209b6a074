//! CMPT (Composite) container parser

use log::debug;

use super::error::{tag_string, DecodeError, Tiles3dResult};
use super::header::{read_header, CmptHeader, Cursor, RawHeader};
use crate::document::{Chunk, ContainerKind, Document};

/// Inner tile headers all start with magic, version and byteLength
const INNER_PREAMBLE: usize = 12;

/// Decode a composite tile. Each inner tile is dispatched on its own magic.
///
/// Inner tiles are framed either by their own header (the tile starts with a known magic and its
/// `byteLength` sits at offset 8) or by a `u32` length prefix written before the tile bytes.
pub fn decode_cmpt(data: &[u8], depth: usize) -> Tiles3dResult<Document> {
    let (header, body) = read_header::<CmptHeader>(data)?;
    let mut cursor = Cursor::new(body, std::mem::size_of::<CmptHeader>());

    let mut doc = Document::new(ContainerKind::Cmpt);
    doc.header = Some(header.describe());

    for index in 0..header.tiles_length {
        let what = format!("cmpt inner tile {}", index);
        let inner = next_inner_tile(&mut cursor, &what, header.byte_length)?;

        let kind = ContainerKind::from_magic(inner)
            .ok_or_else(|| DecodeError::UnknownFormat { found: tag_string(inner) })?;
        let tile = super::decode_at_depth(inner, kind, depth + 1)?;
        debug!("  tiles/{}: {} ({} bytes)", index, kind, inner.len());
        doc.chunks.push(Chunk::document(format!("tiles/{}", index), tile));
    }

    Ok(doc)
}

fn next_inner_tile<'a>(cursor: &mut Cursor<'a>, what: &str, declared: u32) -> Tiles3dResult<&'a [u8]> {
    let tag = cursor.peek(4).ok_or_else(|| DecodeError::truncated(what, 4, cursor.remaining()))?;

    let inner_length = if ContainerKind::from_magic(tag).is_some() {
        let preamble = cursor
            .peek(INNER_PREAMBLE)
            .ok_or_else(|| DecodeError::truncated(what, INNER_PREAMBLE, cursor.remaining()))?;
        u32::from_le_bytes([preamble[8], preamble[9], preamble[10], preamble[11]]) as usize
    } else {
        cursor.read_u32(what)? as usize
    };

    if inner_length > cursor.remaining() {
        return Err(DecodeError::LengthMismatch {
            format: ContainerKind::Cmpt.to_string(),
            declared: declared as u64,
            required: (cursor.offset() + inner_length) as u64,
        });
    }
    cursor.take(inner_length, what)
}

