//! PNTS (Point Cloud) payload parser

use log::debug;

use super::error::Tiles3dResult;
use super::header::{check_table_lengths, read_header, Cursor, PntsHeader, RawHeader};
use super::tables::read_tables;
use crate::document::{Chunk, ContainerKind, Document, Node};

pub(crate) const PAYLOAD_CHUNK: &str = "payload";

/// Decode a PNTS buffer. Point attributes stay in `featureTableBinary`, uninterpreted.
pub fn decode_pnts(data: &[u8]) -> Tiles3dResult<Document> {
    let (header, body) = read_header::<PntsHeader>(data)?;
    let lengths = header.0.lengths();
    let header_size = std::mem::size_of::<PntsHeader>();
    check_table_lengths(ContainerKind::Pnts, header_size, header.0.byte_length, &lengths)?;

    let mut cursor = Cursor::new(body, header_size);
    let mut doc = Document::new(ContainerKind::Pnts);
    doc.header = Some(header.describe());
    doc.chunks = read_tables(&mut cursor, &lengths)?;

    if cursor.remaining() > 0 {
        debug!("  {}: {} trailing bytes", PAYLOAD_CHUNK, cursor.remaining());
        doc.chunks.push(Chunk::node(PAYLOAD_CHUNK, Node::Bytes(cursor.rest().to_vec())));
    }
    Ok(doc)
}
