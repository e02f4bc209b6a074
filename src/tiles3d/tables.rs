//! Feature-table and batch-table sub-chunks shared by B3DM, I3DM and PNTS

use log::debug;

use super::error::{DecodeError, Tiles3dResult};
use super::header::{Cursor, TableLengths};
use crate::document::{Chunk, Node};

pub(crate) const FEATURE_TABLE: &str = "featureTable";
pub(crate) const FEATURE_TABLE_BINARY: &str = "featureTableBinary";
pub(crate) const BATCH_TABLE: &str = "batchTable";
pub(crate) const BATCH_TABLE_BINARY: &str = "batchTableBinary";

/// Decode a JSON sub-chunk. Empty or all-padding chunks become `Null`.
pub(crate) fn decode_json_chunk(name: &str, bytes: &[u8]) -> Tiles3dResult<Node> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| DecodeError::InvalidUtf8 { chunk: name.to_string() })?;
    if text.trim_matches(|c: char| c == '\0' || c.is_whitespace()).is_empty() {
        return Ok(Node::Null);
    }
    Node::from_json_str(text).map_err(|e| DecodeError::json(name, e))
}

/// Read the four table sub-chunks in file order
pub(crate) fn read_tables(cursor: &mut Cursor<'_>, lengths: &TableLengths) -> Tiles3dResult<Vec<Chunk>> {
    let layout = [
        (FEATURE_TABLE, lengths.feature_json, true),
        (FEATURE_TABLE_BINARY, lengths.feature_binary, false),
        (BATCH_TABLE, lengths.batch_json, true),
        (BATCH_TABLE_BINARY, lengths.batch_binary, false),
    ];

    let mut chunks = Vec::with_capacity(layout.len());
    for (name, len, is_json) in layout {
        let bytes = cursor.take(len as usize, name)?;
        let node = if is_json {
            decode_json_chunk(name, bytes)?
        } else {
            Node::Bytes(bytes.to_vec())
        };
        debug!("  {}: {} bytes", name, len);
        chunks.push(Chunk::node(name, node));
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_chunk_variants() {
        assert_eq!(decode_json_chunk(FEATURE_TABLE, b"").unwrap(), Node::Null);
        assert_eq!(decode_json_chunk(FEATURE_TABLE, b"    ").unwrap(), Node::Null);

        let err = decode_json_chunk(BATCH_TABLE, b"{\"a\":").unwrap_err();
        assert_eq!(err.code(), "INVALID_JSON");

        let err = decode_json_chunk(BATCH_TABLE, &[0x7b, 0xff, 0x7d]).unwrap_err();
        assert_eq!(err, DecodeError::InvalidUtf8 { chunk: BATCH_TABLE.to_string() });
    }

    #[test]
    fn test_read_tables_in_order() {
        let mut data = br#"{"BATCH_LENGTH":2}"#.to_vec();
        data.extend_from_slice(&[1, 2, 3, 4]);
        let lengths = TableLengths { feature_json: 18, feature_binary: 4, batch_json: 0, batch_binary: 0 };
        let mut cursor = Cursor::new(&data, 0);
        let chunks = read_tables(&mut cursor, &lengths).unwrap();

        let names: Vec<&str> = chunks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, [FEATURE_TABLE, FEATURE_TABLE_BINARY, BATCH_TABLE, BATCH_TABLE_BINARY]);
        assert_eq!(cursor.remaining(), 0);
    }
}
