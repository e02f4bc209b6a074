//! Fixed-size container headers and a bounds-checked byte cursor

use bytemuck::{Pod, Zeroable};

use super::error::{tag_string, DecodeError, Tiles3dResult};
use crate::document::{ContainerHeader, ContainerKind};

/// Little-endian header laid out exactly as on disk
pub(crate) trait RawHeader: Pod {
    const KIND: ContainerKind;
    const MAGIC: [u8; 4];
    const VERSION: u32;

    /// Swap fields from little-endian to host order
    fn to_native(self) -> Self;
    fn version(&self) -> u32;
    fn byte_length(&self) -> u32;
    fn describe(&self) -> ContainerHeader;
}

/// GLB file header (12 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GlbHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub byte_length: u32,
}

/// B3DM and PNTS file header (28 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TableHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub byte_length: u32,
    pub feature_table_json_byte_length: u32,
    pub feature_table_binary_byte_length: u32,
    pub batch_table_json_byte_length: u32,
    pub batch_table_binary_byte_length: u32,
}

/// I3DM file header (32 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct I3dmHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub byte_length: u32,
    pub feature_table_json_byte_length: u32,
    pub feature_table_binary_byte_length: u32,
    pub batch_table_json_byte_length: u32,
    pub batch_table_binary_byte_length: u32,
    /// 0: payload is a glTF URI, 1: payload is an embedded GLB
    pub gltf_format: u32,
}

/// CMPT file header (16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CmptHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub byte_length: u32,
    pub tiles_length: u32,
}

/// Sub-chunk lengths shared by B3DM, I3DM and PNTS
#[derive(Debug, Clone, Copy)]
pub(crate) struct TableLengths {
    pub feature_json: u32,
    pub feature_binary: u32,
    pub batch_json: u32,
    pub batch_binary: u32,
}

impl TableLengths {
    fn sum(&self) -> u64 {
        [self.feature_json, self.feature_binary, self.batch_json, self.batch_binary]
            .iter()
            .map(|&l| l as u64)
            .sum()
    }

    fn append_to(&self, header: ContainerHeader) -> ContainerHeader {
        header
            .with_length("featureTableJSONByteLength", self.feature_json)
            .with_length("featureTableBinaryByteLength", self.feature_binary)
            .with_length("batchTableJSONByteLength", self.batch_json)
            .with_length("batchTableBinaryByteLength", self.batch_binary)
    }
}

impl GlbHeader {
    pub const SIZE: usize = 12;
}

impl RawHeader for GlbHeader {
    const KIND: ContainerKind = ContainerKind::Glb;
    const MAGIC: [u8; 4] = *b"glTF";
    const VERSION: u32 = 2;

    fn to_native(self) -> Self {
        Self {
            magic: self.magic,
            version: u32::from_le(self.version),
            byte_length: u32::from_le(self.byte_length),
        }
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn byte_length(&self) -> u32 {
        self.byte_length
    }

    fn describe(&self) -> ContainerHeader {
        ContainerHeader::new(self.magic, self.version, self.byte_length)
    }
}

impl TableHeader {
    pub(crate) fn lengths(&self) -> TableLengths {
        TableLengths {
            feature_json: self.feature_table_json_byte_length,
            feature_binary: self.feature_table_binary_byte_length,
            batch_json: self.batch_table_json_byte_length,
            batch_binary: self.batch_table_binary_byte_length,
        }
    }

    fn native(self) -> Self {
        Self {
            magic: self.magic,
            version: u32::from_le(self.version),
            byte_length: u32::from_le(self.byte_length),
            feature_table_json_byte_length: u32::from_le(self.feature_table_json_byte_length),
            feature_table_binary_byte_length: u32::from_le(self.feature_table_binary_byte_length),
            batch_table_json_byte_length: u32::from_le(self.batch_table_json_byte_length),
            batch_table_binary_byte_length: u32::from_le(self.batch_table_binary_byte_length),
        }
    }
}

/// B3DM view of [`TableHeader`]
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct B3dmHeader(pub TableHeader);

/// PNTS view of [`TableHeader`]
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PntsHeader(pub TableHeader);

macro_rules! table_header {
    ($ty:ty, $kind:expr, $magic:expr) => {
        impl RawHeader for $ty {
            const KIND: ContainerKind = $kind;
            const MAGIC: [u8; 4] = *$magic;
            const VERSION: u32 = 1;

            fn to_native(self) -> Self {
                Self(self.0.native())
            }

            fn version(&self) -> u32 {
                self.0.version
            }

            fn byte_length(&self) -> u32 {
                self.0.byte_length
            }

            fn describe(&self) -> ContainerHeader {
                let h = &self.0;
                h.lengths()
                    .append_to(ContainerHeader::new(h.magic, h.version, h.byte_length))
            }
        }
    };
}

table_header!(B3dmHeader, ContainerKind::B3dm, b"b3dm");
table_header!(PntsHeader, ContainerKind::Pnts, b"pnts");

impl I3dmHeader {
    pub(crate) fn lengths(&self) -> TableLengths {
        TableLengths {
            feature_json: self.feature_table_json_byte_length,
            feature_binary: self.feature_table_binary_byte_length,
            batch_json: self.batch_table_json_byte_length,
            batch_binary: self.batch_table_binary_byte_length,
        }
    }
}

impl RawHeader for I3dmHeader {
    const KIND: ContainerKind = ContainerKind::I3dm;
    const MAGIC: [u8; 4] = *b"i3dm";
    const VERSION: u32 = 1;

    fn to_native(self) -> Self {
        Self {
            magic: self.magic,
            version: u32::from_le(self.version),
            byte_length: u32::from_le(self.byte_length),
            feature_table_json_byte_length: u32::from_le(self.feature_table_json_byte_length),
            feature_table_binary_byte_length: u32::from_le(self.feature_table_binary_byte_length),
            batch_table_json_byte_length: u32::from_le(self.batch_table_json_byte_length),
            batch_table_binary_byte_length: u32::from_le(self.batch_table_binary_byte_length),
            gltf_format: u32::from_le(self.gltf_format),
        }
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn byte_length(&self) -> u32 {
        self.byte_length
    }

    fn describe(&self) -> ContainerHeader {
        self.lengths()
            .append_to(ContainerHeader::new(self.magic, self.version, self.byte_length))
            .with_flag("gltfFormat", self.gltf_format)
    }
}

impl RawHeader for CmptHeader {
    const KIND: ContainerKind = ContainerKind::Cmpt;
    const MAGIC: [u8; 4] = *b"cmpt";
    const VERSION: u32 = 1;

    fn to_native(self) -> Self {
        Self {
            magic: self.magic,
            version: u32::from_le(self.version),
            byte_length: u32::from_le(self.byte_length),
            tiles_length: u32::from_le(self.tiles_length),
        }
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn byte_length(&self) -> u32 {
        self.byte_length
    }

    fn describe(&self) -> ContainerHeader {
        ContainerHeader::new(self.magic, self.version, self.byte_length)
            .with_length("tilesLength", self.tiles_length)
    }
}

/// Read and check a header: magic, size, version, and declared length against the buffer.
///
/// Returns the header and the slice bounded by the declared byte length.
pub(crate) fn read_header<H: RawHeader>(data: &[u8]) -> Tiles3dResult<(H, &[u8])> {
    let kind = H::KIND;
    if data.len() < 4 {
        return Err(DecodeError::truncated(format!("{} magic", kind), 4, data.len()));
    }
    if data[..4] != H::MAGIC {
        return Err(DecodeError::BadMagic {
            expected: tag_string(&H::MAGIC),
            found: tag_string(&data[..4]),
        });
    }

    let size = std::mem::size_of::<H>();
    if data.len() < size {
        return Err(DecodeError::truncated(format!("{} header", kind), size, data.len()));
    }
    let header = bytemuck::pod_read_unaligned::<H>(&data[..size]).to_native();

    if header.version() != H::VERSION {
        return Err(DecodeError::UnsupportedVersion {
            format: kind.to_string(),
            version: header.version(),
            supported: H::VERSION,
        });
    }

    let declared = header.byte_length() as usize;
    if declared > data.len() {
        return Err(DecodeError::truncated(format!("{} body", kind), declared, data.len()));
    }
    if declared < size {
        return Err(DecodeError::LengthMismatch {
            format: kind.to_string(),
            declared: declared as u64,
            required: size as u64,
        });
    }

    Ok((header, &data[..declared]))
}

/// Header size plus declared sub-chunk lengths must fit in the declared byte length
pub(crate) fn check_table_lengths(
    kind: ContainerKind,
    header_size: usize,
    byte_length: u32,
    lengths: &TableLengths,
) -> Tiles3dResult<()> {
    let required = header_size as u64 + lengths.sum();
    if required > byte_length as u64 {
        return Err(DecodeError::LengthMismatch {
            format: kind.to_string(),
            declared: byte_length as u64,
            required,
        });
    }
    Ok(())
}

/// Forward-only reader over a bounded byte slice
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset: offset.min(data.len()) }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    pub fn peek(&self, len: usize) -> Option<&'a [u8]> {
        self.data.get(self.offset..self.offset.checked_add(len)?)
    }

    pub fn take(&mut self, len: usize, what: &str) -> Tiles3dResult<&'a [u8]> {
        let bytes = self
            .peek(len)
            .ok_or_else(|| DecodeError::truncated(what, len, self.remaining()))?;
        self.offset += len;
        Ok(bytes)
    }

    pub fn read_u32(&mut self, what: &str) -> Tiles3dResult<u32> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
