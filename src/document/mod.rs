//! Decoded document model
//!
//! A [`Document`] is the typed form of one input file: an optional container header,
//! an optional JSON root and an ordered list of named chunks. Chunks hold either a
//! [`Node`] (parsed JSON sub-chunk or opaque bytes) or a nested document (embedded GLB,
//! composite inner tiles).

mod node;

pub use node::{Node, NodeKind};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Container format of a decoded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    /// Plain JSON: tileset.json or .gltf
    Json,
    Glb,
    B3dm,
    I3dm,
    Pnts,
    Cmpt,
}

impl ContainerKind {
    pub const BINARY: [ContainerKind; 5] = [
        ContainerKind::Glb,
        ContainerKind::B3dm,
        ContainerKind::I3dm,
        ContainerKind::Pnts,
        ContainerKind::Cmpt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Glb => "glb",
            Self::B3dm => "b3dm",
            Self::I3dm => "i3dm",
            Self::Pnts => "pnts",
            Self::Cmpt => "cmpt",
        }
    }

    /// Reserved 4-byte tag, `None` for JSON
    pub fn magic(self) -> Option<&'static [u8; 4]> {
        match self {
            Self::Json => None,
            Self::Glb => Some(b"glTF"),
            Self::B3dm => Some(b"b3dm"),
            Self::I3dm => Some(b"i3dm"),
            Self::Pnts => Some(b"pnts"),
            Self::Cmpt => Some(b"cmpt"),
        }
    }

    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        let tag = bytes.get(0..4)?;
        Self::BINARY
            .into_iter()
            .find(|kind| kind.magic().map_or(false, |m| m.as_slice() == tag))
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" | "gltf" => Some(Self::Json),
            "glb" => Some(Self::Glb),
            "b3dm" => Some(Self::B3dm),
            "i3dm" => Some(Self::I3dm),
            "pnts" => Some(Self::Pnts),
            "cmpt" => Some(Self::Cmpt),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Tile formats whose content lives in feature/batch table chunks
    pub fn is_tile_format(self) -> bool {
        matches!(self, Self::B3dm | Self::I3dm | Self::Pnts | Self::Cmpt)
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One named header field after magic and version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: &'static str,
    pub value: u32,
    /// Part of the byte-identical identity (format flags), as opposed to a derived length
    pub identity: bool,
}

/// Fixed-size container header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub byte_length: u32,
    pub fields: Vec<HeaderField>,
}

impl ContainerHeader {
    pub fn new(magic: [u8; 4], version: u32, byte_length: u32) -> Self {
        Self { magic, version, byte_length, fields: Vec::new() }
    }

    pub fn with_length(mut self, name: &'static str, value: u32) -> Self {
        self.fields.push(HeaderField { name, value, identity: false });
        self
    }

    pub fn with_flag(mut self, name: &'static str, value: u32) -> Self {
        self.fields.push(HeaderField { name, value, identity: true });
        self
    }

    pub fn field(&self, name: &str) -> Option<u32> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.value)
    }

    /// Raw little-endian encoding of magic, version and identity flags.
    ///
    /// Length fields are excluded: they are derived from chunk content, which the
    /// diff engine compares on its own.
    pub fn identity_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12);
        out.extend_from_slice(&self.magic);
        out.extend_from_slice(&self.version.to_le_bytes());
        for field in self.fields.iter().filter(|f| f.identity) {
            out.extend_from_slice(&field.value.to_le_bytes());
        }
        out
    }

    pub fn magic_str(&self) -> String {
        String::from_utf8_lossy(&self.magic).into_owned()
    }
}

/// Body of a named chunk
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkBody {
    Node(Node),
    Document(Box<Document>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub name: String,
    pub body: ChunkBody,
}

impl Chunk {
    pub fn node(name: impl Into<String>, node: Node) -> Self {
        Self { name: name.into(), body: ChunkBody::Node(node) }
    }

    pub fn document(name: impl Into<String>, doc: Document) -> Self {
        Self { name: name.into(), body: ChunkBody::Document(Box::new(doc)) }
    }
}

/// Decoded form of one file
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub kind: ContainerKind,
    /// File the document was read from, if any
    pub source: Option<PathBuf>,
    pub header: Option<ContainerHeader>,
    /// JSON tree for `.json` files and GLB; `None` for tile containers
    pub root: Option<Node>,
    pub chunks: Vec<Chunk>,
}

impl Document {
    pub fn new(kind: ContainerKind) -> Self {
        Self { kind, source: None, header: None, root: None, chunks: Vec::new() }
    }

    /// Document wrapping a plain JSON tree
    pub fn json(root: Node) -> Self {
        Self { root: Some(root), ..Self::new(ContainerKind::Json) }
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn chunk(&self, name: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.name == name)
    }

    pub fn chunk_node(&self, name: &str) -> Option<&Node> {
        match &self.chunk(name)?.body {
            ChunkBody::Node(node) => Some(node),
            ChunkBody::Document(_) => None,
        }
    }

    pub fn nested(&self, name: &str) -> Option<&Document> {
        match &self.chunk(name)?.body {
            ChunkBody::Document(doc) => Some(doc),
            ChunkBody::Node(_) => None,
        }
    }

    /// Nested documents in chunk order
    pub fn nested_documents(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.chunks.iter().filter_map(|c| match &c.body {
            ChunkBody::Document(doc) => Some((c.name.as_str(), doc.as_ref())),
            ChunkBody::Node(_) => None,
        })
    }

    /// The document holding glTF JSON: itself for JSON/GLB, the embedded GLB for B3DM/I3DM
    pub fn gltf_document(&self) -> Option<&Document> {
        match self.kind {
            ContainerKind::Json | ContainerKind::Glb => self.root.as_ref().map(|_| self),
            ContainerKind::B3dm | ContainerKind::I3dm => self.nested("glb"),
            ContainerKind::Pnts | ContainerKind::Cmpt => None,
        }
    }

    /// `BIN\0` chunk of a GLB document
    pub fn bin_chunk(&self) -> Option<&[u8]> {
        if self.kind != ContainerKind::Glb {
            return None;
        }
        self.chunk_node("binary").and_then(Node::as_bytes)
    }

    /// Name used in reports
    pub fn display_name(&self) -> String {
        self.source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string())
    }
}
