//! Structural diff and pre-rendering validation for 3D Tiles and glTF assets.
//!
//! Files are decoded into a uniform [`Document`] tree ([`tiles3d`]), compared under a tolerance
//! [`Policy`] ([`diff`]) or checked against rendering rules ([`validate`]).

pub mod config;
pub mod diff;
pub mod document;
pub mod error;
pub mod tiles3d;
pub mod validate;

pub use config::{CheckConfig, ConfigError, ModeConfig};
pub use diff::{
    compare, compare_dirs, compare_files, DiffItem, DiffKind, DiffReport, DirDiffReport, FileDiff, FileOutcome, Policy,
    PolicyError,
};
pub use document::{Chunk, ChunkBody, ContainerHeader, ContainerKind, Document, Node, NodeKind};
pub use error::{Error, Result};
pub use tiles3d::{decode, decode_sniffed, find_content_files, load_document, DecodeError, MAX_NESTING_DEPTH};
pub use validate::{
    validate, validate_dir, validate_file, validate_with, DirValidationReport, FileValidation, Severity,
    ValidationIssue, ValidationKind, ValidationOptions, ValidationOutcome, ValidationReport,
};
