//! Tolerance-aware structural diff
//!
//! [`compare`] walks two decoded documents in lockstep and reports every structural or value
//! difference under a [`Policy`]. Object keys are compared as sets, arrays positionally, floats
//! with an absolute tolerance, and binary spans by length and then content.

mod policy;
mod report;

pub use policy::{Policy, PolicyError, DEFAULT_TOLERANCE};
pub use report::{DiffItem, DiffKind, DiffReport, DirDiffReport, FileDiff, FileOutcome};

use log::{info, warn};
use std::collections::BTreeSet;
use std::path::Path;

use crate::document::{ChunkBody, ContainerHeader, Document, Node};
use crate::error::Result;
use crate::tiles3d::{find_content_files, load_document};

/// Longest value preview stored in a [`DiffItem`]
const PREVIEW_CHARS: usize = 160;
const MISSING: &str = "<missing>";

/// Compare two documents. Pure; never fails.
pub fn compare(a: &Document, b: &Document, policy: &Policy) -> DiffReport {
    let mut walker = Walker::new(policy);
    walker.document("", a, b);

    let report = DiffReport {
        file1: a.display_name(),
        file2: b.display_name(),
        container_kind: a.kind,
        identical: walker.differences.is_empty(),
        total_items: walker.total,
        matched_items: walker.matched,
        tolerance_matched: walker.tolerance_matched,
        differences: walker.differences,
        tolerance_diffs: walker.tolerance_diffs,
    };
    info!("compare {} vs {}: {}", report.file1, report.file2, report.summary());
    report
}

/// Decode both files, then compare. A decode failure on either side aborts before any diff.
pub fn compare_files<P: AsRef<Path>, Q: AsRef<Path>>(a: P, b: Q, policy: &Policy) -> Result<DiffReport> {
    let doc_a = load_document(a)?;
    let doc_b = load_document(b)?;
    Ok(compare(&doc_a, &doc_b, policy))
}

/// Pair the decodable files of two trees by relative path and compare each pair.
///
/// A file present in only one tree is reported in `unmatched`; a pair where either side fails to
/// decode is recorded as [`FileOutcome::Failed`] and the walk continues. Only an unreadable root
/// directory is an error.
pub fn compare_dirs<P: AsRef<Path>, Q: AsRef<Path>>(a: P, b: Q, policy: &Policy) -> Result<DirDiffReport> {
    let (a, b) = (a.as_ref(), b.as_ref());
    let files_a = find_content_files(a)?;
    let files_b = find_content_files(b)?;

    let mut unmatched = Vec::new();
    for (name, path) in files_a.iter().filter(|(name, _)| !files_b.contains_key(*name)) {
        unmatched.push(one_sided_file(name, path.display().to_string(), MISSING.into(), true));
    }
    for (name, path) in files_b.iter().filter(|(name, _)| !files_a.contains_key(*name)) {
        unmatched.push(one_sided_file(name, MISSING.into(), path.display().to_string(), false));
    }

    let mut files = Vec::new();
    for (name, path_a) in &files_a {
        let Some(path_b) = files_b.get(name) else { continue };
        let outcome = match compare_files(path_a, path_b, policy) {
            Ok(report) => FileOutcome::Compared(report),
            Err(err) => {
                warn!("{}: {}", name, err);
                FileOutcome::Failed(err.to_string())
            }
        };
        files.push(FileDiff { path: name.clone(), outcome });
    }

    let report = DirDiffReport {
        dir1: a.display().to_string(),
        dir2: b.display().to_string(),
        identical: unmatched.is_empty() && files.iter().all(FileDiff::is_identical),
        unmatched,
        files,
    };
    info!("compare {} vs {}: {}", report.dir1, report.dir2, report.summary());
    Ok(report)
}

fn one_sided_file(name: &str, value1: String, value2: String, in_first: bool) -> DiffItem {
    DiffItem {
        path: String::new(),
        field: name.to_string(),
        value1,
        value2,
        kind: DiffKind::Different,
        message: Some(one_sided_message(in_first)),
    }
}

/// Slash-join a path segment
pub(crate) fn join(path: &str, segment: &str) -> String {
    match (path.is_empty(), segment.is_empty()) {
        (true, _) => segment.to_string(),
        (false, true) => path.to_string(),
        (false, false) => format!("{}/{}", path, segment),
    }
}

struct Walker<'p> {
    policy: &'p Policy,
    total: usize,
    matched: usize,
    tolerance_matched: usize,
    differences: Vec<DiffItem>,
    tolerance_diffs: Vec<DiffItem>,
}

impl<'p> Walker<'p> {
    fn new(policy: &'p Policy) -> Self {
        Self {
            policy,
            total: 0,
            matched: 0,
            tolerance_matched: 0,
            differences: Vec::new(),
            tolerance_diffs: Vec::new(),
        }
    }

    fn matched(&mut self) {
        self.total += 1;
        self.matched += 1;
    }

    fn differ(
        &mut self,
        path: &str,
        field: &str,
        value1: String,
        value2: String,
        message: Option<String>,
    ) {
        self.total += 1;
        self.differences.push(DiffItem {
            path: path.to_string(),
            field: field.to_string(),
            value1,
            value2,
            kind: DiffKind::Different,
            message,
        });
    }

    fn document(&mut self, path: &str, a: &Document, b: &Document) {
        if a.kind != b.kind {
            self.differ(
                path,
                "container",
                a.kind.to_string(),
                b.kind.to_string(),
                Some("container kinds differ".into()),
            );
            return;
        }

        match (&a.header, &b.header) {
            (Some(ha), Some(hb)) => self.header(&join(path, "header"), ha, hb),
            (None, None) => {}
            (ha, hb) => self.differ(
                path,
                "header",
                ha.as_ref().map_or(MISSING.into(), header_display),
                hb.as_ref().map_or(MISSING.into(), header_display),
                Some(one_sided_message(ha.is_some())),
            ),
        }

        match (&a.root, &b.root) {
            (Some(ra), Some(rb)) => self.node(path, ra, rb),
            (None, None) => {}
            (ra, rb) => self.differ(
                path,
                "root",
                ra.as_ref().map_or(MISSING.into(), |n| n.preview(PREVIEW_CHARS)),
                rb.as_ref().map_or(MISSING.into(), |n| n.preview(PREVIEW_CHARS)),
                Some(one_sided_message(ra.is_some())),
            ),
        }

        for chunk in &a.chunks {
            let chunk_path = join(path, &chunk.name);
            match b.chunk(&chunk.name) {
                Some(other) => self.chunk(&chunk_path, &chunk.body, &other.body),
                None => {
                    self.differ(path, &chunk.name, body_display(&chunk.body), MISSING.into(), Some(one_sided_message(true)))
                }
            }
        }
        for chunk in b.chunks.iter().filter(|c| a.chunk(&c.name).is_none()) {
            self.differ(path, &chunk.name, MISSING.into(), body_display(&chunk.body), Some(one_sided_message(false)));
        }
    }

    /// Identity bytes compared raw and atomically
    fn header(&mut self, path: &str, a: &ContainerHeader, b: &ContainerHeader) {
        if a.identity_bytes() == b.identity_bytes() {
            self.matched();
        } else {
            self.differ(
                path,
                "bytes",
                header_display(a),
                header_display(b),
                Some("header identity bytes differ".into()),
            );
        }
    }

    fn chunk(&mut self, path: &str, a: &ChunkBody, b: &ChunkBody) {
        match (a, b) {
            (ChunkBody::Node(na), ChunkBody::Node(nb)) => self.node(path, na, nb),
            (ChunkBody::Document(da), ChunkBody::Document(db)) => self.document(path, da, db),
            _ => self.differ(
                path,
                "type",
                body_kind(a).to_string(),
                body_kind(b).to_string(),
                Some("type mismatch".into()),
            ),
        }
    }

    fn node(&mut self, path: &str, a: &Node, b: &Node) {
        match (a, b) {
            (Node::Object(ma), Node::Object(mb)) => {
                let keys_a: BTreeSet<&str> =
                    ma.keys().map(String::as_str).filter(|k| !self.policy.is_ignored(k)).collect();
                let keys_b: BTreeSet<&str> =
                    mb.keys().map(String::as_str).filter(|k| !self.policy.is_ignored(k)).collect();

                for key in keys_a.difference(&keys_b) {
                    let value = ma[*key].preview(PREVIEW_CHARS);
                    self.differ(path, key, value, MISSING.into(), Some(one_sided_message(true)));
                }
                for key in keys_b.difference(&keys_a) {
                    let value = mb[*key].preview(PREVIEW_CHARS);
                    self.differ(path, key, MISSING.into(), value, Some(one_sided_message(false)));
                }
                for key in keys_a.intersection(&keys_b) {
                    self.node(&join(path, key), &ma[*key], &mb[*key]);
                }
            }
            (Node::Array(va), Node::Array(vb)) => {
                if va.len() != vb.len() {
                    self.differ(
                        path,
                        "length",
                        va.len().to_string(),
                        vb.len().to_string(),
                        Some("array lengths differ".into()),
                    );
                }
                for (i, (ea, eb)) in va.iter().zip(vb).enumerate() {
                    self.node(&join(path, &i.to_string()), ea, eb);
                }
            }
            (Node::Float(fa), Node::Float(fb)) => self.float(path, a, b, *fa, *fb),
            (Node::Int(_), Node::Float(_)) | (Node::Float(_), Node::Int(_)) if !self.policy.strict_type_check() => {
                match (a.as_f64(), b.as_f64()) {
                    (Some(fa), Some(fb)) => self.float(path, a, b, fa, fb),
                    _ => self.value(path, a, b, false),
                }
            }
            (Node::Int(ia), Node::Int(ib)) => self.value(path, a, b, ia == ib),
            (Node::Str(sa), Node::Str(sb)) => self.value(path, a, b, sa == sb),
            (Node::Bool(ba), Node::Bool(bb)) => self.value(path, a, b, ba == bb),
            (Node::Null, Node::Null) => self.matched(),
            (Node::Bytes(ba), Node::Bytes(bb)) => self.bytes(path, ba, bb),
            _ => self.differ(
                path,
                "type",
                a.kind().to_string(),
                b.kind().to_string(),
                Some("type mismatch".into()),
            ),
        }
    }

    fn value(&mut self, path: &str, a: &Node, b: &Node, equal: bool) {
        if equal {
            self.matched();
        } else {
            self.differ(path, "value", a.preview(PREVIEW_CHARS), b.preview(PREVIEW_CHARS), None);
        }
    }

    fn float(&mut self, path: &str, a: &Node, b: &Node, fa: f64, fb: f64) {
        if fa == fb || (fa.is_nan() && fb.is_nan()) {
            self.matched();
            return;
        }

        let delta = (fa - fb).abs();
        if delta <= self.policy.float_tolerance() {
            self.matched();
            self.tolerance_matched += 1;
            if self.policy.records_tolerance_diffs() {
                self.tolerance_diffs.push(DiffItem {
                    path: path.to_string(),
                    field: "value".into(),
                    value1: a.preview(PREVIEW_CHARS),
                    value2: b.preview(PREVIEW_CHARS),
                    kind: DiffKind::ToleranceDiff,
                    message: Some(format!("delta {:.2e}", delta)),
                });
            }
        } else {
            self.differ(
                path,
                "value",
                a.preview(PREVIEW_CHARS),
                b.preview(PREVIEW_CHARS),
                Some(format!("delta {:.2e}", delta)),
            );
        }
    }

    fn bytes(&mut self, path: &str, a: &[u8], b: &[u8]) {
        if a.len() != b.len() {
            self.differ(
                path,
                "bytes",
                format!("<{} bytes>", a.len()),
                format!("<{} bytes>", b.len()),
                Some("binary lengths differ".into()),
            );
        } else if let Some(offset) = a.iter().zip(b).position(|(x, y)| x != y) {
            self.differ(
                path,
                "bytes",
                format!("<{} bytes>", a.len()),
                format!("<{} bytes>", b.len()),
                Some(format!("content differs at byte offset {}", offset)),
            );
        } else {
            self.matched();
        }
    }
}

fn one_sided_message(in_first: bool) -> String {
    let side = if in_first { 1 } else { 2 };
    format!("only in file {}", side)
}

fn header_display(header: &ContainerHeader) -> String {
    let mut out = format!("{} v{}", header.magic_str(), header.version);
    for field in header.fields.iter().filter(|f| f.identity) {
        out.push_str(&format!(" {}={}", field.name, field.value));
    }
    out
}

fn body_kind(body: &ChunkBody) -> String {
    match body {
        ChunkBody::Node(node) => node.kind().to_string(),
        ChunkBody::Document(doc) => format!("{} document", doc.kind),
    }
}

fn body_display(body: &ChunkBody) -> String {
    match body {
        ChunkBody::Node(node) => node.preview(PREVIEW_CHARS),
        ChunkBody::Document(doc) => format!("<{} document>", doc.kind),
    }
}
