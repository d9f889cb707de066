use super::domain::StudentRecord;
use super::download::{archive_filename, student_entry_filename};
use super::{PackagingFailure, RenderedDocument, ReportError};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Characters kept as-is in file names; everything else becomes `_`.
pub fn is_filename_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            '_' | '-'
                | 'á' | 'é' | 'í' | 'ó' | 'ú' | 'ü' | 'ñ'
                | 'Á' | 'É' | 'Í' | 'Ó' | 'Ú' | 'Ü' | 'Ñ'
        )
}

/// One `_` per disallowed character, no collapsing. Idempotent.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|ch| if is_filename_safe(ch) { ch } else { '_' })
        .collect()
}

/// Whether an entry name stays inside the extraction directory: relative,
/// no `..` component, no drive prefix or backslash separators.
pub fn is_enclosed_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('/')
        && !name.contains(['\\', ':', '\0'])
        && name.split('/').all(|component| component != "..")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Per-student documents waiting to be packed. Entry names are unique.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    base_name: String,
    entries: Vec<ArchiveEntry>,
    names: HashSet<String>,
}

impl Archive {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            ..Self::default()
        }
    }

    /// Adds a student's document under `{base}_{name}_{id}.pdf`, suffixed
    /// with `_2`, `_3`, ... when that name is taken. Returns the final name.
    pub fn add(&mut self, student: &StudentRecord, document: RenderedDocument) -> &str {
        let candidate = student_entry_filename(&self.base_name, student);
        self.insert(candidate, document.bytes)
    }

    pub fn insert(&mut self, candidate: String, bytes: Vec<u8>) -> &str {
        let filename = self.unique_name(candidate);
        if !is_enclosed_name(&filename) {
            warn!(filename = %filename, "archive entry escapes the archive root when extracted");
        }
        debug!(filename = %filename, size = bytes.len(), "archive entry added");
        self.names.insert(filename.clone());
        self.entries.push(ArchiveEntry { filename, bytes });
        match self.entries.last() {
            Some(entry) => entry.filename.as_str(),
            None => "",
        }
    }

    fn unique_name(&self, candidate: String) -> String {
        if !self.names.contains(&candidate) {
            return candidate;
        }
        let (stem, extension) = match candidate.rfind('.') {
            Some(dot) if dot > 0 => candidate.split_at(dot),
            _ => (candidate.as_str(), ""),
        };
        let unique = (2..)
            .map(|counter| format!("{stem}_{counter}{extension}"))
            .find(|name| !self.names.contains(name))
            .unwrap_or_else(|| candidate.clone());
        warn!(original = %candidate, renamed = %unique, "archive entry name collision");
        unique
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn entry_names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.filename.clone()).collect()
    }

    pub fn filename(&self) -> String {
        archive_filename(&self.base_name)
    }

    /// Writes every entry into one Deflate ZIP. Either all entries are packed
    /// or an error is returned and no bytes escape.
    pub fn finalize(self) -> Result<PackedArchive, ReportError> {
        let filename = self.filename();
        let bytes = pack_entries(&self.entries).map_err(ReportError::Packaging)?;
        let entry_names = self.entry_names();
        info!(
            filename = %filename,
            entries = entry_names.len(),
            size = bytes.len(),
            "archive packed"
        );
        Ok(PackedArchive {
            bytes,
            filename,
            entry_names,
        })
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644)
}

fn pack_entries(entries: &[ArchiveEntry]) -> Result<Vec<u8>, PackagingFailure> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        writer.start_file(entry.filename.as_str(), entry_options())?;
        writer.write_all(&entry.bytes)?;
    }
    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

/// Finished ZIP buffer with the names it contains.
#[derive(Debug, Clone)]
pub struct PackedArchive {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub entry_names: Vec<String>,
}
