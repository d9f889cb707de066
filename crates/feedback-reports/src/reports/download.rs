//! File naming for every artifact and the hand-off of finished bytes to a
//! destination.

use super::archive::{sanitize, PackedArchive};
use super::domain::StudentRecord;
use super::export::RenderedExport;
use super::{RenderedDocument, DEFAULT_BASE_NAME, DOCUMENT_EXTENSION};
use mime::Mime;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Base name of an uploaded file: last path component with its final
/// extension removed. Falls back to [`DEFAULT_BASE_NAME`] when nothing is left.
pub fn derive_base_name(source_filename: Option<&str>) -> String {
    derive_base_name_or(source_filename, DEFAULT_BASE_NAME)
}

pub fn derive_base_name_or(source_filename: Option<&str>, fallback: &str) -> String {
    let Some(raw) = source_filename else {
        return fallback.to_string();
    };
    let file = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let stem = match file.rfind('.') {
        Some(dot) if dot + 1 < file.len() => &file[..dot],
        _ => file,
    };
    if stem.trim().is_empty() {
        fallback.to_string()
    } else {
        stem.to_string()
    }
}

pub fn aggregate_filename(base_name: &str, student_count: usize) -> String {
    format!("{base_name}_informe{student_count}.{DOCUMENT_EXTENSION}")
}

pub fn student_entry_filename(base_name: &str, student: &StudentRecord) -> String {
    format!(
        "{base_name}_{}_{}.{DOCUMENT_EXTENSION}",
        sanitize(&student.name),
        student.id
    )
}

pub fn archive_filename(base_name: &str) -> String {
    format!("{base_name}_informes_por_estudiante.zip")
}

pub fn json_export_filename(base_name: &str) -> String {
    format!("{base_name}_resultado.json")
}

pub fn csv_export_filename(base_name: &str) -> String {
    format!("{base_name}_resultado.csv")
}

/// `Content-Disposition` value for an attachment. The quoted name is an ASCII
/// fallback; non-ASCII names are also sent percent-encoded as `filename*`.
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|ch| match ch {
            '"' | '\\' => '_',
            ch if ch.is_control() || !ch.is_ascii() => '_',
            ch => ch,
        })
        .collect();
    if filename.is_ascii() {
        return format!("attachment; filename=\"{fallback}\"");
    }
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        percent_encode(filename)
    )
}

fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-' | b'_' | b'~') {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

/// Anything that can be handed to a [`DownloadSink`].
pub trait Downloadable {
    fn filename(&self) -> &str;
    fn bytes(&self) -> &[u8];
    fn content_type(&self) -> Mime;
}

impl Downloadable for RenderedDocument {
    fn filename(&self) -> &str {
        &self.suggested_filename
    }

    fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn content_type(&self) -> Mime {
        mime::APPLICATION_PDF
    }
}

impl Downloadable for PackedArchive {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn content_type(&self) -> Mime {
        "application/zip"
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM)
    }
}

impl Downloadable for RenderedExport {
    fn filename(&self) -> &str {
        &self.suggested_filename
    }

    fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn content_type(&self) -> Mime {
        self.content_type.clone()
    }
}

#[derive(Debug)]
pub enum DownloadError {
    InvalidFilename(String),
    Io { path: PathBuf, source: std::io::Error },
    Persist { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::InvalidFilename(name) => write!(f, "invalid download filename '{name}'"),
            DownloadError::Io { path, source } => {
                write!(f, "failed to write {}: {source}", path.display())
            }
            DownloadError::Persist { path, source } => {
                write!(f, "failed to persist download to {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for DownloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DownloadError::InvalidFilename(_) => None,
            DownloadError::Io { source, .. } => Some(source),
            DownloadError::Persist { source, .. } => Some(source),
        }
    }
}

/// Where a finished download was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDownload {
    pub filename: String,
    pub location: Option<PathBuf>,
    pub size: usize,
}

/// Destination for finished bytes: a directory, an HTTP response, a browser.
pub trait DownloadSink {
    fn deliver(&self, bytes: &[u8], filename: &str) -> Result<SavedDownload, DownloadError>;
}

/// Writes downloads into a directory. Files appear atomically: bytes go to a
/// temporary file in the same directory which is then renamed into place.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> DownloadError {
        DownloadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&self, bytes: &[u8], filename: &str) -> Result<SavedDownload, DownloadError> {
        validate_filename(filename)?;
        std::fs::create_dir_all(&self.root).map_err(|err| self.io_error(&self.root, err))?;

        let target = self.root.join(filename);
        let mut staged =
            NamedTempFile::new_in(&self.root).map_err(|err| self.io_error(&self.root, err))?;
        staged
            .write_all(bytes)
            .and_then(|()| staged.flush())
            .map_err(|err| self.io_error(staged.path(), err))?;
        // The staged file is dropped, and so removed, before the error escapes.
        staged.persist(&target).map_err(|err| DownloadError::Persist {
            path: target.clone(),
            source: err.error,
        })?;

        Ok(SavedDownload {
            filename: filename.to_string(),
            location: Some(target),
            size: bytes.len(),
        })
    }
}

fn validate_filename(filename: &str) -> Result<(), DownloadError> {
    let invalid = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\', '\0']);
    if invalid {
        Err(DownloadError::InvalidFilename(filename.to_string()))
    } else {
        Ok(())
    }
}

/// Hands `bytes` to `sink` under `filename`.
pub fn trigger_download(
    sink: &dyn DownloadSink,
    bytes: &[u8],
    filename: &str,
) -> Result<SavedDownload, DownloadError> {
    let saved = sink.deliver(bytes, filename)?;
    info!(filename, size = saved.size, "download delivered");
    Ok(saved)
}

/// [`trigger_download`] for a rendered artifact under its own name.
pub fn deliver(
    sink: &dyn DownloadSink,
    artifact: &dyn Downloadable,
) -> Result<SavedDownload, DownloadError> {
    trigger_download(sink, artifact.bytes(), artifact.filename())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_last_extension_only() {
        assert_eq!(derive_base_name(Some("curso1.xlsx")), "curso1");
        assert_eq!(derive_base_name(Some("notas.final.xlsx")), "notas.final");
        assert_eq!(derive_base_name(Some("sin_extension")), "sin_extension");
        assert_eq!(derive_base_name(Some("punto_final.")), "punto_final.");
        assert_eq!(derive_base_name(Some("C:\\datos\\curso2.xls")), "curso2");
        assert_eq!(derive_base_name(Some("carpeta/curso3.csv")), "curso3");
    }

    #[test]
    fn base_name_falls_back_when_nothing_is_left() {
        assert_eq!(derive_base_name(None), DEFAULT_BASE_NAME);
        assert_eq!(derive_base_name(Some("")), DEFAULT_BASE_NAME);
        assert_eq!(derive_base_name(Some(".xlsx")), DEFAULT_BASE_NAME);
        assert_eq!(derive_base_name(Some("carpeta/")), DEFAULT_BASE_NAME);
        assert_eq!(derive_base_name_or(None, "informe"), "informe");
    }

    #[test]
    fn artifact_names() {
        let student = StudentRecord::new("José Pérez", "2024/07");
        assert_eq!(aggregate_filename("curso", 12), "curso_informe12.pdf");
        assert_eq!(
            student_entry_filename("curso", &student),
            "curso_José_Pérez_2024/07.pdf"
        );
        assert_eq!(archive_filename("curso"), "curso_informes_por_estudiante.zip");
        assert_eq!(json_export_filename("curso"), "curso_resultado.json");
        assert_eq!(csv_export_filename("curso"), "curso_resultado.csv");
    }

    #[test]
    fn content_disposition_quotes_filename() {
        assert_eq!(
            content_disposition("curso_informe2.pdf"),
            "attachment; filename=\"curso_informe2.pdf\""
        );
        assert_eq!(
            content_disposition("a\"b\\c.pdf"),
            "attachment; filename=\"a_b_c.pdf\""
        );
        assert_eq!(
            content_disposition("Sección A_informe1.pdf"),
            "attachment; filename=\"Secci_n A_informe1.pdf\"; \
             filename*=UTF-8''Secci%C3%B3n%20A_informe1.pdf"
        );
    }

    #[test]
    fn directory_sink_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = DirectorySink::new(dir.path().join("salida"));
        let saved = trigger_download(&sink, b"%PDF-1.7", "curso_informe1.pdf").expect("saved");
        let path = saved.location.expect("location");
        assert_eq!(path, dir.path().join("salida").join("curso_informe1.pdf"));
        assert_eq!(std::fs::read(path).expect("readable"), b"%PDF-1.7");
        assert_eq!(saved.size, 8);
    }

    #[test]
    fn directory_sink_overwrites_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = DirectorySink::new(dir.path());
        trigger_download(&sink, b"uno", "a.json").expect("first");
        trigger_download(&sink, b"dos", "a.json").expect("second");
        assert_eq!(std::fs::read(dir.path().join("a.json")).expect("readable"), b"dos");
    }

    #[test]
    fn failed_persist_removes_staged_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let occupied = dir.path().join("curso_informe1.pdf");
        std::fs::create_dir(&occupied).expect("dir");
        std::fs::write(occupied.join("dentro.txt"), b"x").expect("file");
        let sink = DirectorySink::new(dir.path());

        let err = trigger_download(&sink, b"abc", "curso_informe1.pdf")
            .expect_err("target taken");
        assert!(matches!(err, DownloadError::Persist { .. }));
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .expect("listable")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["curso_informe1.pdf"]);
    }

    #[test]
    fn directory_sink_rejects_path_like_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = DirectorySink::new(dir.path());
        for name in ["", "..", "../fuera.pdf", "curso_2024/07.pdf"] {
            let err = trigger_download(&sink, b"x", name).expect_err("rejected");
            assert!(matches!(err, DownloadError::InvalidFilename(_)), "{name}");
        }
    }
}
