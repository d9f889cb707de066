//! Turns an [`EvaluationResult`] into paginated PDF reports and ZIP bundles.

pub mod aggregate;
mod appendix;
pub mod archive;
pub mod domain;
pub mod download;
pub mod export;
pub mod layout;
pub mod pdf;
pub mod per_student;
pub mod progress;
mod sections;

pub use aggregate::{render_aggregate, AggregateRenderer};
pub use appendix::{APPENDIX_PARAGRAPHS, APPENDIX_TITLE};
pub use archive::{sanitize, Archive, ArchiveEntry, PackedArchive};
pub use domain::{EvaluationResult, StudentRecord};
pub use download::{derive_base_name, trigger_download, DirectorySink, DownloadSink, Downloadable};
pub use export::{export_csv, export_json, RenderedExport};
pub use per_student::{render_per_entity, PerStudentRenderer};
pub use progress::{ProgressPhase, ProgressSettings, UploadProgress};
pub use sections::{
    DATA_SOURCES_LABEL, GENERAL_NOTES_HEADING, NOTE_LABEL, TEAMWORK_LABEL,
};

use crate::config::ReportConfig;
use layout::{LaidOutDocument, LayoutError, PageGeometry};
use pdf::PdfError;

/// Base name used when the uploaded file name is unknown.
pub const DEFAULT_BASE_NAME: &str = "retroalimentacion";
pub const DOCUMENT_EXTENSION: &str = "pdf";

/// Page and serialization settings shared by both renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub geometry: PageGeometry,
    pub compress: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::default(),
            compress: true,
        }
    }
}

impl From<&ReportConfig> for RenderSettings {
    fn from(config: &ReportConfig) -> Self {
        Self {
            geometry: PageGeometry::for_size(config.page_size),
            compress: config.compress,
        }
    }
}

/// A finished PDF plus the layout it was serialized from.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub suggested_filename: String,
    pub layout: LaidOutDocument,
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.layout.page_count()
    }

    /// Text of every drawn line, for previews and assertions.
    pub fn text(&self) -> String {
        self.layout.plain_text()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderFailure {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Pdf(#[from] PdfError),
}

#[derive(Debug, thiserror::Error)]
pub enum PackagingFailure {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportFailure {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures surfaced to the caller as a single "could not generate" message.
/// An empty result is not an error.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to render report: {0}")]
    Render(#[from] RenderFailure),
    #[error("failed to package reports: {0}")]
    Packaging(#[from] PackagingFailure),
    #[error("failed to export results: {0}")]
    Export(#[from] ExportFailure),
}

impl From<LayoutError> for ReportError {
    fn from(err: LayoutError) -> Self {
        Self::Render(RenderFailure::Layout(err))
    }
}

impl From<PdfError> for ReportError {
    fn from(err: PdfError) -> Self {
        Self::Render(RenderFailure::Pdf(err))
    }
}
