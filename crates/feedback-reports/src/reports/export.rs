use super::domain::EvaluationResult;
use super::download::{csv_export_filename, json_export_filename};
use super::{ExportFailure, ReportError};
use mime::Mime;
use tracing::info;

const CSV_HEADERS: [&str; 5] = [
    "name",
    "matricula",
    "summary_fuentes_datos_segura",
    "summary_trabajo_en_equipo",
    "notes",
];

/// Raw result serialized for download, with the content type to serve it as.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedExport {
    pub bytes: Vec<u8>,
    pub suggested_filename: String,
    pub content_type: Mime,
}

/// Pretty-printed JSON using the processing service's field names.
pub fn export_json(result: &EvaluationResult, base_name: &str) -> Result<RenderedExport, ReportError> {
    let bytes = serde_json::to_vec_pretty(result).map_err(ExportFailure::Json)?;
    let suggested_filename = json_export_filename(base_name);
    info!(filename = %suggested_filename, size = bytes.len(), "json export ready");
    Ok(RenderedExport {
        bytes,
        suggested_filename,
        content_type: mime::APPLICATION_JSON,
    })
}

/// One row per student in input order. Absent notes become an empty cell.
pub fn export_csv(result: &EvaluationResult, base_name: &str) -> Result<RenderedExport, ReportError> {
    let bytes = write_rows(result)?;
    let suggested_filename = csv_export_filename(base_name);
    info!(
        filename = %suggested_filename,
        rows = result.students.len(),
        "csv export ready"
    );
    Ok(RenderedExport {
        bytes,
        suggested_filename,
        content_type: mime::TEXT_CSV_UTF_8,
    })
}

fn write_rows(result: &EvaluationResult) -> Result<Vec<u8>, ExportFailure> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;
    for student in &result.students {
        writer.write_record([
            student.name.as_str(),
            student.id.as_str(),
            student.summary_a.as_str(),
            student.summary_b.as_str(),
            student.notes.as_deref().unwrap_or_default(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|err| ExportFailure::Io(err.into_error()))
}
