use super::domain::EvaluationResult;
use super::download::aggregate_filename;
use super::layout::{TextFlowCursor, TextStyle};
use super::pdf::{write_pdf, PdfOptions};
use super::sections::{draw_general_notes, draw_student};
use super::{RenderSettings, RenderedDocument, ReportError};
use tracing::info;

/// Draws every student of a result into one document, in input order.
#[derive(Debug, Clone, Default)]
pub struct AggregateRenderer {
    settings: RenderSettings,
}

impl AggregateRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    /// Returns `Ok(None)` when the result has no students.
    pub fn render(
        &self,
        result: &EvaluationResult,
        base_name: &str,
    ) -> Result<Option<RenderedDocument>, ReportError> {
        if result.is_empty() {
            info!(base_name, "no students to render");
            return Ok(None);
        }

        let mut cursor = TextFlowCursor::new(self.settings.geometry, TextStyle::BODY)?;
        for (index, student) in result.students.iter().enumerate() {
            if index > 0 {
                cursor.skip_line();
            }
            draw_student(&mut cursor, student);
        }
        if let Some(notes) = result.general_notes() {
            draw_general_notes(&mut cursor, notes);
        }

        let layout = cursor.finish();
        let options = PdfOptions {
            title: format!("Informe de retroalimentación - {base_name}"),
            compress: self.settings.compress,
        };
        let bytes = write_pdf(&layout, &options)?;
        let suggested_filename = aggregate_filename(base_name, result.students.len());

        info!(
            filename = %suggested_filename,
            students = result.students.len(),
            pages = layout.page_count(),
            "aggregate report rendered"
        );

        Ok(Some(RenderedDocument {
            bytes,
            suggested_filename,
            layout,
        }))
    }
}

pub fn render_aggregate(
    result: &EvaluationResult,
    base_name: &str,
) -> Result<Option<RenderedDocument>, ReportError> {
    AggregateRenderer::default().render(result, base_name)
}
