use super::appendix::{APPENDIX_PARAGRAPHS, APPENDIX_TITLE};
use super::archive::Archive;
use super::domain::{EvaluationResult, StudentRecord};
use super::download::student_entry_filename;
use super::layout::{TextFlowCursor, TextStyle};
use super::pdf::{write_pdf, PdfOptions};
use super::sections::draw_student;
use super::{RenderSettings, RenderedDocument, ReportError};
use tracing::{debug, info};

const PARAGRAPH_GAP: f32 = 6.0;

/// Renders one standalone document per student, each closed by the shared
/// appendix. Every document gets its own layout state.
#[derive(Debug, Clone, Default)]
pub struct PerStudentRenderer {
    settings: RenderSettings,
}

impl PerStudentRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn render_student(
        &self,
        student: &StudentRecord,
        base_name: &str,
    ) -> Result<RenderedDocument, ReportError> {
        let mut cursor = TextFlowCursor::new(self.settings.geometry, TextStyle::BODY)?;
        draw_student(&mut cursor, student);
        draw_appendix(&mut cursor);

        let layout = cursor.finish();
        let options = PdfOptions {
            title: format!("Informe de retroalimentación - {}", student.heading()),
            compress: self.settings.compress,
        };
        let bytes = write_pdf(&layout, &options)?;
        let suggested_filename = student_entry_filename(base_name, student);
        debug!(filename = %suggested_filename, pages = layout.page_count(), "student report rendered");

        Ok(RenderedDocument {
            bytes,
            suggested_filename,
            layout,
        })
    }

    /// Renders every student and collects the documents into an archive.
    /// An empty result yields an empty archive.
    pub fn render_all(
        &self,
        result: &EvaluationResult,
        base_name: &str,
    ) -> Result<Archive, ReportError> {
        let mut archive = Archive::new(base_name);
        for student in &result.students {
            let document = self.render_student(student, base_name)?;
            archive.add(student, document);
        }
        info!(base_name, entries = archive.len(), "per-student reports rendered");
        Ok(archive)
    }
}

pub fn render_per_entity(result: &EvaluationResult, base_name: &str) -> Result<Archive, ReportError> {
    PerStudentRenderer::default().render_all(result, base_name)
}

fn draw_appendix(cursor: &mut TextFlowCursor) {
    cursor.skip_line();
    let title_height = cursor.measure(APPENDIX_TITLE, TextStyle::TITLE);
    let first_line = TextStyle::BODY.line_height();
    cursor.ensure_height(title_height + first_line);
    cursor.with_style(TextStyle::TITLE, |cursor| {
        cursor.draw_block(APPENDIX_TITLE);
    });
    for paragraph in APPENDIX_PARAGRAPHS {
        cursor.advance(0, PARAGRAPH_GAP);
        cursor.draw_block(paragraph);
    }
}
