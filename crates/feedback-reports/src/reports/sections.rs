use super::domain::StudentRecord;
use super::layout::{TextFlowCursor, TextStyle};

pub const DATA_SOURCES_LABEL: &str = "Fuentes de Datos Segura";
pub const TEAMWORK_LABEL: &str = "Trabajo en Equipo";
pub const NOTE_LABEL: &str = "Nota:";
pub const GENERAL_NOTES_HEADING: &str = "Notas generales";

const SECTION_GAP: f32 = 4.0;

/// Header, both competency blocks and the optional note for one student.
pub(crate) fn draw_student(cursor: &mut TextFlowCursor, student: &StudentRecord) {
    cursor.with_style(TextStyle::HEADING, |cursor| {
        cursor.draw_block(&student.heading());
    });
    cursor.advance(0, SECTION_GAP);

    cursor.draw_block(&labeled(DATA_SOURCES_LABEL, &student.summary_a));
    cursor.advance(0, SECTION_GAP);
    cursor.draw_block(&labeled(TEAMWORK_LABEL, &student.summary_b));

    if let Some(note) = student.note() {
        cursor.advance(0, SECTION_GAP);
        cursor.with_style(TextStyle::NOTE, |cursor| {
            cursor.draw_block(&format!("{NOTE_LABEL} {note}"));
        });
    }
}

/// Heading plus body, kept on one page when both fit.
pub(crate) fn draw_general_notes(cursor: &mut TextFlowCursor, notes: &str) {
    cursor.skip_line();
    let height = cursor.measure(GENERAL_NOTES_HEADING, TextStyle::HEADING)
        + cursor.measure(notes, TextStyle::BODY);
    if height <= cursor.state().usable_height() {
        cursor.ensure_height(height);
    }
    cursor.with_style(TextStyle::HEADING, |cursor| {
        cursor.draw_block(GENERAL_NOTES_HEADING);
    });
    cursor.draw_block(notes);
}

/// The label line renders even when the body is empty.
fn labeled(label: &str, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("{label}:")
    } else {
        format!("{label}: {body}")
    }
}
