use feedback_reports::reports::{
    render_per_entity, EvaluationResult, PerStudentRenderer, StudentRecord, APPENDIX_PARAGRAPHS,
    APPENDIX_TITLE,
};
use std::io::{Cursor, Read};

fn read_zip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    (0..archive.len())
        .map(|index| {
            let mut entry = archive.by_index(index).expect("entry");
            let mut content = Vec::new();
            entry.read_to_end(&mut content).expect("readable");
            (entry.name().to_string(), content)
        })
        .collect()
}

fn appendix_text(text: &str) -> &str {
    let start = text.find(APPENDIX_TITLE).expect("appendix present");
    &text[start..]
}

#[test]
fn single_student_archive_holds_one_named_entry() {
    let result = EvaluationResult {
        students: vec![StudentRecord::new("Ana Ruiz", "A001")
            .with_summaries("Cita fuentes.", "Coordina tareas.")],
        notes: None,
    };
    let archive = render_per_entity(&result, "curso1").expect("renders");
    assert_eq!(archive.filename(), "curso1_informes_por_estudiante.zip");
    assert_eq!(archive.entry_names(), vec!["curso1_Ana_Ruiz_A001.pdf"]);

    let packed = archive.finalize().expect("packs");
    let entries = read_zip(&packed.bytes);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "curso1_Ana_Ruiz_A001.pdf");
    assert!(entries[0].1.starts_with(b"%PDF-"));
}

#[test]
fn every_document_carries_the_same_appendix() {
    let renderer = PerStudentRenderer::default();
    let first = renderer
        .render_student(&StudentRecord::new("Ana Ruiz", "A001"), "curso1")
        .expect("renders");
    let second = renderer
        .render_student(
            &StudentRecord::new("Luis Mora", "A002")
                .with_summaries("Texto ".repeat(300), "Otro texto.")
                .with_notes("Revisar."),
            "curso1",
        )
        .expect("renders");

    let first_text = first.text();
    let second_text = second.text();
    assert_eq!(appendix_text(&first_text), appendix_text(&second_text));
    let appendix_words: Vec<&str> = APPENDIX_PARAGRAPHS
        .iter()
        .flat_map(|paragraph| paragraph.split_whitespace())
        .collect();
    let drawn_words: Vec<&str> = appendix_text(&first_text)
        .split_whitespace()
        .skip(APPENDIX_TITLE.split_whitespace().count())
        .collect();
    assert_eq!(drawn_words, appendix_words);
}

#[test]
fn entry_count_matches_students_and_names_are_unique() {
    let result = EvaluationResult {
        students: vec![
            StudentRecord::new("Ana Ruiz", "A001"),
            StudentRecord::new("José Muñoz", "A002"),
            StudentRecord::new("Ana Ruiz", "A001"),
            StudentRecord::new("Ana/Ruiz", "A001"),
        ],
        notes: None,
    };
    let packed = render_per_entity(&result, "curso1")
        .expect("renders")
        .finalize()
        .expect("packs");
    assert_eq!(
        packed.entry_names,
        vec![
            "curso1_Ana_Ruiz_A001.pdf",
            "curso1_José_Muñoz_A002.pdf",
            "curso1_Ana_Ruiz_A001_2.pdf",
            "curso1_Ana_Ruiz_A001_3.pdf",
        ]
    );
    let names: Vec<String> = read_zip(&packed.bytes).into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, packed.entry_names);
}

#[test]
fn empty_result_gives_empty_archive() {
    let archive = render_per_entity(&EvaluationResult::default(), "curso1").expect("renders");
    assert!(archive.is_empty());
    let packed = archive.finalize().expect("packs");
    assert!(read_zip(&packed.bytes).is_empty());
}
