use feedback_reports::reports::download::{deliver, DownloadError, SavedDownload};
use feedback_reports::reports::{
    derive_base_name, export_csv, export_json, render_aggregate, render_per_entity,
    trigger_download, DirectorySink, Downloadable, EvaluationResult, StudentRecord,
};

fn sample() -> EvaluationResult {
    EvaluationResult {
        students: vec![
            StudentRecord::new("Ana Ruiz", "A001").with_summaries("Cita fuentes.", "Colabora."),
            StudentRecord::new("Luis Mora", "A002").with_summaries("Parcial.", "Participa."),
        ],
        notes: None,
    }
}

#[test]
fn upload_name_drives_every_artifact_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = DirectorySink::new(dir.path());
    let base = derive_base_name(Some("Sección A.xlsx"));
    assert_eq!(base, "Sección A");

    let result = sample();
    let document = render_aggregate(&result, &base)
        .expect("renders")
        .expect("document");
    let archive = render_per_entity(&result, &base)
        .expect("renders")
        .finalize()
        .expect("packs");
    let json = export_json(&result, &base).expect("json");
    let csv = export_csv(&result, &base).expect("csv");

    let artifacts: [&dyn Downloadable; 4] = [&document, &archive, &json, &csv];
    let saved: Vec<SavedDownload> = artifacts
        .iter()
        .map(|artifact| deliver(&sink, *artifact).expect("delivered"))
        .collect();

    let names: Vec<&str> = saved.iter().map(|entry| entry.filename.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Sección A_informe2.pdf",
            "Sección A_informes_por_estudiante.zip",
            "Sección A_resultado.json",
            "Sección A_resultado.csv",
        ]
    );
    for (artifact, entry) in artifacts.iter().zip(&saved) {
        let on_disk = std::fs::read(dir.path().join(&entry.filename)).expect("written");
        assert_eq!(on_disk, artifact.bytes());
    }
    assert_eq!(archive.content_type().essence_str(), "application/zip");
    assert_eq!(document.content_type(), mime::APPLICATION_PDF);
}

#[test]
fn unknown_upload_name_falls_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = DirectorySink::new(dir.path());
    let base = derive_base_name(None);
    let json = export_json(&sample(), &base).expect("json");
    let saved = trigger_download(&sink, &json.bytes, &json.suggested_filename).expect("saved");
    assert_eq!(saved.filename, "retroalimentacion_resultado.json");
    assert!(dir.path().join("retroalimentacion_resultado.json").exists());
}

#[test]
fn rejected_name_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = DirectorySink::new(dir.path());
    assert!(trigger_download(&sink, b"x", "../escape.pdf").is_err());
    let leftovers = std::fs::read_dir(dir.path()).expect("listable").count();
    assert_eq!(leftovers, 0);
}

#[test]
fn failed_persist_leaves_no_staged_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let occupied = dir.path().join("curso1_informe2.pdf");
    std::fs::create_dir(&occupied).expect("dir");
    std::fs::write(occupied.join("previo.pdf"), b"x").expect("file");
    let sink = DirectorySink::new(dir.path());

    // Listed while the error is still alive.
    let err = trigger_download(&sink, b"%PDF", "curso1_informe2.pdf")
        .expect_err("target is a directory");
    let names: Vec<String> = std::fs::read_dir(dir.path())
        .expect("listable")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    assert!(matches!(err, DownloadError::Persist { .. }));
    assert!(names.iter().all(|name| !name.starts_with(".tmp")), "{names:?}");
    assert_eq!(names, vec!["curso1_informe2.pdf"]);
    drop(err);
}
