use clap::Args;
use feedback_reports::config::AppConfig;
use feedback_reports::error::AppError;
use feedback_reports::reports::download::{deliver, derive_base_name_or};
use feedback_reports::reports::layout::PageSize;
use feedback_reports::reports::{
    export_csv, export_json, AggregateRenderer, DirectorySink, Downloadable, EvaluationResult,
    PerStudentRenderer, RenderSettings, ReportError, UploadProgress, DATA_SOURCES_LABEL,
    GENERAL_NOTES_HEADING, NOTE_LABEL, TEAMWORK_LABEL,
};
use feedback_reports::telemetry;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;

type Artifact = Box<dyn Downloadable + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenderKind {
    Aggregate,
    PerStudent,
    Json,
    Csv,
}

#[derive(Args, Debug)]
pub(crate) struct RenderArgs {
    /// Evaluation result JSON returned by the processing service
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Name of the uploaded spreadsheet; output names derive from it
    #[arg(long)]
    pub(crate) source_name: Option<String>,
    /// Directory receiving the artifact (defaults to REPORT_OUTPUT_DIR)
    #[arg(long)]
    pub(crate) out_dir: Option<PathBuf>,
    /// Page size override (a4 or letter)
    #[arg(long, value_parser = crate::infra::parse_page_size)]
    pub(crate) page_size: Option<PageSize>,
}

#[derive(Args, Debug)]
pub(crate) struct InspectArgs {
    /// Evaluation result JSON returned by the processing service
    #[arg(long)]
    pub(crate) input: PathBuf,
}

pub(crate) async fn run_render(kind: RenderKind, args: RenderArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let RenderArgs {
        input,
        source_name,
        out_dir,
        page_size,
    } = args;

    let result = load_result(&input)?;
    let base_name =
        derive_base_name_or(source_name.as_deref(), &config.reports.fallback_base_name);
    if result.is_empty() {
        info!(input = %input.display(), "nothing to download");
        println!("Nothing to download: the result has no students.");
        return Ok(());
    }

    let mut reports = config.reports;
    if let Some(size) = page_size {
        reports.page_size = size;
    }
    let settings = RenderSettings::from(&reports);
    let out_dir = out_dir.unwrap_or(reports.output_dir);

    let mut progress = UploadProgress::default();
    let job = tokio::task::spawn_blocking(move || produce(kind, &result, &base_name, settings));
    let Some(artifact) = with_progress(&mut progress, job, print_progress).await? else {
        println!("Nothing to download: the result has no students.");
        return Ok(());
    };
    let finalized_at = Instant::now();

    let sink = DirectorySink::new(out_dir);
    let saved = deliver(&sink, &*artifact)?;

    let clear_delay = progress.settings().clear_delay;
    tokio::time::sleep(clear_delay.saturating_sub(finalized_at.elapsed())).await;
    progress.clear(finalized_at.elapsed());
    print_progress(&progress);

    let location = saved
        .location
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| saved.filename.clone());
    println!("Saved {location} ({} bytes)", saved.size);
    Ok(())
}

pub(crate) fn run_inspect(args: InspectArgs) -> Result<(), AppError> {
    let result = load_result(&args.input)?;
    print!("{}", format_listing(&result));
    Ok(())
}

fn load_result(path: &Path) -> Result<EvaluationResult, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(EvaluationResult::from_json(&raw)?)
}

/// Produces the requested artifact. `None` when there is nothing to render.
pub(crate) fn produce(
    kind: RenderKind,
    result: &EvaluationResult,
    base_name: &str,
    settings: RenderSettings,
) -> Result<Option<Artifact>, ReportError> {
    let artifact: Artifact = match kind {
        RenderKind::Aggregate => match AggregateRenderer::new(settings).render(result, base_name)? {
            Some(document) => Box::new(document),
            None => return Ok(None),
        },
        RenderKind::PerStudent => Box::new(
            PerStudentRenderer::new(settings)
                .render_all(result, base_name)?
                .finalize()?,
        ),
        RenderKind::Json => Box::new(export_json(result, base_name)?),
        RenderKind::Csv => Box::new(export_csv(result, base_name)?),
    };
    Ok(Some(artifact))
}

/// Drives the progress estimate on a timer until `job` finishes, then
/// finalizes on success or resets on failure.
pub(crate) async fn with_progress<T>(
    progress: &mut UploadProgress,
    mut job: JoinHandle<Result<T, ReportError>>,
    mut report: impl FnMut(&UploadProgress),
) -> Result<T, AppError> {
    progress.start()?;
    report(progress);

    let mut interval = tokio::time::interval(progress.settings().tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();

    let joined = loop {
        tokio::select! {
            joined = &mut job => break joined,
            _ = interval.tick() => {
                let now = Instant::now();
                progress.tick(now - last);
                last = now;
                report(progress);
            }
        }
    };

    let outcome = joined
        .map_err(|err| AppError::Io(std::io::Error::other(err)))
        .and_then(|rendered| rendered.map_err(AppError::from));
    match outcome {
        Ok(value) => {
            progress.complete()?;
            report(progress);
            Ok(value)
        }
        Err(err) => {
            progress.fail();
            report(progress);
            Err(err)
        }
    }
}

fn print_progress(progress: &UploadProgress) {
    match progress.percent() {
        Some(percent) => eprint!("\rGenerating... {percent:>3}%"),
        None => eprintln!(),
    }
}

pub(crate) fn format_listing(result: &EvaluationResult) -> String {
    let mut listing = String::new();
    let _ = writeln!(listing, "Students: {}", result.students.len());
    for student in &result.students {
        let _ = writeln!(listing, "\n{}", student.heading());
        let _ = writeln!(listing, "  {DATA_SOURCES_LABEL}: {}", student.summary_a.trim());
        let _ = writeln!(listing, "  {TEAMWORK_LABEL}: {}", student.summary_b.trim());
        if let Some(note) = student.note() {
            let _ = writeln!(listing, "  {NOTE_LABEL} {note}");
        }
    }
    if let Some(notes) = result.general_notes() {
        let _ = writeln!(listing, "\n{GENERAL_NOTES_HEADING}: {}", notes.trim());
    }
    listing
}
