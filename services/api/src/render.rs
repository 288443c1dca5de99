use crate::cli::{Cli, ConvertArgs, PredictArgs, ReferenceArgs};
use crate::infra::build_engine;
use clap::error::ErrorKind;
use clap::CommandFactory;
use jee_predictor::config::AppConfig;
use jee_predictor::error::AppError;
use jee_predictor::prediction::{
    format_rank, MarksInput, PredictionDelta, PredictionResult, PredictionSession, SharePayload,
};
use jee_predictor::reference::{CutoffImporter, ReferenceDataError, ReferenceSummary};
use jee_predictor::telemetry::{self, LogOutput};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Serialize)]
struct PredictOutput<'a> {
    prediction: &'a PredictionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    what_if: Option<PredictionDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    share: Option<SharePayload>,
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let Some(request) = args.request() else {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "give --total or all of --physics, --chemistry and --mathematics",
            )
            .exit()
    };

    let mut config = AppConfig::load()?;
    let json = args.json;
    let share = args.share;
    let what_if_total = args.what_if_total;
    args.data.apply(&mut config.prediction);
    telemetry::init(&config.telemetry, LogOutput::Stderr)?;

    let (engine, _) = build_engine(&config.prediction);
    let mut session = PredictionSession::new(engine);
    session.calculate(request)?;

    let what_if = what_if_total
        .map(|total| session.what_if(|request| request.marks = MarksInput::Total { total }))
        .transpose()?;
    let share = if share { session.share_payload() } else { None };
    let Some(prediction) = session.last() else {
        return Ok(());
    };

    if json {
        let output = PredictOutput {
            prediction,
            what_if,
            share,
        };
        println!("{}", to_json(&output)?);
        return Ok(());
    }

    print!("{}", render_prediction(prediction));
    if let Some(delta) = &what_if {
        print!("\n{}", render_delta(delta));
    }
    if let Some(share) = &share {
        println!("\n{}\n{}", share.title, share.text);
    }
    Ok(())
}

pub(crate) fn run_reference(args: ReferenceArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    args.data.apply(&mut config.prediction);
    telemetry::init(&config.telemetry, LogOutput::Stderr)?;

    let (_, loaded) = build_engine(&config.prediction);
    let summary = loaded.summary();
    if args.json {
        println!("{}", to_json(&summary)?);
    } else {
        print!("{}", render_reference(&summary));
    }
    Ok(())
}

pub(crate) fn run_convert(args: ConvertArgs) -> Result<(), AppError> {
    let mut catalog = CutoffImporter::from_path(&args.input).map_err(ReferenceDataError::from)?;
    if let Some(version) = args.version_label {
        catalog.version = version;
    }
    println!("{}", to_json(&catalog)?);
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|err| AppError::Io(err.into()))
}

pub(crate) fn render_prediction(result: &PredictionResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "JEE Main rank prediction");
    let _ = writeln!(
        out,
        "- Marks: {:.0}/{:.0} | Percentile: {:.2}",
        result.total_marks, result.max_marks, result.percentile
    );
    if let Some(subjects) = &result.subject_percentiles {
        let _ = writeln!(
            out,
            "  Physics {:.2} | Chemistry {:.2} | Mathematics {:.2}",
            subjects.physics, subjects.chemistry, subjects.mathematics
        );
    }
    let _ = writeln!(
        out,
        "- Rank: {} of {} ({:?} model)",
        format_rank(result.rank),
        format_rank(result.total_candidates),
        result.rank_model
    );
    if result.category.is_reserved() {
        let _ = writeln!(
            out,
            "- {} rank: {}",
            result.category.label(),
            format_rank(result.category_rank)
        );
    }
    let _ = writeln!(out, "- JEE Advanced: {}", result.eligibility.summary());
    if let Some(session) = &result.session {
        let table = result.session_table.as_deref().unwrap_or("default");
        let _ = writeln!(out, "- Session: {session} (table: {table})");
    }

    if result.colleges.is_empty() {
        let _ = writeln!(out, "No colleges predicted at this rank.");
    } else {
        let _ = writeln!(out, "College shortlist:");
        for college in &result.colleges {
            let quota = if college.home_state_quota { ", home state" } else { "" };
            let _ = writeln!(
                out,
                "  - [{}] {} ({}) {} | closing {} {}{} | your rank {}",
                college.chance.label(),
                college.institution,
                college.class.label(),
                college.branch,
                college.seat_category.label(),
                format_rank(college.closing_rank),
                quota,
                format_rank(college.candidate_rank)
            );
        }
    }
    let _ = writeln!(
        out,
        "Reference data {} | computed {}",
        result.reference_version,
        result.computed_at.format("%Y-%m-%d %H:%M UTC")
    );
    out
}

pub(crate) fn render_delta(delta: &PredictionDelta) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "What if you scored {:.0}? ({:+.0} marks)",
        delta.scenario.total_marks, delta.marks_change
    );
    let _ = writeln!(
        out,
        "- Percentile {:.2} ({:+.2}) | Rank {} ({:+})",
        delta.scenario.percentile,
        delta.percentile_change,
        format_rank(delta.scenario.rank),
        delta.rank_change
    );
    if delta.eligibility_changed {
        let _ = writeln!(out, "- JEE Advanced: {}", delta.scenario.eligibility.summary());
    }
    for college in &delta.gained {
        let _ = writeln!(out, "  + {college}");
    }
    for college in &delta.lost {
        let _ = writeln!(out, "  - {college}");
    }
    out
}

pub(crate) fn render_reference(summary: &ReferenceSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Reference data {}", summary.version);
    let _ = writeln!(out, "- Rank table: {}", summary.rank_table_version);
    let sessions = if summary.sessions.is_empty() {
        "default only".to_string()
    } else {
        summary.sessions.join(", ")
    };
    let _ = writeln!(out, "- Session tables: {sessions}");
    let _ = writeln!(
        out,
        "- Colleges: {} NIT, {} IIIT, {} imported",
        summary.nit_records, summary.iiit_records, summary.imported_records
    );
    let _ = writeln!(out, "Category coefficients / Advanced cutoffs:");
    for (category, coefficient) in &summary.coefficients {
        let cutoff = summary
            .eligibility
            .get(category)
            .map(|value| format!("{value:.2}"))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "  - {}: {coefficient} / {cutoff}", category.label());
    }
    if !summary.fallbacks.is_empty() {
        let files: Vec<&str> = summary.fallbacks.iter().map(|set| set.file_name()).collect();
        let _ = writeln!(out, "Embedded defaults used for: {}", files.join(", "));
    }
    out
}
