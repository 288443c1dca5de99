use crate::infra::DataArgs;
use crate::render::{run_convert, run_predict, run_reference};
use crate::server;
use clap::{Args, Parser, Subcommand};
use jee_predictor::error::AppError;
use jee_predictor::estimation::Category;
use jee_predictor::prediction::{MarksInput, PredictionRequest};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "JEE Main Rank Predictor",
    about = "Estimate percentile, rank, Advanced eligibility and college chances from JEE Main marks",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run one prediction and print the result
    Predict(PredictArgs),
    /// Summarise the loaded reference tables and any fallbacks
    Reference(ReferenceArgs),
    /// Convert a closing-rank CSV export into a cutoff catalog JSON file
    ConvertCutoffs(ConvertArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Physics marks out of 100
    #[arg(long, conflicts_with = "total")]
    pub(crate) physics: Option<f64>,
    /// Chemistry marks out of 100
    #[arg(long, conflicts_with = "total")]
    pub(crate) chemistry: Option<f64>,
    /// Mathematics marks out of 100
    #[arg(long, conflicts_with = "total")]
    pub(crate) mathematics: Option<f64>,
    /// Total marks out of 300, instead of subject marks
    #[arg(long)]
    pub(crate) total: Option<f64>,
    /// Reservation category (general, ews, obc, sc, st, pwd, pwd_obc, ...)
    #[arg(long, default_value = "general")]
    pub(crate) category: Category,
    /// Exam session or shift code, e.g. jan or jan-s1
    #[arg(long)]
    pub(crate) session: Option<String>,
    /// Home state for state-quota seats
    #[arg(long)]
    pub(crate) home_state: Option<String>,
    /// Also show how the result changes at this total
    #[arg(long)]
    pub(crate) what_if_total: Option<f64>,
    /// Print a shareable summary line
    #[arg(long)]
    pub(crate) share: bool,
    /// Print JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

impl PredictArgs {
    /// `None` when neither a total nor all three subject marks were given.
    pub(crate) fn request(&self) -> Option<PredictionRequest> {
        let marks = match (self.total, self.physics, self.chemistry, self.mathematics) {
            (Some(total), _, _, _) => MarksInput::Total { total },
            (None, Some(physics), Some(chemistry), Some(mathematics)) => MarksInput::Subjects {
                physics,
                chemistry,
                mathematics,
            },
            _ => return None,
        };

        Some(PredictionRequest {
            marks,
            category: self.category,
            session: self.session.clone(),
            home_state: self.home_state.clone(),
            total_candidates: None,
        })
    }
}

#[derive(Args, Debug)]
pub(crate) struct ReferenceArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ConvertArgs {
    /// CSV export with Institution, Class, Branch, Location, State,
    /// Category, Quota, Closing Rank and Closing Marks columns
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Version label written into the catalog
    #[arg(long)]
    pub(crate) version_label: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Predict(args) => run_predict(args),
        Command::Reference(args) => run_reference(args),
        Command::ConvertCutoffs(args) => run_convert(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("jee-predictor-api").chain(args.iter().copied()))
    }

    fn predict_args(args: &[&str]) -> PredictArgs {
        match parse(args).expect("valid arguments").command {
            Some(Command::Predict(args)) => args,
            other => panic!("expected predict command, got {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_serve() {
        assert!(parse(&[]).expect("parses").command.is_none());
    }

    #[test]
    fn subject_marks_build_a_subject_request() {
        let args = predict_args(&[
            "predict",
            "--physics",
            "80",
            "--chemistry",
            "70",
            "--mathematics",
            "90",
            "--category",
            "OBC-NCL",
            "--home-state",
            "Kerala",
        ]);
        let request = args.request().expect("complete marks");
        assert_eq!(request.marks.total(), 240.0);
        assert_eq!(request.category, Category::Obc);
        assert_eq!(request.home_state.as_deref(), Some("Kerala"));
    }

    #[test]
    fn partial_subject_marks_are_incomplete() {
        let args = predict_args(&["predict", "--physics", "80"]);
        assert!(args.request().is_none());
    }

    #[test]
    fn total_conflicts_with_subject_marks() {
        assert!(parse(&["predict", "--total", "200", "--physics", "80"]).is_err());
    }

    #[test]
    fn unknown_category_is_a_usage_error() {
        assert!(parse(&["predict", "--total", "200", "--category", "nri"]).is_err());
    }

    #[test]
    fn data_overrides_are_shared_across_commands() {
        let args = predict_args(&[
            "predict",
            "--total",
            "200",
            "--rank-model",
            "historical",
            "--total-candidates",
            "1250000",
        ]);
        assert_eq!(args.data.total_candidates, Some(1_250_000));
        assert!(args.data.rank_model.is_some());
    }
}
