use clap::Args;
use jee_predictor::config::PredictionSettings;
use jee_predictor::estimation::RankModelKind;
use jee_predictor::prediction::PredictionEngine;
use jee_predictor::reference::{load_reference, LoadedReference};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Overrides for the estimation settings shared by every command.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct DataArgs {
    /// Directory holding reference JSON files and an optional cutoffs.csv
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Override the total number of candidates used for rank estimation
    #[arg(long)]
    pub(crate) total_candidates: Option<u32>,
    /// Percentile-to-rank model: proportional or historical
    #[arg(long)]
    pub(crate) rank_model: Option<RankModelKind>,
    /// Number of colleges to shortlist
    #[arg(long)]
    pub(crate) top_n: Option<usize>,
}

impl DataArgs {
    pub(crate) fn apply(self, settings: &mut PredictionSettings) {
        if let Some(data_dir) = self.data_dir {
            settings.data_dir = Some(data_dir);
        }
        if let Some(total_candidates) = self.total_candidates.filter(|count| *count > 0) {
            settings.total_candidates = total_candidates;
        }
        if let Some(rank_model) = self.rank_model {
            settings.rank_model = rank_model;
        }
        if let Some(top_n) = self.top_n {
            settings.top_n = top_n;
        }
    }
}

/// Load reference data once and wrap it in a shareable engine.
pub(crate) fn build_engine(
    settings: &PredictionSettings,
) -> (Arc<PredictionEngine>, LoadedReference) {
    let loaded = load_reference(settings.data_dir.as_deref());
    let engine = PredictionEngine::new(Arc::new(loaded.data.clone()), settings);
    (Arc::new(engine), loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_args_override_only_supplied_fields() {
        let mut settings = PredictionSettings::default();
        DataArgs {
            total_candidates: Some(1_250_000),
            rank_model: Some(RankModelKind::Historical),
            ..DataArgs::default()
        }
        .apply(&mut settings);

        assert_eq!(settings.total_candidates, 1_250_000);
        assert_eq!(settings.rank_model, RankModelKind::Historical);
        assert_eq!(settings.top_n, PredictionSettings::default().top_n);
        assert!(settings.data_dir.is_none());
    }

    #[test]
    fn zero_candidate_override_is_ignored() {
        let mut settings = PredictionSettings::default();
        DataArgs {
            total_candidates: Some(0),
            ..DataArgs::default()
        }
        .apply(&mut settings);
        assert_eq!(settings.total_candidates, 1_400_000);
    }

    #[test]
    fn engine_without_data_dir_uses_embedded_tables() {
        let (engine, loaded) = build_engine(&PredictionSettings::default());
        assert!(loaded.fallbacks.is_empty());
        assert_eq!(engine.reference().colleges().len(), loaded.data.colleges().len());
    }
}
