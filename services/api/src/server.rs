use crate::cli::ServeArgs;
use crate::infra::{build_engine, AppState};
use crate::routes::with_prediction_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use jee_predictor::config::AppConfig;
use jee_predictor::error::AppError;
use jee_predictor::telemetry::{self, LogOutput};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    args.data.apply(&mut config.prediction);

    telemetry::init(&config.telemetry, LogOutput::Stdout)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (engine, loaded) = build_engine(&config.prediction);
    if !loaded.fallbacks.is_empty() {
        warn!(fallbacks = ?loaded.fallbacks, "serving with embedded reference defaults");
    }

    let app = with_prediction_routes(engine, loaded.summary())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        reference = %loaded.data.version_label(),
        rank_model = ?config.prediction.rank_model,
        "rank predictor ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
