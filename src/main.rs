//! driftguard server entry point

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use driftguard::logic::alarm::AlarmEvaluator;
use driftguard::logic::baseline::BaselineStore;
use driftguard::logic::metrics::{LogAlertSink, LogEmitter};
use driftguard::logic::model::LinearModel;
use driftguard::{config, create_router, AppState};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driftguard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("driftguard starting...");
    tracing::info!(
        threshold = config.drift_threshold,
        evaluation_periods = config.evaluation_periods,
        aggregation = ?config.aggregation_method,
        "drift monitoring configured"
    );

    // Artifacts are load-or-die: serving without baseline statistics or a
    // model would return garbage, so the process refuses to start.
    let baseline = BaselineStore::load(&config.baseline_path)
        .expect("failed to load baseline statistics; refusing to serve");
    let predictor = LinearModel::load(&config.model_path)
        .expect("failed to load model artifact; refusing to serve");

    let state = AppState {
        alarm: Arc::new(AlarmEvaluator::new(config.alarm_config())),
        baseline: Arc::new(baseline),
        predictor: Arc::new(predictor),
        metrics: Arc::new(LogEmitter),
        alerts: Arc::new(LogAlertSink),
        config,
    };

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    tracing::info!("server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    axum::serve(listener, app).await.expect("server error");
}
