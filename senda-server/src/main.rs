// senda-server/src/main.rs

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use senda_common::traits::repository_traits::{
    DecisionRepository, ModerationLogRepository, SubmissionRepository,
};
use senda_core::capabilities::{
    ExternalImageAnalyzer, HttpImageAnalyzer, HttpToxicityClassifier, HttpVisionService,
    SubprocessImageAnalyzer, ToxicityClassifier, VisionService,
};
use senda_core::cache::ModerationResultCache;
use senda_core::config::ModerationConfig;
use senda_core::image::ImageModerationService;
use senda_core::pdf::{PdfAnalysisOrchestrator, PdfPageRasterizer};
use senda_core::repositories::{
    PostgresDecisionRepository, PostgresModerationLogRepository, PostgresSubmissionRepository,
};
use senda_core::services::ModerationService;
use senda_core::tasks::spawn_pending_reconciler_task;
use senda_core::text::TextModerationService;
use senda_core::trust::UserTrustEstimator;
use senda_core::Database;

#[derive(Parser, Debug, Clone)]
#[command(name = "senda-moderation")]
#[command(author, version, about = "Senda - motor de moderación de contenido")]
struct Args {
    /// Path to the JSON config file; defaults apply when it does not exist.
    #[arg(long, default_value = "moderation_config.json")]
    config: PathBuf,

    /// Postgres connection URL. SENDA_DATABASE_URL takes precedence.
    #[arg(long, default_value = "postgres://senda@localhost:5432/senda")]
    database_url: String,

    /// Disable the background loop that re-evaluates stuck pending submissions.
    #[arg(long, default_value = "false")]
    no_reconciler: bool,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("senda=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!("Senda moderation engine starting. config={}", args.config.display());

    let config = ModerationConfig::load_or_default(&args.config)?;

    let database_url =
        std::env::var("SENDA_DATABASE_URL").unwrap_or_else(|_| args.database_url.clone());
    let db = Database::new(&database_url).await?;
    db.migrate().await?;

    let submissions: Arc<dyn SubmissionRepository> =
        Arc::new(PostgresSubmissionRepository::new(db.pool().clone()));
    let decisions: Arc<dyn DecisionRepository> =
        Arc::new(PostgresDecisionRepository::new(db.pool().clone()));
    let moderation_log: Arc<dyn ModerationLogRepository> =
        Arc::new(PostgresModerationLogRepository::new(db.pool().clone()));

    // External capabilities, each optional. Absent ones route through the
    // local fallbacks inside the services.
    let caps = &config.capabilities;

    let classifier: Option<Arc<dyn ToxicityClassifier>> = match &caps.toxicity_url {
        Some(url) => {
            info!("Toxicity classifier endpoint: {}", url);
            Some(Arc::new(HttpToxicityClassifier::new(
                url.clone(),
                caps.toxicity_api_key.clone(),
                caps.toxicity_timeout_secs(),
            )))
        }
        None => {
            warn!("No toxicity endpoint configured; using the local keyword fallback.");
            None
        }
    };

    let mut analyzers: Vec<Arc<dyn ExternalImageAnalyzer>> = Vec::new();
    if let Some(url) = &caps.image_analyzer_url {
        let http = HttpImageAnalyzer::new(url.clone(), caps.image_analyzer_timeout_secs());
        if !http.wait_ready(5).await {
            warn!("Image analyzer at {} not answering health checks yet.", url);
        }
        analyzers.push(Arc::new(http));
    }
    if !caps.image_analyzer_command.is_empty() {
        match SubprocessImageAnalyzer::new(
            caps.image_analyzer_command.clone(),
            caps.image_analyzer_timeout_secs(),
        ) {
            Ok(subprocess) => analyzers.push(Arc::new(subprocess)),
            Err(e) => error!("Invalid image analyzer command: {}", e),
        }
    }
    if analyzers.is_empty() {
        warn!("No image analyzer configured; image attachments will be rejected fail-closed.");
    }

    let vision: Option<Arc<dyn VisionService>> = caps.vision_url.as_ref().map(|url| {
        info!("Vision OCR endpoint: {}", url);
        Arc::new(HttpVisionService::new(url.clone(), caps.vision_timeout_secs()))
            as Arc<dyn VisionService>
    });

    let cache = Arc::new(ModerationResultCache::new(config.cache));
    let text_service = Arc::new(TextModerationService::new(classifier, cache, config.text));
    let image_service = Arc::new(ImageModerationService::new(analyzers, config.image));
    let rasterizer = PdfPageRasterizer::with_default_backends(config.pdf);
    let pdf_orchestrator = Arc::new(PdfAnalysisOrchestrator::new(
        text_service.clone(),
        image_service.clone(),
        rasterizer,
        vision,
        config.pdf,
        config.permissive,
        config.text.max_chars,
    ));
    let trust_estimator = Arc::new(UserTrustEstimator::new(submissions.clone()));

    let service = Arc::new(ModerationService::new(
        text_service,
        image_service,
        pdf_orchestrator,
        trust_estimator,
        submissions.clone(),
        decisions,
        moderation_log,
        config.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let reconciler_handle = if config.reconciler.enabled && !args.no_reconciler {
        Some(spawn_pending_reconciler_task(
            service.clone(),
            submissions,
            config.reconciler,
            shutdown_rx,
        ))
    } else {
        info!("Pending reconciler disabled.");
        None
    };

    info!("Senda moderation engine ready.");
    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received; shutting down.");

    let _ = shutdown_tx.send(true);
    if let Some(handle) = reconciler_handle {
        if let Err(e) = handle.await {
            error!("Reconciler task join error: {:?}", e);
        }
    }
    info!("Shutdown complete.");
    Ok(())
}
