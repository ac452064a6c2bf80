mod domain;
mod application;
mod adapters;
mod config;

use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

use crate::application::services::{AnnotationService, InspectionService, RecordService};
use crate::adapters::{
    http::{router, state::{HttpState, ServiceChecks}},
    ocr::tesseract::TesseractOcr,
    roboflow::client::RoboflowDetector,
    sqlite::record_repo::SqliteRecordRepository,
    storage::local::LocalObjectStore,
    vlm::zhipu::ZhipuVlm,
};
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();
    tracing::info!("🔧 Inicializando adaptadores de infraestructura...");

    // 2. Adaptadores
    let http = reqwest::Client::builder().timeout(cfg.http_timeout).build()?;

    if cfg.roboflow.api_key.is_empty() {
        tracing::warn!("⚠️ ROBOFLOW_API_KEY no definida: /api/analyze responderá 503");
    }
    let detector = Arc::new(RoboflowDetector::new(http.clone(), cfg.roboflow.clone()));
    let store = Arc::new(LocalObjectStore::new(cfg.storage_dir.clone()));

    let ocr = Arc::new(TesseractOcr::new(cfg.ocr.clone()));
    let ocr_available = ocr.is_available();
    if !ocr_available {
        tracing::warn!("⚠️ Tesseract no disponible ({}), el OCR fallará", cfg.ocr.binary);
    }

    let vlm = Arc::new(ZhipuVlm::new(http, cfg.vlm.clone()));
    let vlm_configured = vlm.is_configured();
    if !vlm_configured {
        tracing::warn!("⚠️ ZHIPU_API_KEY no definida: lectura CAD y de material desactivadas");
    }

    let repo = Arc::new(SqliteRecordRepository::open(&cfg.database_path)?);
    tracing::info!("🗄️ Base de datos: {}", cfg.database_path.display());

    // 3. Servicios (casos de uso)
    let state = HttpState {
        inspection: Arc::new(InspectionService::new(detector, store)),
        annotation: Arc::new(AnnotationService::new(ocr, vlm)),
        records: Arc::new(RecordService::new(repo)),
        checks: ServiceChecks { ocr_available, vlm_configured },
    };

    // 4. Router + archivos estáticos
    let app = router(state).fallback_service(ServeDir::new(&cfg.static_dir));

    // 5. Servidor
    let addr = cfg.listen_addr();
    tracing::info!("🚀 Servidor de inspección iniciado en http://{}", addr);
    tracing::info!("📂 Archivos estáticos servidos desde '{}'", cfg.static_dir.display());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
