pub mod error;
pub mod routes;
pub mod state;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::adapters::http::state::HttpState;

/// Tamaño máximo de una subida (fotos de obra y planos).
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/api/health", get(routes::health))
        // Análisis de imagen
        .route("/api/analyze", post(routes::analyze))
        .route("/analyze", post(routes::analyze))
        // Anotaciones y planos
        .route("/api/ocr", post(routes::ocr))
        .route("/ocr", post(routes::ocr))
        .route("/api/parse_cad", post(routes::parse_cad))
        .route("/api/verify_material", post(routes::verify_material))
        .route("/api/check_compliance", post(routes::check_compliance))
        .route("/check_compliance", post(routes::check_compliance))
        // Registros
        .route("/api/records", get(routes::list_records).post(routes::create_record))
        .route("/api/records/:id", get(routes::get_record).delete(routes::delete_record))
        // Informe
        .route("/api/export_report", post(routes::export_report))
        .route("/api/export_excel", post(routes::export_report))
        .route("/export_excel", post(routes::export_report))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
