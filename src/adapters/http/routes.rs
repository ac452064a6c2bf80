use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Redirect},
    Json,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use crate::adapters::http::{error::ApiError, state::HttpState, upload::read_upload};
use crate::application::{
    dto::{
        AnalysisMode, AnalysisResult, AnalyzeOptions, CadParseOutcome, CheckComplianceRequest,
        ColumnReportRequest, HealthResponse, MaterialOutcome, OcrOutcome, OkResponse,
    },
    ports::DetectionParams,
    report::{render_column_report, report_filename, REPORT_CONTENT_TYPE},
};
use crate::domain::{
    cad::CadComponent,
    compliance::ComplianceResult,
    record::{InspectionRecord, NewInspectionRecord, RecordPage},
    spacing::{ComponentType, SpacingTargets},
};

fn connected(ok: bool) -> String {
    let label = if ok { "connected" } else { "disconnected" };
    label.to_string()
}

pub async fn index() -> Redirect {
    Redirect::to("/portal.html")
}

/// Parámetros de `/api/analyze`; los ausentes toman los valores por defecto.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeQuery {
    mode: Option<String>,
    conf: Option<u32>,
    overlap: Option<u32>,
    component_type: Option<String>,
    pixel_per_mm: Option<f64>,
    target_spacing: Option<f64>,
    target_spacing_dense: Option<f64>,
    target_spacing_sparse: Option<f64>,
    tolerance: Option<f64>,
}

impl From<AnalyzeQuery> for AnalyzeOptions {
    fn from(q: AnalyzeQuery) -> Self {
        let defaults = SpacingTargets::default();
        let detection = DetectionParams::default();
        AnalyzeOptions {
            mode: AnalysisMode::parse(q.mode.as_deref().unwrap_or("spacing")),
            detection: DetectionParams {
                confidence: q.conf.unwrap_or(detection.confidence),
                overlap: q.overlap.unwrap_or(detection.overlap),
            },
            component: q
                .component_type
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .map(ComponentType::parse),
            pixels_per_mm: q.pixel_per_mm.unwrap_or(0.0),
            targets: SpacingTargets {
                single: q.target_spacing.unwrap_or(defaults.single),
                dense: q.target_spacing_dense.unwrap_or(defaults.dense),
                sparse: q.target_spacing_sparse.unwrap_or(defaults.sparse),
                tolerance: q.tolerance.unwrap_or(defaults.tolerance),
            },
        }
    }
}

pub async fn analyze(
    State(st): State<HttpState>,
    query: Result<Query<AnalyzeQuery>, QueryRejection>,
    multipart: Multipart,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Query(query) = query?;
    let upload = read_upload(multipart).await?;
    let opts = AnalyzeOptions::from(query);
    let stored_name = format!("input_{}.jpg", Local::now().format("%Y%m%d_%H%M%S"));

    let result = st.inspection.analyze(&upload.bytes, &stored_name, &opts).await?;
    Ok(Json(result))
}

pub async fn parse_cad(State(st): State<HttpState>, multipart: Multipart) -> Result<Json<CadParseOutcome>, ApiError> {
    let upload = read_upload(multipart).await?;
    let component = CadComponent::parse(upload.field("component_type").unwrap_or("column"));
    tracing::info!("Plano CAD recibido: {} ({} bytes)", upload.filename, upload.bytes.len());

    Ok(Json(st.annotation.parse_cad(&upload.bytes, component).await))
}

pub async fn verify_material(State(st): State<HttpState>, multipart: Multipart) -> Result<Json<MaterialOutcome>, ApiError> {
    let upload = read_upload(multipart).await?;
    tracing::info!("Foto de material recibida: {} ({} bytes)", upload.filename, upload.bytes.len());

    Ok(Json(st.annotation.verify_material(&upload.bytes).await))
}

pub async fn ocr(State(st): State<HttpState>, multipart: Multipart) -> Result<Json<OcrOutcome>, ApiError> {
    let upload = read_upload(multipart).await?;
    Ok(Json(st.annotation.recognize(&upload.bytes).await))
}

pub async fn check_compliance(
    State(st): State<HttpState>,
    payload: Result<Json<CheckComplianceRequest>, JsonRejection>,
) -> Result<Json<ComplianceResult>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(st.annotation.check_compliance(req.detected_count, req.design_total)))
}

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    page: Option<u32>,
    per_page: Option<u32>,
    #[serde(rename = "type")]
    inspection_type: Option<String>,
}

pub async fn list_records(
    State(st): State<HttpState>,
    query: Result<Query<RecordsQuery>, QueryRejection>,
) -> Result<Json<RecordPage>, ApiError> {
    let Query(q) = query?;
    let page = st
        .records
        .list(q.page.unwrap_or(1), q.per_page.unwrap_or(20), q.inspection_type)
        .await?;
    Ok(Json(page))
}

pub async fn create_record(
    State(st): State<HttpState>,
    payload: Result<Json<NewInspectionRecord>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let record = st.records.create(req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "record": record }))))
}

pub async fn get_record(State(st): State<HttpState>, Path(id): Path<i64>) -> Result<Json<InspectionRecord>, ApiError> {
    Ok(Json(st.records.get(id).await?))
}

pub async fn delete_record(State(st): State<HttpState>, Path(id): Path<i64>) -> Result<Json<OkResponse>, ApiError> {
    st.records.delete(id).await?;
    Ok(Json(OkResponse { success: true }))
}

pub async fn export_report(
    payload: Result<Json<ColumnReportRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let now = Local::now();
    let body = render_column_report(&req, now)?;
    let disposition = format!("attachment; filename=\"{}\"", report_filename(now));
    tracing::info!("📊 Informe generado: {} bytes", body.len());
    Ok((
        [
            (header::CONTENT_TYPE, REPORT_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

pub async fn health(State(st): State<HttpState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        timestamp: Local::now().to_rfc3339(),
        database: connected(st.records.database_ready().await),
        storage: st.inspection.storage_description(),
        ocr: if st.checks.ocr_available { "available" } else { "unavailable" }.into(),
        vlm: if st.checks.vlm_configured { "configured" } else { "unconfigured" }.into(),
    })
}
