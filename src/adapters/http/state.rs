use std::sync::Arc;
use crate::application::services::{AnnotationService, InspectionService, RecordService};

/// Estado compartido para los manejadores HTTP de Axum.
/// Siguiendo la Arquitectura Hexagonal, el estado contiene los servicios (Casos de Uso).
#[derive(Clone)]
pub struct HttpState {
    /// Análisis de fotografías (detección + separaciones / cercos).
    pub inspection: Arc<InspectionService>,
    /// OCR, lectura de planos CAD y verificación de material.
    pub annotation: Arc<AnnotationService>,
    /// Registros de inspección.
    pub records: Arc<RecordService>,
    /// Disponibilidad de los servicios externos, calculada al arrancar.
    pub checks: ServiceChecks,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceChecks {
    pub ocr_available: bool,
    pub vlm_configured: bool,
}
