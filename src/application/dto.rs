use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::application::ports::DetectionParams;
use crate::domain::{
    annotation::AnnotationParse,
    cad::{CadComponent, MaterialMark},
    detection::{Detection, ImageSize},
    geometry::{Point2D, TieSegment},
    record::ComplianceSnapshot,
    spacing::{ComponentType, SpacingSegment, SpacingSummary, SpacingTargets},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    Spacing,
    Counting,
    Column,
    /// Modo no reconocido: sólo detección, con el modelo de separaciones.
    Other,
}

impl AnalysisMode {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "spacing" => Self::Spacing,
            "counting" => Self::Counting,
            "column" => Self::Column,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeOptions {
    pub mode: AnalysisMode,
    pub detection: DetectionParams,
    /// `None` si el cliente no indicó tipo de elemento.
    pub component: Option<ComponentType>,
    pub pixels_per_mm: f64,
    pub targets: SpacingTargets,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::Spacing,
            detection: DetectionParams::default(),
            component: None,
            pixels_per_mm: 0.0,
            targets: SpacingTargets::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub mode: AnalysisMode,
    pub predictions: Vec<Detection>,
    pub detected_count: usize,
    pub image: Option<ImageSize>,
    pub time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoop_path: Option<Vec<Point2D>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_ties: Option<Vec<TieSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacings: Option<Vec<SpacingSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing_summary: Option<SpacingSummary>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OcrOutcome {
    pub success: bool,
    #[serde(flatten)]
    pub parse: AnnotationParse,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CadParseOutcome {
    pub success: bool,
    pub component_type: CadComponent,
    pub report: String,
    pub extracted_data: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Copia plana de `extracted_data` que esperan los clientes antiguos.
    #[serde(flatten)]
    pub legacy_fields: Map<String, Value>,
}

/// Claves propias de la respuesta; la copia plana no puede pisarlas.
const CAD_OUTCOME_KEYS: [&str; 6] = ["success", "component_type", "report", "extracted_data", "raw_response", "error"];

impl CadParseOutcome {
    pub fn succeeded(component_type: CadComponent, report: String, data: Map<String, Value>, raw: String) -> Self {
        let legacy_fields = data
            .iter()
            .filter(|(k, _)| !CAD_OUTCOME_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            success: true,
            component_type,
            report,
            extracted_data: data,
            raw_response: Some(raw),
            error: None,
            legacy_fields,
        }
    }

    pub fn failed(component_type: CadComponent, error: String) -> Self {
        Self {
            success: false,
            component_type,
            report: String::new(),
            extracted_data: Map::new(),
            raw_response: None,
            error: Some(error),
            legacy_fields: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaterialOutcome {
    pub success: bool,
    #[serde(flatten)]
    pub mark: Option<MaterialMark>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckComplianceRequest {
    pub detected_count: u32,
    pub design_total: u32,
}

/// Datos del informe de sección de pilar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnReportRequest {
    pub column_id: Option<String>,
    pub section_size: Option<(u32, u32)>,
    pub detected_count: u32,
    pub design_total: u32,
    pub compliance: Option<ComplianceSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub database: String,
    pub storage: String,
    pub ocr: String,
    pub vlm: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub success: bool,
}
