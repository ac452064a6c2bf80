use serde::{Deserialize, Serialize};

use super::geometry::Point2D;

/// Predicción del servicio de detección: (x, y) es el centro de la caja.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_id: Option<String>,
}

impl Detection {
    pub fn center(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Respuesta completa de una llamada de detección.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionBatch {
    #[serde(default)]
    pub predictions: Vec<Detection>,
    #[serde(default)]
    pub image: Option<ImageSize>,
    #[serde(default)]
    pub time: f64,
}

impl DetectionBatch {
    pub fn centers(&self) -> Vec<Point2D> {
        self.predictions.iter().map(Detection::center).collect()
    }
}
