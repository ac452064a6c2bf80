use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    detection::DetectionBatch,
    errors::DomainResult,
    record::{InspectionRecord, RecordDraft, RecordFilter, RecordPage},
};

/// Modelo de detección alojado que se consulta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionModel {
    /// Barras en planta (losas, muros, vigas).
    Spacing,
    /// Secciones de barras (recuento y pilares).
    Counting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Confianza mínima, 0..100.
    pub confidence: u32,
    /// Solape máximo para NMS, 0..100.
    pub overlap: u32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self { confidence: 40, overlap: 40 }
    }
}

#[async_trait]
pub trait DetectionPort: Send + Sync {
    async fn detect(&self, image: &[u8], model: DetectionModel, params: DetectionParams) -> DomainResult<DetectionBatch>;
}

#[async_trait]
pub trait OcrPort: Send + Sync {
    async fn extract_text(&self, image: &[u8]) -> DomainResult<String>;
}

#[async_trait]
pub trait VisionLanguagePort: Send + Sync {
    async fn complete(&self, image: &[u8], prompt: &str, max_tokens: Option<u32>) -> DomainResult<String>;
}

#[async_trait]
pub trait RecordRepositoryPort: Send + Sync {
    async fn insert(&self, draft: RecordDraft) -> DomainResult<InspectionRecord>;
    async fn list(&self, filter: &RecordFilter) -> DomainResult<RecordPage>;
    async fn get(&self, id: i64) -> DomainResult<Option<InspectionRecord>>;
    /// `false` si no existía.
    async fn delete(&self, id: i64) -> DomainResult<bool>;
    async fn ping(&self) -> bool;
}

#[async_trait]
pub trait ObjectStorePort: Send + Sync {
    /// Guarda el objeto y devuelve su URL de acceso.
    async fn put(&self, data: &[u8], filename: &str, content_type: &str) -> DomainResult<String>;
    fn describe(&self) -> String;
}
