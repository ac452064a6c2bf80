use async_trait::async_trait;
use base64::{prelude::BASE64_STANDARD, Engine};
use tracing::{error, info};

use crate::application::ports::{DetectionModel, DetectionParams, DetectionPort};
use crate::config::RoboflowConfig;
use crate::domain::{
    detection::DetectionBatch,
    errors::{DomainError, DomainResult},
};

/// Cliente del API alojado de detección de objetos (Roboflow).
///
/// La imagen viaja en base64 en el cuerpo; clave, confianza y solape van
/// en la query. Una sola llamada por análisis, sin reintentos.
pub struct RoboflowDetector {
    client: reqwest::Client,
    cfg: RoboflowConfig,
}

impl RoboflowDetector {
    pub fn new(client: reqwest::Client, cfg: RoboflowConfig) -> Self {
        Self { client, cfg }
    }

    fn model_url(&self, model: DetectionModel) -> &str {
        match model {
            DetectionModel::Spacing => &self.cfg.spacing_url,
            DetectionModel::Counting => &self.cfg.counting_url,
        }
    }
}

#[async_trait]
impl DetectionPort for RoboflowDetector {
    async fn detect(&self, image: &[u8], model: DetectionModel, params: DetectionParams) -> DomainResult<DetectionBatch> {
        if self.cfg.api_key.is_empty() {
            return Err(DomainError::Unavailable("ROBOFLOW_API_KEY no configurada".into()));
        }

        let url = self.model_url(model);
        let res = self
            .client
            .post(url)
            .query(&[
                ("api_key", self.cfg.api_key.clone()),
                ("confidence", params.confidence.to_string()),
                ("overlap", params.overlap.to_string()),
            ])
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(BASE64_STANDARD.encode(image))
            .send()
            .await
            .map_err(|e| {
                error!("❌ Error de red con el detector: {e}");
                DomainError::Upstream(format!("detector: {e}"))
            })?;

        let status = res.status();
        if !status.is_success() {
            error!("❌ El detector respondió {status}");
            return Err(DomainError::Upstream(format!("detector respondió {status}")));
        }

        let batch = res
            .json::<DetectionBatch>()
            .await
            .map_err(|e| DomainError::Upstream(format!("respuesta del detector ilegible: {e}")))?;

        info!("✅ Detector {:?}: {} objetos", model, batch.predictions.len());
        Ok(batch)
    }
}
