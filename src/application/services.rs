use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    application::{
        dto::{AnalysisMode, AnalysisResult, AnalyzeOptions, CadParseOutcome, MaterialOutcome, OcrOutcome},
        ports::{DetectionModel, DetectionPort, ObjectStorePort, OcrPort, RecordRepositoryPort, VisionLanguagePort},
        prompts::{cad_prompt, MATERIAL_PROMPT},
    },
    domain::{
        annotation::AnnotationParse,
        cad::{extract_json_object, CadComponent, MaterialMark, ModelReply},
        compliance::{check_compliance, ComplianceResult},
        errors::{DomainError, DomainResult},
        geometry::generate_hoop_path,
        record::{make_record_id, InspectionRecord, NewInspectionRecord, RecordDraft, RecordFilter, RecordPage},
        spacing::{classify_spacing, SpacingSummary},
    },
};

const CAD_MAX_TOKENS: u32 = 1024;
const MAX_PER_PAGE: u32 = 100;

/// Análisis de fotografías de obra: detección + post-proceso geométrico.
#[derive(Clone)]
pub struct InspectionService {
    detector: Arc<dyn DetectionPort>,
    store: Arc<dyn ObjectStorePort>,
}

impl InspectionService {
    pub fn new(detector: Arc<dyn DetectionPort>, store: Arc<dyn ObjectStorePort>) -> Self {
        Self { detector, store }
    }

    pub fn storage_description(&self) -> String {
        self.store.describe()
    }

    /// Sube la imagen, llama una vez al detector y aplica el post-proceso
    /// del modo pedido. Un fallo de subida no aborta el análisis.
    pub async fn analyze(&self, image: &[u8], filename: &str, opts: &AnalyzeOptions) -> DomainResult<AnalysisResult> {
        info!(
            "Análisis recibido | modo: {:?} | conf: {} | overlap: {} | elemento: {:?}",
            opts.mode, opts.detection.confidence, opts.detection.overlap, opts.component
        );

        let image_url = match self.store.put(image, filename, "image/jpeg").await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("No se pudo guardar la imagen de entrada: {e}");
                None
            }
        };

        let model = match opts.mode {
            AnalysisMode::Spacing | AnalysisMode::Other => DetectionModel::Spacing,
            AnalysisMode::Counting | AnalysisMode::Column => DetectionModel::Counting,
        };
        let batch = self.detector.detect(image, model, opts.detection).await?;
        info!("Detección correcta, objetos: {}", batch.predictions.len());

        let centers = batch.centers();
        let mut result = AnalysisResult {
            mode: opts.mode,
            detected_count: batch.predictions.len(),
            predictions: batch.predictions,
            image: batch.image,
            time: batch.time,
            hoop_path: None,
            inner_ties: None,
            spacings: None,
            spacing_summary: None,
            image_url,
        };

        match opts.mode {
            AnalysisMode::Column => {
                let path = generate_hoop_path(&centers);
                result.hoop_path = Some(path.outer_hoop);
                result.inner_ties = Some(path.inner_ties);
            }
            AnalysisMode::Spacing => {
                if let Some(component) = opts.component.filter(|_| opts.pixels_per_mm > 0.0) {
                    let spacings = classify_spacing(&centers, component, opts.pixels_per_mm, &opts.targets);
                    let summary = SpacingSummary::from_segments(&spacings);
                    info!(
                        "Separaciones revisadas | total: {} | conformes: {} | no conformes: {} | sin clasificar: {}",
                        summary.total, summary.passed, summary.failed, summary.unclassified
                    );
                    result.spacings = Some(spacings);
                    result.spacing_summary = Some(summary);
                }
            }
            AnalysisMode::Counting | AnalysisMode::Other => {}
        }

        Ok(result)
    }
}

/// Lectura de anotaciones: OCR, planos CAD y marcas de laminación.
#[derive(Clone)]
pub struct AnnotationService {
    ocr: Arc<dyn OcrPort>,
    vlm: Arc<dyn VisionLanguagePort>,
}

impl AnnotationService {
    pub fn new(ocr: Arc<dyn OcrPort>, vlm: Arc<dyn VisionLanguagePort>) -> Self {
        Self { ocr, vlm }
    }

    /// Los fallos del OCR se devuelven dentro del resultado, no como error.
    pub async fn recognize(&self, image: &[u8]) -> OcrOutcome {
        match self.ocr.extract_text(image).await {
            Ok(text) => {
                let parse = AnnotationParse::from_text(text.trim());
                info!(
                    "OCR | pilar: {:?} | sección: {:?} | total de proyecto: {}",
                    parse.column_id, parse.section_size, parse.design_total
                );
                OcrOutcome { success: true, parse, error: None }
            }
            Err(e) => {
                warn!("OCR fallido: {e}");
                OcrOutcome { success: false, parse: AnnotationParse::default(), error: Some(e.to_string()) }
            }
        }
    }

    pub async fn parse_cad(&self, image: &[u8], component: CadComponent) -> CadParseOutcome {
        info!("Lectura CAD | elemento: {} | {} bytes", component.as_str(), image.len());
        let prompt = cad_prompt(component);

        let raw = match self.vlm.complete(image, &prompt, Some(CAD_MAX_TOKENS)).await {
            Ok(raw) => raw.trim().to_string(),
            Err(e) => {
                warn!("Lectura CAD fallida: {e}");
                return CadParseOutcome::failed(component, format!("大模型调用失败: {e}"));
            }
        };
        debug!("Respuesta cruda del VLM ({}):\n{raw}", component.as_str());

        let reply = ModelReply::parse(&raw);
        if reply.data.is_empty() {
            warn!("El VLM no devolvió datos estructurados");
        }

        CadParseOutcome::succeeded(component, reply.report, reply.data, raw)
    }

    pub async fn verify_material(&self, image: &[u8]) -> MaterialOutcome {
        info!("Verificación de material | {} bytes", image.len());
        let raw = match self.vlm.complete(image, MATERIAL_PROMPT, None).await {
            Ok(raw) => raw.trim().to_string(),
            Err(e) => {
                warn!("Verificación de material fallida: {e}");
                return MaterialOutcome {
                    success: false,
                    error: Some(format!("大模型调用失败: {e}")),
                    ..MaterialOutcome::default()
                };
            }
        };
        debug!("Respuesta cruda del VLM (material): {raw}");

        match extract_json_object(&raw) {
            Some(obj) => MaterialOutcome {
                success: true,
                mark: Some(MaterialMark::from_object(&obj)),
                raw_response: Some(raw),
                error: None,
            },
            None => MaterialOutcome {
                success: false,
                mark: None,
                raw_response: Some(raw),
                error: Some("大模型返回格式异常，无法提取 JSON".to_string()),
            },
        }
    }

    pub fn check_compliance(&self, detected_count: u32, design_total: u32) -> ComplianceResult {
        check_compliance(detected_count, design_total)
    }
}

/// Alta, consulta y baja de registros de inspección.
#[derive(Clone)]
pub struct RecordService {
    repo: Arc<dyn RecordRepositoryPort>,
}

impl RecordService {
    pub fn new(repo: Arc<dyn RecordRepositoryPort>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, data: NewInspectionRecord) -> DomainResult<InspectionRecord> {
        let now = Local::now();
        let draft = RecordDraft {
            record_id: make_record_id(now, Uuid::new_v4()),
            inspection_type: data
                .inspection_type
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "spacing".to_string()),
            data,
            created_at: now,
        };
        let record = self.repo.insert(draft).await?;
        info!("Registro creado: {} (id {})", record.record_id, record.id);
        Ok(record)
    }

    pub async fn list(&self, page: u32, per_page: u32, inspection_type: Option<String>) -> DomainResult<RecordPage> {
        let filter = RecordFilter {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
            inspection_type: inspection_type.filter(|t| !t.is_empty()),
        };
        self.repo.list(&filter).await
    }

    pub async fn get(&self, id: i64) -> DomainResult<InspectionRecord> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("registro {id}")))
    }

    pub async fn delete(&self, id: i64) -> DomainResult<()> {
        if self.repo.delete(id).await? {
            info!("Registro eliminado: id {id}");
            Ok(())
        } else {
            Err(DomainError::NotFound(format!("registro {id}")))
        }
    }

    pub async fn database_ready(&self) -> bool {
        self.repo.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::DetectionParams;
    use crate::domain::{
        compliance::ComplianceStatus,
        detection::{Detection, DetectionBatch},
        geometry::TieOrientation,
        spacing::{ComponentType, SpacingStatus},
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeDetector {
        points: Vec<(f64, f64)>,
        calls: Mutex<Vec<DetectionModel>>,
    }

    impl FakeDetector {
        fn new(points: &[(f64, f64)]) -> Arc<Self> {
            Arc::new(Self { points: points.to_vec(), calls: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl DetectionPort for FakeDetector {
        async fn detect(&self, _image: &[u8], model: DetectionModel, _params: DetectionParams) -> DomainResult<DetectionBatch> {
            self.calls.lock().unwrap().push(model);
            Ok(DetectionBatch {
                predictions: self
                    .points
                    .iter()
                    .map(|&(x, y)| Detection {
                        x,
                        y,
                        width: 4.0,
                        height: 4.0,
                        confidence: 0.9,
                        class: "rebar".into(),
                        class_id: None,
                        detection_id: None,
                    })
                    .collect(),
                image: None,
                time: 0.05,
            })
        }
    }

    struct FailingDetector;

    #[async_trait]
    impl DetectionPort for FailingDetector {
        async fn detect(&self, _: &[u8], _: DetectionModel, _: DetectionParams) -> DomainResult<DetectionBatch> {
            Err(DomainError::Upstream("status 503".into()))
        }
    }

    struct FakeStore {
        fail: bool,
    }

    #[async_trait]
    impl ObjectStorePort for FakeStore {
        async fn put(&self, _data: &[u8], filename: &str, _content_type: &str) -> DomainResult<String> {
            if self.fail {
                Err(DomainError::OperationFailed("disk full".into()))
            } else {
                Ok(format!("file:///tmp/{filename}"))
            }
        }

        fn describe(&self) -> String {
            "fake".into()
        }
    }

    struct FakeOcr(DomainResult<&'static str>);

    #[async_trait]
    impl OcrPort for FakeOcr {
        async fn extract_text(&self, _image: &[u8]) -> DomainResult<String> {
            match &self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(e) => Err(DomainError::Unavailable(e.to_string())),
            }
        }
    }

    struct FakeVlm {
        reply: Option<&'static str>,
        prompts: Mutex<Vec<(String, Option<u32>)>>,
    }

    impl FakeVlm {
        fn replying(reply: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self { reply, prompts: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl VisionLanguagePort for FakeVlm {
        async fn complete(&self, _image: &[u8], prompt: &str, max_tokens: Option<u32>) -> DomainResult<String> {
            self.prompts.lock().unwrap().push((prompt.to_string(), max_tokens));
            self.reply
                .map(str::to_string)
                .ok_or_else(|| DomainError::Unavailable("sin clave".into()))
        }
    }

    fn inspection(detector: Arc<dyn DetectionPort>, store_fails: bool) -> InspectionService {
        InspectionService::new(detector, Arc::new(FakeStore { fail: store_fails }))
    }

    #[tokio::test]
    async fn column_mode_uses_counting_model_and_builds_hoop() {
        let detector = FakeDetector::new(&[(1.0, 1.0), (5.0, 1.0), (5.0, 5.0), (1.0, 5.0), (3.0, 3.0)]);
        let svc = inspection(detector.clone(), false);
        let opts = AnalyzeOptions { mode: AnalysisMode::Column, ..AnalyzeOptions::default() };

        let result = svc.analyze(b"img", "a.jpg", &opts).await.unwrap();

        assert_eq!(detector.calls.lock().unwrap().as_slice(), &[DetectionModel::Counting]);
        assert_eq!(result.detected_count, 5);
        assert_eq!(result.hoop_path.as_ref().map(Vec::len), Some(4));
        let ties = result.inner_ties.unwrap();
        assert_eq!(ties.len(), 1);
        assert_eq!(ties[0].orientation, TieOrientation::Vertical);
        assert_eq!(result.image_url.as_deref(), Some("file:///tmp/a.jpg"));
        assert!(result.spacings.is_none());
    }

    #[tokio::test]
    async fn spacing_mode_classifies_when_scale_and_component_given() {
        let detector = FakeDetector::new(&[(0.0, 0.0), (150.0, 0.0), (300.0, 0.0)]);
        let svc = inspection(detector.clone(), false);
        let opts = AnalyzeOptions {
            component: Some(ComponentType::SlabWall),
            pixels_per_mm: 1.0,
            ..AnalyzeOptions::default()
        };

        let result = svc.analyze(b"img", "a.jpg", &opts).await.unwrap();

        assert_eq!(detector.calls.lock().unwrap().as_slice(), &[DetectionModel::Spacing]);
        let spacings = result.spacings.unwrap();
        assert_eq!(spacings.len(), 2);
        assert!(spacings.iter().all(|s| s.status == Some(SpacingStatus::Pass)));
        assert_eq!(result.spacing_summary.unwrap().passed, 2);
    }

    #[tokio::test]
    async fn spacing_is_skipped_without_scale_or_component() {
        let detector = FakeDetector::new(&[(0.0, 0.0), (150.0, 0.0)]);
        let svc = inspection(detector, false);

        let no_scale = AnalyzeOptions { component: Some(ComponentType::SlabWall), ..AnalyzeOptions::default() };
        assert!(svc.analyze(b"img", "a.jpg", &no_scale).await.unwrap().spacings.is_none());

        let no_component = AnalyzeOptions { pixels_per_mm: 2.0, ..AnalyzeOptions::default() };
        assert!(svc.analyze(b"img", "a.jpg", &no_component).await.unwrap().spacings.is_none());
    }

    #[tokio::test]
    async fn unknown_mode_detects_with_spacing_model_but_skips_classification() {
        let detector = FakeDetector::new(&[(0.0, 0.0), (150.0, 0.0), (300.0, 0.0)]);
        let svc = inspection(detector.clone(), false);
        let opts = AnalyzeOptions {
            mode: AnalysisMode::parse("weird"),
            component: Some(ComponentType::SlabWall),
            pixels_per_mm: 1.0,
            ..AnalyzeOptions::default()
        };

        let result = svc.analyze(b"img", "a.jpg", &opts).await.unwrap();

        assert_eq!(detector.calls.lock().unwrap().as_slice(), &[DetectionModel::Spacing]);
        assert_eq!(result.detected_count, 3);
        assert!(result.spacings.is_none());
        assert!(result.spacing_summary.is_none());
        assert!(result.hoop_path.is_none());
    }

    #[tokio::test]
    async fn upload_failure_does_not_abort_analysis() {
        let svc = inspection(FakeDetector::new(&[(0.0, 0.0)]), true);
        let result = svc.analyze(b"img", "a.jpg", &AnalyzeOptions::default()).await.unwrap();
        assert_eq!(result.image_url, None);
        assert_eq!(result.detected_count, 1);
    }

    #[tokio::test]
    async fn detector_errors_propagate() {
        let svc = inspection(Arc::new(FailingDetector), false);
        let err = svc.analyze(b"img", "a.jpg", &AnalyzeOptions::default()).await.unwrap_err();
        assert!(matches!(err, DomainError::Upstream(_)));
    }

    #[tokio::test]
    async fn ocr_text_is_parsed() {
        let svc = AnnotationService::new(Arc::new(FakeOcr(Ok("  KZ3 650x600 4C25 8C22\n"))), FakeVlm::replying(None));
        let outcome = svc.recognize(b"img").await;
        assert!(outcome.success);
        assert_eq!(outcome.parse.raw_text, "KZ3 650x600 4C25 8C22");
        assert_eq!(outcome.parse.column_id.as_deref(), Some("KZ3"));
        assert_eq!(outcome.parse.design_total, 12);
    }

    #[tokio::test]
    async fn ocr_failure_is_reported_in_outcome() {
        let svc = AnnotationService::new(Arc::new(FakeOcr(Err(DomainError::Unavailable("x".into())))), FakeVlm::replying(None));
        let outcome = svc.recognize(b"img").await;
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
        assert_eq!(outcome.parse.design_total, 0);
    }

    #[tokio::test]
    async fn cad_parse_sends_component_prompt_and_splits_reply() {
        let vlm = FakeVlm::replying(Some("分析：角筋4C25\n```json\n{\"total_bars\": 12}\n```"));
        let svc = AnnotationService::new(Arc::new(FakeOcr(Ok(""))), vlm.clone());

        let outcome = svc.parse_cad(b"img", CadComponent::Beam).await;

        assert!(outcome.success);
        assert_eq!(outcome.report, "分析：角筋4C25");
        assert_eq!(outcome.extracted_data.get("total_bars"), Some(&serde_json::json!(12)));
        assert_eq!(outcome.legacy_fields, outcome.extracted_data);
        let prompts = vlm.prompts.lock().unwrap();
        assert!(prompts[0].0.contains("【梁】"));
        assert_eq!(prompts[0].1, Some(CAD_MAX_TOKENS));
    }

    #[tokio::test]
    async fn cad_parse_failure_is_soft() {
        let svc = AnnotationService::new(Arc::new(FakeOcr(Ok(""))), FakeVlm::replying(None));
        let outcome = svc.parse_cad(b"img", CadComponent::Column).await;
        assert!(!outcome.success);
        assert!(outcome.extracted_data.is_empty());
        assert!(outcome.error.unwrap().contains("sin clave"));
    }

    #[tokio::test]
    async fn material_verification_reads_mark_or_reports_bad_format() {
        let ok = AnnotationService::new(
            Arc::new(FakeOcr(Ok(""))),
            FakeVlm::replying(Some(r#"{"material_grade": "HRB500", "is_seismic": true, "diameter": 25, "raw_text": "5E25"}"#)),
        );
        let outcome = ok.verify_material(b"img").await;
        assert!(outcome.success);
        assert_eq!(outcome.mark.unwrap().diameter, 25);

        let bad = AnnotationService::new(Arc::new(FakeOcr(Ok(""))), FakeVlm::replying(Some("看不清")));
        let outcome = bad.verify_material(b"img").await;
        assert!(!outcome.success);
        assert_eq!(outcome.raw_response.as_deref(), Some("看不清"));
    }

    #[test]
    fn compliance_delegates_to_evaluator() {
        let svc = AnnotationService::new(Arc::new(FakeOcr(Ok(""))), FakeVlm::replying(None));
        assert_eq!(svc.check_compliance(10, 12).status, ComplianceStatus::Fail);
    }

    #[derive(Default)]
    struct RecordingRepo {
        filters: Mutex<Vec<RecordFilter>>,
    }

    #[async_trait]
    impl RecordRepositoryPort for RecordingRepo {
        async fn insert(&self, _draft: RecordDraft) -> DomainResult<InspectionRecord> {
            Err(DomainError::OperationFailed("no usado".into()))
        }
        async fn list(&self, filter: &RecordFilter) -> DomainResult<RecordPage> {
            self.filters.lock().unwrap().push(filter.clone());
            Ok(RecordPage { records: Vec::new(), total: 0, page: filter.page, per_page: filter.per_page, pages: 0 })
        }
        async fn get(&self, _id: i64) -> DomainResult<Option<InspectionRecord>> {
            Ok(None)
        }
        async fn delete(&self, _id: i64) -> DomainResult<bool> {
            Ok(false)
        }
        async fn ping(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn listing_clamps_paging_and_ignores_empty_type() {
        let repo = Arc::new(RecordingRepo::default());
        let svc = RecordService::new(repo.clone());

        svc.list(0, 0, Some(String::new())).await.unwrap();
        svc.list(3, 500, Some("column".into())).await.unwrap();
        svc.list(2, 100, None).await.unwrap();

        let filters = repo.filters.lock().unwrap();
        assert_eq!(filters[0], RecordFilter { page: 1, per_page: 1, inspection_type: None });
        assert_eq!(filters[1], RecordFilter { page: 3, per_page: 100, inspection_type: Some("column".into()) });
        assert_eq!(filters[2], RecordFilter { page: 2, per_page: 100, inspection_type: None });
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let svc = RecordService::new(Arc::new(RecordingRepo::default()));
        assert!(matches!(svc.get(9).await, Err(DomainError::NotFound(_))));
        assert!(matches!(svc.delete(9).await, Err(DomainError::NotFound(_))));
    }
}
