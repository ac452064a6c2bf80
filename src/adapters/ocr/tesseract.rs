use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::io::{Cursor, Write};
use std::process::{Command, Stdio};
use tracing::{error, info};

use crate::application::ports::OcrPort;
use crate::config::OcrConfig;
use crate::domain::errors::{DomainError, DomainResult};

/// OCR con el binario de Tesseract (`tesseract stdin stdout -l <lang>`).
pub struct TesseractOcr {
    cfg: OcrConfig,
}

impl TesseractOcr {
    pub fn new(cfg: OcrConfig) -> Self {
        Self { cfg }
    }

    /// Comprueba que el binario responde a `--version`.
    pub fn is_available(&self) -> bool {
        Command::new(&self.cfg.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

/// Escala de grises en PNG: Tesseract reconoce mejor sin color.
pub fn to_grayscale_png(image: &[u8]) -> DomainResult<Vec<u8>> {
    let img = image::load_from_memory(image)
        .map_err(|e| DomainError::InvalidInput(format!("imagen ilegible: {e}")))?;
    let gray = DynamicImage::ImageLuma8(img.to_luma8());
    let mut buf = Cursor::new(Vec::new());
    gray.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| DomainError::OperationFailed(format!("codificando PNG: {e}")))?;
    Ok(buf.into_inner())
}

fn run_tesseract(binary: &str, lang: &str, png: &[u8]) -> DomainResult<String> {
    let mut child = Command::new(binary)
        .args(["stdin", "stdout", "-l", lang])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| DomainError::Unavailable(format!("no se pudo lanzar {binary}: {e}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(png) {
            drop(stdin);
            // Sin esperar al proceso quedaría zombi.
            let _ = child.kill();
            let status = child.wait();
            error!("❌ tesseract cerró la entrada ({e}); salida: {status:?}");
            return Err(DomainError::OperationFailed(format!("escribiendo a tesseract: {e}")));
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| DomainError::OperationFailed(format!("esperando a tesseract: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DomainError::OperationFailed(format!("tesseract terminó con {}: {}", output.status, stderr.trim())));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[async_trait]
impl OcrPort for TesseractOcr {
    async fn extract_text(&self, image: &[u8]) -> DomainResult<String> {
        let image = image.to_vec();
        let binary = self.cfg.binary.clone();
        let lang = self.cfg.lang.clone();

        // Decodificar y lanzar el proceso bloquea: fuera del runtime.
        let text = tokio::task::spawn_blocking(move || {
            let png = to_grayscale_png(&image)?;
            run_tesseract(&binary, &lang, &png)
        })
        .await
        .map_err(|e| {
            error!("❌ Tarea de OCR abortada: {e}");
            DomainError::OperationFailed(e.to_string())
        })??;

        info!("🔤 OCR: {} caracteres", text.chars().count());
        Ok(text)
    }
}
