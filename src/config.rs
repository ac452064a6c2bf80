use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SPACING_URL: &str = "https://detect.roboflow.com/rebar-4y6jc-vrqiw/3";
const DEFAULT_COUNTING_URL: &str = "https://detect.roboflow.com/rebar-9zzhq-zm30m/1";
const DEFAULT_ZHIPU_URL: &str = "https://open.bigmodel.cn/api/paas/v4";

/// Configuración del proceso, leída una sola vez de variables de entorno.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub database_path: PathBuf,
    pub storage_dir: PathBuf,
    pub http_timeout: Duration,
    pub roboflow: RoboflowConfig,
    pub vlm: VlmConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone)]
pub struct RoboflowConfig {
    pub api_key: String,
    pub spacing_url: String,
    pub counting_url: String,
}

#[derive(Debug, Clone)]
pub struct VlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub binary: String,
    pub lang: String,
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u16>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_string("BIND_ADDR", "0.0.0.0"),
            port: env_u16("PORT", 5000),
            static_dir: PathBuf::from(env_string("STATIC_DIR", "public")),
            database_path: PathBuf::from(env_string("DATABASE_PATH", "rebar_system.sqlite")),
            storage_dir: env::var("STORAGE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join("rebar-images")),
            http_timeout: Duration::from_secs(env_u64("HTTP_TIMEOUT_SECS", 60)),
            roboflow: RoboflowConfig {
                api_key: env_string("ROBOFLOW_API_KEY", ""),
                spacing_url: env_string("ROBOFLOW_SPACING_URL", DEFAULT_SPACING_URL),
                counting_url: env_string("ROBOFLOW_COUNTING_URL", DEFAULT_COUNTING_URL),
            },
            vlm: VlmConfig {
                api_key: env_string("ZHIPU_API_KEY", ""),
                base_url: env_string("ZHIPU_BASE_URL", DEFAULT_ZHIPU_URL),
                model: env_string("GLM_MODEL", "glm-4v-flash"),
            },
            ocr: OcrConfig {
                binary: env_string("TESSERACT_BIN", "tesseract"),
                lang: env_string("OCR_LANG", "chi_sim+eng"),
            },
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}
