// src/domain/cad.rs
//! Interpretación de las respuestas del modelo de visión-lenguaje:
//! lectura de planos CAD y de marcas de laminación.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;

pub const EMPTY_REPORT_PLACEHOLDER: &str = "模型未生成分析报告，请查看下方参数是否已自动填充。";
const SUMMARY_HEADER: &str = "**AI 自动提取结果（模型未生成分析报告）：**";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CadComponent {
    Column,
    Beam,
    Slab,
    Wall,
}

impl CadComponent {
    /// Valor desconocido o vacío: pilar.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "beam" => Self::Beam,
            "slab" => Self::Slab,
            "wall" => Self::Wall,
            _ => Self::Column,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Column => "column",
            Self::Beam => "beam",
            Self::Slab => "slab",
            Self::Wall => "wall",
        }
    }
}

/// Respuesta del modelo separada en informe (Markdown) y datos estructurados.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelReply {
    pub report: String,
    pub data: Map<String, Value>,
}

fn fenced_json_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("static regex"))
}

fn widest_braces_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
}

fn any_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*\n?(.*?)\n?\s*```").expect("static regex"))
}

fn flat_braces_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[^{}]*\}").expect("static regex"))
}

fn output_format_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</?output_format>").expect("static regex"))
}

fn empty_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```\w*\s*```").expect("static regex"))
}

fn line_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"//[^\n]*").expect("static regex"))
}

impl ModelReply {
    /// Nunca falla: si no hay JSON legible, `data` queda vacío y la
    /// respuesta completa pasa a ser el informe.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        let (json_span, report) = match fenced_json_re().captures(raw) {
            Some(caps) => {
                let whole = caps.get(0).map_or(0..0, |m| m.range());
                let inner = caps.get(1).map_or("", |m| m.as_str());
                (inner.trim().to_string(), splice_out(raw, whole))
            }
            None => match widest_braces_re().find(raw) {
                Some(m) => (m.as_str().trim().to_string(), splice_out(raw, m.range())),
                None => (String::new(), raw.to_string()),
            },
        };

        let report = output_format_tag_re().replace_all(&report, "");
        let report = empty_fence_re().replace_all(&report, "").trim().to_string();

        let data = if json_span.is_empty() {
            Map::new()
        } else {
            let cleaned = json_span.replace('\u{feff}', "");
            let cleaned = line_comment_re().replace_all(cleaned.trim(), "");
            match serde_json::from_str::<Value>(&cleaned) {
                Ok(Value::Object(map)) => map,
                Ok(_) => Map::new(),
                Err(e) => {
                    tracing::warn!("JSON del modelo ilegible ({e}): {cleaned}");
                    Map::new()
                }
            }
        };

        let report = if !report.is_empty() {
            report
        } else if !data.is_empty() {
            summarize(&data)
        } else {
            EMPTY_REPORT_PLACEHOLDER.to_string()
        };

        Self { report, data }
    }
}

fn splice_out(raw: &str, range: std::ops::Range<usize>) -> String {
    format!("{}{}", &raw[..range.start], &raw[range.end..]).trim().to_string()
}

fn summarize(data: &Map<String, Value>) -> String {
    let mut lines = vec![SUMMARY_HEADER.to_string(), String::new()];
    for (k, v) in data {
        let shown = match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        lines.push(format!("- **{k}**: {shown}"));
    }
    lines.join("\n")
}

/// Busca un objeto JSON en texto libre: texto completo, bloque de código,
/// o el primer par de llaves sin anidar.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let as_object = |s: &str| match serde_json::from_str::<Value>(s.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    };

    as_object(text)
        .or_else(|| {
            any_fence_re()
                .captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| as_object(m.as_str()))
        })
        .or_else(|| flat_braces_re().find(text).and_then(|m| as_object(m.as_str())))
}

/// Marca de laminación en la superficie de la barra (p. ej. "4E22").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialMark {
    pub material_grade: String,
    pub is_seismic: bool,
    pub diameter: u32,
    pub raw_text: String,
}

impl MaterialMark {
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            material_grade: text("material_grade"),
            is_seismic: obj.get("is_seismic").and_then(Value::as_bool).unwrap_or(false),
            diameter: obj
                .get("diameter")
                .and_then(Value::as_u64)
                .and_then(|d| u32::try_from(d).ok())
                .unwrap_or(0),
            raw_text: text("raw_text"),
        }
    }
}
