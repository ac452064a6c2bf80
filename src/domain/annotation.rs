// src/domain/annotation.rs
//! Lectura de anotaciones de armado ("pingfa") sobre texto reconocido.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=50;
pub const DIAMETER_RANGE: std::ops::RangeInclusive<u32> = 6..=50;

/// Un grupo de barras: `count` barras de `diameter` mm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebarSpec {
    pub count: u32,
    pub diameter: u32,
}

/// Resultado de pasar todos los extractores sobre un texto.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationParse {
    pub raw_text: String,
    pub column_id: Option<String>,
    pub section_size: Option<(u32, u32)>,
    pub rebar_config: Vec<RebarSpec>,
    pub design_total: u32,
}

impl AnnotationParse {
    pub fn from_text(raw: &str) -> Self {
        let rebar_config = parse_rebar_specs(raw);
        Self {
            raw_text: raw.to_string(),
            column_id: parse_column_id(raw),
            section_size: parse_section_size(raw),
            design_total: design_total(&rebar_config),
            rebar_config,
        }
    }
}

fn spec_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)([0-9]+)\s*[CΦφ]\s*([0-9]+)").expect("static regex"))
}

fn column_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)[KGZ]+Z?[0-9]+").expect("static regex"))
}

fn section_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)([0-9]{3,4})\s*[x×*]\s*([0-9]{3,4})").expect("static regex"))
}

/// Extrae todos los grupos `nCd` / `nΦd` / `nφd`.
///
/// Los grupos fuera de rango (cantidad 1..=50, diámetro 6..=50) se
/// descartan en silencio: el ruido numérico del OCR es habitual.
pub fn parse_rebar_specs(text: &str) -> Vec<RebarSpec> {
    spec_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let count = caps[1].parse::<u32>().ok()?;
            let diameter = caps[2].parse::<u32>().ok()?;
            (COUNT_RANGE.contains(&count) && DIAMETER_RANGE.contains(&diameter))
                .then_some(RebarSpec { count, diameter })
        })
        .collect()
}

pub fn design_total(specs: &[RebarSpec]) -> u32 {
    specs.iter().map(|s| s.count).sum()
}

/// Número de pilar (KZ1, GZ3, Z2...), en mayúsculas.
pub fn parse_column_id(text: &str) -> Option<String> {
    column_re().find(text).map(|m| m.as_str().to_uppercase())
}

/// Sección `ancho x alto` (650x600, 650*600, 650×600).
pub fn parse_section_size(text: &str) -> Option<(u32, u32)> {
    let caps = section_re().captures(text)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}
