use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::annotation::RebarSpec;

/// Registro de inspección persistido.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub id: i64,
    pub record_id: String,
    pub inspection_type: String,
    pub project_name: Option<String>,
    pub location: Option<String>,
    pub column_id: Option<String>,
    pub section_size: Option<(u32, u32)>,
    pub detected_count: Option<u32>,
    pub design_total: Option<u32>,
    pub compliance_status: Option<String>,
    pub compliance_message: Option<String>,
    pub rebar_config: Option<Vec<RebarSpec>>,
    /// Se guardan tal cual llegan del cliente (predicciones y cerco).
    #[serde(skip_serializing)]
    pub predictions: Option<Value>,
    #[serde(skip_serializing)]
    pub hoop_path: Option<Value>,
    pub image_url: Option<String>,
    pub inspector: Option<String>,
    pub created_at: DateTime<Local>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSnapshot {
    pub status: Option<String>,
    pub message: Option<String>,
}

/// Datos que envía el cliente al crear un registro.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewInspectionRecord {
    pub inspection_type: Option<String>,
    pub project_name: Option<String>,
    pub location: Option<String>,
    pub column_id: Option<String>,
    pub section_size: Option<(u32, u32)>,
    pub detected_count: Option<u32>,
    pub design_total: Option<u32>,
    pub compliance: Option<ComplianceSnapshot>,
    pub rebar_config: Option<Vec<RebarSpec>>,
    pub predictions: Option<Value>,
    pub hoop_path: Option<Value>,
    pub image_url: Option<String>,
    pub inspector: Option<String>,
}

/// Registro listo para insertar (identificador y fecha ya asignados).
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub record_id: String,
    pub inspection_type: String,
    pub data: NewInspectionRecord,
    pub created_at: DateTime<Local>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub page: u32,
    pub per_page: u32,
    pub inspection_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPage {
    pub records: Vec<InspectionRecord>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub pages: u64,
}

/// `IR` + fecha local `YYYYMMDDHHMMSS` + 4 hex en mayúsculas.
/// `IR<fecha y hora><4 hex del UUID en mayúsculas>`.
pub fn make_record_id(now: DateTime<Local>, nonce: Uuid) -> String {
    let hex = nonce.simple().to_string();
    format!("IR{}{}", now.format("%Y%m%d%H%M%S"), hex[..4].to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn record_id_has_timestamp_and_hex_suffix() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let nonce = Uuid::from_u128(0x3c4d_ab00_0000_0000_0000_0000_0000_0001);
        assert_eq!(make_record_id(now, nonce), "IR202403091405073C4D");
        let nonce = Uuid::from_u128(0x000a_0000_0000_0000_0000_0000_0000_0000);
        assert_eq!(make_record_id(now, nonce), "IR20240309140507000A");
    }

    #[test]
    fn record_ids_differ_within_the_same_second() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let ids: std::collections::HashSet<String> =
            (0..64).map(|_| make_record_id(now, Uuid::new_v4())).collect();
        assert!(ids.len() > 50);
    }

    #[test]
    fn new_record_accepts_partial_payload() {
        let rec: NewInspectionRecord = serde_json::from_str(
            r#"{"inspection_type": "column", "section_size": [650, 600],
                "compliance": {"status": "PASS", "message": "ok"}}"#,
        )
        .unwrap();
        assert_eq!(rec.section_size, Some((650, 600)));
        assert_eq!(rec.compliance.unwrap().status.as_deref(), Some("PASS"));
        assert!(rec.project_name.is_none());
    }
}
