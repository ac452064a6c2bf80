use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComplianceStatus {
    Pass,
    Fail,
    Warning,
    Unknown,
}

impl ComplianceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Warning => "WARNING",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub status: ComplianceStatus,
    pub message: String,
    pub detected_count: u32,
    pub design_total: u32,
    /// detectado - proyecto; ausente cuando no hay valor de proyecto.
    pub diff: Option<i64>,
}

/// Compara el número detectado con el total de proyecto.
pub fn check_compliance(detected_count: u32, design_total: u32) -> ComplianceResult {
    if design_total == 0 {
        return ComplianceResult {
            status: ComplianceStatus::Unknown,
            message: format!("未提供设计数量，无法判定（检测数量 {detected_count}，设计数量 0）"),
            detected_count,
            design_total,
            diff: None,
        };
    }

    let diff = i64::from(detected_count) - i64::from(design_total);
    let (status, message) = match diff {
        0 => (
            ComplianceStatus::Pass,
            format!("✅ 合规：检测数量({detected_count})与设计数量({design_total})一致，差值 {diff:+}"),
        ),
        d if d > 0 => (
            ComplianceStatus::Warning,
            format!("⚠️ 警告：检测数量({detected_count})超出设计数量({design_total})，多出 {d} 根，差值 {diff:+}"),
        ),
        d => (
            ComplianceStatus::Fail,
            format!(
                "❌ 不合规：检测数量({detected_count})少于设计数量({design_total})，缺少 {} 根，差值 {diff:+}",
                d.abs()
            ),
        ),
    };

    ComplianceResult {
        status,
        message,
        detected_count,
        design_total,
        diff: Some(diff),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_counts_pass() {
        let r = check_compliance(12, 12);
        assert_eq!(r.status, ComplianceStatus::Pass);
        assert_eq!(r.diff, Some(0));
    }

    #[test]
    fn surplus_is_a_warning() {
        let r = check_compliance(14, 12);
        assert_eq!(r.status, ComplianceStatus::Warning);
        assert_eq!(r.diff, Some(2));
        assert!(r.message.contains("14") && r.message.contains("12") && r.message.contains("+2"));
    }

    #[test]
    fn deficit_fails() {
        let r = check_compliance(10, 12);
        assert_eq!(r.status, ComplianceStatus::Fail);
        assert_eq!(r.diff, Some(-2));
        assert!(r.message.contains("10") && r.message.contains("12") && r.message.contains("-2"));
    }

    #[test]
    fn missing_design_total_is_unknown() {
        let r = check_compliance(5, 0);
        assert_eq!(r.status, ComplianceStatus::Unknown);
        assert_eq!(r.diff, None);
    }

    #[test]
    fn unknown_iff_design_total_is_zero() {
        for detected in 0..6 {
            for design in 0..6 {
                let r = check_compliance(detected, design);
                assert_eq!(r.status == ComplianceStatus::Unknown, design == 0);
            }
        }
    }

    #[test]
    fn status_serializes_uppercase() {
        assert_eq!(serde_json::to_value(ComplianceStatus::Warning).unwrap(), "WARNING");
        assert_eq!(ComplianceStatus::Warning.as_str(), "WARNING");
    }
}
