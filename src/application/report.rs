//! Informe de sección de pilar en formato xlsx.

use chrono::{DateTime, Local};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, XlsxError};

use crate::application::dto::ColumnReportRequest;
use crate::domain::errors::{DomainError, DomainResult};

pub const REPORT_TITLE: &str = "钢筋工程智能管控平台 - 柱截面检测报告";
pub const REPORT_SHEET: &str = "柱截面检测报告";
pub const REPORT_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADER_BLUE: u32 = 0x2196F3;
const COLUMN_WIDTHS: [(u16, f64); 4] = [(0, 15.0), (1, 15.0), (2, 25.0), (3, 25.0)];

pub fn report_filename(now: DateTime<Local>) -> String {
    format!("column_report_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

/// Color de la celda de dictamen; `None` para estados sin color.
pub fn status_color(status: &str) -> Option<u32> {
    match status {
        "PASS" => Some(0x008000),
        "FAIL" => Some(0xFF0000),
        "WARNING" => Some(0xFF8C00),
        _ => None,
    }
}

pub fn render_column_report(req: &ColumnReportRequest, now: DateTime<Local>) -> DomainResult<Vec<u8>> {
    build_workbook(req, now).map_err(|e| DomainError::OperationFailed(format!("generando xlsx: {e}")))
}

fn build_workbook(req: &ColumnReportRequest, now: DateTime<Local>) -> Result<Vec<u8>, XlsxError> {
    let title = Format::new()
        .set_bold()
        .set_font_size(16)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let section_title = Format::new().set_bold().set_font_size(12);
    let header = Format::new()
        .set_bold()
        .set_font_size(14)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_BLUE))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);

    let compliance = req.compliance.clone().unwrap_or_default();
    let status = compliance.status.unwrap_or_else(|| "N/A".to_string());
    let section = req
        .section_size
        .map(|(w, h)| format!("{w}×{h} mm"))
        .unwrap_or_else(|| "N/A".to_string());

    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    ws.set_name(REPORT_SHEET)?;

    ws.merge_range(0, 0, 0, 5, REPORT_TITLE, &title)?;

    // Datos generales
    ws.write_string(2, 0, "柱号")?;
    ws.write_string(2, 1, req.column_id.as_deref().unwrap_or("N/A"))?;
    ws.write_string(2, 2, "检测时间")?;
    ws.write_string(2, 3, now.format("%Y-%m-%d %H:%M:%S").to_string())?;
    ws.write_string(3, 0, "截面尺寸")?;
    ws.write_string(3, 1, section)?;

    // Resultados
    ws.write_string_with_format(5, 0, "检测结果汇总", &section_title)?;
    for (col, label) in ["项目", "数值", "说明"].into_iter().enumerate() {
        ws.write_string_with_format(6, col as u16, label, &header)?;
    }
    ws.write_string(7, 0, "AI 检测数量")?;
    ws.write_number(7, 1, f64::from(req.detected_count))?;
    ws.write_string(7, 2, "纵筋根数")?;
    ws.write_string(8, 0, "设计数量")?;
    ws.write_number(8, 1, f64::from(req.design_total))?;
    ws.write_string(8, 2, "图纸要求")?;

    ws.write_string(9, 0, "合规性判定")?;
    match status_color(&status) {
        Some(rgb) => {
            let verdict = Format::new().set_bold().set_font_color(Color::RGB(rgb));
            ws.write_string_with_format(9, 1, &status, &verdict)?;
        }
        None => {
            ws.write_string(9, 1, &status)?;
        }
    }
    ws.write_string(9, 2, compliance.message.unwrap_or_default())?;

    for (col, width) in COLUMN_WIDTHS {
        ws.set_column_width(col, width)?;
    }

    workbook.save_to_buffer()
}
