// src/application/prompts.rs
//! Prompts del modelo de visión-lenguaje.
//!
//! Deben ser cortos (glm-4v corta o emite tokens de control con prompts
//! largos), sin mensaje de sistema y con la estructura de dos pasos:
//! informe razonado y después un bloque ```json``` con los mismos números.

use crate::domain::cad::CadComponent;

struct CadTemplate {
    label: &'static str,
    task: &'static str,
    example: &'static str,
    json_block: &'static str,
}

fn template(component: CadComponent) -> CadTemplate {
    match component {
        CadComponent::Beam => CadTemplate {
            label: "梁",
            task: "1)上部纵筋的规格和根数（若有分排如2/4需相加） 2)下部纵筋的规格和根数 \
                   3)是否有腰筋（G或N开头），有则写根数，无则写0 4)箍筋的直径、加密区间距和非加密区间距、肢数。",
            example: "例：上部筋2C25→top_bars_total=2，Φ8@100/200(2)→stirrup_dense=100,stirrup_normal=200,stirrup_legs=2",
            json_block: r#"{"top_bars_total": 0, "bottom_bars_total": 0, "waist_bars": 0, "stirrup_dense": 0, "stirrup_normal": 0, "stirrup_legs": 0}"#,
        },
        CadComponent::Slab => CadTemplate {
            label: "楼板",
            task: "1)受力钢筋的规格 2)间距标注数值（@后面的数字）。",
            example: "例：C10@150→design_spacing=150",
            json_block: r#"{"design_spacing": 0}"#,
        },
        CadComponent::Wall => CadTemplate {
            label: "剪力墙",
            task: "1)水平分布筋规格和间距 2)竖向分布筋规格和间距。若只标一个间距则水平竖向相同。",
            example: "例：Φ10@200→design_spacing=200",
            json_block: r#"{"design_spacing": 0}"#,
        },
        CadComponent::Column => CadTemplate {
            label: "柱",
            task: "1)截面尺寸（若分段标注如200+200需相加）。\
                   2)角筋的规格和根数。请独立、仔细辨认角筋标注文字，绝不可与中部筋的规格混淆！\
                   3)中部筋的规格和根数。\
                   4)纵筋总数（仅需将角筋与中部筋的【根数】相加，不要合并规格）。\
                   5)箍筋的直径、加密区与非加密区间距（如A8@100/200则加密=100，非加密=200）。",
            example: "例：角筋4C25，中部筋8C20，总数12根→corner_bars=4,middle_bars=8,total_bars=12",
            json_block: r#"{"corner_bars": 0, "middle_bars": 0, "total_bars": 0, "stirrup_dense": 0, "stirrup_normal": 0}"#,
        },
    }
}

pub fn cad_prompt(component: CadComponent) -> String {
    let t = template(component);
    format!(
        "这是一张【{label}】的CAD截面配筋图。请仔细看图，完成以下两步。\n\n\
         第一步 - 分析报告：\n\
         逐项读取图中的标注信息，写出你的判断依据。只提取图中可见标注，看不到的填0，不要猜测。\n\
         {task}\n{example}\n\n\
         第二步 - 填写JSON：\n\
         根据你在第一步中分析出的数字填入JSON。你在报告里写了什么数字，JSON里就必须填同样的数字！数值为纯整数不带单位。\n\
         ```json\n{json}\n```",
        label = t.label,
        task = t.task,
        example = t.example,
        json = t.json_block,
    )
}

pub const MATERIAL_PROMPT: &str = "你是一个钢筋质检员。请读取图中钢筋表面的凸起轧印（如4E22）。\n\
轧印识别规则：\n\
- 首位数字代表牌号：4代表HRB400，5代表HRB500，3代表HRB335\n\
- 字母E代表抗震钢筋（满足抗震要求）\n\
- 最后的数字代表公称直径(mm)\n\
- 示例：4E22 = HRB400抗震钢筋，直径22mm\n\
- 示例：5E25 = HRB500抗震钢筋，直径25mm\n\
- 示例：422 = HRB400非抗震钢筋，直径22mm\n\n\
请严格以 JSON 格式返回，不要包含其他任何文字：\n\
{\"material_grade\": \"HRB400\", \"is_seismic\": true, \"diameter\": 22, \"raw_text\": \"4E22\"}";
