// ==========================================
// 合金熔体活度计算 - 相互作用参数记录
// ==========================================
// 来源: first_order / second_order / lnY0 表
// 温度字段: 固定温度 (如 "1873") 或标记 "T" (系数为 a/T+b 表达式)
// ==========================================

use crate::domain::types::ConcentrationUnit;
use serde::{Deserialize, Serialize};

/// 温度字段中表示"系数随温度变化"的标记
pub const TEMPERATURE_FORMULA_MARKER: &str = "T";

// ==========================================
// InteractionParameterRecord - 参数库原始记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionParameterRecord {
    pub solvent: String,
    pub solute_i: String,
    pub solute_j: String,
    pub solute_k: Option<String>,
    pub coefficient: String,         // 系数文本（数值或 a/T+b）
    pub unit: ConcentrationUnit,
    pub temperature: String,         // 温度文本（数值或 "T"）
    pub rank: Option<String>,
    pub reference: Option<String>,
}

impl InteractionParameterRecord {
    /// 系数是否为温度表达式
    pub fn is_temperature_formula(&self) -> bool {
        self.temperature.trim() == TEMPERATURE_FORMULA_MARKER
    }
}

// ==========================================
// 查询结果
// ==========================================

/// 参数查询结果
///
/// - value 为 NaN 表示无可用数据
/// - swapped=true 表示以 (j, i) 顺序命中，value 已按互易关系换算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterLookup {
    pub value: f64,
    pub unit: ConcentrationUnit,
    pub swapped: bool,
    pub rank: Option<String>,
    pub reference: Option<String>,
}

impl ParameterLookup {
    pub fn not_found(unit: ConcentrationUnit) -> Self {
        Self {
            value: f64::NAN,
            unit,
            swapped: false,
            rank: None,
            reference: None,
        }
    }

    pub fn is_found(&self) -> bool {
        !self.value.is_nan()
    }
}

// ==========================================
// ComparisonRow - 实验值与计算值对照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub solvent: String,
    pub solute_i: String,
    pub solute_j: String,
    pub temperature: f64,
    pub experimental: f64,        // 摩尔分数口径 ε，NaN 表示无实验值
    pub computed: Vec<(String, f64)>, // (外推模型, ε)
}
