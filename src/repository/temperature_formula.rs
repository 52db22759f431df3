// ==========================================
// 合金熔体活度计算 - 温度相关系数解析
// ==========================================
// 形式: a/T + b（两项顺序任意，可省略任一项，允许空白与正负号）
// 规则:
// - 温度字段为 "T"：解析表达式并在请求温度下求值
// - 否则：温度字段必须与请求温度精确一致，否则视为无适用数据 (NaN)
// ==========================================

use crate::domain::interaction::TEMPERATURE_FORMULA_MARKER;
use crate::repository::error::{RepositoryError, RepositoryResult};

/// 固定温度匹配容差
pub const TEMPERATURE_MATCH_TOLERANCE: f64 = 1e-9;

/// a/T + b
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureFormula {
    pub a: f64,
    pub b: f64,
}

impl TemperatureFormula {
    pub fn parse(text: &str) -> RepositoryResult<Self> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(RepositoryError::FormulaParseError(text.to_string()));
        }

        let mut formula = TemperatureFormula { a: 0.0, b: 0.0 };
        for term in split_terms(&compact) {
            if let Some(numerator) = term.strip_suffix("/T") {
                formula.a += parse_number(numerator, text)?;
            } else {
                formula.b += parse_number(&term, text)?;
            }
        }
        Ok(formula)
    }

    pub fn evaluate(&self, temperature: f64) -> f64 {
        if temperature <= 0.0 {
            return f64::NAN;
        }
        self.a / temperature + self.b
    }
}

/// 按顶层 +/- 拆分（保留符号；指数记数法中的符号不拆分）
fn split_terms(compact: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;

    for c in compact.chars() {
        let is_sign = c == '+' || c == '-';
        let after_exponent = matches!(prev, Some('e') | Some('E'));
        if is_sign && !current.is_empty() && !after_exponent {
            terms.push(std::mem::take(&mut current));
        }
        current.push(c);
        prev = Some(c);
    }
    if !current.is_empty() {
        terms.push(current);
    }
    terms
}

fn parse_number(raw: &str, original: &str) -> RepositoryResult<f64> {
    let trimmed = raw.strip_prefix('+').unwrap_or(raw);
    match trimmed {
        "" => Ok(1.0),
        "-" => Ok(-1.0),
        _ => trimmed
            .parse::<f64>()
            .map_err(|_| RepositoryError::FormulaParseError(original.to_string())),
    }
}

/// 按温度字段解析系数文本
///
/// # 返回
/// - 有效数值: 适用的系数
/// - NaN: 无适用数据（温度不匹配 / 文本为空 / 无法解析）
pub fn resolve_coefficient(coefficient: Option<&str>, temperature_field: &str, temperature: f64) -> f64 {
    let coefficient = match coefficient.map(str::trim) {
        Some(c) if !c.is_empty() => c,
        _ => return f64::NAN,
    };

    if temperature_field.trim() == TEMPERATURE_FORMULA_MARKER {
        return match TemperatureFormula::parse(coefficient) {
            Ok(formula) => formula.evaluate(temperature),
            Err(e) => {
                tracing::warn!(coefficient, error = %e, "温度表达式解析失败");
                f64::NAN
            }
        };
    }

    let stored_t = match temperature_field.trim().parse::<f64>() {
        Ok(t) => t,
        Err(_) => {
            tracing::warn!(temperature_field, "温度字段无法解析");
            return f64::NAN;
        }
    };

    if (stored_t - temperature).abs() > TEMPERATURE_MATCH_TOLERANCE {
        return f64::NAN;
    }

    coefficient.parse::<f64>().unwrap_or_else(|_| {
        tracing::warn!(coefficient, "系数文本无法解析为数值");
        f64::NAN
    })
}
