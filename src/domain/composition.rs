// ==========================================
// 合金熔体活度计算 - 成分模型
// ==========================================
// 语法: Element := [A-Z][a-z]? ; Token := Element (Decimal)?
// 规则: 缺省数量为 1.0，重复元素累加，解析后归一化为摩尔分数
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// 归一化容差
pub const NORMALIZATION_TOLERANCE: f64 = 1e-6;

/// 成分解析/校验错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositionError {
    #[error("成分字符串为空")]
    Empty,

    #[error("成分字符串格式错误 (位置 {position}): {message}")]
    Malformed { position: usize, message: String },

    #[error("元素 {symbol} 的数量无效: {value}")]
    InvalidAmount { symbol: String, value: String },

    #[error("成分总量必须大于 0")]
    ZeroTotal,
}

// ==========================================
// Composition - 成分 (元素 → 摩尔分数)
// ==========================================
// 保留首次出现顺序，便于回显
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    entries: Vec<(String, f64)>,
}

impl Composition {
    /// 由 (元素, 数量) 列表构造并归一化
    pub fn from_amounts<I, S>(amounts: I) -> Result<Self, CompositionError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut entries: Vec<(String, f64)> = Vec::new();
        for (symbol, amount) in amounts {
            let symbol = symbol.into();
            if !amount.is_finite() || amount < 0.0 {
                return Err(CompositionError::InvalidAmount {
                    symbol,
                    value: amount.to_string(),
                });
            }
            match entries.iter_mut().find(|(s, _)| *s == symbol) {
                Some((_, v)) => *v += amount,
                None => entries.push((symbol, amount)),
            }
        }

        if entries.is_empty() {
            return Err(CompositionError::Empty);
        }

        let total: f64 = entries.iter().map(|(_, v)| v).sum();
        if total <= 0.0 {
            return Err(CompositionError::ZeroTotal);
        }
        for (_, v) in entries.iter_mut() {
            *v /= total;
        }

        Ok(Self { entries })
    }

    /// 元素摩尔分数，不存在返回 None
    pub fn fraction(&self, symbol: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, v)| *v)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.iter().any(|(s, _)| s == symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(s, v)| (s.as_str(), *v))
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.entries.iter().map(|(s, _)| s.as_str()).collect()
    }

    /// 除溶剂外的全部组元
    pub fn solutes<'a>(&'a self, solvent: &'a str) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        self.iter().filter(move |(s, _)| *s != solvent)
    }

    pub fn distinct_elements(&self) -> BTreeSet<String> {
        self.entries.iter().map(|(s, _)| s.clone()).collect()
    }

    /// 体系名称，如 "Fe-C-Si"
    pub fn system_name(&self) -> String {
        self.symbols().join("-")
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }

    pub fn is_normalized(&self) -> bool {
        (self.total() - 1.0).abs() <= NORMALIZATION_TOLERANCE
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (symbol, x) in &self.entries {
            write!(f, "{}{}", symbol, x)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Composition {
    type Err = CompositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_composition(s)
    }
}

// ==========================================
// 成分字符串解析
// ==========================================

/// 解析 `Fe70C3Si27` / `Fe0.7 C0.03 Si0.27` / `FeC` 形式的成分字符串
pub fn parse_composition(text: &str) -> Result<Composition, CompositionError> {
    let chars: Vec<char> = text.chars().collect();
    if chars.iter().all(|c| c.is_whitespace()) {
        return Err(CompositionError::Empty);
    }

    let mut amounts: Vec<(String, f64)> = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        if !c.is_ascii_uppercase() {
            return Err(CompositionError::Malformed {
                position: pos,
                message: format!("期望元素符号首字母（大写），实际为 '{}'", c),
            });
        }

        let mut symbol = c.to_string();
        pos += 1;
        if pos < chars.len() && chars[pos].is_ascii_lowercase() {
            symbol.push(chars[pos]);
            pos += 1;
        }

        let start = pos;
        while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
            pos += 1;
        }

        let amount = if start == pos {
            1.0
        } else {
            let raw: String = chars[start..pos].iter().collect();
            raw.parse::<f64>()
                .map_err(|_| CompositionError::InvalidAmount {
                    symbol: symbol.clone(),
                    value: raw.clone(),
                })?
        };

        amounts.push((symbol, amount));
    }

    Composition::from_amounts(amounts)
}
