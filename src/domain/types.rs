// ==========================================
// 合金熔体活度计算 - 领域类型定义
// ==========================================
// 职责: 物态、杂化类别、浓度单位等基础枚举
// 序列化格式: 与参数库字段一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 气体常数 J/(mol·K)
pub const GAS_CONSTANT: f64 = 8.314;

// ==========================================
// 物态 (Phase State)
// ==========================================
// 影响: 杂化项 α、过剩熵系数、缓存键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseState {
    Solid,  // 固态
    Liquid, // 液态
}

impl PhaseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseState::Solid => "solid",
            PhaseState::Liquid => "liquid",
        }
    }

    /// 杂化项缩放系数 α
    pub fn hybrid_alpha(&self) -> f64 {
        match self {
            PhaseState::Solid => 1.0,
            PhaseState::Liquid => 0.73,
        }
    }

    /// 过剩熵经验系数 τ（ΔS = ΔH/τ · (1/Tm_a + 1/Tm_b)）
    pub fn entropy_divisor(&self) -> f64 {
        match self {
            PhaseState::Solid => 15.1,
            PhaseState::Liquid => 14.0,
        }
    }
}

impl Default for PhaseState {
    fn default() -> Self {
        PhaseState::Liquid
    }
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PhaseState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "solid" | "s" => Ok(PhaseState::Solid),
            "liquid" | "l" => Ok(PhaseState::Liquid),
            other => Err(format!("未知物态: {}", other)),
        }
    }
}

// ==========================================
// 杂化类别 (Hybridization Class)
// ==========================================
// 过渡金属与 p 区多价元素之间才计入杂化项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HybridClass {
    Alpha, // 过渡金属
    Beta,  // p 区多价元素
    Other, // 其他
}

impl HybridClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            HybridClass::Alpha => "alpha",
            HybridClass::Beta => "beta",
            HybridClass::Other => "other",
        }
    }

    /// 从参数库字段解析，无法识别的值一律视为 other
    pub fn from_db_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "alpha" | "a" => HybridClass::Alpha,
            "beta" | "b" => HybridClass::Beta,
            _ => HybridClass::Other,
        }
    }
}

impl fmt::Display for HybridClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 浓度口径 (Concentration Unit)
// ==========================================
// Mass: 质量百分数口径 (e, r)
// Mole: 摩尔分数口径 (ε, ρ)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcentrationUnit {
    Mass,
    Mole,
}

impl fmt::Display for ConcentrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcentrationUnit::Mass => write!(f, "mass"),
            ConcentrationUnit::Mole => write!(f, "mole"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_state_parse() {
        assert_eq!("Liquid".parse::<PhaseState>().unwrap(), PhaseState::Liquid);
        assert_eq!(" solid ".parse::<PhaseState>().unwrap(), PhaseState::Solid);
        assert!("gas".parse::<PhaseState>().is_err());
    }

    #[test]
    fn test_phase_state_constants() {
        assert_eq!(PhaseState::Solid.hybrid_alpha(), 1.0);
        assert_eq!(PhaseState::Liquid.hybrid_alpha(), 0.73);
        assert_eq!(PhaseState::Liquid.entropy_divisor(), 14.0);
        assert_eq!(PhaseState::Solid.entropy_divisor(), 15.1);
    }

    #[test]
    fn test_hybrid_class_from_db() {
        assert_eq!(HybridClass::from_db_str("alpha"), HybridClass::Alpha);
        assert_eq!(HybridClass::from_db_str("Beta"), HybridClass::Beta);
        assert_eq!(HybridClass::from_db_str(""), HybridClass::Other);
    }
}
