use crate::domain::types::PhaseState;
use crate::engine::activity::ActivityConditions;
use crate::engine::binary::ModelSettings;
use crate::engine::extrapolation::ExtrapolationModel;
use crate::engine::quadrature::QuadratureSettings;
use serde::{Deserialize, Serialize};

/// 计算配置（持久化对象）
///
/// 存储位置：config_kv（每个字段一个 key，见 config_keys）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculationSettings {
    /// 非对称参数 λ
    #[serde(default)]
    pub asymmetry_lambda: f64,

    /// 过剩熵开关
    #[serde(default)]
    pub entropy_enabled: bool,

    /// 默认温度（K）
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,

    #[serde(default)]
    pub default_state: PhaseState,

    #[serde(default)]
    pub default_extrapolation: ExtrapolationModel,

    #[serde(default)]
    pub quadrature: QuadratureSettings,

    /// 含 H 体系体积迭代上限
    #[serde(default = "default_hydrogen_max_iterations")]
    pub hydrogen_max_iterations: usize,

    #[serde(default = "default_hydrogen_tolerance")]
    pub hydrogen_tolerance: f64,
}

fn default_temperature() -> f64 {
    1873.0
}

fn default_hydrogen_max_iterations() -> usize {
    1000
}

fn default_hydrogen_tolerance() -> f64 {
    1e-6
}

impl Default for CalculationSettings {
    fn default() -> Self {
        Self {
            asymmetry_lambda: 0.0,
            entropy_enabled: false,
            default_temperature: default_temperature(),
            default_state: PhaseState::Liquid,
            default_extrapolation: ExtrapolationModel::Uem1,
            quadrature: QuadratureSettings::default(),
            hydrogen_max_iterations: default_hydrogen_max_iterations(),
            hydrogen_tolerance: default_hydrogen_tolerance(),
        }
    }
}

impl CalculationSettings {
    /// 二元模型实例参数
    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            lambda: self.asymmetry_lambda,
            entropy: self.entropy_enabled,
            hydrogen_max_iterations: self.hydrogen_max_iterations,
            hydrogen_tolerance: self.hydrogen_tolerance,
            quadrature: self.quadrature,
        }
    }

    /// 默认计算条件
    pub fn default_conditions(&self) -> ActivityConditions {
        ActivityConditions::new(
            self.default_temperature,
            self.default_state,
            self.default_extrapolation,
        )
    }
}
