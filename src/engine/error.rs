// ==========================================
// 合金熔体活度计算 - 计算层错误类型
// ==========================================
// 说明: 仅输入校验类错误以 Err 返回；
//       参数缺失、数值奇异一律以 NaN 传播，不进入此类型
// ==========================================

use crate::domain::composition::CompositionError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalcError {
    #[error("成分解析失败: {0}")]
    Composition(#[from] CompositionError),

    #[error("成分中缺少{role}元素: {symbol}")]
    MissingComponent { role: &'static str, symbol: String },

    #[error("组元数不足: 至少需要 2 个组元，实际 {0} 个")]
    TooFewComponents(usize),

    #[error("溶质与溶剂相同: {0}")]
    SoluteIsSolvent(String),

    #[error("温度必须为正值: {0}")]
    InvalidTemperature(f64),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl CalcError {
    pub fn missing_solute(symbol: &str) -> Self {
        CalcError::MissingComponent {
            role: "溶质",
            symbol: symbol.to_string(),
        }
    }

    pub fn missing_solvent(symbol: &str) -> Self {
        CalcError::MissingComponent {
            role: "溶剂",
            symbol: symbol.to_string(),
        }
    }
}

pub type CalcResult<T> = Result<T, CalcError>;
