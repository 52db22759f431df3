// ==========================================
// 合金熔体活度计算 - 领域模型层
// ==========================================
// 职责: 元素参数、成分、相互作用参数记录、基础枚举
// 红线: 不含数据访问逻辑,不含计算引擎逻辑
// ==========================================

pub mod composition;
pub mod element;
pub mod interaction;
pub mod types;

// 重导出核心类型
pub use composition::{parse_composition, Composition, CompositionError};
pub use element::Element;
pub use interaction::{
    ComparisonRow, InteractionParameterRecord, ParameterLookup,
};
pub use types::{ConcentrationUnit, HybridClass, PhaseState, GAS_CONSTANT};
