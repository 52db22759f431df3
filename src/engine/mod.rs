// ==========================================
// 合金熔体活度计算 - 引擎层
// ==========================================
// 职责: Miedema 二元模型、三元外推、相互作用系数、活度系数
// 红线: Engine 不拼 SQL; 元素参数经 ElementSource 注入
// ==========================================

pub mod activity;
pub mod binary;
pub mod cache;
pub mod entropy;
pub mod error;
pub mod events;
pub mod extrapolation;
pub mod quadrature;
pub mod ternary;
pub mod unit_conversion;

// 重导出核心引擎
pub use activity::{ActivityCoefficientEngine, ActivityConditions, ActivityResult, ClosureModel};
pub use binary::{BinaryModel, ModelSettings};
pub use cache::{CacheKey, ContributionCache};
pub use entropy::entropy_judge;
pub use error::{CalcError, CalcResult};
pub use events::{
    CollectingReporter, ContributionMap, ContributionReport, ContributionReporter, NoOpReporter,
    TracingReporter,
};
pub use extrapolation::{ExtrapolationModel, StrategyContext};
pub use quadrature::{GaussLegendre, QuadratureSettings};
pub use ternary::{InteractionCurve, MeltConditions, TernaryMelts};
