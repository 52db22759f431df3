// ==========================================
// 合金熔体活度计算 - 参数仓储层
// ==========================================
// 红线: Repository 不含计算逻辑（单位换算除外）
// ==========================================
// 职责: 元素参数与相互作用参数的只读访问
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod element_repo;
pub mod error;
pub mod interaction_repo;
pub mod temperature_formula;

// 重导出核心仓储
pub use element_repo::{ElementRepository, ElementSource, InMemoryElementSource};
pub use error::{RepositoryError, RepositoryResult};
pub use interaction_repo::{FirstOrderEstimator, InteractionParameterStore};
pub use temperature_formula::{resolve_coefficient, TemperatureFormula};
