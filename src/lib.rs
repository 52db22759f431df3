// ==========================================
// 合金熔体活度计算 - 核心库
// ==========================================
// 模型: Miedema 二元生成焓 + 几何外推 (UEM1/UEM2/GSM/Muggianu/Toop)
// 输出: 一阶/二阶相互作用系数、无限稀活度系数、多元活度
// 技术栈: Rust + SQLite (参数库)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 元素、成分、参数记录
pub mod domain;

// 数据仓储层 - 参数库访问
pub mod repository;

// 引擎层 - 热力学计算
pub mod engine;

// 导入层 - CSV 参数
pub mod importer;

// 配置层 - 计算配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 调用入口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    parse_composition, ComparisonRow, Composition, ConcentrationUnit, Element,
    InteractionParameterRecord, ParameterLookup, PhaseState,
};

// 引擎
pub use engine::{
    entropy_judge, ActivityCoefficientEngine, ActivityConditions, ActivityResult, BinaryModel,
    CalcError, ClosureModel, ContributionReporter, ExtrapolationModel, ModelSettings,
    TernaryMelts,
};

// 仓储
pub use repository::{ElementRepository, ElementSource, InteractionParameterStore};

// 配置
pub use config::{CalculationSettings, ConfigManager};

// API
pub use api::{ActivityApi, ParameterApi};

// ==========================================
// 常量定义
// ==========================================

// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 名称
pub const APP_NAME: &str = "合金熔体活度计算";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
