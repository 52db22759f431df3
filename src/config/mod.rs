// ==========================================
// 合金熔体活度计算 - 配置层
// ==========================================
// 职责: 计算配置读取、覆写、快照
// 存储: config_kv 表
// ==========================================

pub mod calculation_settings;
pub mod config_manager;

// 重导出核心配置管理器
pub use calculation_settings::CalculationSettings;
pub use config_manager::{config_keys, ConfigManager};
