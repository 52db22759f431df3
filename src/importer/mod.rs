// ==========================================
// 合金熔体活度计算 - 参数导入层
// ==========================================
// 职责: CSV 参数文件解析、逐行校验、写入参数库
// ==========================================

pub mod error;
pub mod file_parser;
pub mod parameter_importer;

pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, RawRecord};
pub use parameter_importer::{ImportSummary, ParameterImporter, RowViolation};
