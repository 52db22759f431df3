// ==========================================
// 合金熔体活度计算 - API 层
// ==========================================
// 职责: 面向调用方的计算与参数管理入口
// 约定: 输入校验在此层完成；返回值均可序列化
// ==========================================

pub mod activity_api;
pub mod error;
pub mod parameter_api;

pub use activity_api::{
    ActivityApi, ActivityRequest, ActivityResponse, InteractionMatrixRequest,
    InteractionMatrixResponse,
};
pub use error::{ApiError, ApiResult};
pub use parameter_api::ParameterApi;
