// ==========================================
// 电动车保有量预测系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供 CLI 与集成方调用
// ==========================================

pub mod dashboard_api;
pub mod error;
pub mod forecast_api;
pub mod import_api;

// 重导出核心类型
pub use dashboard_api::DashboardApi;
pub use error::{ApiError, ApiResult};
pub use forecast_api::{ForecastApi, ForecastRequest};
pub use import_api::ImportApi;
