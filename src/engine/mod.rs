// ==========================================
// 电动车保有量预测系统 - 引擎层
// ==========================================
// 职责: 预测拟合、准确度评估、看板汇总、电网影响估算
// 红线: Engine 不拼 SQL，只处理内存中的记录
// ==========================================

pub mod accuracy;
pub mod dashboard;
pub mod error;
pub mod forecast_engine;
pub mod grid_impact;
pub mod growth;
pub mod metrics;
pub mod protocol;
pub mod regression;

// 重导出核心引擎
pub use accuracy::AccuracyEvaluator;
pub use dashboard::{compute_dashboard_stats, DashboardStats};
pub use error::{ForecastError, ForecastResult};
pub use forecast_engine::{FitAndPredict, FitEvaluation, RegressionForecastEngine};
pub use grid_impact::{
    GridAnalysis, GridImpactAnalyzer, LoadShapeSource, MidpointLoadShape, SeededLoadShape,
};
pub use protocol::{handle_json, handle_request, EngineRequest, EngineResponse};
