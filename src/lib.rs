// ==========================================
// 电动车保有量预测系统 - 核心库
// ==========================================
// 功能: 历史数据 CSV/Excel 导入、保有量与充电需求预测、模型准确度、电网影响估算
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 预测与分析
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 引擎参数
pub mod config;

// 数据库基础设施（连接初始化/建表）
pub mod db;

// 日志系统
pub mod logging;

// 报表导出
pub mod export;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    AccuracyReport, ChargingEventRecord, ForecastPoint, HistoricalRecord, ModelUsed,
    SemanticField, SheetType, StoredForecast,
};

pub use engine::{AccuracyEvaluator, FitAndPredict, GridImpactAnalyzer, RegressionForecastEngine};

pub use api::{ApiError, ApiResult, DashboardApi, ForecastApi, ForecastRequest, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "电动车保有量预测系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
