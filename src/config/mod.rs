// ==========================================
// 电动车保有量预测系统 - 配置层
// ==========================================
// 职责: 引擎参数定义与 config_kv 覆写加载
// ==========================================

pub mod config_manager;
pub mod engine_config;

pub use config_manager::{config_keys, ConfigManager};
pub use engine_config::{
    AccuracySettings, EngineConfig, ForecastSettings, GridSettings, ImportSettings,
};
