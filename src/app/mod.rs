// ==========================================
// 电动车保有量预测系统 - 应用层
// ==========================================
// 职责: 组装数据库、配置与 API，供 CLI 使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
