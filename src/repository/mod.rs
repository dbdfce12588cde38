// ==========================================
// 电动车保有量预测系统 - 数据仓储层
// ==========================================
// 职责: SQLite 数据访问，不含业务规则
// ==========================================

pub mod error;
pub mod ev_data_repo;
pub mod ev_data_repo_impl;

pub use error::{RepositoryError, RepositoryResult};
pub use ev_data_repo::EvDataRepository;
pub use ev_data_repo_impl::EvDataRepositoryImpl;
