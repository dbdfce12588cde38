// ==========================================
// 电动车保有量预测系统 - API层错误类型
// ==========================================
// 职责: 汇总导入/引擎/仓储错误，区分调用方错误（4xx 语义）与系统错误
// ==========================================

use crate::engine::error::ForecastError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 预测点数不足时返回给调用方的提示
pub const NOT_ENOUGH_HISTORY_MESSAGE: &str = "Not enough historical data to forecast";

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 调用方错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 导入格式错误（消息直接面向用户）
    #[error("{0}")]
    FormatError(String),

    /// 没有可用的数据行（附带行级告警）
    #[error("{message}")]
    NoValidRows {
        message: String,
        warnings: Vec<String>,
    },

    #[error("{0}")]
    InsufficientData(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 系统错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("预测引擎失败: {0}")]
    EngineFailure(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 是否为调用方可修正的错误
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidInput(_)
                | ApiError::FormatError(_)
                | ApiError::NoValidRows { .. }
                | ApiError::InsufficientData(_)
                | ApiError::NotFound(_)
        )
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::UniqueConstraintViolation(msg) => ApiError::DatabaseError(msg),
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::NoValidRows { warnings } => ApiError::NoValidRows {
                message: ImportError::NoValidRows {
                    warnings: Vec::new(),
                }
                .to_string(),
                warnings,
            },
            e if e.is_format_error() => ApiError::FormatError(e.to_string()),
            e @ ImportError::FileNotFound(_) => ApiError::InvalidInput(e.to_string()),
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

// ==========================================
// 从 ForecastError 转换
// ==========================================
impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::InsufficientData { .. } => {
                ApiError::InsufficientData(NOT_ENOUGH_HISTORY_MESSAGE.to_string())
            }
            ForecastError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            ForecastError::EngineFailure(msg) => ApiError::EngineFailure(msg),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
