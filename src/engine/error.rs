// ==========================================
// 电动车保有量预测系统 - 预测引擎错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 预测引擎错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// 历史点数不足（按原始点数计，需至少 2 个）
    #[error("Insufficient historical data (need at least {needed} points, got {got})")]
    InsufficientData { needed: usize, got: usize },

    /// 请求参数非法（年份区间等）
    #[error("Invalid forecast input: {0}")]
    InvalidInput(String),

    /// 数值计算失败（非有限值、超时、线程异常）
    #[error("Forecast engine failure: {0}")]
    EngineFailure(String),
}

/// Result 类型别名
pub type ForecastResult<T> = Result<T, ForecastError>;
