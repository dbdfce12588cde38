// ==========================================
// 电动车保有量预测系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分级: ImportError 为批次级（整批拒绝）；RowError 为行级（记告警、跳过该行）
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 格式识别失败时提示的示例列
pub const EXPECTED_COLUMNS_HINT: &str =
    "year, region, ev_type, count OR vehicle_model, energy_consumed, charging_start_time";

/// 导入模块错误类型（批次级）
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.xlsx/.xls）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    // ===== 表格格式错误（FormatError）=====
    #[error("CSV file is empty or has no data rows")]
    EmptyFile,

    #[error(
        "Unable to detect CSV format. Please ensure your CSV contains columns like: {}",
        EXPECTED_COLUMNS_HINT
    )]
    UnrecognizedFormat { headers: Vec<String> },

    #[error("No valid data rows found. Please check your CSV format.")]
    NoValidRows { warnings: Vec<String> },

    // ===== 落库错误 =====
    #[error("数据落库失败: {0}")]
    PersistenceError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否属于表格格式错误（调用方应拒绝上传，不重试）
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ImportError::EmptyFile
                | ImportError::UnrecognizedFormat { .. }
                | ImportError::NoValidRows { .. }
                | ImportError::UnsupportedFormat(_)
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::PersistenceError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

// ==========================================
// RowError - 行级错误（可恢复）
// ==========================================
// 输出格式: "Row <n>: <message>"
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("Invalid year: {0}")]
    InvalidYear(String),

    #[error("Negative {field}: {value}")]
    NegativeValue { field: String, value: String },
}

impl RowError {
    /// 生成带行号的告警文本
    pub fn to_warning(&self, row_number: usize) -> String {
        format!("Row {}: {}", row_number, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_warning_format() {
        let err = RowError::InvalidYear("19x5".to_string());
        assert_eq!(err.to_warning(3), "Row 3: Invalid year: 19x5");
    }

    #[test]
    fn test_unrecognized_format_lists_expected_columns() {
        let err = ImportError::UnrecognizedFormat {
            headers: vec!["foo".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("ev_type"));
        assert!(message.contains("charging_start_time"));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_persistence_error_is_not_format_error() {
        let err = ImportError::PersistenceError("disk full".to_string());
        assert!(!err.is_format_error());
    }
}
