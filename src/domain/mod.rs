// ==========================================
// 电动车保有量预测系统 - 领域层
// ==========================================
// 职责: 历史记录、语义字段、预测结果等核心类型
// ==========================================

pub mod ev_stat;
pub mod field;
pub mod forecast;

pub use ev_stat::{ChargingEventRecord, HistoricalRecord, SeriesPoint};
pub use field::{SemanticField, SheetType};
pub use forecast::{AccuracyReport, ForecastPoint, ModelUsed, StoredForecast, YearPrediction};
