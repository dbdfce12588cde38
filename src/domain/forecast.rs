// ==========================================
// 电动车保有量预测系统 - 预测领域模型
// ==========================================
// 职责: 预测点 / 已落库预测 / 模型类型 / 准确度报告
// 红线: 预测点只由预测引擎生成，生成后不可修改
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ModelUsed - 预测所用模型族
// ==========================================
// 序列化格式: 展示名（与外部协议 modelUsed 字符串一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelUsed {
    #[serde(rename = "Linear Regression")]
    LinearRegression,
    #[serde(rename = "Polynomial Regression")]
    PolynomialRegression,
    #[serde(rename = "Moving Average Growth")]
    MovingAverageGrowth,
    #[serde(rename = "Flat Projection")]
    FlatProjection,
}

impl ModelUsed {
    /// 转换为数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ModelUsed::LinearRegression => "Linear Regression",
            ModelUsed::PolynomialRegression => "Polynomial Regression",
            ModelUsed::MovingAverageGrowth => "Moving Average Growth",
            ModelUsed::FlatProjection => "Flat Projection",
        }
    }

    /// 从数据库字符串解析（未知值返回 None）
    pub fn from_db_str(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Linear Regression" => Some(ModelUsed::LinearRegression),
            "Polynomial Regression" => Some(ModelUsed::PolynomialRegression),
            "Moving Average Growth" => Some(ModelUsed::MovingAverageGrowth),
            "Flat Projection" => Some(ModelUsed::FlatProjection),
            _ => None,
        }
    }
}

impl fmt::Display for ModelUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

// ==========================================
// YearPrediction - 引擎输出（单年）
// ==========================================
// 对齐外部数值进程协议: {year, predictedCount, predictedDemandKwh, modelUsed}
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearPrediction {
    pub year: i32,
    pub predicted_count: i64,
    pub predicted_demand_kwh: f64,
    pub model_used: ModelUsed,
}

// ==========================================
// ForecastPoint - 预测点（带地区/车型）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub region: String,
    pub ev_type: String,
    pub year: i32,
    pub predicted_count: i64,
    pub predicted_demand_kwh: f64,
    pub model_used: ModelUsed,
}

impl ForecastPoint {
    pub fn from_prediction(region: &str, ev_type: &str, prediction: YearPrediction) -> Self {
        Self {
            region: region.to_string(),
            ev_type: ev_type.to_string(),
            year: prediction.year,
            predicted_count: prediction.predicted_count,
            predicted_demand_kwh: prediction.predicted_demand_kwh,
            model_used: prediction.model_used,
        }
    }
}

// ==========================================
// StoredForecast - 已落库预测
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredForecast {
    pub id: i64,
    pub run_id: String, // 同一次生成共享的批次 ID
    #[serde(flatten)]
    pub point: ForecastPoint,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// AccuracyReport - 模型准确度报告
// ==========================================
// 说明: 样本内拟合质量，不是真正的样本外准确度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyReport {
    pub mae: Option<f64>,
    pub r2_score: Option<f64>,
    pub confidence_level: Option<i64>,
    pub sample_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tested_combination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_points_in_test: Option<usize>,
}

impl AccuracyReport {
    /// 无可用数据（非错误状态）
    pub fn no_data() -> Self {
        Self {
            mae: None,
            r2_score: None,
            confidence_level: None,
            sample_size: 0,
            tested_combination: None,
            data_points_in_test: None,
        }
    }
}
