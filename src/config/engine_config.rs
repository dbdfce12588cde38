// ==========================================
// 电动车保有量预测系统 - 引擎配置
// ==========================================
// 职责: 导入/预测/准确度/电网分析的全部可调参数及默认值
// 存储: config_kv 表覆写（见 config_manager）
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ImportSettings - 导入参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// 单次处理的数据行上限
    pub max_rows: usize,
    /// 原样保留的预览行数
    pub preview_rows: usize,
    /// 对外返回的告警条数上限
    pub max_surfaced_warnings: usize,
    /// 缺失充电需求时按车辆数估算的年耗电（kWh/辆）
    pub default_kwh_per_vehicle: f64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            max_rows: 1000,
            preview_rows: 10,
            max_surfaced_warnings: 10,
            default_kwh_per_vehicle: 3000.0,
        }
    }
}

// ==========================================
// ForecastSettings - 预测模型选择参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// 启用回归所需的最少年度点数（同年份求和后的不同年份数，非原始记录数）
    pub regression_min_points: usize,
    /// 启用回归所需的最少不同年份数
    pub regression_min_distinct_years: usize,
    /// 二次多项式参与竞争所需的最少点数
    pub polynomial_min_points: usize,
    /// 单次拟合超时（毫秒）
    pub fit_timeout_ms: u64,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            regression_min_points: 4,
            regression_min_distinct_years: 3,
            polynomial_min_points: 6,
            fit_timeout_ms: 30_000,
        }
    }
}

// ==========================================
// AccuracySettings - 置信度展示区间
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccuracySettings {
    pub confidence_floor: i64,
    pub confidence_ceiling: i64,
}

impl Default for AccuracySettings {
    fn default() -> Self {
        Self {
            confidence_floor: 70,
            confidence_ceiling: 95,
        }
    }
}

// ==========================================
// GridSettings - 电网影响估算常量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// 高峰同时充电比例
    pub peak_concurrency_ratio: f64,
    /// 平均充电功率（kW）
    pub avg_charging_rate_kw: f64,
    /// 容量安全裕度系数
    pub safety_margin: f64,
    /// 单座变电站容量（MW）
    pub substation_capacity_mw: f64,
    /// 单台变压器升级成本
    pub transformer_cost_per_unit: f64,
    /// 单座变电站建设成本
    pub substation_cost: f64,
    /// 需要扩容的利用率阈值（%）
    pub upgrade_utilization_pct: f64,
    /// 建议负荷管理的利用率阈值（%）
    pub load_management_utilization_pct: f64,
    /// 渗透率归一化基准（辆）
    pub penetration_reference_evs: f64,
    /// 渗透率因子上限
    pub max_penetration_factor: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            peak_concurrency_ratio: 0.20,
            avg_charging_rate_kw: 7.2,
            safety_margin: 1.3,
            substation_capacity_mw: 75.0,
            transformer_cost_per_unit: 1_000_000.0,
            substation_cost: 10_000_000.0,
            upgrade_utilization_pct: 80.0,
            load_management_utilization_pct: 70.0,
            penetration_reference_evs: 50_000.0,
            max_penetration_factor: 1.5,
        }
    }
}

// ==========================================
// EngineConfig - 配置全集
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub import: ImportSettings,
    pub forecast: ForecastSettings,
    pub accuracy: AccuracySettings,
    pub grid: GridSettings,
}

impl EngineConfig {
    /// 校验配置一致性
    ///
    /// # 返回
    /// - Ok(()): 校验通过
    /// - Err(String): 第一条违规说明
    pub fn validate(&self) -> Result<(), String> {
        if self.import.max_rows == 0 {
            return Err("import.max_rows must be positive".to_string());
        }
        if self.import.default_kwh_per_vehicle < 0.0 {
            return Err("import.default_kwh_per_vehicle must be non-negative".to_string());
        }
        if self.forecast.regression_min_points < 2 {
            return Err("forecast.regression_min_points must be at least 2".to_string());
        }
        if self.forecast.regression_min_distinct_years < 2 {
            return Err("forecast.regression_min_distinct_years must be at least 2".to_string());
        }
        if self.forecast.polynomial_min_points < 3 {
            return Err("forecast.polynomial_min_points must be at least 3".to_string());
        }
        if self.accuracy.confidence_floor > self.accuracy.confidence_ceiling {
            return Err(format!(
                "accuracy.confidence_floor ({}) exceeds confidence_ceiling ({})",
                self.accuracy.confidence_floor, self.accuracy.confidence_ceiling
            ));
        }
        if self.grid.substation_capacity_mw <= 0.0 || self.grid.penetration_reference_evs <= 0.0 {
            return Err("grid capacities must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.import.max_rows, 1000);
        assert_eq!(config.accuracy.confidence_floor, 70);
        assert_eq!(config.accuracy.confidence_ceiling, 95);
    }

    #[test]
    fn test_inverted_confidence_range_rejected() {
        let mut config = EngineConfig::default();
        config.accuracy.confidence_floor = 96;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"forecast": {"polynomial_min_points": 8}}"#).unwrap();
        assert_eq!(config.forecast.polynomial_min_points, 8);
        assert_eq!(config.forecast.regression_min_points, 4);
        assert_eq!(config.import.preview_rows, 10);
    }
}
