// ==========================================
// 电动车保有量预测系统 - 历史数据领域模型
// ==========================================
// 职责: 历史保有量记录 / 充电事件记录 / 预测输入序列点
// 红线: 年份必须落在 [1900, 2100]，否则丢弃并告警
// ==========================================

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// 合法年份下界（含）
pub const MIN_PLAUSIBLE_YEAR: i32 = 1900;

/// 合法年份上界（含）
pub const MAX_PLAUSIBLE_YEAR: i32 = 2100;

/// 缺省车型（未映射 evType 列或充电记录聚合时使用）
pub const DEFAULT_EV_TYPE: &str = "Mixed";

/// 缺省车辆型号（充电记录未映射 vehicleModel 列时使用）
pub const DEFAULT_VEHICLE_MODEL: &str = "Unknown";

/// 判断年份是否为合理的日历年
pub fn is_plausible_year(year: i32) -> bool {
    (MIN_PLAUSIBLE_YEAR..=MAX_PLAUSIBLE_YEAR).contains(&year)
}

// ==========================================
// HistoricalRecord - 历史保有量记录
// ==========================================
// 用途: 导入层写入，预测引擎只读
// 说明: 不做唯一性约束，重复记录在聚合时累加
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalRecord {
    pub region: String,
    pub year: i32,
    pub ev_type: String,
    pub count: i64,               // 保有量（≥0）
    pub charging_demand_kwh: f64, // 年充电需求（kWh，≥0）
}

impl HistoricalRecord {
    /// 分组键: (region, evType)
    pub fn combination_key(&self) -> (&str, &str) {
        (&self.region, &self.ev_type)
    }

    /// 展示用组合名 "{region}-{evType}"（不可作为分组键，可能重名）
    pub fn combination_label(&self) -> String {
        format!("{}-{}", self.region, self.ev_type)
    }
}

// ==========================================
// ChargingEventRecord - 充电事件明细
// ==========================================
// 用途: charging_patterns 表格导入，按 (region, 年份) 聚合为保有量记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingEventRecord {
    pub region: String,
    pub vehicle_model: String,
    pub battery_capacity_kwh: Option<f64>,
    pub energy_consumed_kwh: f64,
    pub charging_duration_hours: Option<f64>,
    pub charging_rate_kw: Option<f64>,
    pub charger_type: Option<String>,
    pub user_type: Option<String>,
    pub charging_start_time: DateTime<Utc>,
}

impl ChargingEventRecord {
    /// 充电开始时间所在年份（聚合键）
    pub fn start_year(&self) -> i32 {
        self.charging_start_time.year()
    }
}

// ==========================================
// SeriesPoint - 预测引擎输入点
// ==========================================
// 对齐外部数值进程协议: {year, count, chargingDemandKwh}
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub year: i32,
    pub count: i64,
    pub charging_demand_kwh: f64,
}

impl From<&HistoricalRecord> for SeriesPoint {
    fn from(record: &HistoricalRecord) -> Self {
        Self {
            year: record.year,
            count: record.count,
            charging_demand_kwh: record.charging_demand_kwh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_plausible_year_bounds() {
        assert!(is_plausible_year(1900));
        assert!(is_plausible_year(2100));
        assert!(!is_plausible_year(1899));
        assert!(!is_plausible_year(2101));
    }

    #[test]
    fn test_historical_record_wire_format() {
        let record = HistoricalRecord {
            region: "Texas".to_string(),
            year: 2022,
            ev_type: "BEV".to_string(),
            count: 1700,
            charging_demand_kwh: 5_100_000.0,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["evType"], "BEV");
        assert_eq!(json["chargingDemandKwh"], 5_100_000.0);
        assert_eq!(record.combination_key(), ("Texas", "BEV"));
        assert_eq!(record.combination_label(), "Texas-BEV");
    }

    #[test]
    fn test_charging_record_start_year() {
        let record = ChargingEventRecord {
            region: "Ohio".to_string(),
            vehicle_model: DEFAULT_VEHICLE_MODEL.to_string(),
            battery_capacity_kwh: None,
            energy_consumed_kwh: 12.5,
            charging_duration_hours: None,
            charging_rate_kw: None,
            charger_type: None,
            user_type: None,
            charging_start_time: Utc.with_ymd_and_hms(2023, 3, 14, 8, 0, 0).unwrap(),
        };
        assert_eq!(record.start_year(), 2023);
    }
}
