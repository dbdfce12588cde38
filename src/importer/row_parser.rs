// ==========================================
// 电动车保有量预测系统 - 行解析器
// ==========================================
// 职责: 单行 {规范化表头 → 原始值} → 类型化记录
// 返回约定:
// - Ok(Some(record)): 有效行
// - Ok(None): 缺必填字段，静默跳过
// - Err(RowError): 值非法，记告警后跳过
// ==========================================

use crate::config::engine_config::ImportSettings;
use crate::domain::ev_stat::{
    is_plausible_year, ChargingEventRecord, HistoricalRecord, DEFAULT_EV_TYPE,
    DEFAULT_VEHICLE_MODEL,
};
use crate::domain::field::SemanticField;
use crate::importer::column_mapper::ColumnMappings;
use crate::importer::error::RowError;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;

// ==========================================
// RowContext - 单行上下文
// ==========================================
pub struct RowContext<'a> {
    row: &'a HashMap<String, String>,
    mappings: &'a ColumnMappings,
}

impl<'a> RowContext<'a> {
    /// # 参数
    /// - row: 键为规范化（小写、去空白）后的表头
    /// - mappings: 列映射（源表头同样按规范化形式查找）
    pub fn new(row: &'a HashMap<String, String>, mappings: &'a ColumnMappings) -> Self {
        Self { row, mappings }
    }

    /// 读取语义字段的原始值（未映射或空值返回 None）
    pub fn value(&self, field: SemanticField) -> Option<&'a str> {
        let header = self.mappings.header_for(field)?;
        self.row
            .get(header)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

// ==========================================
// 数值/时间解析辅助
// ==========================================

fn strip_thousands(raw: &str) -> String {
    raw.trim().replace(',', "")
}

/// 解析浮点数（去千分位，拒绝 NaN/Inf）
pub fn parse_number(raw: &str) -> Option<f64> {
    strip_thousands(raw)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// 解析整数（允许小数形式，截断取整）
pub fn parse_integer(raw: &str) -> Option<i64> {
    let cleaned = strip_thousands(raw);
    if let Ok(v) = cleaned.parse::<i64>() {
        return Some(v);
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() < i64::MAX as f64)
        .map(|v| v.trunc() as i64)
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y%m%d%H%M%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

/// 解析时间戳（RFC3339 或常见本地格式，按 UTC 处理）
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

/// 解析年份: 整数 / 小数 / 日期（取年份）
pub fn parse_year(raw: &str) -> Option<i32> {
    if let Some(v) = parse_integer(raw) {
        return i32::try_from(v).ok();
    }
    parse_timestamp(raw).map(|dt| dt.year())
}

// ==========================================
// ev_stats 行
// ==========================================

/// 解析年度保有量行
///
/// 规则:
/// - year/region 缺失: 静默跳过
/// - year 非法或不在 [1900, 2100]: 行错误
/// - count 缺失或无法解析: 按 0 处理；负数为行错误
/// - chargingDemandKwh 缺失或无法解析: count × default_kwh_per_vehicle
pub fn parse_ev_stat_row(
    ctx: &RowContext<'_>,
    settings: &ImportSettings,
) -> Result<Option<HistoricalRecord>, RowError> {
    let (Some(year_raw), Some(region)) = (
        ctx.value(SemanticField::Year),
        ctx.value(SemanticField::Region),
    ) else {
        return Ok(None);
    };

    let year = parse_year(year_raw)
        .filter(|y| is_plausible_year(*y))
        .ok_or_else(|| RowError::InvalidYear(year_raw.to_string()))?;

    let ev_type = ctx
        .value(SemanticField::EvType)
        .unwrap_or(DEFAULT_EV_TYPE)
        .to_string();

    let count = ctx
        .value(SemanticField::Count)
        .and_then(parse_integer)
        .unwrap_or(0);
    if count < 0 {
        return Err(RowError::NegativeValue {
            field: "count".to_string(),
            value: count.to_string(),
        });
    }

    let charging_demand_kwh = match ctx
        .value(SemanticField::ChargingDemandKwh)
        .and_then(parse_number)
    {
        Some(v) if v < 0.0 => {
            return Err(RowError::NegativeValue {
                field: "charging demand".to_string(),
                value: v.to_string(),
            })
        }
        Some(v) => v,
        None => count as f64 * settings.default_kwh_per_vehicle,
    };

    Ok(Some(HistoricalRecord {
        region: region.to_string(),
        year,
        ev_type,
        count,
        charging_demand_kwh,
    }))
}

// ==========================================
// charging_patterns 行
// ==========================================

/// 解析充电事件行
///
/// # 参数
/// - now: 开始时间缺失或无法解析时的替代值（由调用方注入）
pub fn parse_charging_row(
    ctx: &RowContext<'_>,
    now: DateTime<Utc>,
) -> Result<Option<ChargingEventRecord>, RowError> {
    let Some(region) = ctx.value(SemanticField::Region) else {
        return Ok(None);
    };
    let Some(energy_consumed_kwh) = ctx
        .value(SemanticField::EnergyConsumedKwh)
        .and_then(parse_number)
    else {
        return Ok(None);
    };
    if energy_consumed_kwh < 0.0 {
        return Err(RowError::NegativeValue {
            field: "energy consumed".to_string(),
            value: energy_consumed_kwh.to_string(),
        });
    }

    let charging_start_time = ctx
        .value(SemanticField::ChargingStartTime)
        .and_then(parse_timestamp)
        .unwrap_or(now);

    Ok(Some(ChargingEventRecord {
        region: region.to_string(),
        vehicle_model: ctx
            .value(SemanticField::VehicleModel)
            .unwrap_or(DEFAULT_VEHICLE_MODEL)
            .to_string(),
        battery_capacity_kwh: ctx
            .value(SemanticField::BatteryCapacityKwh)
            .and_then(parse_number),
        energy_consumed_kwh,
        charging_duration_hours: ctx
            .value(SemanticField::ChargingDurationHours)
            .and_then(parse_number),
        charging_rate_kw: ctx
            .value(SemanticField::ChargingRateKw)
            .and_then(parse_number),
        charger_type: ctx.value(SemanticField::ChargerType).map(str::to_string),
        user_type: ctx.value(SemanticField::UserType).map(str::to_string),
        charging_start_time,
    }))
}
