// ==========================================
// 电动车保有量预测系统 - 语义字段与表格类型
// ==========================================
// 职责: 定义列映射的标准语义字段、表格形态
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// SemanticField - 标准语义字段
// ==========================================
// 顺序即列映射扫描顺序（稳定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SemanticField {
    // ===== 保有量统计 =====
    Year,
    Region,
    EvType,
    Count,
    ChargingDemandKwh,

    // ===== 充电明细 =====
    VehicleModel,
    BatteryCapacityKwh,
    EnergyConsumedKwh,
    ChargingDurationHours,
    ChargingRateKw,
    ChargerType,
    UserType,
    ChargingStartTime,
}

impl SemanticField {
    /// 全部字段（扫描顺序）
    pub const ALL: [SemanticField; 13] = [
        SemanticField::Year,
        SemanticField::Region,
        SemanticField::EvType,
        SemanticField::Count,
        SemanticField::ChargingDemandKwh,
        SemanticField::VehicleModel,
        SemanticField::BatteryCapacityKwh,
        SemanticField::EnergyConsumedKwh,
        SemanticField::ChargingDurationHours,
        SemanticField::ChargingRateKw,
        SemanticField::ChargerType,
        SemanticField::UserType,
        SemanticField::ChargingStartTime,
    ];

    /// 标准字段名（与导出协议一致）
    pub fn canonical_name(&self) -> &'static str {
        match self {
            SemanticField::Year => "year",
            SemanticField::Region => "region",
            SemanticField::EvType => "evType",
            SemanticField::Count => "count",
            SemanticField::ChargingDemandKwh => "chargingDemandKwh",
            SemanticField::VehicleModel => "vehicleModel",
            SemanticField::BatteryCapacityKwh => "batteryCapacityKwh",
            SemanticField::EnergyConsumedKwh => "energyConsumedKwh",
            SemanticField::ChargingDurationHours => "chargingDurationHours",
            SemanticField::ChargingRateKw => "chargingRateKw",
            SemanticField::ChargerType => "chargerType",
            SemanticField::UserType => "userType",
            SemanticField::ChargingStartTime => "chargingStartTime",
        }
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

// ==========================================
// SheetType - 表格形态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetType {
    EvStats,          // 年度保有量统计
    ChargingPatterns, // 充电事件明细
    Unknown,          // 无法识别
}

impl fmt::Display for SheetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetType::EvStats => write!(f, "ev_stats"),
            SheetType::ChargingPatterns => write!(f, "charging_patterns"),
            SheetType::Unknown => write!(f, "unknown"),
        }
    }
}
