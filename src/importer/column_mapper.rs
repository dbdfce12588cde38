// ==========================================
// 电动车保有量预测系统 - 列映射器
// ==========================================
// 职责: 任意表头 → 标准语义字段（带置信度）
// 规则: 完全匹配 1.0 > 表头包含别名 0.9 > 别名包含表头 0.8 > 编辑距离相似度(>0.7)
// 选择: 每个字段取置信度最高且 > 0.5 的表头，同分取先出现者
// 说明: 字段之间不互斥，一个表头可同时映射多个字段
// ==========================================

use crate::domain::field::SemanticField;
use serde::Serialize;
use std::collections::BTreeMap;

/// 映射生效的最低置信度（严格大于）
pub const MIN_MAPPING_CONFIDENCE: f64 = 0.5;

/// 编辑距离相似度生效阈值（严格大于）
pub const MIN_SIMILARITY: f64 = 0.7;

// ==========================================
// ColumnMatch / ColumnMappings
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMatch {
    pub source_header: String,
    pub confidence: f64,
}

/// 字段 → 匹配结果（每个字段至多一条）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnMappings {
    entries: BTreeMap<SemanticField, ColumnMatch>,
}

impl ColumnMappings {
    pub fn get(&self, field: SemanticField) -> Option<&ColumnMatch> {
        self.entries.get(&field)
    }

    /// 字段对应的源表头
    pub fn header_for(&self, field: SemanticField) -> Option<&str> {
        self.entries.get(&field).map(|m| m.source_header.as_str())
    }

    pub fn contains(&self, field: SemanticField) -> bool {
        self.entries.contains_key(&field)
    }

    pub fn contains_all(&self, fields: &[SemanticField]) -> bool {
        fields.iter().all(|f| self.contains(*f))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SemanticField, &ColumnMatch)> {
        self.entries.iter()
    }

    fn insert(&mut self, field: SemanticField, matched: ColumnMatch) {
        self.entries.insert(field, matched);
    }
}

// ==========================================
// 别名表
// ==========================================
pub fn field_aliases(field: SemanticField) -> &'static [&'static str] {
    match field {
        SemanticField::Year => &["year", "yr", "date", "period", "time"],
        SemanticField::Region => &[
            "region",
            "state",
            "location",
            "area",
            "territory",
            "province",
            "city",
        ],
        SemanticField::EvType => &[
            "ev_type",
            "evtype",
            "type",
            "vehicle_type",
            "ev type",
            "vehicle type",
            "category",
        ],
        SemanticField::Count => &[
            "count",
            "vehicles",
            "evs",
            "ev_count",
            "vehicle_count",
            "number",
            "total",
            "quantity",
        ],
        SemanticField::ChargingDemandKwh => &[
            "charging_demand_kwh",
            "demand",
            "kwh",
            "energy",
            "consumption",
            "charging_demand",
            "demand_kwh",
        ],
        SemanticField::VehicleModel => &["vehicle_model", "model", "vehicle", "car_model", "ev_model"],
        SemanticField::BatteryCapacityKwh => &[
            "battery_capacity_kwh",
            "battery_capacity",
            "battery",
            "capacity",
            "battery_kwh",
        ],
        SemanticField::EnergyConsumedKwh => &[
            "energy_consumed_kwh",
            "energy_consumed",
            "energy",
            "kwh_consumed",
            "consumption",
        ],
        SemanticField::ChargingDurationHours => &[
            "charging_duration_hours",
            "duration",
            "charging_duration",
            "hours",
            "time",
        ],
        SemanticField::ChargingRateKw => &["charging_rate_kw", "charging_rate", "rate", "kw", "power"],
        SemanticField::ChargerType => &[
            "charger_type",
            "charger",
            "type",
            "charging_type",
            "station_type",
        ],
        SemanticField::UserType => &["user_type", "user", "customer_type", "driver_type"],
        SemanticField::ChargingStartTime => &[
            "charging_start_time",
            "start_time",
            "timestamp",
            "date",
            "time",
            "charging_start",
        ],
    }
}

// ==========================================
// 相似度计算
// ==========================================

/// 规范化: 小写，去掉下划线/空白/连字符
pub fn normalize_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// 编辑距离（插入/删除/替换，单位代价）
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// 字符串相似度: (较长长度 - 编辑距离) / 较长长度；两者皆空为 1.0
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let longer = a.chars().count().max(b.chars().count());
    if longer == 0 {
        return 1.0;
    }
    (longer - levenshtein(a, b)) as f64 / longer as f64
}

/// 单个表头对一组别名的置信度（取各别名得分最大值）
pub fn match_confidence(header: &str, aliases: &[&str]) -> f64 {
    let header = normalize_token(header);
    if header.is_empty() {
        return 0.0;
    }

    let mut best = 0.0_f64;
    for alias in aliases {
        let alias = normalize_token(alias);
        let score = if header == alias {
            return 1.0;
        } else if header.contains(&alias) {
            0.9
        } else if alias.contains(&header) {
            0.8
        } else {
            let similarity = string_similarity(&header, &alias);
            if similarity > MIN_SIMILARITY {
                similarity
            } else {
                0.0
            }
        };
        best = best.max(score);
    }
    best
}

// ==========================================
// ColumnMapper
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnMapper;

impl ColumnMapper {
    pub fn new() -> Self {
        Self
    }

    /// 检测列映射
    ///
    /// # 参数
    /// - headers: 表头（原样，可含大小写/空白）
    ///
    /// # 返回
    /// 每个语义字段至多一条映射；未达阈值的字段缺省
    pub fn detect(&self, headers: &[String]) -> ColumnMappings {
        let mut mappings = ColumnMappings::default();

        for field in SemanticField::ALL {
            let aliases = field_aliases(field);
            let mut best: Option<ColumnMatch> = None;

            for header in headers {
                let confidence = match_confidence(header, aliases);
                let highest = best.as_ref().map_or(0.0, |m| m.confidence);
                if confidence > MIN_MAPPING_CONFIDENCE && confidence > highest {
                    best = Some(ColumnMatch {
                        source_header: header.clone(),
                        confidence,
                    });
                }
            }

            if let Some(matched) = best {
                mappings.insert(field, matched);
            }
        }

        mappings
    }
}
