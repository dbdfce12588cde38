// ==========================================
// 电动车保有量预测系统 - 看板汇总
// ==========================================
// 指标:
// - totalEvs / totalDemand: 全部记录求和
// - topRegion: 保有量合计最大的地区（同值取先出现者）
// - growthRate: 年度合计的同比增长率均值（%，1 位小数；上年为 0 的跳过）
// ==========================================

use crate::domain::ev_stat::HistoricalRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 无数据时的 topRegion
pub const NO_DATA_REGION: &str = "No data";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_evs: i64,
    pub total_demand: f64,
    pub top_region: String,
    pub growth_rate: f64,
}

impl DashboardStats {
    pub fn empty() -> Self {
        Self {
            total_evs: 0,
            total_demand: 0.0,
            top_region: NO_DATA_REGION.to_string(),
            growth_rate: 0.0,
        }
    }
}

pub fn compute_dashboard_stats(records: &[HistoricalRecord]) -> DashboardStats {
    if records.is_empty() {
        return DashboardStats::empty();
    }

    let total_evs: i64 = records.iter().map(|r| r.count).sum();
    let total_demand: f64 = records.iter().map(|r| r.charging_demand_kwh).sum();

    // 地区合计（保留首次出现顺序）
    let mut region_index: HashMap<&str, usize> = HashMap::new();
    let mut region_totals: Vec<(&str, i64)> = Vec::new();
    for record in records {
        match region_index.get(record.region.as_str()) {
            Some(&pos) => region_totals[pos].1 += record.count,
            None => {
                region_index.insert(record.region.as_str(), region_totals.len());
                region_totals.push((record.region.as_str(), record.count));
            }
        }
    }

    let mut top: Option<(&str, i64)> = None;
    for (region, total) in region_totals {
        if top.map_or(true, |(_, best)| total > best) {
            top = Some((region, total));
        }
    }
    let top_region = top
        .map(|(region, _)| region.to_string())
        .unwrap_or_else(|| NO_DATA_REGION.to_string());

    DashboardStats {
        total_evs,
        total_demand,
        top_region,
        growth_rate: average_growth_rate(records),
    }
}

fn average_growth_rate(records: &[HistoricalRecord]) -> f64 {
    let mut year_totals: BTreeMap<i32, i64> = BTreeMap::new();
    for record in records {
        *year_totals.entry(record.year).or_insert(0) += record.count;
    }

    let totals: Vec<i64> = year_totals.into_values().collect();
    let rates: Vec<f64> = totals
        .windows(2)
        .filter(|pair| pair[0] > 0)
        .map(|pair| (pair[1] - pair[0]) as f64 / pair[0] as f64 * 100.0)
        .collect();

    if rates.is_empty() {
        return 0.0;
    }
    let average = rates.iter().sum::<f64>() / rates.len() as f64;
    (average * 10.0).round() / 10.0
}
