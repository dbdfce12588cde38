// ==========================================
// 电动车保有量预测系统 - 电网影响估算
// ==========================================
// 估算链: 保有量 → 高峰同时充电功率 → 所需容量（含裕度）→ 变电站数 → 成本
// 利用率: 峰值 / (基础容量 × 地区系数 + 渗透率带来的扩容)
// 日负荷曲线: 形状系数由注入的 LoadShapeSource 提供（可确定性复现）
// ==========================================

use crate::config::engine_config::GridSettings;
use crate::domain::ev_stat::HistoricalRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// 未指定地区时的展示名
pub const ALL_REGIONS: &str = "All Regions";

/// 晚高峰时段
const PEAK_HOURS: [u32; 4] = [18, 19, 20, 21];

/// 无数据时的默认高峰小时
const DEFAULT_PEAK_HOUR: u32 = 19;

/// 未指定地区时的哈希基数
const DEFAULT_REGION_HASH: u32 = 100;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ==========================================
// LoadShapeSource - 负荷形状随机源
// ==========================================
pub trait LoadShapeSource: Send {
    /// 返回 [low, low + width) 内的系数
    fn sample(&mut self, low: f64, width: f64) -> f64;
}

/// 固定取区间中点（无随机性）
#[derive(Debug, Clone, Copy, Default)]
pub struct MidpointLoadShape;

impl LoadShapeSource for MidpointLoadShape {
    fn sample(&mut self, low: f64, width: f64) -> f64 {
        low + width / 2.0
    }
}

/// 带种子的伪随机形状
#[derive(Debug, Clone)]
pub struct SeededLoadShape {
    rng: StdRng,
}

impl SeededLoadShape {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl LoadShapeSource for SeededLoadShape {
    fn sample(&mut self, low: f64, width: f64) -> f64 {
        low + self.rng.gen::<f64>() * width
    }
}

// ==========================================
// 输出结构
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSummary {
    pub region: String,
    pub total_evs: i64,
    pub total_annual_demand_kwh: f64,
    pub peak_demand_kw: f64,
    pub peak_demand_mw: f64,
    pub required_capacity_mw: f64,
    pub capacity_utilization: f64,
    pub upgrade_needed: bool,
    pub substations_needed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCosts {
    pub transformer_upgrade_cost: f64,
    pub total_infrastructure_cost: f64,
    pub cost_per_ev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyDemand {
    pub hour: u32,
    pub demand_kw: f64,
    pub demand_mw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakHour {
    pub hour: u32,
    pub demand_kw: f64,
    pub demand_mw: f64,
    pub time_range: String,
}

impl PeakHour {
    fn from_hourly(hourly: &HourlyDemand) -> Self {
        Self {
            hour: hourly.hour,
            demand_kw: hourly.demand_kw,
            demand_mw: hourly.demand_mw,
            time_range: format!("{}:00 - {}:00", hourly.hour, hourly.hour + 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: Priority,
    pub category: String,
    pub recommendation: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridAnalysis {
    pub summary: GridSummary,
    pub costs: GridCosts,
    pub peak_hour: PeakHour,
    pub hourly_profile: Vec<HourlyDemand>,
    pub recommendations: Vec<Recommendation>,
}

// ==========================================
// GridImpactAnalyzer
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct GridImpactAnalyzer {
    settings: GridSettings,
}

/// 地区系数哈希: UTF-16 码元求和（未指定地区取 100）
pub fn region_hash(region: Option<&str>) -> u32 {
    match region {
        Some(name) => name.encode_utf16().map(u32::from).sum(),
        None => DEFAULT_REGION_HASH,
    }
}

/// 地区系数 ∈ [0.6, 1.0)
pub fn regional_variation(region: Option<&str>) -> f64 {
    0.6 + f64::from(region_hash(region) % 40) / 100.0
}

impl GridImpactAnalyzer {
    pub fn new(settings: GridSettings) -> Self {
        Self { settings }
    }

    /// 估算电网影响
    ///
    /// # 参数
    /// - records: 已按地区过滤的年度记录
    /// - region: 地区名（None 表示全部地区）
    /// - shape: 日负荷形状系数来源
    pub fn analyze(
        &self,
        records: &[HistoricalRecord],
        region: Option<&str>,
        shape: &mut dyn LoadShapeSource,
    ) -> GridAnalysis {
        let region_name = region.unwrap_or(ALL_REGIONS).to_string();
        if records.is_empty() {
            return Self::empty_analysis(region_name);
        }

        let s = &self.settings;
        let total_evs: i64 = records.iter().map(|r| r.count).sum();
        let total_demand_kwh: f64 = records.iter().map(|r| r.charging_demand_kwh).sum();

        // 高峰负荷
        let peak_concurrent = total_evs as f64 * s.peak_concurrency_ratio;
        let peak_demand_kw = peak_concurrent * s.avg_charging_rate_kw;
        let peak_demand_mw = peak_demand_kw / 1000.0;

        // 容量与变电站
        let required_capacity_mw = peak_demand_mw * s.safety_margin;
        let substations_needed = (required_capacity_mw / s.substation_capacity_mw).ceil().max(0.0) as u32;

        // 成本
        let transformer_cost = f64::from(substations_needed) * s.transformer_cost_per_unit;
        let total_cost = f64::from(substations_needed) * s.substation_cost;

        // 利用率
        let penetration = (total_evs as f64 / s.penetration_reference_evs).min(s.max_penetration_factor);
        let base_capacity_mw = required_capacity_mw * regional_variation(region);
        let upgrade_capacity_mw = peak_demand_mw * penetration * 0.3;
        let current_capacity_mw = base_capacity_mw + upgrade_capacity_mw;
        let capacity_utilization = if current_capacity_mw > 0.0 {
            peak_demand_mw / current_capacity_mw * 100.0
        } else {
            0.0
        };
        let upgrade_needed = capacity_utilization > s.upgrade_utilization_pct;

        let hourly_profile = Self::hourly_profile(peak_demand_kw, shape);
        let peak_hour = hourly_profile
            .iter()
            .fold(None::<&HourlyDemand>, |best, curr| match best {
                Some(b) if curr.demand_kw <= b.demand_kw => Some(b),
                _ => Some(curr),
            })
            .map(PeakHour::from_hourly)
            .unwrap_or_else(Self::default_peak_hour);

        let recommendations =
            self.recommendations(upgrade_needed, capacity_utilization, substations_needed);

        GridAnalysis {
            summary: GridSummary {
                region: region_name,
                total_evs,
                total_annual_demand_kwh: round2(total_demand_kwh),
                peak_demand_kw: round2(peak_demand_kw),
                peak_demand_mw: round2(peak_demand_mw),
                required_capacity_mw: round2(required_capacity_mw),
                capacity_utilization: round2(capacity_utilization),
                upgrade_needed,
                substations_needed,
            },
            costs: GridCosts {
                transformer_upgrade_cost: round2(transformer_cost),
                total_infrastructure_cost: round2(total_cost),
                cost_per_ev: if total_evs > 0 {
                    round2(total_cost / total_evs as f64)
                } else {
                    0.0
                },
            },
            peak_hour,
            hourly_profile,
            recommendations,
        }
    }

    fn hourly_profile(peak_demand_kw: f64, shape: &mut dyn LoadShapeSource) -> Vec<HourlyDemand> {
        (0..24)
            .map(|hour| {
                let factor = if PEAK_HOURS.contains(&hour) {
                    shape.sample(0.6, 0.2)
                } else if hour >= 22 || hour < 6 {
                    shape.sample(0.2, 0.2)
                } else {
                    shape.sample(0.1, 0.2)
                };
                let demand_kw = peak_demand_kw * factor;
                HourlyDemand {
                    hour,
                    demand_kw: round2(demand_kw),
                    demand_mw: round2(demand_kw / 1000.0),
                }
            })
            .collect()
    }

    fn recommendations(
        &self,
        upgrade_needed: bool,
        capacity_utilization: f64,
        substations_needed: u32,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        if upgrade_needed {
            recommendations.push(Recommendation {
                priority: Priority::High,
                category: "Infrastructure".to_string(),
                recommendation: format!(
                    "Grid capacity upgrade required. Current utilization at {:.1}%.",
                    capacity_utilization
                ),
                action: format!(
                    "Plan for {} substation upgrades or new installations.",
                    substations_needed
                ),
            });
        }

        if capacity_utilization > self.settings.load_management_utilization_pct {
            recommendations.push(Recommendation {
                priority: Priority::Medium,
                category: "Load Management".to_string(),
                recommendation:
                    "Implement smart charging programs to shift load away from peak hours."
                        .to_string(),
                action: "Deploy time-of-use pricing and managed charging incentives.".to_string(),
            });
        }

        recommendations.push(Recommendation {
            priority: Priority::Medium,
            category: "Monitoring".to_string(),
            recommendation: "Install real-time grid monitoring for EV charging patterns."
                .to_string(),
            action: "Deploy smart meters and load monitoring systems at key substations."
                .to_string(),
        });

        recommendations
    }

    fn default_peak_hour() -> PeakHour {
        PeakHour {
            hour: DEFAULT_PEAK_HOUR,
            demand_kw: 0.0,
            demand_mw: 0.0,
            time_range: format!("{}:00 - {}:00", DEFAULT_PEAK_HOUR, DEFAULT_PEAK_HOUR + 1),
        }
    }

    fn empty_analysis(region: String) -> GridAnalysis {
        GridAnalysis {
            summary: GridSummary {
                region,
                total_evs: 0,
                total_annual_demand_kwh: 0.0,
                peak_demand_kw: 0.0,
                peak_demand_mw: 0.0,
                required_capacity_mw: 0.0,
                capacity_utilization: 0.0,
                upgrade_needed: false,
                substations_needed: 0,
            },
            costs: GridCosts {
                transformer_upgrade_cost: 0.0,
                total_infrastructure_cost: 0.0,
                cost_per_ev: 0.0,
            },
            peak_hour: Self::default_peak_hour(),
            hourly_profile: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(region: &str, count: i64) -> HistoricalRecord {
        HistoricalRecord {
            region: region.to_string(),
            year: 2023,
            ev_type: "BEV".to_string(),
            count,
            charging_demand_kwh: count as f64 * 3000.0,
        }
    }

    #[test]
    fn test_empty_records_give_zeroed_analysis() {
        let analysis =
            GridImpactAnalyzer::default().analyze(&[], Some("Ohio"), &mut MidpointLoadShape);
        assert_eq!(analysis.summary.region, "Ohio");
        assert_eq!(analysis.summary.total_evs, 0);
        assert_eq!(analysis.peak_hour.hour, 19);
        assert_eq!(analysis.peak_hour.time_range, "19:00 - 20:00");
        assert!(analysis.hourly_profile.is_empty());
        assert!(analysis.recommendations.is_empty());
    }

    #[test]
    fn test_peak_and_capacity_chain() {
        let records = vec![record("Ohio", 60_000), record("Ohio", 40_000)];
        let analysis =
            GridImpactAnalyzer::default().analyze(&records, None, &mut MidpointLoadShape);
        let summary = &analysis.summary;

        assert_eq!(summary.region, ALL_REGIONS);
        assert_eq!(summary.total_evs, 100_000);
        // 100000 × 0.2 × 7.2 kW = 144 MW，× 1.3 = 187.2 MW → 3 座变电站
        assert_relative_eq!(summary.peak_demand_kw, 144_000.0);
        assert_relative_eq!(summary.peak_demand_mw, 144.0);
        assert_relative_eq!(summary.required_capacity_mw, 187.2);
        assert_eq!(summary.substations_needed, 3);
        assert_relative_eq!(analysis.costs.total_infrastructure_cost, 30_000_000.0);
        assert_relative_eq!(analysis.costs.cost_per_ev, 300.0);
    }

    #[test]
    fn test_utilization_uses_region_hash() {
        // "All Regions" 缺省哈希 100 → 系数 0.8；渗透率封顶 1.5
        let records = vec![record("Ohio", 100_000)];
        let analysis =
            GridImpactAnalyzer::default().analyze(&records, None, &mut MidpointLoadShape);

        let expected: f64 = 144.0 / (187.2 * 0.8 + 144.0 * 1.5 * 0.3) * 100.0;
        assert_relative_eq!(
            analysis.summary.capacity_utilization,
            (expected * 100.0).round() / 100.0
        );
        assert_eq!(regional_variation(Some("AB")), 0.6 + f64::from((65 + 66) % 40) / 100.0);
    }

    #[test]
    fn test_midpoint_profile_peaks_in_evening() {
        let records = vec![record("Ohio", 10_000)];
        let analysis =
            GridImpactAnalyzer::default().analyze(&records, Some("Ohio"), &mut MidpointLoadShape);

        assert_eq!(analysis.hourly_profile.len(), 24);
        // 18~21 点系数相同，取最先出现的 18 点
        assert_eq!(analysis.peak_hour.hour, 18);
        assert_eq!(analysis.peak_hour.time_range, "18:00 - 19:00");
        assert_relative_eq!(analysis.peak_hour.demand_kw, 14_400.0 * 0.7);
    }

    #[test]
    fn test_seeded_shape_is_reproducible_and_bounded() {
        let records = vec![record("Texas", 25_000)];
        let analyzer = GridImpactAnalyzer::default();
        let first = analyzer.analyze(&records, Some("Texas"), &mut SeededLoadShape::new(7));
        let second = analyzer.analyze(&records, Some("Texas"), &mut SeededLoadShape::new(7));
        assert_eq!(first, second);

        let peak_kw = first.summary.peak_demand_kw;
        for hourly in &first.hourly_profile {
            assert!(hourly.demand_kw <= peak_kw * 0.8 + 0.01);
            assert!(hourly.demand_kw >= peak_kw * 0.1 - 0.01);
        }
    }

    #[test]
    fn test_recommendations_follow_utilization() {
        let analyzer = GridImpactAnalyzer::default();
        let recs = analyzer.recommendations(true, 85.0, 2);
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].priority, Priority::High);
        assert_eq!(
            recs[0].recommendation,
            "Grid capacity upgrade required. Current utilization at 85.0%."
        );
        assert_eq!(recs[0].action, "Plan for 2 substation upgrades or new installations.");

        let recs = analyzer.recommendations(false, 50.0, 1);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category, "Monitoring");

        let json = serde_json::to_value(&recs[0]).unwrap();
        assert_eq!(json["priority"], "MEDIUM");
    }
}
