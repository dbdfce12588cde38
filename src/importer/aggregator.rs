// ==========================================
// 电动车保有量预测系统 - 充电记录聚合
// ==========================================
// 职责: 充电事件按 (region, 开始年份) 聚合为年度保有量记录
// 规则:
// - count = 事件数
// - chargingDemandKwh = energyConsumedKwh 求和
// - evType = "Mixed"
// - 年份超出 [1900, 2100] 的分组丢弃并告警
// 顺序: 按分组首次出现顺序输出
// ==========================================

use crate::domain::ev_stat::{
    is_plausible_year, ChargingEventRecord, HistoricalRecord, DEFAULT_EV_TYPE,
};
use std::collections::HashMap;

/// 聚合结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationOutcome {
    pub stats: Vec<HistoricalRecord>,
    pub warnings: Vec<String>,
}

pub fn aggregate_charging_records(records: &[ChargingEventRecord]) -> AggregationOutcome {
    let mut index: HashMap<(String, i32), usize> = HashMap::new();
    let mut buckets: Vec<HistoricalRecord> = Vec::new();

    for record in records {
        let key = (record.region.clone(), record.start_year());
        match index.get(&key) {
            Some(&pos) => {
                let bucket = &mut buckets[pos];
                bucket.count += 1;
                bucket.charging_demand_kwh += record.energy_consumed_kwh;
            }
            None => {
                index.insert(key, buckets.len());
                buckets.push(HistoricalRecord {
                    region: record.region.clone(),
                    year: record.start_year(),
                    ev_type: DEFAULT_EV_TYPE.to_string(),
                    count: 1,
                    charging_demand_kwh: record.energy_consumed_kwh,
                });
            }
        }
    }

    let mut outcome = AggregationOutcome::default();
    for bucket in buckets {
        if is_plausible_year(bucket.year) {
            outcome.stats.push(bucket);
        } else {
            outcome.warnings.push(format!(
                "Charging records for {} in {} skipped: year outside plausible range",
                bucket.region, bucket.year
            ));
        }
    }
    outcome
}
