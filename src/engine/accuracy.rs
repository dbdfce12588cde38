// ==========================================
// 电动车保有量预测系统 - 模型准确度评估
// ==========================================
// 方法: 选取记录数最多的 (region, evType) 组合，评估预测引擎的样本内拟合
// 输出: mae（%，1 位小数）/ r2Score（2 位小数）/ confidenceLevel（限幅展示值）
// 说明: 样本内拟合质量，不是样本外准确度
// ==========================================

use crate::config::engine_config::AccuracySettings;
use crate::domain::ev_stat::{HistoricalRecord, SeriesPoint};
use crate::domain::forecast::AccuracyReport;
use crate::engine::error::ForecastResult;
use crate::engine::forecast_engine::FitAndPredict;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

// ==========================================
// AccuracyEvaluator
// ==========================================
pub struct AccuracyEvaluator {
    engine: Arc<dyn FitAndPredict>,
    settings: AccuracySettings,
}

impl AccuracyEvaluator {
    pub fn new(engine: Arc<dyn FitAndPredict>, settings: AccuracySettings) -> Self {
        Self { engine, settings }
    }

    /// 评估全部历史记录
    ///
    /// # 返回
    /// - 无记录或最大组合不足 2 条: 指标全为 null（非错误）
    /// - 引擎失败: Err
    pub fn evaluate(&self, records: &[HistoricalRecord]) -> ForecastResult<AccuracyReport> {
        if records.is_empty() {
            return Ok(AccuracyReport::no_data());
        }

        let Some((key, points)) = largest_combination(records) else {
            return Ok(AccuracyReport::no_data());
        };
        if points.len() < 2 {
            debug!(combination = %key, "最大组合不足 2 条记录");
            return Ok(AccuracyReport::no_data());
        }

        let evaluation = self.engine.evaluate_fit(&points)?;

        let r2 = evaluation.r_squared;
        let confidence = ((r2.clamp(0.0, 1.0) * 100.0).round() as i64)
            .clamp(self.settings.confidence_floor, self.settings.confidence_ceiling);

        info!(
            combination = %key,
            points = points.len(),
            model = %evaluation.model_used,
            r2,
            "准确度评估完成"
        );

        Ok(AccuracyReport {
            mae: Some(round_to(evaluation.mae_percent, 1)),
            r2_score: Some(round_to(r2, 2)),
            confidence_level: Some(confidence),
            sample_size: records.len(),
            tested_combination: Some(key),
            data_points_in_test: Some(points.len()),
        })
    }
}

/// 记录数最多的组合（同数量取先出现者）
fn largest_combination(records: &[HistoricalRecord]) -> Option<(String, Vec<SeriesPoint>)> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<SeriesPoint>)> = Vec::new();

    for record in records {
        let key = record.combination_key();
        match index.get(&key) {
            Some(&pos) => groups[pos].1.push(SeriesPoint::from(record)),
            None => {
                index.insert(key, groups.len());
                groups.push((record.combination_label(), vec![SeriesPoint::from(record)]));
            }
        }
    }

    let mut best: Option<(String, Vec<SeriesPoint>)> = None;
    for group in groups {
        let larger = best.as_ref().map_or(true, |b| group.1.len() > b.1.len());
        if larger {
            best = Some(group);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::forecast_engine::RegressionForecastEngine;

    fn evaluator() -> AccuracyEvaluator {
        AccuracyEvaluator::new(
            Arc::new(RegressionForecastEngine::default()),
            AccuracySettings::default(),
        )
    }

    fn record(region: &str, ev_type: &str, year: i32, count: i64) -> HistoricalRecord {
        HistoricalRecord {
            region: region.to_string(),
            year,
            ev_type: ev_type.to_string(),
            count,
            charging_demand_kwh: count as f64 * 3000.0,
        }
    }

    #[test]
    fn test_empty_history_reports_nulls() {
        let report = evaluator().evaluate(&[]).unwrap();
        assert_eq!(report, AccuracyReport::no_data());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["mae"].is_null());
        assert!(json["r2Score"].is_null());
        assert!(json["confidenceLevel"].is_null());
        assert_eq!(json["sampleSize"], 0);
        assert!(json.get("testedCombination").is_none());
    }

    #[test]
    fn test_singleton_groups_report_nulls() {
        let records = vec![record("Ohio", "BEV", 2020, 5), record("Texas", "BEV", 2020, 9)];
        let report = evaluator().evaluate(&records).unwrap();
        assert_eq!(report.sample_size, 0);
        assert!(report.mae.is_none());
    }

    #[test]
    fn test_largest_group_is_evaluated() {
        let mut records: Vec<HistoricalRecord> = (0..5)
            .map(|i| record("Texas", "BEV", 2018 + i, 100 + 100 * i as i64))
            .collect();
        records.push(record("Ohio", "PHEV", 2020, 10));
        records.push(record("Ohio", "PHEV", 2021, 30));

        let report = evaluator().evaluate(&records).unwrap();
        assert_eq!(report.tested_combination.as_deref(), Some("Texas-BEV"));
        assert_eq!(report.data_points_in_test, Some(5));
        assert_eq!(report.sample_size, 7);
        assert_eq!(report.r2_score, Some(1.0));
        assert_eq!(report.mae, Some(0.0));
        // 完美拟合也限幅到上限
        assert_eq!(report.confidence_level, Some(95));
    }

    #[test]
    fn test_tie_prefers_first_combination() {
        let records = vec![
            record("Ohio", "BEV", 2020, 10),
            record("Texas", "BEV", 2020, 10),
            record("Ohio", "BEV", 2021, 20),
            record("Texas", "BEV", 2021, 25),
        ];
        let report = evaluator().evaluate(&records).unwrap();
        assert_eq!(report.tested_combination.as_deref(), Some("Ohio-BEV"));
    }

    #[test]
    fn test_hyphenated_names_stay_separate_groups() {
        let records = vec![
            record("North-East", "BEV", 2020, 10),
            record("North", "East-BEV", 2020, 40),
            record("North-East", "BEV", 2021, 12),
            record("North", "East-BEV", 2021, 45),
            record("Ohio", "BEV", 2020, 100),
            record("Ohio", "BEV", 2021, 120),
            record("Ohio", "BEV", 2022, 145),
        ];
        let report = evaluator().evaluate(&records).unwrap();
        assert_eq!(report.tested_combination.as_deref(), Some("Ohio-BEV"));
        assert_eq!(report.data_points_in_test, Some(3));
        assert_eq!(report.sample_size, 7);
    }

    #[test]
    fn test_poor_fit_is_floored() {
        let records: Vec<HistoricalRecord> = [100, 900, 50, 1000, 20]
            .iter()
            .enumerate()
            .map(|(i, c)| record("Ohio", "BEV", 2016 + i as i32, *c))
            .collect();

        let report = evaluator().evaluate(&records).unwrap();
        assert_eq!(report.confidence_level, Some(70));
        assert!(report.r2_score.unwrap() < 0.7);
    }
}
