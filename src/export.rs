// ==========================================
// 电动车保有量预测系统 - 预测结果导出
// ==========================================
// 格式: CSV（表头 + 每个预测点一行），字段与 JSON 输出同名
// ==========================================

use crate::domain::forecast::StoredForecast;
use serde::Serialize;
use std::io;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ForecastCsvRow<'a> {
    id: i64,
    run_id: &'a str,
    region: &'a str,
    ev_type: &'a str,
    year: i32,
    predicted_count: i64,
    predicted_demand_kwh: f64,
    model_used: &'a str,
    created_at: String,
}

impl<'a> From<&'a StoredForecast> for ForecastCsvRow<'a> {
    fn from(forecast: &'a StoredForecast) -> Self {
        Self {
            id: forecast.id,
            run_id: &forecast.run_id,
            region: &forecast.point.region,
            ev_type: &forecast.point.ev_type,
            year: forecast.point.year,
            predicted_count: forecast.point.predicted_count,
            predicted_demand_kwh: forecast.point.predicted_demand_kwh,
            model_used: forecast.point.model_used.to_db_str(),
            created_at: forecast.created_at.to_rfc3339(),
        }
    }
}

/// 写出预测结果 CSV
///
/// # 返回
/// - Ok(usize): 写出的数据行数（不含表头）
pub fn write_forecasts_csv<W: io::Write>(
    forecasts: &[StoredForecast],
    writer: W,
) -> Result<usize, csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for forecast in forecasts {
        csv_writer.serialize(ForecastCsvRow::from(forecast))?;
    }
    csv_writer.flush()?;
    Ok(forecasts.len())
}
