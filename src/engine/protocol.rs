// ==========================================
// 电动车保有量预测系统 - 预测引擎 JSON 协议
// ==========================================
// 输入: {"historical": [{year, count, chargingDemandKwh}], "futureYears": [int]}
// 输出: {"results": [{year, predictedCount, predictedDemandKwh, modelUsed}]} | {"error": string}
// 用途: CLI engine 子命令（stdin → stdout），便于外部进程以同一协议调用
// ==========================================

use crate::domain::ev_stat::SeriesPoint;
use crate::domain::forecast::YearPrediction;
use crate::engine::forecast_engine::FitAndPredict;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRequest {
    #[serde(default)]
    pub historical: Vec<SeriesPoint>,
    #[serde(default)]
    pub future_years: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EngineResponse {
    Results { results: Vec<YearPrediction> },
    Failure { error: String },
}

impl EngineResponse {
    pub fn is_failure(&self) -> bool {
        matches!(self, EngineResponse::Failure { .. })
    }
}

/// 处理一次请求（失败以结构化 error 返回，不 panic）
pub fn handle_request(engine: &dyn FitAndPredict, request: &EngineRequest) -> EngineResponse {
    match engine.fit_and_predict(&request.historical, &request.future_years) {
        Ok(results) => EngineResponse::Results { results },
        Err(e) => {
            warn!(error = %e, "预测请求失败");
            EngineResponse::Failure {
                error: e.to_string(),
            }
        }
    }
}

/// 处理原始 JSON 文本
pub fn handle_json(engine: &dyn FitAndPredict, input: &str) -> EngineResponse {
    match serde_json::from_str::<EngineRequest>(input) {
        Ok(request) => handle_request(engine, &request),
        Err(e) => EngineResponse::Failure {
            error: format!("Invalid request: {}", e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::forecast_engine::RegressionForecastEngine;
    use serde_json::json;

    #[test]
    fn test_results_wire_format() {
        let engine = RegressionForecastEngine::default();
        let input = json!({
            "historical": [
                {"year": 2020, "count": 1000, "chargingDemandKwh": 3000000.0},
                {"year": 2021, "count": 1300, "chargingDemandKwh": 3900000.0},
                {"year": 2022, "count": 1700, "chargingDemandKwh": 5100000.0}
            ],
            "futureYears": [2023, 2024]
        })
        .to_string();

        let response = serde_json::to_value(handle_json(&engine, &input)).unwrap();
        let results = response["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["year"], 2023);
        assert_eq!(results[0]["modelUsed"], "Moving Average Growth");
        assert!(results[0]["predictedCount"].is_i64());
    }

    #[test]
    fn test_insufficient_data_is_structured_error() {
        let engine = RegressionForecastEngine::default();
        let response = handle_json(&engine, r#"{"historical": [], "futureYears": [2025]}"#);
        assert!(response.is_failure());

        let value = serde_json::to_value(&response).unwrap();
        assert!(value["error"]
            .as_str()
            .unwrap()
            .starts_with("Insufficient historical data"));
    }

    #[test]
    fn test_malformed_json_is_structured_error() {
        let engine = RegressionForecastEngine::default();
        assert!(handle_json(&engine, "not json").is_failure());
    }

    #[test]
    fn test_extreme_future_year_is_structured_error() {
        let engine = RegressionForecastEngine::default();
        let input = json!({
            "historical": [
                {"year": 2020, "count": 100, "chargingDemandKwh": 1000.0},
                {"year": 2021, "count": 120, "chargingDemandKwh": 1200.0}
            ],
            "futureYears": [i32::MIN]
        })
        .to_string();

        let response = handle_json(&engine, &input);
        assert!(response.is_failure());

        let value = serde_json::to_value(&response).unwrap();
        assert!(value["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid forecast input"));
    }
}
