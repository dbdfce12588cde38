// ==========================================
// 预测引擎 JSON 协议集成测试
// ==========================================
// 覆盖: engine 子命令使用的 stdin/stdout 协议

use ev_adoption_forecast::config::engine_config::ForecastSettings;
use ev_adoption_forecast::engine::forecast_engine::RegressionForecastEngine;
use ev_adoption_forecast::engine::protocol::{handle_json, EngineResponse};
use serde_json::{json, Value};

fn engine() -> RegressionForecastEngine {
    RegressionForecastEngine::new(ForecastSettings::default())
}

fn run(request: Value) -> Value {
    let response = handle_json(&engine(), &request.to_string());
    serde_json::to_value(response).unwrap()
}

#[test]
fn test_growth_request_round_trip() {
    let output = run(json!({
        "historical": [
            {"year": 2020, "count": 1000, "chargingDemandKwh": 3000000.0},
            {"year": 2021, "count": 1300, "chargingDemandKwh": 3900000.0},
            {"year": 2022, "count": 1700, "chargingDemandKwh": 5100000.0}
        ],
        "futureYears": [2023, 2024]
    }));

    let results = output["results"].as_array().expect("应返回 results");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["year"], 2023);
    assert_eq!(results[0]["modelUsed"], "Moving Average Growth");
    let count = results[0]["predictedCount"].as_i64().unwrap();
    assert!((count - 2216).abs() <= 1);
    assert!(results[1]["predictedDemandKwh"].as_f64().unwrap() > 5_100_000.0);
}

#[test]
fn test_future_years_keep_requested_order() {
    let output = run(json!({
        "historical": [
            {"year": 2018, "count": 10, "chargingDemandKwh": 1.0},
            {"year": 2019, "count": 20, "chargingDemandKwh": 2.0},
            {"year": 2020, "count": 30, "chargingDemandKwh": 3.0},
            {"year": 2021, "count": 40, "chargingDemandKwh": 4.0}
        ],
        "futureYears": [2024, 2022]
    }));

    let results = output["results"].as_array().unwrap();
    assert_eq!(results[0]["year"], 2024);
    assert_eq!(results[0]["predictedCount"], 70);
    assert_eq!(results[1]["predictedCount"], 50);
    assert_eq!(results[1]["modelUsed"], "Linear Regression");
}

#[test]
fn test_single_point_is_structured_error() {
    let response = handle_json(
        &engine(),
        r#"{"historical": [{"year": 2022, "count": 5, "chargingDemandKwh": 1.0}], "futureYears": [2023]}"#,
    );
    assert!(response.is_failure());

    let output = serde_json::to_value(&response).unwrap();
    assert!(output["error"]
        .as_str()
        .unwrap()
        .contains("Insufficient historical data"));
}

#[test]
fn test_malformed_json_is_structured_error() {
    let response = handle_json(&engine(), "not json");
    match response {
        EngineResponse::Failure { error } => assert!(error.starts_with("Invalid request")),
        other => panic!("unexpected response: {other:?}"),
    }
}
