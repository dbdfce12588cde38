// ==========================================
// 预测 API 集成测试
// ==========================================
// 覆盖: 导入 → 生成预测 → 落库 → 查询/导出；数据不足不写入；准确度评估

use approx::assert_relative_eq;
use ev_adoption_forecast::api::{ApiError, ForecastRequest};
use ev_adoption_forecast::domain::forecast::ModelUsed;
use ev_adoption_forecast::export::write_forecasts_csv;

mod test_helpers;
use test_helpers::{create_test_state, dataset_path, ev_stats_csv};

fn request(region: &str, ev_type: &str, start_year: i32, end_year: i32) -> ForecastRequest {
    ForecastRequest {
        region: region.to_string(),
        ev_type: ev_type.to_string(),
        start_year,
        end_year,
    }
}

#[tokio::test]
async fn test_three_point_series_uses_growth_model() {
    let (_db, state) = create_test_state().expect("创建测试数据库失败");
    state
        .import_api
        .import_csv_text(&ev_stats_csv("Texas", "BEV", &[(2020, 1000), (2021, 1300), (2022, 1700)]))
        .await
        .unwrap();

    let stored = state
        .forecast_api
        .generate(&request("Texas", "BEV", 2023, 2024))
        .await
        .expect("预测失败");

    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].point.year, 2023);
    assert_eq!(stored[1].point.year, 2024);
    assert!(stored
        .iter()
        .all(|s| s.point.model_used == ModelUsed::MovingAverageGrowth));
    assert!((stored[0].point.predicted_count - 2216).abs() <= 1);
    assert!((stored[1].point.predicted_count - 2890).abs() <= 1);
    // 同一次生成共享 runId
    assert_eq!(stored[0].run_id, stored[1].run_id);

    let listed = state
        .forecast_api
        .list_forecasts(Some("Texas"), Some("BEV"))
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    for (listed, stored) in listed.iter().zip(&stored) {
        assert_eq!(listed.id, stored.id);
        assert_eq!(listed.run_id, stored.run_id);
        assert_eq!(listed.point, stored.point);
    }
}

#[tokio::test]
async fn test_linear_series_uses_regression() {
    let (_db, state) = create_test_state().expect("创建测试数据库失败");
    state
        .import_api
        .import_file(&dataset_path("ev_stats_sample.csv"))
        .await
        .unwrap();

    let stored = state
        .forecast_api
        .generate(&request("Texas", "BEV", 2023, 2025))
        .await
        .unwrap();

    assert_eq!(stored.len(), 3);
    assert!(stored
        .iter()
        .all(|s| s.point.model_used == ModelUsed::LinearRegression));
    // 保有量与需求单调递增
    assert!(stored[0].point.predicted_count < stored[2].point.predicted_count);
    assert!(stored[0].point.predicted_demand_kwh < stored[2].point.predicted_demand_kwh);
}

#[tokio::test]
async fn test_insufficient_history_fails_without_writes() {
    let (_db, state) = create_test_state().expect("创建测试数据库失败");
    state
        .import_api
        .import_csv_text(&ev_stats_csv("Utah", "BEV", &[(2022, 50)]))
        .await
        .unwrap();

    for region in ["Utah", "Nowhere"] {
        let err = state
            .forecast_api
            .generate(&request(region, "BEV", 2023, 2025))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InsufficientData(_)));
        assert_eq!(err.to_string(), "Not enough historical data to forecast");
    }

    assert!(state
        .forecast_api
        .list_forecasts(None, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_inverted_year_range_is_invalid_input() {
    let (_db, state) = create_test_state().expect("创建测试数据库失败");
    let err = state
        .forecast_api
        .generate(&request("Texas", "BEV", 2030, 2025))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn test_accuracy_on_empty_and_populated_database() {
    let (_db, state) = create_test_state().expect("创建测试数据库失败");

    let empty = state.forecast_api.model_accuracy().await.unwrap();
    assert_eq!(empty.mae, None);
    assert_eq!(empty.r2_score, None);
    assert_eq!(empty.confidence_level, None);
    assert_eq!(empty.sample_size, 0);

    // 严格线性序列: 样本内拟合完美
    state
        .import_api
        .import_csv_text(&ev_stats_csv(
            "Texas",
            "BEV",
            &[(2018, 100), (2019, 200), (2020, 300), (2021, 400), (2022, 500)],
        ))
        .await
        .unwrap();
    state
        .import_api
        .import_csv_text(&ev_stats_csv("Ohio", "PHEV", &[(2021, 10), (2022, 20)]))
        .await
        .unwrap();

    let report = state.forecast_api.model_accuracy().await.unwrap();
    assert_eq!(report.sample_size, 7);
    assert_eq!(report.data_points_in_test, Some(5));
    assert_eq!(report.tested_combination.as_deref(), Some("Texas-BEV"));
    assert_relative_eq!(report.r2_score.unwrap(), 1.0);
    assert_relative_eq!(report.mae.unwrap(), 0.0);
    assert_eq!(report.confidence_level, Some(95));
}

#[tokio::test]
async fn test_export_stored_forecasts_as_csv() {
    let (_db, state) = create_test_state().expect("创建测试数据库失败");
    state
        .import_api
        .import_csv_text(&ev_stats_csv("Texas", "BEV", &[(2020, 1000), (2021, 1300), (2022, 1700)]))
        .await
        .unwrap();
    state
        .forecast_api
        .generate(&request("Texas", "BEV", 2023, 2025))
        .await
        .unwrap();

    let forecasts = state.forecast_api.list_forecasts(None, None).await.unwrap();
    let mut buffer = Vec::new();
    let written = write_forecasts_csv(&forecasts, &mut buffer).unwrap();
    assert_eq!(written, 3);

    let text = String::from_utf8(buffer).unwrap();
    assert_eq!(text.lines().count(), 4);
    assert!(text.contains("Moving Average Growth"));
}
