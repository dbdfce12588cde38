// ==========================================
// 看板 API 集成测试
// ==========================================
// 覆盖: 看板汇总、电网影响分析（固定负荷形状，可复现）

use approx::assert_relative_eq;
use ev_adoption_forecast::engine::grid_impact::{MidpointLoadShape, SeededLoadShape};

mod test_helpers;
use test_helpers::{create_test_state, ev_stats_csv};

#[tokio::test]
async fn test_dashboard_on_empty_database() {
    let (_db, state) = create_test_state().expect("创建测试数据库失败");
    let stats = state.dashboard_api.dashboard_stats().await.unwrap();

    assert_eq!(stats.total_evs, 0);
    assert_eq!(stats.total_demand, 0.0);
    assert_eq!(stats.top_region, "No data");
    assert_eq!(stats.growth_rate, 0.0);
}

#[tokio::test]
async fn test_dashboard_totals_and_growth() {
    let (_db, state) = create_test_state().expect("创建测试数据库失败");
    state
        .import_api
        .import_csv_text(&ev_stats_csv("Texas", "BEV", &[(2020, 1000), (2021, 1300), (2022, 1700)]))
        .await
        .unwrap();
    state
        .import_api
        .import_csv_text(&ev_stats_csv("Ohio", "PHEV", &[(2020, 1000), (2021, 1200)]))
        .await
        .unwrap();

    let stats = state.dashboard_api.dashboard_stats().await.unwrap();
    assert_eq!(stats.total_evs, 6200);
    assert_relative_eq!(stats.total_demand, 6200.0 * 3000.0);
    assert_eq!(stats.top_region, "Texas");
    // 2000 → 2500 (+25%)，2500 → 1700 (-32%)
    assert_relative_eq!(stats.growth_rate, -3.5);

    let json = serde_json::to_value(&stats).unwrap();
    assert!(json.get("totalEvs").is_some());
    assert!(json.get("topRegion").is_some());
}

#[tokio::test]
async fn test_grid_analysis_for_region_is_deterministic_with_midpoint_shape() {
    let (_db, state) = create_test_state().expect("创建测试数据库失败");
    state
        .import_api
        .import_csv_text(&ev_stats_csv("Texas", "BEV", &[(2021, 40_000), (2022, 60_000)]))
        .await
        .unwrap();
    state
        .import_api
        .import_csv_text(&ev_stats_csv("Ohio", "BEV", &[(2022, 5_000)]))
        .await
        .unwrap();

    let analysis = state
        .dashboard_api
        .grid_analysis(Some("Texas"), &mut MidpointLoadShape)
        .await
        .unwrap();

    let summary = &analysis.summary;
    assert_eq!(summary.region, "Texas");
    assert_eq!(summary.total_evs, 100_000);
    assert_relative_eq!(summary.peak_demand_mw, 144.0);
    assert_eq!(summary.substations_needed, 3);
    assert_relative_eq!(analysis.costs.transformer_upgrade_cost, 3_000_000.0);

    assert_eq!(analysis.hourly_profile.len(), 24);
    assert_eq!(analysis.peak_hour.hour, 18);
    // 监测建议始终存在，且位于最后
    assert_eq!(
        analysis.recommendations.last().map(|r| r.category.as_str()),
        Some("Monitoring")
    );
}

#[tokio::test]
async fn test_grid_analysis_all_regions_and_seeded_shape() {
    let (_db, state) = create_test_state().expect("创建测试数据库失败");
    state
        .import_api
        .import_csv_text(&ev_stats_csv("Texas", "BEV", &[(2021, 1_000), (2022, 2_000)]))
        .await
        .unwrap();

    let first = state
        .dashboard_api
        .grid_analysis(None, &mut SeededLoadShape::new(42))
        .await
        .unwrap();
    let second = state
        .dashboard_api
        .grid_analysis(None, &mut SeededLoadShape::new(42))
        .await
        .unwrap();

    assert_eq!(first.summary.region, "All Regions");
    assert_eq!(first.summary.total_evs, 3_000);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_grid_analysis_without_data() {
    let (_db, state) = create_test_state().expect("创建测试数据库失败");
    let analysis = state
        .dashboard_api
        .grid_analysis(Some("Nowhere"), &mut MidpointLoadShape)
        .await
        .unwrap();

    assert_eq!(analysis.summary.total_evs, 0);
    assert!(!analysis.summary.upgrade_needed);
    assert_eq!(analysis.peak_hour.time_range, "19:00 - 20:00");
    assert!(analysis.hourly_profile.is_empty());
    assert!(analysis.recommendations.is_empty());
}
