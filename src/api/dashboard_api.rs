// ==========================================
// 电动车保有量预测系统 - 看板 API
// ==========================================
// 职责: 看板汇总与电网影响分析（只读）
// ==========================================

use crate::api::error::ApiResult;
use crate::config::engine_config::GridSettings;
use crate::engine::dashboard::{compute_dashboard_stats, DashboardStats};
use crate::engine::grid_impact::{GridAnalysis, GridImpactAnalyzer, LoadShapeSource};
use crate::repository::ev_data_repo::EvDataRepository;
use std::sync::Arc;
use tracing::debug;

/// 看板API
pub struct DashboardApi<R>
where
    R: EvDataRepository,
{
    repo: Arc<R>,
    analyzer: GridImpactAnalyzer,
}

impl<R> DashboardApi<R>
where
    R: EvDataRepository,
{
    pub fn new(repo: Arc<R>, grid: GridSettings) -> Self {
        Self {
            repo,
            analyzer: GridImpactAnalyzer::new(grid),
        }
    }

    /// 看板汇总（全部历史记录）
    pub async fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        let records = self.repo.list_ev_stats(None, None).await?;
        Ok(compute_dashboard_stats(&records))
    }

    /// 电网影响分析
    ///
    /// # 参数
    /// - region: 地区（None 表示全部地区）
    /// - shape: 日负荷形状来源（测试中可用 MidpointLoadShape 固定结果）
    pub async fn grid_analysis(
        &self,
        region: Option<&str>,
        shape: &mut dyn LoadShapeSource,
    ) -> ApiResult<GridAnalysis> {
        let records = self.repo.list_ev_stats(region, None).await?;
        debug!(records = records.len(), region = ?region, "电网分析数据已加载");
        Ok(self.analyzer.analyze(&records, region, shape))
    }
}
