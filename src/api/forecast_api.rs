// ==========================================
// 电动车保有量预测系统 - 预测 API
// ==========================================
// 职责: 预测生成（加载序列 → 引擎拟合 → 整批落库）、预测查询、模型准确度
// 约束: 拟合在阻塞线程池执行并受超时保护；失败时不写入任何预测点
// ==========================================

use crate::api::error::{ApiError, ApiResult, NOT_ENOUGH_HISTORY_MESSAGE};
use crate::config::engine_config::{AccuracySettings, ForecastSettings};
use crate::domain::ev_stat::{is_plausible_year, SeriesPoint, MAX_PLAUSIBLE_YEAR, MIN_PLAUSIBLE_YEAR};
use crate::domain::forecast::{AccuracyReport, ForecastPoint, StoredForecast};
use crate::engine::accuracy::AccuracyEvaluator;
use crate::engine::error::ForecastError;
use crate::engine::forecast_engine::{FitAndPredict, MIN_HISTORICAL_POINTS};
use crate::repository::ev_data_repo::EvDataRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 预测生成请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    pub region: String,
    pub ev_type: String,
    pub start_year: i32,
    pub end_year: i32,
}

impl ForecastRequest {
    fn validate(&self) -> ApiResult<()> {
        if self.region.trim().is_empty() || self.ev_type.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "region and evType are required".to_string(),
            ));
        }
        if !is_plausible_year(self.start_year) || !is_plausible_year(self.end_year) {
            return Err(ApiError::InvalidInput(format!(
                "years must be within {}..={}",
                MIN_PLAUSIBLE_YEAR, MAX_PLAUSIBLE_YEAR
            )));
        }
        if self.start_year > self.end_year {
            return Err(ApiError::InvalidInput(format!(
                "startYear {} is after endYear {}",
                self.start_year, self.end_year
            )));
        }
        Ok(())
    }

    fn future_years(&self) -> Vec<i32> {
        (self.start_year..=self.end_year).collect()
    }
}

/// 预测API
pub struct ForecastApi<R>
where
    R: EvDataRepository,
{
    repo: Arc<R>,
    engine: Arc<dyn FitAndPredict>,
    settings: ForecastSettings,
    evaluator: AccuracyEvaluator,
}

impl<R> ForecastApi<R>
where
    R: EvDataRepository,
{
    pub fn new(
        repo: Arc<R>,
        engine: Arc<dyn FitAndPredict>,
        settings: ForecastSettings,
        accuracy: AccuracySettings,
    ) -> Self {
        let evaluator = AccuracyEvaluator::new(engine.clone(), accuracy);
        Self {
            repo,
            engine,
            settings,
            evaluator,
        }
    }

    /// 生成并保存预测
    ///
    /// # 返回
    /// - Ok(Vec<StoredForecast>): 按年份升序的已保存预测点（共享 runId）
    /// - Err(ApiError::InsufficientData): 历史点不足 2 个
    /// - Err(ApiError::EngineFailure): 拟合失败或超时
    #[instrument(skip(self), fields(region = %request.region, ev_type = %request.ev_type))]
    pub async fn generate(&self, request: &ForecastRequest) -> ApiResult<Vec<StoredForecast>> {
        request.validate()?;

        // === 步骤 1: 加载历史序列 ===
        let records = self
            .repo
            .list_ev_stats(Some(&request.region), Some(&request.ev_type))
            .await?;
        if records.len() < MIN_HISTORICAL_POINTS {
            warn!(points = records.len(), "历史数据不足，拒绝预测");
            return Err(ApiError::InsufficientData(
                NOT_ENOUGH_HISTORY_MESSAGE.to_string(),
            ));
        }
        let series: Vec<SeriesPoint> = records.iter().map(SeriesPoint::from).collect();
        debug!(points = series.len(), "历史序列已加载");

        // === 步骤 2: 拟合（阻塞线程池 + 超时）===
        let future_years = request.future_years();
        let engine = self.engine.clone();
        let timeout_ms = self.settings.fit_timeout_ms;
        let task = tokio::task::spawn_blocking(move || engine.fit_and_predict(&series, &future_years));

        let predictions = match tokio::time::timeout(Duration::from_millis(timeout_ms), task).await {
            Err(_) => {
                warn!(timeout_ms, "拟合超时");
                return Err(ForecastError::EngineFailure(format!(
                    "fit timed out after {} ms",
                    timeout_ms
                ))
                .into());
            }
            Ok(Err(join_err)) => {
                return Err(ForecastError::EngineFailure(join_err.to_string()).into());
            }
            Ok(Ok(result)) => result?,
        };

        // === 步骤 3: 整批落库 ===
        let run_id = Uuid::new_v4().to_string();
        let points: Vec<ForecastPoint> = predictions
            .into_iter()
            .map(|p| ForecastPoint::from_prediction(&request.region, &request.ev_type, p))
            .collect();
        let stored = self.repo.insert_forecasts(&run_id, points).await?;

        info!(
            run_id = %run_id,
            years = stored.len(),
            model = ?stored.first().map(|s| s.point.model_used),
            "预测生成完成"
        );
        Ok(stored)
    }

    /// 查询已保存的预测
    pub async fn list_forecasts(
        &self,
        region: Option<&str>,
        ev_type: Option<&str>,
    ) -> ApiResult<Vec<StoredForecast>> {
        Ok(self.repo.list_forecasts(region, ev_type).await?)
    }

    /// 模型准确度（全部历史记录）
    pub async fn model_accuracy(&self) -> ApiResult<AccuracyReport> {
        let records = self.repo.list_ev_stats(None, None).await?;
        Ok(self.evaluator.evaluate(&records)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start_year: i32, end_year: i32) -> ForecastRequest {
        ForecastRequest {
            region: "Texas".to_string(),
            ev_type: "BEV".to_string(),
            start_year,
            end_year,
        }
    }

    #[test]
    fn test_request_validation() {
        assert!(request(2023, 2025).validate().is_ok());
        assert!(request(2025, 2025).validate().is_ok());
        assert!(matches!(
            request(2026, 2025).validate(),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(request(1800, 2025).validate().is_err());

        let mut blank = request(2023, 2024);
        blank.region = "  ".to_string();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_future_years_are_ascending_and_inclusive() {
        assert_eq!(request(2023, 2026).future_years(), vec![2023, 2024, 2025, 2026]);
    }
}
