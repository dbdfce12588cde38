// ==========================================
// 电动车保有量预测系统 - 数据导入 API
// ==========================================
// 职责: 封装 CSV/Excel 导入与历史数据查询
// 红线: 导入失败不落库任何数据
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::engine_config::ImportSettings;
use crate::domain::ev_stat::HistoricalRecord;
use crate::importer::csv_normalizer::CsvNormalizer;
use crate::importer::ev_importer::{EvDataImporter, EvDataImporterImpl, ImportOutcome};
use crate::repository::ev_data_repo::EvDataRepository;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// 导入API
pub struct ImportApi<R>
where
    R: EvDataRepository + 'static,
{
    repo: Arc<R>,
    importer: EvDataImporterImpl<R>,
}

impl<R> ImportApi<R>
where
    R: EvDataRepository + 'static,
{
    /// 创建新的ImportApi实例
    ///
    /// # 参数
    /// - repo: 数据仓储（与其他 API 共享）
    /// - settings: 导入参数
    pub fn new(repo: Arc<R>, settings: ImportSettings) -> Self {
        let importer = EvDataImporterImpl::new(repo.clone(), CsvNormalizer::new(settings));
        Self { repo, importer }
    }

    /// 导入 CSV 文本
    pub async fn import_csv_text(&self, content: &str) -> ApiResult<ImportOutcome> {
        self.importer.import_csv_text(content).await.map_err(|e| {
            warn!(error = %e, "CSV 文本导入失败");
            ApiError::from(e)
        })
    }

    /// 导入单个文件
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 批次 ID、形态、记录数、告警、预览
    /// - Err(ApiError): 文件/格式/落库错误
    pub async fn import_file(&self, file_path: &Path) -> ApiResult<ImportOutcome> {
        self.importer.import_file(file_path).await.map_err(ApiError::from)
    }

    /// 批量导入（各文件独立成功或失败）
    pub async fn import_files(&self, file_paths: Vec<PathBuf>) -> Vec<ApiResult<ImportOutcome>> {
        let results = self.importer.import_files(file_paths).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(total = results.len(), failed, "批量导入结束");
        results
            .into_iter()
            .map(|result| result.map_err(ApiError::from))
            .collect()
    }

    /// 查询历史记录
    pub async fn list_ev_stats(
        &self,
        region: Option<&str>,
        ev_type: Option<&str>,
    ) -> ApiResult<Vec<HistoricalRecord>> {
        Ok(self.repo.list_ev_stats(region, ev_type).await?)
    }

    /// 已登记地区
    pub async fn list_regions(&self) -> ApiResult<Vec<String>> {
        Ok(self.repo.list_regions().await?)
    }

    /// 清空全部业务数据
    pub async fn clear_all_data(&self) -> ApiResult<()> {
        self.repo.clear_all_data().await?;
        info!("业务数据已清空");
        Ok(())
    }
}
