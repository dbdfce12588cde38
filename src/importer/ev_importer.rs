// ==========================================
// 电动车保有量预测系统 - 数据导入器
// ==========================================
// 职责: 整合导入流程，从文件/文本到数据库
// 流程: 读取 → 列映射 → 形态判定 → 逐行解析 → (充电明细聚合) → 落库
// 红线: 批次级错误不落库任何数据；行级错误只记告警
// ==========================================

use crate::domain::field::SheetType;
use crate::importer::aggregator::aggregate_charging_records;
use crate::importer::csv_normalizer::{CsvNormalizer, NormalizedSheet, ParsedRecords, PreviewRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawSheet, SheetReader, UniversalFileReader};
use crate::repository::ev_data_repo::EvDataRepository;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ImportOutcome - 单批次导入结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub batch_id: String,
    #[serde(rename = "type")]
    pub sheet_type: SheetType,
    /// 解析出的有效记录数（ev_stats 行或充电事件行）
    pub count: usize,
    /// 写入的年度保有量记录数（充电明细为聚合后的条数）
    pub stats_created: usize,
    pub warnings: Vec<String>,
    pub preview: Vec<PreviewRow>,
    pub elapsed_ms: u64,
}

// ==========================================
// EvDataImporter Trait
// ==========================================
#[async_trait]
pub trait EvDataImporter: Send + Sync {
    /// 从 CSV 文本导入
    async fn import_csv_text(&self, content: &str) -> ImportResult<ImportOutcome>;

    /// 从文件导入（.csv / .xlsx / .xls）
    async fn import_file(&self, file_path: &Path) -> ImportResult<ImportOutcome>;

    /// 批量导入多个文件（并发执行，各文件结果独立）
    async fn import_files(&self, file_paths: Vec<PathBuf>) -> Vec<ImportResult<ImportOutcome>>;
}

// ==========================================
// EvDataImporterImpl
// ==========================================
pub struct EvDataImporterImpl<R>
where
    R: EvDataRepository,
{
    repo: Arc<R>,
    normalizer: CsvNormalizer,
    reader: Box<dyn SheetReader>,
}

impl<R> EvDataImporterImpl<R>
where
    R: EvDataRepository,
{
    /// # 参数
    /// - repo: 数据仓储
    /// - normalizer: 表格规范化器（携带导入参数）
    pub fn new(repo: Arc<R>, normalizer: CsvNormalizer) -> Self {
        Self {
            repo,
            normalizer,
            reader: Box::new(UniversalFileReader),
        }
    }

    /// 替换文件读取器
    pub fn with_reader(mut self, reader: Box<dyn SheetReader>) -> Self {
        self.reader = reader;
        self
    }

    /// 导入已读取的原始表格
    #[instrument(skip_all, fields(source = %source))]
    async fn import_sheet(&self, sheet: RawSheet, source: &str) -> ImportResult<ImportOutcome> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        info!(batch_id = %batch_id, rows = sheet.rows.len(), "开始导入");

        // === 步骤 1: 规范化 ===
        debug!("步骤 1: 列映射与逐行解析");
        let normalized = self.normalizer.normalize(&sheet, Utc::now()).map_err(|e| {
            warn!(error = %e, "表格规范化失败");
            e
        })?;

        if normalized.sheet_type == SheetType::Unknown {
            warn!(headers = ?sheet.headers, "无法识别表格形态");
            return Err(ImportError::UnrecognizedFormat {
                headers: sheet.headers,
            });
        }

        let NormalizedSheet {
            sheet_type,
            data,
            preview,
            mut warnings,
            row_count,
            total_warnings,
            ..
        } = normalized;
        info!(sheet_type = %sheet_type, row_count, total_warnings, "解析完成");

        // === 步骤 2: 落库 ===
        debug!("步骤 2: 落库");
        let stats_created = match data {
            ParsedRecords::EvStats(stats) => self.repo.persist_ev_stats(stats).await,
            ParsedRecords::ChargingPatterns(records) => {
                let aggregation = aggregate_charging_records(&records);
                debug!(buckets = aggregation.stats.len(), "充电明细聚合完成");

                let limit = self.normalizer.settings().max_surfaced_warnings;
                for extra in aggregation.warnings {
                    if warnings.len() < limit {
                        warnings.push(extra);
                    }
                }

                self.repo
                    .persist_charging_import(records, aggregation.stats)
                    .await
            }
            ParsedRecords::Unrecognized => Ok(0),
        }
        .map_err(|e| {
            error!(error = %e, "落库失败");
            ImportError::from(e)
        })?;

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            batch_id = %batch_id,
            count = row_count,
            stats_created,
            elapsed_ms,
            "导入完成"
        );

        Ok(ImportOutcome {
            batch_id,
            sheet_type,
            count: row_count,
            stats_created,
            warnings,
            preview,
            elapsed_ms,
        })
    }
}

#[async_trait]
impl<R> EvDataImporter for EvDataImporterImpl<R>
where
    R: EvDataRepository + 'static,
{
    async fn import_csv_text(&self, content: &str) -> ImportResult<ImportOutcome> {
        let sheet = RawSheet::from_csv_text(content)?;
        self.import_sheet(sheet, "inline").await
    }

    async fn import_file(&self, file_path: &Path) -> ImportResult<ImportOutcome> {
        let source = file_path.display().to_string();
        let sheet = self.reader.read_sheet(file_path).map_err(|e| {
            error!(file_path = %source, error = %e, "文件读取失败");
            e
        })?;
        self.import_sheet(sheet, &source).await
    }

    async fn import_files(&self, file_paths: Vec<PathBuf>) -> Vec<ImportResult<ImportOutcome>> {
        info!(files = file_paths.len(), "开始批量导入");
        join_all(file_paths.iter().map(|path| self.import_file(path))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::engine_config::ImportSettings;
    use crate::db::init_schema;
    use crate::repository::ev_data_repo_impl::EvDataRepositoryImpl;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn importer() -> (EvDataImporterImpl<EvDataRepositoryImpl>, Arc<EvDataRepositoryImpl>) {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let repo = Arc::new(EvDataRepositoryImpl::from_connection(Arc::new(Mutex::new(
            conn,
        ))));
        let importer =
            EvDataImporterImpl::new(repo.clone(), CsvNormalizer::new(ImportSettings::default()));
        (importer, repo)
    }

    #[tokio::test]
    async fn test_import_ev_stats_text() {
        let (importer, repo) = importer();
        let outcome = importer
            .import_csv_text("year,region,ev_type,count\n2020,Texas,BEV,1000\n2021,Texas,BEV,1300\n")
            .await
            .unwrap();

        assert_eq!(outcome.sheet_type, SheetType::EvStats);
        assert_eq!(outcome.count, 2);
        assert_eq!(outcome.stats_created, 2);
        assert_eq!(repo.list_ev_stats(None, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_shape_is_rejected_without_writes() {
        let (importer, repo) = importer();
        let result = importer.import_csv_text("foo,bar\n1,2\n").await;

        assert!(matches!(result, Err(ImportError::UnrecognizedFormat { .. })));
        assert!(repo.list_ev_stats(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_charging_import_creates_aggregates() {
        let (importer, repo) = importer();
        let csv = "region,vehicle_model,energy_consumed,charging_start_time\n\
                   Ohio,Leaf,10,2023-01-05 08:00:00\n\
                   Ohio,Bolt,15,2023-02-05 19:00:00\n\
                   Texas,Model Y,30,2022-03-01 18:00:00\n";

        let outcome = importer.import_csv_text(csv).await.unwrap();
        assert_eq!(outcome.sheet_type, SheetType::ChargingPatterns);
        assert_eq!(outcome.count, 3);
        assert_eq!(outcome.stats_created, 2);

        let ohio = repo.list_ev_stats(Some("Ohio"), Some("Mixed")).await.unwrap();
        assert_eq!(ohio.len(), 1);
        assert_eq!(ohio[0].count, 2);
        assert_eq!(ohio[0].charging_demand_kwh, 25.0);
        assert_eq!(repo.count_charging_records().await.unwrap(), 3);
    }
}
