// ==========================================
// 电动车保有量预测系统 - 数据仓储实现
// ==========================================
// 职责: EvDataRepository 的 rusqlite 实现
// 约束: 所有查询参数化；批量写入走事务
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::ev_stat::{ChargingEventRecord, HistoricalRecord};
use crate::domain::forecast::{ForecastPoint, ModelUsed, StoredForecast};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::ev_data_repo::EvDataRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row, Transaction};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

// ==========================================
// EvDataRepositoryImpl
// ==========================================
pub struct EvDataRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl EvDataRepositoryImpl {
    /// 创建新的 Repository 实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（调用方负责建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 事务内辅助 =====

    fn insert_ev_stats_tx(tx: &Transaction, stats: &[HistoricalRecord]) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO ev_stats (region, year, ev_type, count, charging_demand_kwh)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )?;

        let mut count = 0;
        for stat in stats {
            stmt.execute(params![
                stat.region,
                stat.year,
                stat.ev_type,
                stat.count,
                stat.charging_demand_kwh,
            ])?;
            count += 1;
        }
        Ok(count)
    }

    fn insert_charging_records_tx(
        tx: &Transaction,
        records: &[ChargingEventRecord],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO charging_records (
                region, vehicle_model, battery_capacity_kwh, energy_consumed_kwh,
                charging_duration_hours, charging_rate_kw, charger_type, user_type,
                charging_start_time
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )?;

        let mut count = 0;
        for record in records {
            stmt.execute(params![
                record.region,
                record.vehicle_model,
                record.battery_capacity_kwh,
                record.energy_consumed_kwh,
                record.charging_duration_hours,
                record.charging_rate_kw,
                record.charger_type,
                record.user_type,
                record.charging_start_time,
            ])?;
            count += 1;
        }
        Ok(count)
    }

    /// 登记地区（已存在则忽略）
    fn ensure_regions_tx<'a, I>(tx: &Transaction, regions: I) -> RepositoryResult<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unique: BTreeSet<&str> = regions.into_iter().collect();
        let mut stmt = tx.prepare("INSERT OR IGNORE INTO regions (name) VALUES (?1)")?;
        for region in unique {
            stmt.execute(params![region])?;
        }
        Ok(())
    }

    fn map_ev_stat_row(row: &Row) -> rusqlite::Result<HistoricalRecord> {
        Ok(HistoricalRecord {
            region: row.get(0)?,
            year: row.get(1)?,
            ev_type: row.get(2)?,
            count: row.get(3)?,
            charging_demand_kwh: row.get(4)?,
        })
    }

    fn map_forecast_row(row: &Row) -> rusqlite::Result<StoredForecast> {
        let model_raw: String = row.get(7)?;
        let model_used = ModelUsed::from_db_str(&model_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                7,
                Type::Text,
                format!("未知模型: {}", model_raw).into(),
            )
        })?;

        Ok(StoredForecast {
            id: row.get(0)?,
            run_id: row.get(1)?,
            point: ForecastPoint {
                region: row.get(2)?,
                year: row.get(3)?,
                ev_type: row.get(4)?,
                predicted_count: row.get(5)?,
                predicted_demand_kwh: row.get(6)?,
                model_used,
            },
            created_at: row.get(8)?,
        })
    }
}

#[async_trait]
impl EvDataRepository for EvDataRepositoryImpl {
    async fn persist_ev_stats(&self, stats: Vec<HistoricalRecord>) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        Self::ensure_regions_tx(&tx, stats.iter().map(|s| s.region.as_str()))?;
        let count = Self::insert_ev_stats_tx(&tx, &stats)?;

        tx.commit()?;
        debug!(count, "ev_stats 写入完成");
        Ok(count)
    }

    async fn persist_charging_import(
        &self,
        records: Vec<ChargingEventRecord>,
        aggregated: Vec<HistoricalRecord>,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        Self::ensure_regions_tx(&tx, records.iter().map(|r| r.region.as_str()))?;
        let charging_count = Self::insert_charging_records_tx(&tx, &records)?;
        let stats_count = Self::insert_ev_stats_tx(&tx, &aggregated)?;

        tx.commit()?;
        debug!(charging_count, stats_count, "充电明细写入完成");
        Ok(stats_count)
    }

    async fn list_ev_stats(
        &self,
        region: Option<&str>,
        ev_type: Option<&str>,
    ) -> RepositoryResult<Vec<HistoricalRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT region, year, ev_type, count, charging_demand_kwh
            FROM ev_stats
            WHERE (?1 IS NULL OR region = ?1)
              AND (?2 IS NULL OR ev_type = ?2)
            ORDER BY id
            "#,
        )?;

        let stats = stmt
            .query_map(params![region, ev_type], Self::map_ev_stat_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stats)
    }

    async fn list_regions(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT name FROM regions ORDER BY name")?;
        let regions = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(regions)
    }

    async fn count_charging_records(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM charging_records", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    async fn insert_forecasts(
        &self,
        run_id: &str,
        points: Vec<ForecastPoint>,
    ) -> RepositoryResult<Vec<StoredForecast>> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let created_at: DateTime<Utc> = Utc::now();

        let mut stored = Vec::with_capacity(points.len());
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO forecasts (
                    run_id, region, year, ev_type, predicted_count,
                    predicted_demand_kwh, model_used, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;

            for point in points {
                stmt.execute(params![
                    run_id,
                    point.region,
                    point.year,
                    point.ev_type,
                    point.predicted_count,
                    point.predicted_demand_kwh,
                    point.model_used.to_db_str(),
                    created_at,
                ])?;
                stored.push(StoredForecast {
                    id: tx.last_insert_rowid(),
                    run_id: run_id.to_string(),
                    point,
                    created_at,
                });
            }
        }

        tx.commit()?;
        debug!(run_id = %run_id, count = stored.len(), "预测结果写入完成");
        Ok(stored)
    }

    async fn list_forecasts(
        &self,
        region: Option<&str>,
        ev_type: Option<&str>,
    ) -> RepositoryResult<Vec<StoredForecast>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, run_id, region, year, ev_type, predicted_count,
                   predicted_demand_kwh, model_used, created_at
            FROM forecasts
            WHERE (?1 IS NULL OR region = ?1)
              AND (?2 IS NULL OR ev_type = ?2)
            ORDER BY id
            "#,
        )?;

        let forecasts = stmt
            .query_map(params![region, ev_type], Self::map_forecast_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(forecasts)
    }

    async fn clear_all_data(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(
            r#"
            DELETE FROM forecasts;
            DELETE FROM charging_records;
            DELETE FROM ev_stats;
            DELETE FROM regions;
            "#,
        )?;
        tx.commit()?;
        debug!("业务数据已清空");
        Ok(())
    }
}
