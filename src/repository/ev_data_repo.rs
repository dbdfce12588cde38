// ==========================================
// 电动车保有量预测系统 - 数据仓储 Trait
// ==========================================
// 职责: 定义历史数据 / 充电明细 / 预测结果的数据访问接口
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::ev_stat::{ChargingEventRecord, HistoricalRecord};
use crate::domain::forecast::{ForecastPoint, StoredForecast};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// EvDataRepository Trait
// ==========================================
// 实现者: EvDataRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait EvDataRepository: Send + Sync {
    // ===== 导入写入（事务化）=====

    /// 写入年度保有量记录，并登记出现的地区
    ///
    /// # 返回
    /// - Ok(usize): 写入条数
    /// - Err: 数据库错误（整个事务回滚）
    async fn persist_ev_stats(&self, stats: Vec<HistoricalRecord>) -> RepositoryResult<usize>;

    /// 写入充电明细及其聚合得到的年度记录（同一事务）
    ///
    /// # 参数
    /// - records: 充电事件
    /// - aggregated: 按 (region, 年份) 聚合后的年度记录
    ///
    /// # 返回
    /// - Ok(usize): 写入的聚合年度记录条数
    async fn persist_charging_import(
        &self,
        records: Vec<ChargingEventRecord>,
        aggregated: Vec<HistoricalRecord>,
    ) -> RepositoryResult<usize>;

    // ===== 查询 =====

    /// 查询年度保有量记录（按插入顺序）
    ///
    /// # 参数
    /// - region / ev_type: None 表示不过滤
    async fn list_ev_stats(
        &self,
        region: Option<&str>,
        ev_type: Option<&str>,
    ) -> RepositoryResult<Vec<HistoricalRecord>>;

    /// 已登记地区（按名称排序）
    async fn list_regions(&self) -> RepositoryResult<Vec<String>>;

    /// 充电明细条数
    async fn count_charging_records(&self) -> RepositoryResult<usize>;

    // ===== 预测结果 =====

    /// 写入同一批次的预测点（全部成功或全部回滚）
    ///
    /// # 返回
    /// 带数据库 ID 与创建时间的已存储记录，顺序与输入一致
    async fn insert_forecasts(
        &self,
        run_id: &str,
        points: Vec<ForecastPoint>,
    ) -> RepositoryResult<Vec<StoredForecast>>;

    /// 查询预测结果（按 ID 升序）
    async fn list_forecasts(
        &self,
        region: Option<&str>,
        ev_type: Option<&str>,
    ) -> RepositoryResult<Vec<StoredForecast>>;

    // ===== 维护 =====

    /// 清空全部业务数据（配置保留）
    async fn clear_all_data(&self) -> RepositoryResult<()>;
}
