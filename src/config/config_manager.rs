// ==========================================
// 电动车保有量预测系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)，缺省值见 EngineConfig::default
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // ===== 导入 =====
    pub const IMPORT_MAX_ROWS: &str = "import.max_rows";
    pub const IMPORT_PREVIEW_ROWS: &str = "import.preview_rows";
    pub const IMPORT_MAX_SURFACED_WARNINGS: &str = "import.max_surfaced_warnings";
    pub const IMPORT_DEFAULT_KWH_PER_VEHICLE: &str = "import.default_kwh_per_vehicle";

    // ===== 预测 =====
    pub const FORECAST_REGRESSION_MIN_POINTS: &str = "forecast.regression_min_points";
    pub const FORECAST_REGRESSION_MIN_DISTINCT_YEARS: &str =
        "forecast.regression_min_distinct_years";
    pub const FORECAST_POLYNOMIAL_MIN_POINTS: &str = "forecast.polynomial_min_points";
    pub const FORECAST_FIT_TIMEOUT_MS: &str = "forecast.fit_timeout_ms";

    // ===== 准确度 =====
    pub const ACCURACY_CONFIDENCE_FLOOR: &str = "accuracy.confidence_floor";
    pub const ACCURACY_CONFIDENCE_CEILING: &str = "accuracy.confidence_ceiling";

    // ===== 电网 =====
    pub const GRID_PEAK_CONCURRENCY_RATIO: &str = "grid.peak_concurrency_ratio";
    pub const GRID_AVG_CHARGING_RATE_KW: &str = "grid.avg_charging_rate_kw";
    pub const GRID_SAFETY_MARGIN: &str = "grid.safety_margin";
    pub const GRID_SUBSTATION_CAPACITY_MW: &str = "grid.substation_capacity_mw";
    pub const GRID_UPGRADE_UTILIZATION_PCT: &str = "grid.upgrade_utilization_pct";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        debug!(key = %key, value = %value, "配置已更新");
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&json!(config_map))
            .map_err(|e| RepositoryError::InternalError(e.to_string()))
    }

    /// 读取并解析配置值，不存在时使用默认值
    fn read_parsed<T: FromStr>(&self, key: &str, default: T) -> RepositoryResult<T> {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|_| RepositoryError::FieldValueError {
                    field: key.to_string(),
                    message: format!("无法解析配置值: {}", raw),
                }),
        }
    }

    /// 加载引擎配置（缺省值 + config_kv 覆写）
    pub fn load_engine_config(&self) -> RepositoryResult<EngineConfig> {
        use config_keys::*;

        let mut config = EngineConfig::default();

        // ===== 导入 =====
        config.import.max_rows = self.read_parsed(IMPORT_MAX_ROWS, config.import.max_rows)?;
        config.import.preview_rows =
            self.read_parsed(IMPORT_PREVIEW_ROWS, config.import.preview_rows)?;
        config.import.max_surfaced_warnings = self.read_parsed(
            IMPORT_MAX_SURFACED_WARNINGS,
            config.import.max_surfaced_warnings,
        )?;
        config.import.default_kwh_per_vehicle = self.read_parsed(
            IMPORT_DEFAULT_KWH_PER_VEHICLE,
            config.import.default_kwh_per_vehicle,
        )?;

        // ===== 预测 =====
        config.forecast.regression_min_points = self.read_parsed(
            FORECAST_REGRESSION_MIN_POINTS,
            config.forecast.regression_min_points,
        )?;
        config.forecast.regression_min_distinct_years = self.read_parsed(
            FORECAST_REGRESSION_MIN_DISTINCT_YEARS,
            config.forecast.regression_min_distinct_years,
        )?;
        config.forecast.polynomial_min_points = self.read_parsed(
            FORECAST_POLYNOMIAL_MIN_POINTS,
            config.forecast.polynomial_min_points,
        )?;
        config.forecast.fit_timeout_ms =
            self.read_parsed(FORECAST_FIT_TIMEOUT_MS, config.forecast.fit_timeout_ms)?;

        // ===== 准确度 =====
        config.accuracy.confidence_floor =
            self.read_parsed(ACCURACY_CONFIDENCE_FLOOR, config.accuracy.confidence_floor)?;
        config.accuracy.confidence_ceiling = self.read_parsed(
            ACCURACY_CONFIDENCE_CEILING,
            config.accuracy.confidence_ceiling,
        )?;

        // ===== 电网 =====
        config.grid.peak_concurrency_ratio = self.read_parsed(
            GRID_PEAK_CONCURRENCY_RATIO,
            config.grid.peak_concurrency_ratio,
        )?;
        config.grid.avg_charging_rate_kw =
            self.read_parsed(GRID_AVG_CHARGING_RATE_KW, config.grid.avg_charging_rate_kw)?;
        config.grid.safety_margin =
            self.read_parsed(GRID_SAFETY_MARGIN, config.grid.safety_margin)?;
        config.grid.substation_capacity_mw = self.read_parsed(
            GRID_SUBSTATION_CAPACITY_MW,
            config.grid.substation_capacity_mw,
        )?;
        config.grid.upgrade_utilization_pct = self.read_parsed(
            GRID_UPGRADE_UTILIZATION_PCT,
            config.grid.upgrade_utilization_pct,
        )?;

        config
            .validate()
            .map_err(RepositoryError::ValidationError)?;

        Ok(config)
    }
}
