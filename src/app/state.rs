// ==========================================
// 电动车保有量预测系统 - 应用状态
// ==========================================
// 职责: 打开数据库、加载配置、装配共享仓储与各 API 实例
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{DashboardApi, ForecastApi, ImportApi};
use crate::config::config_manager::ConfigManager;
use crate::config::engine_config::EngineConfig;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::forecast_engine::{FitAndPredict, RegressionForecastEngine};
use crate::repository::ev_data_repo_impl::EvDataRepositoryImpl;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "EV_FORECAST_DB";

/// 应用状态
///
/// 所有 API 共享同一个仓储（同一条 SQLite 连接）
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 生效的引擎配置
    pub config: EngineConfig,

    /// 预测引擎（CLI engine 子命令直接使用）
    pub engine: Arc<dyn FitAndPredict>,

    /// 数据导入API
    pub import_api: Arc<ImportApi<EvDataRepositoryImpl>>,

    /// 预测API
    pub forecast_api: Arc<ForecastApi<EvDataRepositoryImpl>>,

    /// 看板API
    pub dashboard_api: Arc<DashboardApi<EvDataRepositoryImpl>>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（":memory:" 可用于测试）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));
        let config = config_manager
            .load_engine_config()
            .map_err(|e| format!("配置加载失败: {}", e))?;
        tracing::debug!(?config, "引擎配置已加载");

        // ==========================================
        // 仓储 / 引擎 / API
        // ==========================================
        let repo = Arc::new(EvDataRepositoryImpl::from_connection(conn));
        let engine: Arc<dyn FitAndPredict> =
            Arc::new(RegressionForecastEngine::new(config.forecast.clone()));

        let import_api = Arc::new(ImportApi::new(repo.clone(), config.import.clone()));
        let forecast_api = Arc::new(ForecastApi::new(
            repo.clone(),
            engine.clone(),
            config.forecast.clone(),
            config.accuracy.clone(),
        ));
        let dashboard_api = Arc::new(DashboardApi::new(repo, config.grid.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            config,
            engine,
            import_api,
            forecast_api,
            dashboard_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 EV_FORECAST_DB（非空时）
/// - 否则: 用户本地数据目录/ev-adoption-forecast/ev_forecast.db
/// - 无法获取数据目录时: ./ev_forecast.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./ev_forecast.db");
    if let Some(data_dir) = dirs::data_local_dir() {
        let dir = data_dir.join("ev-adoption-forecast");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("ev_forecast.db");
        }
    }

    path.to_string_lossy().to_string()
}
