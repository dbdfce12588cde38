// ==========================================
// 电动车保有量预测系统 - 命令行入口
// ==========================================
// 子命令: import / forecast / forecasts / accuracy / dashboard / grid / export / clear / engine
// 输出: stdout 为格式化 JSON（export 为 CSV），日志写 stderr
// ==========================================

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use ev_adoption_forecast::api::{ApiError, ApiResult, ForecastRequest};
use ev_adoption_forecast::app::{get_default_db_path, AppState, DB_PATH_ENV};
use ev_adoption_forecast::engine::grid_impact::SeededLoadShape;
use ev_adoption_forecast::engine::protocol::handle_json;
use ev_adoption_forecast::export::write_forecasts_csv;
use ev_adoption_forecast::{logging, APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = "ev-forecast")]
#[command(about = "EV adoption data import, forecasting and grid impact analysis")]
#[command(version)]
struct Cli {
    /// SQLite database path (default: user data dir)
    #[arg(long, global = true, env = DB_PATH_ENV)]
    db: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import CSV / Excel files (ev_stats or charging_patterns shape)
    Import {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Generate and store forecasts for one region / EV type
    Forecast {
        #[arg(long)]
        region: String,
        #[arg(long)]
        ev_type: String,
        #[arg(long)]
        start_year: i32,
        #[arg(long)]
        end_year: i32,
    },

    /// List stored forecasts
    Forecasts {
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        ev_type: Option<String>,
    },

    /// List imported historical records
    Stats {
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        ev_type: Option<String>,
    },

    /// List known regions
    Regions,

    /// In-sample accuracy of the forecast model
    Accuracy,

    /// Dashboard totals
    Dashboard,

    /// Grid impact analysis
    Grid {
        #[arg(long)]
        region: Option<String>,
        /// Seed for the hourly load shape (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Export stored forecasts as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        ev_type: Option<String>,
    },

    /// Delete all imported data and forecasts
    Clear,

    /// Forecast engine wire protocol: JSON request on stdin, JSON response on stdout
    Engine,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn api_error_json(err: &ApiError) -> serde_json::Value {
    match err {
        ApiError::NoValidRows { message, warnings } => {
            json!({ "error": message, "warnings": warnings })
        }
        other => json!({ "error": other.to_string() }),
    }
}

/// 调用方错误退出码 2，系统错误退出码 1
fn exit_code_for(err: &ApiError) -> ExitCode {
    if err.is_client_error() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

fn report_failure(err: &ApiError) -> anyhow::Result<ExitCode> {
    tracing::error!(error = %err, "命令执行失败");
    eprintln!("{}", serde_json::to_string_pretty(&api_error_json(err))?);
    Ok(exit_code_for(err))
}

/// 成功输出 JSON，失败输出错误
fn emit<T: Serialize>(result: ApiResult<T>) -> anyhow::Result<ExitCode> {
    match result {
        Ok(value) => {
            print_json(&value)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => report_failure(&e),
    }
}

async fn run(state: &AppState, command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Import { files } => {
            let sources: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
            let results = state.import_api.import_files(files).await;

            let mut exit_code = ExitCode::SUCCESS;
            let mut report = Vec::with_capacity(results.len());
            for (source, result) in sources.into_iter().zip(results) {
                match result {
                    Ok(outcome) => report.push(json!({ "file": source, "result": outcome })),
                    Err(e) => {
                        tracing::warn!(file = %source, error = %e, "文件导入失败");
                        let mut entry = api_error_json(&e);
                        entry["file"] = json!(source);
                        report.push(entry);
                        exit_code = exit_code_for(&e);
                    }
                }
            }
            print_json(&report)?;
            Ok(exit_code)
        }

        Commands::Forecast {
            region,
            ev_type,
            start_year,
            end_year,
        } => {
            let request = ForecastRequest {
                region,
                ev_type,
                start_year,
                end_year,
            };
            emit(state.forecast_api.generate(&request).await)
        }

        Commands::Forecasts { region, ev_type } => emit(
            state
                .forecast_api
                .list_forecasts(region.as_deref(), ev_type.as_deref())
                .await,
        ),

        Commands::Stats { region, ev_type } => emit(
            state
                .import_api
                .list_ev_stats(region.as_deref(), ev_type.as_deref())
                .await,
        ),

        Commands::Regions => emit(state.import_api.list_regions().await),

        Commands::Accuracy => emit(state.forecast_api.model_accuracy().await),

        Commands::Dashboard => emit(state.dashboard_api.dashboard_stats().await),

        Commands::Grid { region, seed } => {
            let seed = seed.unwrap_or_else(rand::random);
            tracing::debug!(seed, "负荷曲线随机种子");
            let mut shape = SeededLoadShape::new(seed);
            emit(
                state
                    .dashboard_api
                    .grid_analysis(region.as_deref(), &mut shape)
                    .await,
            )
        }

        Commands::Export {
            out,
            region,
            ev_type,
        } => {
            let forecasts = match state
                .forecast_api
                .list_forecasts(region.as_deref(), ev_type.as_deref())
                .await
            {
                Ok(forecasts) => forecasts,
                Err(e) => return report_failure(&e),
            };
            let written = match &out {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("无法创建导出文件: {}", path.display()))?;
                    write_forecasts_csv(&forecasts, file)?
                }
                None => write_forecasts_csv(&forecasts, io::stdout().lock())?,
            };
            tracing::info!(rows = written, "预测结果已导出");
            Ok(ExitCode::SUCCESS)
        }

        Commands::Clear => emit(
            state
                .import_api
                .clear_all_data()
                .await
                .map(|()| json!({ "success": true })),
        ),

        Commands::Engine => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("读取 stdin 失败")?;
            let response = handle_json(state.engine.as_ref(), &input);
            print_json(&response)?;
            Ok(if response.is_failure() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    if cli.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("{} v{}", APP_NAME, VERSION);

    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;
    run(&state, cli.command).await
}
