// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库上的 AppState、临时 CSV 文件、测试数据集路径
// ==========================================

#![allow(dead_code)]

use ev_adoption_forecast::app::AppState;
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并装配 AppState
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - AppState: 应用状态
pub fn create_test_state() -> Result<(NamedTempFile, AppState), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let state = AppState::new(db_path)?;
    Ok((temp_file, state))
}

/// 写出带扩展名的临时 CSV 文件
pub fn write_temp_csv(content: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// 测试数据集路径
pub fn dataset_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("datasets")
        .join(name)
}

/// 年度保有量 CSV 文本
pub fn ev_stats_csv(region: &str, ev_type: &str, series: &[(i32, i64)]) -> String {
    let mut csv = String::from("year,region,ev_type,count\n");
    for (year, count) in series {
        csv.push_str(&format!("{},{},{},{}\n", year, region, ev_type, count));
    }
    csv
}
