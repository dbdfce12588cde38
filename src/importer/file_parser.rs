// ==========================================
// 电动车保有量预测系统 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析 → RawSheet（表头 + 数据行）
// 支持: CSV 文本 / CSV 文件 / Excel (.xlsx/.xls)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use std::fs;
use std::path::Path;

// ==========================================
// RawSheet - 原始表格
// ==========================================
// 说明: 表头未做规范化；数据行不含空白行
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawSheet {
    /// 从 CSV 文本构造
    ///
    /// # 返回
    /// - Err(EmptyFile): 去掉空白行后不足 2 行（无数据行）
    pub fn from_csv_text(content: &str) -> ImportResult<Self> {
        let lines: Vec<&str> = content
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .collect();

        if lines.len() < 2 {
            return Err(ImportError::EmptyFile);
        }

        let headers = split_csv_line(lines[0]);
        let rows = lines[1..].iter().map(|line| split_csv_line(line)).collect();

        Ok(Self { headers, rows })
    }
}

/// 引号感知的逗号切分
///
/// 规则:
/// - `"` 切换“引号内”状态，引号内的 `,` 视为普通字符
/// - 字段首尾残留的引号去掉，字段两端去空白
/// - 不处理 `""` 转义（已知限制）
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);

    fields
        .into_iter()
        .map(|field| {
            let trimmed = field.trim();
            let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
            let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
            trimmed.trim().to_string()
        })
        .collect()
}

// ==========================================
// SheetReader Trait
// ==========================================
// 用途: 文件 → RawSheet
pub trait SheetReader: Send + Sync {
    fn read_sheet(&self, file_path: &Path) -> ImportResult<RawSheet>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

// ==========================================
// CSV 文件读取
// ==========================================
pub struct CsvFileReader;

impl SheetReader for CsvFileReader {
    fn read_sheet(&self, file_path: &Path) -> ImportResult<RawSheet> {
        ensure_exists(file_path)?;
        let content = fs::read_to_string(file_path)?;
        // 兼容带 BOM 的 UTF-8 文件
        RawSheet::from_csv_text(content.trim_start_matches('\u{feff}'))
    }
}

// ==========================================
// Excel 文件读取（仅第一个工作表）
// ==========================================
pub struct ExcelFileReader;

impl SheetReader for ExcelFileReader {
    fn read_sheet(&self, file_path: &Path) -> ImportResult<RawSheet> {
        ensure_exists(file_path)?;

        let mut workbook = open_workbook_auto(file_path)?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows().map(|row| {
            row.iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect::<Vec<String>>()
        });

        let headers = rows.next().ok_or(ImportError::EmptyFile)?;

        // 跳过完全空白的行
        let data_rows: Vec<Vec<String>> = rows
            .filter(|row| row.iter().any(|v| !v.is_empty()))
            .collect();

        if data_rows.is_empty() {
            return Err(ImportError::EmptyFile);
        }

        Ok(RawSheet {
            headers,
            rows: data_rows,
        })
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileReader;

impl SheetReader for UniversalFileReader {
    fn read_sheet(&self, file_path: &Path) -> ImportResult<RawSheet> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" | "txt" => CsvFileReader.read_sheet(file_path),
            "xlsx" | "xls" => ExcelFileReader.read_sheet(file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_split_respects_quoted_commas() {
        assert_eq!(split_csv_line(r#"a,"b,c",d"#), vec!["a", "b,c", "d"]);
    }

    #[test]
    fn test_split_trims_fields_and_keeps_empty_trailing() {
        assert_eq!(split_csv_line(" a , b ,"), vec!["a", "b", ""]);
    }

    #[test]
    fn test_split_does_not_unescape_doubled_quotes() {
        // 已知限制: "x""y" 不还原为 x"y
        assert_eq!(split_csv_line(r#""x""y""#), vec!["xy"]);
    }

    #[test]
    fn test_from_csv_text_skips_blank_lines() {
        let sheet = RawSheet::from_csv_text("year,region\n\n2020,Ohio\r\n   \n2021,Ohio\n").unwrap();
        assert_eq!(sheet.headers, vec!["year", "region"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0], vec!["2020", "Ohio"]);
    }

    #[test]
    fn test_from_csv_text_header_only_is_empty() {
        assert!(matches!(
            RawSheet::from_csv_text("year,region\n\n"),
            Err(ImportError::EmptyFile)
        ));
        assert!(matches!(RawSheet::from_csv_text(""), Err(ImportError::EmptyFile)));
    }

    #[test]
    fn test_csv_file_reader_valid_file() {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(temp_file, "\u{feff}Year,Region,Count").unwrap();
        writeln!(temp_file, "2021,\"Cook County, IL\",120").unwrap();

        let sheet = UniversalFileReader.read_sheet(temp_file.path()).unwrap();
        assert_eq!(sheet.headers[0], "Year");
        assert_eq!(sheet.rows[0][1], "Cook County, IL");
    }

    #[test]
    fn test_reader_file_not_found() {
        let result = CsvFileReader.read_sheet(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_reader_rejects_unknown_extension() {
        let result = UniversalFileReader.read_sheet(Path::new("data.parquet"));
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}
