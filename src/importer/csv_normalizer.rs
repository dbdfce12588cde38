// ==========================================
// 电动车保有量预测系统 - 表格规范化
// ==========================================
// 职责: RawSheet → {type, data, preview, warnings, rowCount}
// 流程:
// 1. 表头规范化（trim + 小写）→ 列映射
// 2. 判定表格形态
// 3. 逐行解析（上限 max_rows），行错误记告警后跳过
// 4. 零有效行 → 批次失败
// ==========================================

use crate::config::engine_config::ImportSettings;
use crate::domain::ev_stat::{ChargingEventRecord, HistoricalRecord};
use crate::domain::field::{SemanticField, SheetType};
use crate::importer::column_mapper::{ColumnMapper, ColumnMappings};
use crate::importer::error::{ImportError, ImportResult, RowError};
use crate::importer::file_parser::RawSheet;
use crate::importer::row_parser::{parse_charging_row, parse_ev_stat_row, RowContext};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use tracing::{debug, warn};

// ==========================================
// ParsedRecords - 解析结果（按表格形态）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRecords {
    EvStats(Vec<HistoricalRecord>),
    ChargingPatterns(Vec<ChargingEventRecord>),
    Unrecognized,
}

impl ParsedRecords {
    pub fn len(&self) -> usize {
        match self {
            ParsedRecords::EvStats(records) => records.len(),
            ParsedRecords::ChargingPatterns(records) => records.len(),
            ParsedRecords::Unrecognized => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// 对外协议中 data 恒为数组
impl Serialize for ParsedRecords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParsedRecords::EvStats(records) => records.serialize(serializer),
            ParsedRecords::ChargingPatterns(records) => records.serialize(serializer),
            ParsedRecords::Unrecognized => serializer.collect_seq(std::iter::empty::<()>()),
        }
    }
}

// ==========================================
// PreviewRow - 预览行（保持表头顺序）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewRow(Vec<(String, String)>);

impl PreviewRow {
    /// 缺失值补空串；重复表头保留首次出现的位置，取后者的值
    fn from_raw(headers: &[String], values: &[String]) -> Self {
        let mut cells: Vec<(String, String)> = Vec::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            let value = values.get(i).cloned().unwrap_or_default();
            match cells.iter_mut().find(|(name, _)| name == header) {
                Some(cell) => cell.1 = value,
                None => cells.push((header.clone(), value)),
            }
        }
        Self(cells)
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == header)
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for PreviewRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ==========================================
// NormalizedSheet - 规范化结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSheet {
    #[serde(rename = "type")]
    pub sheet_type: SheetType,
    pub data: ParsedRecords,
    pub preview: Vec<PreviewRow>,
    pub warnings: Vec<String>, // 仅保留前 max_surfaced_warnings 条
    pub row_count: usize,
    #[serde(skip)]
    pub total_warnings: usize,
    #[serde(skip)]
    pub mappings: ColumnMappings,
}

/// 判定表格形态
pub fn classify_sheet(mappings: &ColumnMappings) -> SheetType {
    use SemanticField::*;

    let is_ev_stats = mappings.contains_all(&[Year, Region])
        && (mappings.contains(EvType) || mappings.contains(Count));
    if is_ev_stats {
        return SheetType::EvStats;
    }

    let is_charging = mappings.contains_all(&[Region, EnergyConsumedKwh])
        && (mappings.contains(VehicleModel) || mappings.contains(ChargingStartTime));
    if is_charging {
        return SheetType::ChargingPatterns;
    }

    SheetType::Unknown
}

// ==========================================
// CsvNormalizer
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CsvNormalizer {
    mapper: ColumnMapper,
    settings: ImportSettings,
}

impl CsvNormalizer {
    pub fn new(settings: ImportSettings) -> Self {
        Self {
            mapper: ColumnMapper::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// 规范化 CSV 文本
    pub fn normalize_text(&self, content: &str, now: DateTime<Utc>) -> ImportResult<NormalizedSheet> {
        let sheet = RawSheet::from_csv_text(content)?;
        self.normalize(&sheet, now)
    }

    /// 规范化原始表格
    ///
    /// # 参数
    /// - sheet: 原始表格（表头未规范化）
    /// - now: 充电开始时间缺失时的替代时间
    ///
    /// # 返回
    /// - Ok: 形态可能为 Unknown（data 为空），由调用方决定是否拒绝
    /// - Err(NoValidRows): 形态已识别但无任何有效行
    pub fn normalize(&self, sheet: &RawSheet, now: DateTime<Utc>) -> ImportResult<NormalizedSheet> {
        let headers: Vec<String> = sheet
            .headers
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let mappings = self.mapper.detect(&headers);
        let sheet_type = classify_sheet(&mappings);
        debug!(
            sheet_type = %sheet_type,
            mapped_fields = mappings.len(),
            "列映射完成"
        );

        let row_maps: Vec<HashMap<String, String>> = sheet
            .rows
            .iter()
            .take(self.settings.max_rows)
            .map(|values| build_row_map(&headers, values))
            .collect();

        let preview: Vec<PreviewRow> = sheet
            .rows
            .iter()
            .take(self.settings.preview_rows.min(self.settings.max_rows))
            .map(|values| PreviewRow::from_raw(&headers, values))
            .collect();

        if sheet.rows.len() > self.settings.max_rows {
            warn!(
                total_rows = sheet.rows.len(),
                max_rows = self.settings.max_rows,
                "数据行超出上限，超出部分不处理"
            );
        }

        let mut warnings = Vec::new();
        let data = match sheet_type {
            SheetType::EvStats => {
                ParsedRecords::EvStats(collect_rows(&row_maps, &mappings, &mut warnings, |ctx| {
                    parse_ev_stat_row(ctx, &self.settings)
                }))
            }
            SheetType::ChargingPatterns => ParsedRecords::ChargingPatterns(collect_rows(
                &row_maps,
                &mappings,
                &mut warnings,
                |ctx| parse_charging_row(ctx, now),
            )),
            SheetType::Unknown => ParsedRecords::Unrecognized,
        };

        let total_warnings = warnings.len();
        if total_warnings > 0 {
            debug!(total_warnings, "行级告警");
        }
        warnings.truncate(self.settings.max_surfaced_warnings);

        if sheet_type != SheetType::Unknown && data.is_empty() {
            return Err(ImportError::NoValidRows { warnings });
        }

        Ok(NormalizedSheet {
            sheet_type,
            row_count: data.len(),
            data,
            preview,
            warnings,
            total_warnings,
            mappings,
        })
    }
}

/// 表头 → 原始值（缺失值补空串，多余值忽略，重复表头后者覆盖前者）
fn build_row_map(headers: &[String], values: &[String]) -> HashMap<String, String> {
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| (header.clone(), values.get(i).cloned().unwrap_or_default()))
        .collect()
}

/// 逐行解析；行错误转为 "Row <n>: <message>" 告警（n 为 1 起的数据行号）
fn collect_rows<T, F>(
    row_maps: &[HashMap<String, String>],
    mappings: &ColumnMappings,
    warnings: &mut Vec<String>,
    parse: F,
) -> Vec<T>
where
    F: Fn(&RowContext<'_>) -> Result<Option<T>, RowError>,
{
    let mut records = Vec::with_capacity(row_maps.len());
    for (index, row) in row_maps.iter().enumerate() {
        let ctx = RowContext::new(row, mappings);
        match parse(&ctx) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(err) => warnings.push(err.to_warning(index + 1)),
        }
    }
    records
}
