// ==========================================
// 电动车保有量预测系统 - 导入层
// ==========================================
// 职责: 文件读取、列映射、逐行解析、充电明细聚合
// ==========================================

pub mod aggregator;
pub mod column_mapper;
pub mod csv_normalizer;
pub mod error;
pub mod ev_importer;
pub mod file_parser;
pub mod row_parser;

pub use column_mapper::{ColumnMapper, ColumnMappings};
pub use csv_normalizer::{CsvNormalizer, NormalizedSheet, ParsedRecords};
pub use error::{ImportError, ImportResult};
pub use ev_importer::{EvDataImporter, EvDataImporterImpl, ImportOutcome};
pub use file_parser::{CsvFileReader, ExcelFileReader, RawSheet, SheetReader, UniversalFileReader};
