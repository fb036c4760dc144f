//! Workbook export: field selection, sheet rendering and orchestration

pub mod config;
pub mod fields;
pub mod pipeline;
pub mod workbook;

pub use config::ExportConfig;
pub use fields::{parse_selection, CellValue, Field};
pub use pipeline::{ExportPipeline, ExportReport};
pub use workbook::ExportWorkbook;
