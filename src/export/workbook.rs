//! Spreadsheet rendering of movie sections and show completion

use super::fields::{CellValue, Field};
use crate::completion::{BatchOutcome, Completion, CompletionResult, Expected};
use crate::model::Show;
use chrono::NaiveDateTime;
use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, Table, TableColumn, Workbook, Worksheet, XlsxError,
};
use std::collections::HashSet;
use std::path::Path;

/// Header of the per-show series summary column
pub const SERIES_HEADER: &str = "Series Complete (Plex/TVMaze)";

const MAX_SHEET_NAME: usize = 31;
const WRAPPED_WIDTH: f64 = 60.0;
const INVALID_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Background colours used by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Complete season or series
    Green,
    /// Incomplete season or series
    Red,
    /// Season the catalog does not know
    Gray,
    /// Owned but unverifiable, or a low resolution movie
    Yellow,
    /// 4K movie
    DarkGreen,
    /// 1080p movie
    White,
}

impl Fill {
    pub fn rgb(self) -> u32 {
        match self {
            Fill::Green => 0x90EE90,
            Fill::Red => 0xFFB6B6,
            Fill::Gray => 0xD3D3D3,
            Fill::Yellow => 0xFFFFCC,
            Fill::DarkGreen => 0x77B190,
            Fill::White => 0xFFFFFF,
        }
    }
}

/// Rendered text and fill of a status cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCell {
    pub text: String,
    pub fill: Option<Fill>,
}

impl StatusCell {
    fn new(text: impl Into<String>, fill: Option<Fill>) -> Self {
        Self {
            text: text.into(),
            fill,
        }
    }
}

/// Cell for one season column of a show row
pub fn season_cell(result: &CompletionResult, index: u32) -> StatusCell {
    let Some(season) = result.season(index) else {
        let fill = result.has_catalog_data().then_some(Fill::Gray);
        return StatusCell::new("", fill);
    };

    let observed = season.observed;
    let text = match season.expected.count() {
        Some(expected) => format!("{}/{}", observed, expected),
        None if observed > 0 || season.expected == Expected::NotInCatalog => {
            format!("{}/?", observed)
        }
        None => String::new(),
    };

    let fill = match season.classify() {
        Completion::Complete => Some(Fill::Green),
        Completion::Incomplete => Some(Fill::Red),
        Completion::NonexistentExternally => Some(Fill::Gray),
        Completion::Unknown => (observed > 0).then_some(Fill::Yellow),
    };
    StatusCell::new(text, fill)
}

/// Cell for the series summary column
///
/// Counts regular seasons only; specials never affect the summary.
pub fn series_cell(result: &CompletionResult) -> StatusCell {
    if !result.has_catalog_data() {
        let owned = result.owned_regular_seasons();
        let fill = (owned > 0).then_some(Fill::Yellow);
        return StatusCell::new(format!("{}/?", owned), fill);
    }

    let total = result.catalog_regular_seasons();
    let complete = result.complete_regular_seasons();
    let fill = if total == 0 {
        Fill::Gray
    } else if complete >= total {
        Fill::Green
    } else {
        Fill::Red
    };
    StatusCell::new(format!("{}/{}", complete, total), Some(fill))
}

/// Season indices that get a column: S00 only when some show owns specials
pub fn season_columns(shows: &[&Show], max_season_index: u32) -> Vec<u32> {
    let has_specials = shows.iter().any(|s| s.seasons.contains_key(&0));
    let first = if has_specials { 0 } else { 1 };
    (first..=max_season_index).collect()
}

pub fn season_header(index: u32) -> String {
    format!("S{:02}", index)
}

/// Row fill for a movie by its video resolution
pub fn resolution_fill(resolution: &str) -> Option<Fill> {
    match resolution.trim().to_lowercase().as_str() {
        "4k" | "uhd" | "2160p" => Some(Fill::DarkGreen),
        "1080" | "1080p" => Some(Fill::White),
        "720" | "720p" | "sd" | "480" | "480p" | "576" | "576p" | "dvd" | "pal" | "ntsc" => {
            Some(Fill::Yellow)
        }
        _ => None,
    }
}

/// Worksheet name for a section, unique among `used`
pub fn sheet_name(title: &str, used: &HashSet<String>) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !INVALID_SHEET_CHARS.contains(c))
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'');
    let base: String = if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned.chars().take(MAX_SHEET_NAME).collect()
    };

    let mut candidate = base.clone();
    let mut n = 2;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!(" ({})", n);
        let keep = MAX_SHEET_NAME - suffix.len();
        candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        n += 1;
    }
    candidate
}

/// File name of an export started at `now`
pub fn output_file_name(now: NaiveDateTime) -> String {
    format!("PlexMediaExport_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

/// Workbook with one worksheet per library section
pub struct ExportWorkbook {
    workbook: Workbook,
    used_names: HashSet<String>,
    sheet_names: Vec<String>,
}

impl Default for ExportWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportWorkbook {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            used_names: HashSet::new(),
            sheet_names: Vec::new(),
        }
    }

    /// Names of the worksheets added so far
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    fn add_sheet(&mut self, title: &str) -> Result<&mut Worksheet, XlsxError> {
        let name = sheet_name(title, &self.used_names);
        self.used_names.insert(name.to_lowercase());
        self.sheet_names.push(name.clone());

        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&name)?;
        Ok(worksheet)
    }

    /// Add a movie section; `rows` are already sorted and match `fields`
    pub fn add_movie_sheet(
        &mut self,
        title: &str,
        fields: &[Field],
        rows: &[Vec<CellValue>],
    ) -> Result<(), XlsxError> {
        let headers: Vec<String> = fields.iter().map(|f| f.name().to_string()).collect();
        let resolution_col = fields.iter().position(|f| *f == Field::VideoResolution);

        let worksheet = self.add_sheet(title)?;
        write_header(worksheet, &headers)?;

        for (i, row) in rows.iter().enumerate() {
            let row_num = i as u32 + 1;
            let fill = resolution_col
                .and_then(|col| row.get(col))
                .and_then(|value| match value {
                    CellValue::Text(text) => resolution_fill(text),
                    CellValue::Number(n) => resolution_fill(&n.to_string()),
                });

            for (col, (field, value)) in fields.iter().zip(row).enumerate() {
                let format = cell_format(*field, fill);
                write_value(worksheet, row_num, col as u16, value, &format)?;
            }
        }

        finish_sheet(worksheet, &headers, rows.len(), fields)
    }

    /// Add a show section with completion columns
    ///
    /// `shows` and `outcome.results` are parallel and already sorted.
    pub fn add_show_sheet(
        &mut self,
        title: &str,
        fields: &[Field],
        shows: &[&Show],
        outcome: &BatchOutcome,
    ) -> Result<(), XlsxError> {
        let seasons = season_columns(shows, outcome.max_season_index);
        let mut headers: Vec<String> = fields.iter().map(|f| f.name().to_string()).collect();
        headers.push(SERIES_HEADER.to_string());
        headers.extend(seasons.iter().map(|&i| season_header(i)));

        let worksheet = self.add_sheet(title)?;
        write_header(worksheet, &headers)?;

        for (i, (show, result)) in shows.iter().zip(&outcome.results).enumerate() {
            let row_num = i as u32 + 1;

            for (col, field) in fields.iter().enumerate() {
                let value = field.show_value(show);
                write_value(worksheet, row_num, col as u16, &value, &cell_format(*field, None))?;
            }

            let mut col = fields.len() as u16;
            write_status(worksheet, row_num, col, &series_cell(result))?;

            for &index in &seasons {
                col += 1;
                write_status(worksheet, row_num, col, &season_cell(result, index))?;
            }
        }

        finish_sheet(worksheet, &headers, shows.len(), fields)
    }

    pub fn save(&mut self, path: &Path) -> Result<(), XlsxError> {
        self.workbook.save(path)
    }
}

fn bordered() -> Format {
    Format::new().set_border(FormatBorder::Thin)
}

fn with_fill(format: Format, fill: Option<Fill>) -> Format {
    match fill {
        Some(fill) => format.set_background_color(Color::RGB(fill.rgb())),
        None => format,
    }
}

fn cell_format(field: Field, fill: Option<Fill>) -> Format {
    let format = match field {
        f if f.is_wrapped() => bordered().set_text_wrap().set_align(FormatAlign::Top),
        Field::Title | Field::Studio => bordered().set_align(FormatAlign::Left),
        _ => bordered().set_align(FormatAlign::Center),
    };
    with_fill(format, fill)
}

fn write_header(worksheet: &mut Worksheet, headers: &[String]) -> Result<(), XlsxError> {
    let format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_border_bottom(FormatBorder::Medium);

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &format)?;
    }
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_value(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: &Format,
) -> Result<(), XlsxError> {
    match value {
        CellValue::Text(text) => worksheet.write_string_with_format(row, col, text, format)?,
        CellValue::Number(n) => worksheet.write_number_with_format(row, col, *n, format)?,
    };
    Ok(())
}

fn write_status(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &StatusCell,
) -> Result<(), XlsxError> {
    let format = with_fill(bordered().set_align(FormatAlign::Center), cell.fill);
    worksheet.write_string_with_format(row, col, &cell.text, &format)?;
    Ok(())
}

/// Table, column widths; an empty sheet keeps its header only
fn finish_sheet(
    worksheet: &mut Worksheet,
    headers: &[String],
    rows: usize,
    fields: &[Field],
) -> Result<(), XlsxError> {
    if rows > 0 && !headers.is_empty() {
        let columns: Vec<TableColumn> = headers
            .iter()
            .map(|h| TableColumn::new().set_header(h))
            .collect();
        let table = Table::new().set_columns(&columns);
        worksheet.add_table(0, 0, rows as u32, headers.len() as u16 - 1, &table)?;
    }

    worksheet.autofit();
    for (col, field) in fields.iter().enumerate() {
        if field.is_wrapped() {
            worksheet.set_column_width(col as u16, WRAPPED_WIDTH)?;
        }
    }
    Ok(())
}
