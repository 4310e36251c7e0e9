use rust_xlsxwriter::{Format, Workbook};

use crate::error::AppError;
use crate::table::{JobTable, COLUMNS};

pub const SHEET_NAME: &str = "Vagas";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Longest string a single XLSX cell accepts.
const MAX_CELL_CHARS: usize = 32_767;

/// Serialises the table into a single-sheet workbook with a bold header row.
pub fn to_xlsx(table: &JobTable) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME).map_err(xlsx_error)?;

    for (col, title) in COLUMNS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *title, &header)
            .map_err(xlsx_error)?;
    }

    for (index, row) in table.rows.iter().enumerate() {
        let line = index as u32 + 1;
        for (col, cell) in row.cells().iter().enumerate() {
            worksheet
                .write_string(line, col as u16, fit_cell(cell))
                .map_err(xlsx_error)?;
        }
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

pub fn to_csv(table: &JobTable) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS).map_err(csv_error)?;
    for row in &table.rows {
        writer.write_record(row.cells()).map_err(csv_error)?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Export(format!("CSV flush failed: {e}")))
}

fn fit_cell(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

fn xlsx_error(e: rust_xlsxwriter::XlsxError) -> AppError {
    AppError::Export(format!("XLSX: {e}"))
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::Export(format!("CSV: {e}"))
}
