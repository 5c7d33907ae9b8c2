use anyhow::{Result, anyhow};
use rust_xlsxwriter::{Format, FormatBorder, Workbook};

use crate::services::report::PayrollRow;

pub const PAYROLL_FILENAME: &str = "payroll.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const PAYROLL_HEADERS: [&str; 4] = ["Username", "Week Start", "Hours Worked", "Net Pay"];

const SHEET_NAME: &str = "Payroll";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Renders the weekly payroll rows into an in-memory `.xlsx` workbook.
pub fn payroll_workbook(rows: &[PayrollRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME).map_err(to_anyhow)?;

    let header_format = Format::new().set_bold().set_border(FormatBorder::Thin);
    let money_format = Format::new().set_num_format("0.00");

    for (col, header) in PAYROLL_HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(to_anyhow)?;
    }
    worksheet.set_freeze_panes(1, 0).map_err(to_anyhow)?;

    let mut widths: Vec<usize> = PAYROLL_HEADERS.iter().map(|h| h.len()).collect();

    for (index, row) in rows.iter().enumerate() {
        let r = (index + 1) as u32;
        let week_start = row.week_start.format(DATE_FORMAT).to_string();

        worksheet.write_string(r, 0, &row.username).map_err(to_anyhow)?;
        worksheet.write_string(r, 1, &week_start).map_err(to_anyhow)?;
        worksheet
            .write_number_with_format(r, 2, row.hours_worked, &money_format)
            .map_err(to_anyhow)?;
        worksheet
            .write_number_with_format(r, 3, row.net_pay, &money_format)
            .map_err(to_anyhow)?;

        widths[0] = widths[0].max(row.username.chars().count());
        widths[1] = widths[1].max(week_start.len());
    }

    for (col, width) in widths.iter().enumerate() {
        worksheet
            .set_column_width(col as u16, *width as f64 + 2.0)
            .map_err(to_anyhow)?;
    }

    workbook.save_to_buffer().map_err(to_anyhow)
}

fn to_anyhow<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("Spreadsheet export failed: {}", e)
}
