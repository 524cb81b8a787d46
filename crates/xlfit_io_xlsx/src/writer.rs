//! Sheet writer: create a workbook or amend an existing one, then autofit columns.

use std::any::Any;
use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::amend::{AmendSession, write_frame_umya};
use crate::conf::{
    derive_append_width_policy, derive_create_width_policy, derive_default_header_format,
};
use crate::frame::SheetFrame;
use crate::sizer::{SheetHandle, apply_column_widths};
use crate::spec::{
    EnumCellValue, EnumWriteMode, ReportSheetWrite, SpecCellFormat, XlsxWriteError,
};
use crate::util::{
    cast_col_num, cast_row_num, derive_write_error_from_io, validate_frame_shape,
    validate_sheet_name,
};

/// Write `frame` into sheet `sheet_name` of the workbook at `location`.
///
/// A missing file is created (header frozen, widths padded and capped at 50);
/// an existing file is amended, replacing a same-named sheet. Failures never
/// propagate: they are logged and returned as [`ReportSheetWrite::diagnostic`].
pub fn write_in_excel(
    frame: &SheetFrame,
    location: impl AsRef<Path>,
    sheet_name: &str,
    if_include_index: bool,
) -> ReportSheetWrite {
    let path = location.as_ref();
    let result = catch_unwind(AssertUnwindSafe(|| {
        try_write_in_excel(frame, path, sheet_name, if_include_index)
    }))
    .unwrap_or_else(|payload| {
        Err(XlsxWriteError::Panicked(derive_panic_text(
            payload.as_ref(),
        )))
    });
    derive_report_from_result(path, sheet_name, result)
}

/// Same as [`write_in_excel`] but returns typed errors.
pub fn try_write_in_excel(
    frame: &SheetFrame,
    location: impl AsRef<Path>,
    sheet_name: &str,
    if_include_index: bool,
) -> Result<EnumWriteMode, XlsxWriteError> {
    let path = location.as_ref();
    validate_sheet_name(sheet_name)?;
    validate_frame_shape(frame, if_include_index)?;

    if path.is_file() {
        log::debug!("amending {} sheet={sheet_name:?}", path.display());
        write_into_existing_workbook(frame, path, sheet_name, if_include_index)?;
        Ok(EnumWriteMode::Append)
    } else {
        log::debug!("creating {} sheet={sheet_name:?}", path.display());
        write_new_workbook(frame, path, sheet_name, if_include_index)?;
        Ok(EnumWriteMode::Create)
    }
}

fn write_new_workbook(
    frame: &SheetFrame,
    path: &Path,
    sheet_name: &str,
    if_include_index: bool,
) -> Result<(), XlsxWriteError> {
    let fmt_header = derive_rust_xlsx_format(&derive_default_header_format());

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    write_frame_xlsxwriter(worksheet, frame, if_include_index, &fmt_header)?;
    apply_column_widths(
        frame,
        SheetHandle::RustXlsxWriter(&mut *worksheet),
        &derive_create_width_policy(if_include_index),
    )?;
    worksheet.set_freeze_panes(1, 0)?;

    let v_buf = workbook.save_to_buffer()?;
    fs::write(path, v_buf).map_err(|err| derive_write_error_from_io(path, err))
}

fn write_into_existing_workbook(
    frame: &SheetFrame,
    path: &Path,
    sheet_name: &str,
    if_include_index: bool,
) -> Result<(), XlsxWriteError> {
    let mut session = AmendSession::open(path)?;
    let worksheet = session.replace_sheet(sheet_name)?;
    write_frame_umya(worksheet, frame, if_include_index)?;
    apply_column_widths(
        frame,
        SheetHandle::Umya(worksheet),
        &derive_append_width_policy(if_include_index),
    )?;
    session.commit()
}

fn derive_report_from_result(
    path: &Path,
    sheet_name: &str,
    result: Result<EnumWriteMode, XlsxWriteError>,
) -> ReportSheetWrite {
    let mut report = ReportSheetWrite {
        path: path.to_path_buf(),
        sheet_name: sheet_name.to_string(),
        mode: None,
        diagnostic: None,
    };
    match result {
        Ok(mode) => report.mode = Some(mode),
        Err(err) => {
            let c_msg = match &err {
                XlsxWriteError::Locked { .. } => err.to_string(),
                _ => format!(
                    "Failed to write sheet {sheet_name:?} in {}: {err}",
                    path.display()
                ),
            };
            log::error!("{c_msg}");
            report.diagnostic = Some(c_msg);
        }
    }
    report
}

fn derive_panic_text(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic".to_string()
}

fn write_frame_xlsxwriter(
    worksheet: &mut Worksheet,
    frame: &SheetFrame,
    if_include_index: bool,
    fmt_header: &Format,
) -> Result<(), XlsxWriteError> {
    let n_offset = usize::from(if_include_index);

    if if_include_index {
        match frame.index_name() {
            Some(c_name) => {
                worksheet.write_string_with_format(0, 0, c_name, fmt_header)?;
            }
            None => {
                worksheet.write_blank(0, 0, fmt_header)?;
            }
        }
        for (n_idx_row, value) in frame.index_values()?.iter().enumerate() {
            write_cell_with_format(worksheet, n_idx_row + 1, 0, value, Some(fmt_header))?;
        }
    }

    for (n_idx_col, c_name) in frame.column_names().iter().enumerate() {
        worksheet.write_string_with_format(
            0,
            cast_col_num(n_idx_col + n_offset)?,
            c_name,
            fmt_header,
        )?;
        for (n_idx_row, value) in frame.column_values(n_idx_col)?.iter().enumerate() {
            write_cell_with_format(worksheet, n_idx_row + 1, n_idx_col + n_offset, value, None)?;
        }
    }

    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: Option<&Format>,
) -> Result<(), XlsxWriteError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    let fmt_default = Format::new();
    let format = format.unwrap_or(&fmt_default);

    match value {
        EnumCellValue::None => {}
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumCellValue::Boolean(val) => {
            worksheet.write_boolean_with_format(n_row, n_col, *val, format)?;
        }
        EnumCellValue::Integer(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val as f64, format)?;
        }
        EnumCellValue::Float(val) if val.is_finite() => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
        EnumCellValue::Float(val) if val.is_nan() => {}
        EnumCellValue::Float(val) => {
            let c_inf = if val.is_sign_positive() { "inf" } else { "-inf" };
            worksheet.write_string_with_format(n_row, n_col, c_inf, format)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        _ => None,
    }
}
