//! Column sizer: fit each column's width to its widest value.

use crate::frame::SheetFrame;
use crate::spec::{
    EnumCellValue, EnumSheetEngine, SpecColumnWidth, SpecColumnWidthPolicy, XlsxWriteError,
};
use crate::util::{cast_col_num, derive_column_letter};
use crate::width::display_length;

/// Worksheet of one of the two supported engines.
pub enum SheetHandle<'a> {
    /// Addressed by 0-based column index.
    RustXlsxWriter(&'a mut rust_xlsxwriter::Worksheet),
    /// Addressed by column letter (`A` is column 0).
    Umya(&'a mut umya_spreadsheet::Worksheet),
}

impl SheetHandle<'_> {
    /// Engine behind this handle.
    pub fn engine(&self) -> EnumSheetEngine {
        match self {
            Self::RustXlsxWriter(_) => EnumSheetEngine::RustXlsxWriter,
            Self::Umya(_) => EnumSheetEngine::Umya,
        }
    }

    /// Set the width of physical column `col_idx` (0-based).
    pub fn set_column_width(&mut self, col_idx: usize, width: f64) -> Result<(), XlsxWriteError> {
        match self {
            Self::RustXlsxWriter(worksheet) => {
                worksheet.set_column_width(cast_col_num(col_idx)?, width)?;
            }
            Self::Umya(worksheet) => {
                worksheet
                    .get_column_dimension_mut(&derive_column_letter(col_idx + 1))
                    .set_width(width);
            }
        }
        Ok(())
    }
}

/// Compute one width per physical column.
///
/// With `if_include_index` the index is column 0 and data columns shift right by one.
pub fn plan_column_widths(
    frame: &SheetFrame,
    policy: &SpecColumnWidthPolicy,
) -> Result<Vec<SpecColumnWidth>, XlsxWriteError> {
    validate_width_policy(policy)?;

    let n_offset = usize::from(policy.if_include_index);
    let mut l_widths = Vec::with_capacity(frame.width() + n_offset);

    if policy.if_include_index {
        let n_len_header = frame
            .index_name()
            .map(|name| {
                display_length(&EnumCellValue::String(name.to_string()), policy.decimals)
            })
            .unwrap_or(0);
        let n_len =
            derive_max_display_length(&frame.index_values()?, n_len_header, policy.decimals);
        l_widths.push(SpecColumnWidth {
            col_idx: 0,
            width: derive_final_width(n_len, policy),
        });
    }

    for (n_idx_col, c_name) in frame.column_names().into_iter().enumerate() {
        let n_len_header = display_length(&EnumCellValue::String(c_name), policy.decimals);
        let n_len = derive_max_display_length(
            &frame.column_values(n_idx_col)?,
            n_len_header,
            policy.decimals,
        );
        l_widths.push(SpecColumnWidth {
            col_idx: n_idx_col + n_offset,
            width: derive_final_width(n_len, policy),
        });
    }

    Ok(l_widths)
}

/// Size every column of `sheet` to fit `frame`. Cell contents are not touched.
pub fn apply_column_widths(
    frame: &SheetFrame,
    mut sheet: SheetHandle<'_>,
    policy: &SpecColumnWidthPolicy,
) -> Result<(), XlsxWriteError> {
    let engine = sheet.engine();
    for spec_width in plan_column_widths(frame, policy)? {
        log::debug!(
            "set column width: engine={engine} col={} width={}",
            spec_width.col_idx,
            spec_width.width
        );
        sheet.set_column_width(spec_width.col_idx, spec_width.width)?;
    }
    Ok(())
}

fn derive_max_display_length(
    values: &[EnumCellValue],
    n_len_header: usize,
    decimals: u32,
) -> usize {
    values
        .iter()
        .map(|value| display_length(value, decimals))
        .fold(n_len_header, usize::max)
}

fn derive_final_width(n_len: usize, policy: &SpecColumnWidthPolicy) -> f64 {
    let n_width = n_len as f64 * policy.length_factor + policy.margin + policy.width_padding;
    match policy.width_max {
        Some(n_max) => n_width.min(n_max),
        None => n_width,
    }
}

fn validate_width_policy(policy: &SpecColumnWidthPolicy) -> Result<(), XlsxWriteError> {
    let invalid = |msg: &str| -> Result<(), XlsxWriteError> {
        Err(XlsxWriteError::InvalidFrame(format!("width policy: {msg}")))
    };
    if !policy.length_factor.is_finite() || policy.length_factor < 0.0 {
        return invalid("length_factor must be finite and >= 0.");
    }
    if !policy.margin.is_finite() || !policy.width_padding.is_finite() {
        return invalid("margin and width_padding must be finite.");
    }
    if let Some(n_max) = policy.width_max
        && (n_max.is_nan() || n_max <= 0.0)
    {
        return invalid("width_max must be > 0.");
    }
    Ok(())
}
