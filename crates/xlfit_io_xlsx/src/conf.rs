//! XLSX constants and default preset factories.

use crate::spec::{SpecCellFormat, SpecColumnWidthPolicy};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Decimal places assumed for floats when measuring display length.
pub const N_DECIMALS_DEFAULT: u32 = 3;
/// Default extra characters added by the standalone column sizer.
pub const N_WIDTH_MARGIN_DEFAULT: f64 = 3.0;
/// Width cap used when a workbook is created from scratch.
pub const N_WIDTH_MAX_CREATE: f64 = 50.0;
/// Extra space added per column when a workbook is created from scratch.
pub const N_WIDTH_PADDING_CREATE: f64 = 1.0;

/// Width policy for the create-new-file path: margin 0, padding 1, capped at 50.
pub fn derive_create_width_policy(if_include_index: bool) -> SpecColumnWidthPolicy {
    SpecColumnWidthPolicy {
        margin: 0.0,
        width_padding: N_WIDTH_PADDING_CREATE,
        width_max: Some(N_WIDTH_MAX_CREATE),
        if_include_index,
        ..Default::default()
    }
}

/// Width policy for the append-to-existing-file path: margin 0, uncapped.
pub fn derive_append_width_policy(if_include_index: bool) -> SpecColumnWidthPolicy {
    SpecColumnWidthPolicy {
        margin: 0.0,
        if_include_index,
        ..Default::default()
    }
}

/// Header cell format: bold, thin border, centered.
pub fn derive_default_header_format() -> SpecCellFormat {
    SpecCellFormat {
        bold: Some(true),
        border: Some(1),
        align: Some("center".to_string()),
        ..Default::default()
    }
}
