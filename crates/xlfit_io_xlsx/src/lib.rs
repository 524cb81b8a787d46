//! `xlfit_io_xlsx` v1:
//! Write tabular data into XLSX sheets with content-fitted column widths.
//!
//! Module layout:
//! - `conf`   : constants and default presets
//! - `spec`   : specs/models/options/errors
//! - `frame`  : tabular dataset wrapper over polars
//! - `width`  : display-length estimation
//! - `sizer`  : per-column width planning and application
//! - `util`   : pure helper functions
//! - `amend`  : existing-workbook session (`umya-spreadsheet`)
//! - `writer` : create-or-amend entry point (`rust_xlsxwriter` / `umya-spreadsheet`)
pub mod amend;
pub mod conf;
pub mod frame;
pub mod sizer;
pub mod spec;
pub mod util;
pub mod width;
pub mod writer;

pub use amend::AmendSession;
pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, N_WIDTH_MAX_CREATE,
    TUP_EXCEL_ILLEGAL, derive_append_width_policy, derive_create_width_policy,
};
pub use frame::SheetFrame;
pub use sizer::{SheetHandle, apply_column_widths, plan_column_widths};
pub use spec::{
    EnumCellValue, EnumSheetEngine, EnumWriteMode, ReportSheetWrite, SpecCellFormat,
    SpecColumnWidth, SpecColumnWidthPolicy, XlsxWriteError,
};
pub use util::{derive_column_letter, validate_sheet_name};
pub use width::{display_length, display_length_text, render_display_text};
pub use writer::{try_write_in_excel, write_in_excel};
