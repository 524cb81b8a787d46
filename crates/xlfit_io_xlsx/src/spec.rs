//! Shared XLSX specification models.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::conf::{N_DECIMALS_DEFAULT, N_WIDTH_MARGIN_DEFAULT};

////////////////////////////////////////////////////////////////////////////////
// #region CellSpecification

/// Normalized cell value during conversion/write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Boolean value.
    Boolean(bool),
    /// Integer value.
    Integer(i64),
    /// Floating-point value.
    Float(f64),
}

/// Cell format subset used for header cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Bold style.
    pub bold: Option<bool>,
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region EngineSpecification

/// Spreadsheet backend used to write a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumSheetEngine {
    /// `rust_xlsxwriter`: create-only, columns addressed by 0-based index.
    RustXlsxWriter,
    /// `umya-spreadsheet`: read/modify/write, columns addressed by letter.
    Umya,
}

impl EnumSheetEngine {
    /// Canonical engine identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RustXlsxWriter => "rust_xlsxwriter",
            Self::Umya => "umya_spreadsheet",
        }
    }
}

impl fmt::Display for EnumSheetEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnumSheetEngine {
    type Err = XlsxWriteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rust_xlsxwriter" | "xlsxwriter" => Ok(Self::RustXlsxWriter),
            "umya_spreadsheet" | "umya-spreadsheet" | "umya" => Ok(Self::Umya),
            _ => Err(XlsxWriteError::UnsupportedEngine(s.to_string())),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnWidthSpecification

/// Column width policy.
///
/// Final width is `display_len * length_factor + margin + width_padding`,
/// capped at `width_max` when set.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecColumnWidthPolicy {
    /// Extra character units beyond the widest value.
    pub margin: f64,
    /// Factor converting character count into column width units.
    pub length_factor: f64,
    /// Decimal places assumed for floats (should match what the sheet displays).
    pub decimals: u32,
    /// Whether the row index is written as the first physical column.
    pub if_include_index: bool,
    /// Extra padding added after margin.
    pub width_padding: f64,
    /// Upper bound for the final width.
    pub width_max: Option<f64>,
}

impl Default for SpecColumnWidthPolicy {
    fn default() -> Self {
        Self {
            margin: N_WIDTH_MARGIN_DEFAULT,
            length_factor: 1.0,
            decimals: N_DECIMALS_DEFAULT,
            if_include_index: true,
            width_padding: 0.0,
            width_max: None,
        }
    }
}

/// One planned column width (physical 0-based column index).
#[derive(Debug, Clone, PartialEq)]
pub struct SpecColumnWidth {
    /// Physical column index in the sheet.
    pub col_idx: usize,
    /// Width in character units.
    pub width: f64,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Procedure selected by the sheet writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumWriteMode {
    /// Target did not exist; a new workbook was created.
    Create,
    /// Target existed; the named sheet was written into it.
    Append,
}

impl EnumWriteMode {
    /// Engine used by this procedure.
    pub fn engine(&self) -> EnumSheetEngine {
        match self {
            Self::Create => EnumSheetEngine::RustXlsxWriter,
            Self::Append => EnumSheetEngine::Umya,
        }
    }
}

/// Outcome of one `write_in_excel` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSheetWrite {
    /// Target workbook path.
    pub path: PathBuf,
    /// Target sheet name.
    pub sheet_name: String,
    /// Procedure that completed, `None` when the write failed.
    pub mode: Option<EnumWriteMode>,
    /// Human-readable failure description.
    pub diagnostic: Option<String>,
}

impl ReportSheetWrite {
    /// Whether the sheet was written.
    pub fn is_ok(&self) -> bool {
        self.diagnostic.is_none()
    }
}

impl fmt::Display for ReportSheetWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.mode, &self.diagnostic) {
            (_, Some(msg)) => write!(f, "[XLSX] failed: {msg}"),
            (Some(mode), None) => write!(
                f,
                "[XLSX] {} sheet={:?} mode={mode:?} engine={}",
                self.path.display(),
                self.sheet_name,
                mode.engine()
            ),
            (None, None) => write!(f, "[XLSX] {} sheet={:?}", self.path.display(), self.sheet_name),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Errors raised while sizing or writing a sheet.
#[derive(Debug, Error)]
pub enum XlsxWriteError {
    /// Unknown spreadsheet engine identifier.
    #[error(
        "Only rust_xlsxwriter and umya_spreadsheet are supported as engines, not {0:?}."
    )]
    UnsupportedEngine(String),
    /// Sheet name rejected by Excel naming rules.
    #[error("Invalid sheet name {name:?}: {reason}")]
    InvalidSheetName {
        /// Offending name.
        name: String,
        /// Rule that was violated.
        reason: String,
    },
    /// Frame shape or index does not fit a worksheet.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
    /// Target is locked by another program or access is denied.
    #[error("Failed to save {} : Try closing any program holding the file open.", path.display())]
    Locked {
        /// Target workbook path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Other IO failure on the target.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// Target workbook path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// `rust_xlsxwriter` failure.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    /// `umya-spreadsheet` failure.
    #[error("xlsx amend error: {0}")]
    Amend(String),
    /// Engine panicked while writing.
    #[error("engine panicked: {0}")]
    Panicked(String),
    /// Failure while reading frame values.
    #[error("Failed to access frame value: {0}")]
    Polars(#[from] polars::error::PolarsError),
    /// Row/column position beyond engine integer range.
    #[error("{axis} index overflow: {value}")]
    IndexOverflow {
        /// `row` or `column`.
        axis: &'static str,
        /// Offending position.
        value: usize,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
