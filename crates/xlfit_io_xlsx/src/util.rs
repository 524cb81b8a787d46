//! Stateless helper utilities used by the sizer and writers.

use std::io;
use std::path::Path;

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::frame::SheetFrame;
use crate::spec::XlsxWriteError;

////////////////////////////////////////////////////////////////////////////////
// #region InputGuards

/// Check `name` against Excel sheet naming rules without rewriting it.
pub fn validate_sheet_name(name: &str) -> Result<(), XlsxWriteError> {
    let invalid = |reason: String| XlsxWriteError::InvalidSheetName {
        name: name.to_string(),
        reason,
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty".to_string()));
    }
    let n_len = name.chars().count();
    if n_len > N_LEN_EXCEL_SHEET_NAME_MAX {
        return Err(invalid(format!(
            "{n_len} chars exceeds the {N_LEN_EXCEL_SHEET_NAME_MAX}-char limit"
        )));
    }
    if let Some(c_illegal) = TUP_EXCEL_ILLEGAL.iter().find(|c| name.contains(**c)) {
        return Err(invalid(format!("contains illegal character {c_illegal:?}")));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(invalid("must not start or end with an apostrophe".to_string()));
    }
    Ok(())
}

/// Reject frames that cannot fit in one worksheet (header row and index column included).
pub fn validate_frame_shape(
    frame: &SheetFrame,
    if_include_index: bool,
) -> Result<(), XlsxWriteError> {
    let n_rows = frame.height() + 1;
    if n_rows > N_NROWS_EXCEL_MAX {
        return Err(XlsxWriteError::InvalidFrame(format!(
            "{n_rows} rows (header included) exceeds Excel limit {N_NROWS_EXCEL_MAX}"
        )));
    }
    let n_cols = frame.width() + usize::from(if_include_index);
    if n_cols > N_NCOLS_EXCEL_MAX {
        return Err(XlsxWriteError::InvalidFrame(format!(
            "{n_cols} columns (index included) exceeds Excel limit {N_NCOLS_EXCEL_MAX}"
        )));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Addressing

/// Spreadsheet column label for a 1-based column number (`1 -> A`, `27 -> AA`).
pub fn derive_column_letter(col_num_1based: usize) -> String {
    let mut n_rest = col_num_1based;
    let mut l_chars = Vec::new();
    while n_rest > 0 {
        let n_rem = (n_rest - 1) % 26;
        l_chars.push((b'A' + n_rem as u8) as char);
        n_rest = (n_rest - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

pub(crate) fn cast_row_num(value: usize) -> Result<u32, XlsxWriteError> {
    u32::try_from(value).map_err(|_| XlsxWriteError::IndexOverflow { axis: "row", value })
}

pub(crate) fn cast_col_num(value: usize) -> Result<u16, XlsxWriteError> {
    u16::try_from(value).map_err(|_| XlsxWriteError::IndexOverflow {
        axis: "column",
        value,
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region IoErrors

/// Whether an IO error means the file is held open elsewhere or access is denied.
pub fn is_io_error_locked(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}

/// Classify an IO error on the target workbook.
pub fn derive_write_error_from_io(path: &Path, err: io::Error) -> XlsxWriteError {
    if is_io_error_locked(&err) {
        XlsxWriteError::Locked {
            path: path.to_path_buf(),
            source: err,
        }
    } else {
        XlsxWriteError::Io {
            path: path.to_path_buf(),
            source: err,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::*;

    #[test]
    fn test_derive_column_letter() {
        assert_eq!(derive_column_letter(1), "A");
        assert_eq!(derive_column_letter(26), "Z");
        assert_eq!(derive_column_letter(27), "AA");
        assert_eq!(derive_column_letter(52), "AZ");
        assert_eq!(derive_column_letter(703), "AAA");
        assert_eq!(derive_column_letter(16_384), "XFD");
    }

    #[test]
    fn test_validate_sheet_name() {
        assert!(validate_sheet_name("S").is_ok());
        assert!(validate_sheet_name("Quarterly report 2024").is_ok());
        assert!(validate_sheet_name("").is_err());
        assert!(validate_sheet_name("a/b").is_err());
        assert!(validate_sheet_name("[x]").is_err());
        assert!(validate_sheet_name("'quoted'").is_err());
        assert!(validate_sheet_name(&"x".repeat(31)).is_ok());
        assert!(validate_sheet_name(&"x".repeat(32)).is_err());
    }

    #[test]
    fn test_validate_frame_shape_counts_index_column() {
        let frame = SheetFrame::new(df!("a" => [1i64]).unwrap());
        assert!(validate_frame_shape(&frame, true).is_ok());
        assert!(validate_frame_shape(&frame, false).is_ok());
    }

    #[test]
    fn test_permission_denied_is_locked() {
        let err = derive_write_error_from_io(
            Path::new("out.xlsx"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, XlsxWriteError::Locked { .. }));
        assert!(err.to_string().contains("out.xlsx"));

        let err = derive_write_error_from_io(
            Path::new("out.xlsx"),
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert!(matches!(err, XlsxWriteError::Io { .. }));
    }
}
