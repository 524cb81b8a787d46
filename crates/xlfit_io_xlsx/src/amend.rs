//! Amend an existing workbook with `umya-spreadsheet`.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::frame::SheetFrame;
use crate::spec::{EnumCellValue, XlsxWriteError};
use crate::util::{cast_col_num, cast_row_num, derive_write_error_from_io};

/// Open workbook bound to its file handle.
///
/// The handle is held from [`Self::open`] until the session is dropped, on
/// success and error paths alike. Nothing reaches disk before [`Self::commit`],
/// and the target is only ever replaced by a fully written sibling file.
pub struct AmendSession {
    path: PathBuf,
    file: File,
    book: Spreadsheet,
}

impl AmendSession {
    /// Open `path` for read/write and load every sheet.
    pub fn open(path: &Path) -> Result<Self, XlsxWriteError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|err| derive_write_error_from_io(path, err))?;
        let book = umya_spreadsheet::reader::xlsx::read_reader(&mut file, true).map_err(|err| {
            XlsxWriteError::Amend(format!("failed to read {}: {err}", path.display()))
        })?;
        log::debug!("amend session opened: {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file,
            book,
        })
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|worksheet| worksheet.get_name().to_string())
            .collect()
    }

    /// Return an empty sheet named `sheet_name`.
    ///
    /// An existing sheet of that name is dropped and its replacement takes the
    /// same position; a new name is appended after the last sheet.
    pub fn replace_sheet(&mut self, sheet_name: &str) -> Result<&mut Worksheet, XlsxWriteError> {
        let n_idx_old = self
            .book
            .get_sheet_collection_no_check()
            .iter()
            .position(|worksheet| worksheet.get_name() == sheet_name);
        if let Some(n_idx) = n_idx_old {
            self.book
                .remove_sheet(n_idx)
                .map_err(|err| derive_amend_error(sheet_name, err))?;
        }
        self.book
            .new_sheet(sheet_name)
            .map_err(|err| derive_amend_error(sheet_name, err))?;

        // umya renumbers sheetId by position on write.
        let l_sheets = self.book.get_sheet_collection_mut();
        let n_idx = n_idx_old.unwrap_or(l_sheets.len() - 1);
        l_sheets[n_idx..].rotate_right(1);
        Ok(&mut l_sheets[n_idx])
    }

    /// Serialize the workbook and replace the target file.
    ///
    /// The bytes go to a temp file next to the target, which is synced and then
    /// renamed over it. A failure at any step leaves the original untouched.
    pub fn commit(self) -> Result<(), XlsxWriteError> {
        let io_err = |err| derive_write_error_from_io(&self.path, err);
        let dir_parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir_parent).map_err(io_err)?;
        umya_spreadsheet::writer::xlsx::write_writer(&self.book, tmp.as_file_mut()).map_err(|err| {
            XlsxWriteError::Amend(format!("failed to serialize {}: {err}", self.path.display()))
        })?;
        tmp.as_file_mut().flush().map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;

        let permissions = self.file.metadata().map_err(io_err)?.permissions();
        tmp.as_file().set_permissions(permissions).map_err(io_err)?;
        tmp.persist(&self.path).map_err(|err| io_err(err.error))?;
        log::debug!("amend session committed: {}", self.path.display());
        Ok(())
    }
}

impl Drop for AmendSession {
    fn drop(&mut self) {
        log::debug!("amend session released: {}", self.path.display());
    }
}

/// Write header row and values of `frame` into an empty `worksheet`.
pub(crate) fn write_frame_umya(
    worksheet: &mut Worksheet,
    frame: &SheetFrame,
    if_include_index: bool,
) -> Result<(), XlsxWriteError> {
    let n_offset = usize::from(if_include_index);

    if if_include_index {
        if let Some(c_name) = frame.index_name() {
            write_header_cell(worksheet, 0, c_name)?;
        }
        for (n_idx_row, value) in frame.index_values()?.iter().enumerate() {
            write_cell(worksheet, n_idx_row + 1, 0, value)?;
            let coordinate = derive_coordinate(n_idx_row + 1, 0)?;
            worksheet
                .get_cell_mut(coordinate)
                .get_style_mut()
                .get_font_mut()
                .set_bold(true);
        }
    }

    for (n_idx_col, c_name) in frame.column_names().iter().enumerate() {
        write_header_cell(worksheet, n_idx_col + n_offset, c_name)?;
        for (n_idx_row, value) in frame.column_values(n_idx_col)?.iter().enumerate() {
            write_cell(worksheet, n_idx_row + 1, n_idx_col + n_offset, value)?;
        }
    }
    Ok(())
}

fn write_header_cell(
    worksheet: &mut Worksheet,
    col_idx: usize,
    text: &str,
) -> Result<(), XlsxWriteError> {
    let cell = worksheet.get_cell_mut(derive_coordinate(0, col_idx)?);
    cell.set_value_string(text);
    cell.get_style_mut().get_font_mut().set_bold(true);
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
) -> Result<(), XlsxWriteError> {
    let coordinate = derive_coordinate(row_idx, col_idx)?;
    match value {
        EnumCellValue::None => {}
        EnumCellValue::String(s) => {
            worksheet.get_cell_mut(coordinate).set_value_string(s.as_str());
        }
        EnumCellValue::Boolean(b) => {
            worksheet.get_cell_mut(coordinate).set_value_bool(*b);
        }
        EnumCellValue::Integer(n) => {
            worksheet.get_cell_mut(coordinate).set_value_number(*n as f64);
        }
        EnumCellValue::Float(x) if x.is_finite() => {
            worksheet.get_cell_mut(coordinate).set_value_number(*x);
        }
        EnumCellValue::Float(x) if x.is_nan() => {}
        EnumCellValue::Float(x) => {
            let c_inf = if x.is_sign_positive() { "inf" } else { "-inf" };
            worksheet.get_cell_mut(coordinate).set_value_string(c_inf);
        }
    }
    Ok(())
}

/// 0-based `(row, col)` to umya's 1-based `(col, row)`.
fn derive_coordinate(row_idx: usize, col_idx: usize) -> Result<(u32, u32), XlsxWriteError> {
    let n_col = u32::from(cast_col_num(col_idx + 1)?);
    let n_row = cast_row_num(row_idx + 1)?;
    Ok((n_col, n_row))
}

fn derive_amend_error(sheet_name: &str, err: impl std::fmt::Display) -> XlsxWriteError {
    XlsxWriteError::Amend(format!("sheet {sheet_name:?}: {err}"))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use polars::prelude::*;

    use super::*;

    fn create_workbook(path: &Path, sheets: &[&str]) {
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        for c_name in sheets {
            let worksheet = book.new_sheet(*c_name).unwrap();
            worksheet.get_cell_mut((1, 1)).set_value_string(format!("old {c_name}"));
        }
        umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
    }

    #[test]
    fn test_replace_existing_sheet_keeps_others() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("book.xlsx");
        create_workbook(&path, &["Keep", "S"]);

        let frame = SheetFrame::new(df!("Name" => ["Al", "Bob"]).unwrap());
        let mut session = AmendSession::open(&path).unwrap();
        let worksheet = session.replace_sheet("S").unwrap();
        write_frame_umya(worksheet, &frame, false).unwrap();
        session.commit().unwrap();

        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let mut l_names: Vec<String> = book
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .collect();
        l_names.sort();
        assert_eq!(l_names, vec!["Keep", "S"]);

        let keep = book.get_sheet_by_name("Keep").unwrap();
        assert_eq!(keep.get_value((1, 1)), "old Keep");

        let sheet = book.get_sheet_by_name("S").unwrap();
        assert_eq!(sheet.get_value((1, 1)), "Name");
        assert_eq!(sheet.get_value((1, 2)), "Al");
        assert_eq!(sheet.get_value((1, 3)), "Bob");
    }

    #[test]
    fn test_replaced_sheet_keeps_its_position() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("book.xlsx");
        create_workbook(&path, &["A", "S", "Z"]);

        let mut session = AmendSession::open(&path).unwrap();
        let worksheet = session.replace_sheet("S").unwrap();
        assert_eq!(worksheet.get_name(), "S");
        worksheet.get_cell_mut((1, 1)).set_value_string("new S");
        assert_eq!(session.sheet_names(), vec!["A", "S", "Z"]);
        session.commit().unwrap();

        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let l_names: Vec<String> = book
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .collect();
        assert_eq!(l_names, vec!["A", "S", "Z"]);
        assert_eq!(book.get_sheet_by_name("S").unwrap().get_value((1, 1)), "new S");
        assert_eq!(book.get_sheet_by_name("Z").unwrap().get_value((1, 1)), "old Z");

        let mut session = AmendSession::open(&path).unwrap();
        session.replace_sheet("A").unwrap();
        assert_eq!(session.sheet_names(), vec!["A", "S", "Z"]);
    }

    #[test]
    fn test_commit_replaces_file_without_leftovers() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("book.xlsx");
        create_workbook(&path, &["S"]);

        let mut session = AmendSession::open(&path).unwrap();
        session.replace_sheet("T").unwrap();
        session.commit().unwrap();

        let l_entries: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(l_entries, vec![std::ffi::OsString::from("book.xlsx")]);
        assert_eq!(
            AmendSession::open(&path).unwrap().sheet_names(),
            vec!["S", "T"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_commit_keeps_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("book.xlsx");
        create_workbook(&path, &["S"]);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let mut session = AmendSession::open(&path).unwrap();
        session.replace_sheet("S").unwrap();
        session.commit().unwrap();

        let n_mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(n_mode & 0o777, 0o644);
    }

    #[test]
    fn test_new_sheet_is_added() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("book.xlsx");
        create_workbook(&path, &["First"]);

        let mut session = AmendSession::open(&path).unwrap();
        session.replace_sheet("Second").unwrap();
        assert_eq!(session.sheet_names(), vec!["First", "Second"]);
        session.commit().unwrap();

        let session = AmendSession::open(&path).unwrap();
        assert_eq!(session.sheet_names(), vec!["First", "Second"]);
    }

    #[test]
    fn test_dropped_session_leaves_file_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("book.xlsx");
        create_workbook(&path, &["S"]);
        let v_before = std::fs::read(&path).unwrap();

        {
            let mut session = AmendSession::open(&path).unwrap();
            session.replace_sheet("S").unwrap();
        }

        assert_eq!(std::fs::read(&path).unwrap(), v_before);
    }

    #[test]
    fn test_open_rejects_non_workbook() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plain.xlsx");
        std::fs::write(&path, b"not a zip").unwrap();

        assert!(matches!(
            AmendSession::open(&path),
            Err(XlsxWriteError::Amend(_))
        ));
    }

    #[test]
    fn test_write_frame_with_index() {
        let frame = SheetFrame::new(df!("v" => [Some(1.5f64), None, Some(f64::INFINITY)]).unwrap())
            .with_index(Series::new("key".into(), &["a", "b", "c"]))
            .unwrap();
        let mut book = umya_spreadsheet::new_file();
        let worksheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        write_frame_umya(worksheet, &frame, true).unwrap();

        assert_eq!(worksheet.get_value("A1"), "key");
        assert_eq!(worksheet.get_value("B1"), "v");
        assert_eq!(worksheet.get_value("A2"), "a");
        assert_eq!(worksheet.get_value("B2"), "1.5");
        assert_eq!(worksheet.get_value("B3"), "");
        assert_eq!(worksheet.get_value("B4"), "inf");
    }
}
