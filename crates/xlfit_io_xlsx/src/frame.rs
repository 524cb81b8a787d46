//! Tabular dataset wrapper: polars frame plus an optional row index.

use std::io::Cursor;

use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader, Series};

use crate::spec::{EnumCellValue, XlsxWriteError};

/// Ordered columns with an ordered row index.
///
/// When no index is attached the index is the range `0..height`, unnamed.
#[derive(Debug, Clone)]
pub struct SheetFrame {
    df: DataFrame,
    index: Option<Series>,
    index_name: Option<String>,
}

impl SheetFrame {
    /// Wrap a dataframe with the default range index.
    pub fn new(df: DataFrame) -> Self {
        Self {
            df,
            index: None,
            index_name: None,
        }
    }

    /// Build a frame from a Polars IPC payload.
    pub fn from_ipc_bytes(v_ipc_df: &[u8]) -> Result<Self, XlsxWriteError> {
        let df = IpcReader::new(Cursor::new(v_ipc_df))
            .finish()
            .map_err(|err| XlsxWriteError::InvalidFrame(format!("bad IPC payload: {err}")))?;
        Ok(Self::new(df))
    }

    /// Attach row index labels. A non-empty series name becomes the index name.
    ///
    /// The label count must equal the frame height (any count is accepted for
    /// a frame without columns).
    pub fn with_index(mut self, index: Series) -> Result<Self, XlsxWriteError> {
        if self.df.width() > 0 && index.len() != self.df.height() {
            return Err(XlsxWriteError::InvalidFrame(format!(
                "index length {} != frame height {}",
                index.len(),
                self.df.height()
            )));
        }
        let c_name = index.name().as_str();
        if !c_name.is_empty() {
            self.index_name = Some(c_name.to_string());
        }
        self.index = Some(index);
        Ok(self)
    }

    /// Set (or override) the index display name.
    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    /// Underlying dataframe.
    pub fn data(&self) -> &DataFrame {
        &self.df
    }

    /// Index display name, if any.
    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        match (&self.index, self.df.width()) {
            (Some(index), 0) => index.len(),
            _ => self.df.height(),
        }
    }

    /// Number of data columns (index excluded).
    pub fn width(&self) -> usize {
        self.df.width()
    }

    /// Column header labels in order.
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Values of data column `col_idx`, top to bottom.
    pub fn column_values(&self, col_idx: usize) -> Result<Vec<EnumCellValue>, XlsxWriteError> {
        let col = &self.df.get_columns()[col_idx];
        (0..col.len())
            .map(|n_idx_row| Ok(derive_cell_value_from_any_value(col.get(n_idx_row)?)))
            .collect()
    }

    /// Row index labels, top to bottom.
    pub fn index_values(&self) -> Result<Vec<EnumCellValue>, XlsxWriteError> {
        match &self.index {
            Some(index) => (0..index.len())
                .map(|n_idx_row| Ok(derive_cell_value_from_any_value(index.get(n_idx_row)?)))
                .collect(),
            None => (0..self.height())
                .map(|n_idx_row| {
                    i64::try_from(n_idx_row)
                        .map(EnumCellValue::Integer)
                        .map_err(|_| XlsxWriteError::IndexOverflow {
                            axis: "row",
                            value: n_idx_row,
                        })
                })
                .collect(),
        }
    }
}

impl From<DataFrame> for SheetFrame {
    fn from(df: DataFrame) -> Self {
        Self::new(df)
    }
}

pub(crate) fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => EnumCellValue::Boolean(val),
        AnyValue::UInt8(val) => EnumCellValue::Integer(val as i64),
        AnyValue::UInt16(val) => EnumCellValue::Integer(val as i64),
        AnyValue::UInt32(val) => EnumCellValue::Integer(val as i64),
        AnyValue::UInt64(val) => match i64::try_from(val) {
            Ok(n) => EnumCellValue::Integer(n),
            Err(_) => EnumCellValue::Float(val as f64),
        },
        AnyValue::Int8(val) => EnumCellValue::Integer(val as i64),
        AnyValue::Int16(val) => EnumCellValue::Integer(val as i64),
        AnyValue::Int32(val) => EnumCellValue::Integer(val as i64),
        AnyValue::Int64(val) => EnumCellValue::Integer(val),
        AnyValue::Float32(val) => EnumCellValue::Float(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Float(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::*;

    #[test]
    fn test_default_index_is_unnamed_range() {
        let frame = SheetFrame::new(df!("a" => [10i64, 20, 30]).unwrap());
        assert_eq!(frame.index_name(), None);
        assert_eq!(
            frame.index_values().unwrap(),
            vec![
                EnumCellValue::Integer(0),
                EnumCellValue::Integer(1),
                EnumCellValue::Integer(2)
            ]
        );
    }

    #[test]
    fn test_named_series_sets_index_name() {
        let frame = SheetFrame::new(df!("a" => [1i64, 2]).unwrap())
            .with_index(Series::new("id".into(), &["x", "y"]))
            .unwrap();
        assert_eq!(frame.index_name(), Some("id"));
        assert_eq!(
            frame.index_values().unwrap(),
            vec![
                EnumCellValue::String("x".to_string()),
                EnumCellValue::String("y".to_string())
            ]
        );

        let frame = frame.with_index_name("key");
        assert_eq!(frame.index_name(), Some("key"));
    }

    #[test]
    fn test_index_length_mismatch_rejected() {
        let err = SheetFrame::new(df!("a" => [1i64, 2]).unwrap())
            .with_index(Series::new("".into(), &[1i64]))
            .unwrap_err();
        assert!(matches!(err, XlsxWriteError::InvalidFrame(_)));
    }

    #[test]
    fn test_column_values_keep_types_and_nulls() {
        let df = df!(
            "s" => [Some("a"), None],
            "f" => [Some(1.5f64), None],
            "b" => [true, false]
        )
        .unwrap();
        let frame = SheetFrame::new(df);

        assert_eq!(frame.column_names(), vec!["s", "f", "b"]);
        assert_eq!(
            frame.column_values(0).unwrap(),
            vec![EnumCellValue::String("a".to_string()), EnumCellValue::None]
        );
        assert_eq!(
            frame.column_values(1).unwrap(),
            vec![EnumCellValue::Float(1.5), EnumCellValue::None]
        );
        assert_eq!(
            frame.column_values(2).unwrap(),
            vec![EnumCellValue::Boolean(true), EnumCellValue::Boolean(false)]
        );
    }

    #[test]
    fn test_from_ipc_bytes() {
        let mut df = df!("Name" => ["Al", "Bob"]).unwrap();
        let mut buf = Vec::new();
        IpcWriter::new(&mut buf).finish(&mut df).unwrap();

        let frame = SheetFrame::from_ipc_bytes(&buf).unwrap();
        assert_eq!(frame.column_names(), vec!["Name"]);
        assert_eq!(frame.height(), 2);

        assert!(matches!(
            SheetFrame::from_ipc_bytes(b"not ipc"),
            Err(XlsxWriteError::InvalidFrame(_))
        ));
    }
}
