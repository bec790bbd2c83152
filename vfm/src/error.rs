use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VfmError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("packed column count {found} does not match product layout ({expected})")]
    FormatMismatch { expected: usize, found: usize },

    #[error("no data in {axis} range [{min}, {max}]")]
    EmptyRange {
        axis: &'static str,
        min: f64,
        max: f64,
    },

    #[error("missing field {0}")]
    MissingField(String),

    #[error("shape {rows}x{cols} does not hold {len} elements")]
    Shape { rows: usize, cols: usize, len: usize },

    #[error("no field files in {0}")]
    NoFields(PathBuf),

    #[error("invalid field file header {0}")]
    Header(PathBuf),

    #[error("field {field} is {found}, expected {expected}")]
    DataType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid zone layout, {0}")]
    Layout(&'static str),
}
