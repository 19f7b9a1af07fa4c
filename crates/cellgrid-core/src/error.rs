//! Error types for Cellgrid core.

use thiserror::Error;

/// Errors that can occur while driving a spreadsheet document.
///
/// Formula problems are not errors at this level: they become cell error
/// state and are read back through [`Cell::value`](cellgrid_engine::engine::Cell::value).
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Invalid spreadsheet document: {message}")]
    Parse { message: String },

    #[error("Invalid cell name: {0}")]
    InvalidCellName(String),

    #[error("Cell at row {row}, column {column} is outside the grid")]
    OutOfRange { row: usize, column: usize },

    #[error("No file path set")]
    NoFilePath,
}

pub type Result<T> = std::result::Result<T, SheetError>;
