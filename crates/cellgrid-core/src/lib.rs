//! cellgrid-core - UI-agnostic spreadsheet document + storage.

pub mod document;
pub mod error;
pub mod storage;

pub use document::{CellChange, CellProperty, Command, SheetConfig, Spreadsheet};
pub use error::{Result, SheetError};

pub use cellgrid_engine::engine::{Cell, CellRef};
