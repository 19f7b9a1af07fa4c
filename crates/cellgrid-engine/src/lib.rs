//! cellgrid_engine - Formula parsing and evaluation for the spreadsheet.

pub mod engine;
