//! Document state and logic (UI-agnostic).

mod io;
mod ops;
mod recalc;
mod state;

pub use ops::{COLOR_CHANGE, TEXT_CHANGE};
pub use state::{CellChange, CellProperty, Command, SheetConfig, Spreadsheet};
