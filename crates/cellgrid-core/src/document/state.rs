use crate::error::{Result, SheetError};
use cellgrid_engine::engine::{Cell, CellRef, ExpressionTree};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Default number of rows in a new sheet
pub const DEFAULT_ROWS: usize = 50;
/// Default number of columns in a new sheet (A..Z)
pub const DEFAULT_COLUMNS: usize = 26;
/// Maximum number of undo entries to keep
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Grid dimensions and history bound for a new sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SheetConfig {
    pub rows: usize,
    pub columns: usize,
    pub history_limit: usize,
}

impl Default for SheetConfig {
    fn default() -> Self {
        SheetConfig {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// An undoable history entry: snapshots of every cell the mutation touched,
/// taken before it happened.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    pub description: String,
    pub cells: Vec<Cell>,
}

/// Which observable property of a cell changed.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum CellProperty {
    Text,
    Value,
    BackgroundColor,
    Error,
}

/// Notification delivered to subscribers after a cell property changes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CellChange {
    pub cell: CellRef,
    pub property: CellProperty,
}

pub(crate) type Listener = Box<dyn FnMut(&CellChange)>;

/// UI-agnostic spreadsheet document: a fixed grid of cells plus the formula
/// reference graph, undo/redo history and file state.
pub struct Spreadsheet {
    pub(crate) rows: usize,
    pub(crate) columns: usize,
    /// Row-major, `rows * columns` cells
    pub(crate) cells: Vec<Cell>,
    /// Formula cell -> cells its formula names
    pub(crate) references: HashMap<CellRef, Vec<CellRef>>,
    /// Reverse of `references`: cell -> formula cells that name it
    pub(crate) dependents: HashMap<CellRef, BTreeSet<CellRef>>,
    /// Parsed formulas, dropped whenever the cell's text changes
    pub(crate) formulas: HashMap<CellRef, Rc<ExpressionTree>>,
    pub(crate) undo_stack: Vec<Command>,
    pub(crate) redo_stack: Vec<Command>,
    pub(crate) history_limit: usize,
    listeners: Vec<Listener>,
    pub(crate) file_path: Option<PathBuf>,
    pub(crate) modified: bool,
}

impl Spreadsheet {
    /// Create an empty sheet. Zero dimensions are clamped to one.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self::with_config(SheetConfig {
            rows,
            columns,
            ..SheetConfig::default()
        })
    }

    pub fn with_config(config: SheetConfig) -> Self {
        let rows = config.rows.max(1);
        let columns = config.columns.max(1);
        Spreadsheet {
            rows,
            columns,
            cells: blank_cells(rows, columns),
            references: HashMap::new(),
            dependents: HashMap::new(),
            formulas: HashMap::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            history_limit: config.history_limit,
            listeners: Vec::new(),
            file_path: None,
            modified: false,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn is_valid_index(&self, row: usize, column: usize) -> bool {
        row < self.rows && column < self.columns
    }

    /// True when `name` is a well-formed cell name inside this grid.
    pub fn is_valid_cell_name(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn cell(&self, cell_ref: &CellRef) -> Option<&Cell> {
        self.cell_at(cell_ref.row, cell_ref.col)
    }

    pub fn cell_at(&self, row: usize, column: usize) -> Option<&Cell> {
        if !self.is_valid_index(row, column) {
            return None;
        }
        self.cells.get(row * self.columns + column)
    }

    /// Look a cell up by name ("B3"). None when the name is malformed or
    /// outside the grid.
    pub fn cell_by_name(&self, name: &str) -> Option<&Cell> {
        self.resolve(name).and_then(|cell_ref| self.cell(&cell_ref))
    }

    /// Every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Register an observer called after every cell property change.
    pub fn subscribe(&mut self, listener: impl FnMut(&CellChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Parse a name and check it against the grid bounds.
    pub(crate) fn resolve(&self, name: &str) -> Option<CellRef> {
        CellRef::from_str(name).filter(|r| self.is_valid_index(r.row, r.col))
    }

    /// Index into `cells`, or `OutOfRange`.
    pub(crate) fn index_of(&self, cell_ref: &CellRef) -> Result<usize> {
        if !self.is_valid_index(cell_ref.row, cell_ref.col) {
            return Err(SheetError::OutOfRange {
                row: cell_ref.row,
                column: cell_ref.col,
            });
        }
        Ok(cell_ref.row * self.columns + cell_ref.col)
    }

    pub(crate) fn cell_mut(&mut self, cell_ref: &CellRef) -> Option<&mut Cell> {
        let index = self.index_of(cell_ref).ok()?;
        self.cells.get_mut(index)
    }

    pub(crate) fn notify(&mut self, cell: CellRef, property: CellProperty) {
        let change = CellChange { cell, property };
        for listener in &mut self.listeners {
            listener(&change);
        }
    }

    /// Drop all cell state and the reference graph. History is untouched.
    pub(crate) fn reset_cells(&mut self) {
        self.cells = blank_cells(self.rows, self.columns);
        self.references.clear();
        self.dependents.clear();
        self.formulas.clear();
    }
}

fn blank_cells(rows: usize, columns: usize) -> Vec<Cell> {
    (0..rows)
        .flat_map(|row| (0..columns).map(move |col| Cell::new(CellRef::at(row, col))))
        .collect()
}

impl Default for Spreadsheet {
    fn default() -> Self {
        Self::with_config(SheetConfig::default())
    }
}

impl fmt::Debug for Spreadsheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spreadsheet")
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("file_path", &self.file_path)
            .field("modified", &self.modified)
            .finish()
    }
}
