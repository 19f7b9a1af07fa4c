use super::state::{CellProperty, Command, Spreadsheet};
use crate::error::Result;
use cellgrid_engine::engine::CellRef;
use log::{debug, warn};
use std::collections::HashSet;

/// History description for text edits
pub const TEXT_CHANGE: &str = "cell text change";
/// History description for color edits
pub const COLOR_CHANGE: &str = "cell background color change";

impl Spreadsheet {
    /// Set a cell's text and recalculate everything that depends on it.
    ///
    /// Setting the current text again records nothing.
    pub fn set_text(&mut self, cell_ref: &CellRef, text: &str) -> Result<()> {
        let index = self.index_of(cell_ref)?;
        if self.cells[index].text() == text {
            return Ok(());
        }
        let snapshot = self.cells[index].clone();
        self.push_undo(Command {
            description: TEXT_CHANGE.to_string(),
            cells: vec![snapshot],
        });
        self.modified = true;
        self.apply_text(*cell_ref, text);
        Ok(())
    }

    pub fn set_background_color(&mut self, cell_ref: &CellRef, color: u32) -> Result<()> {
        self.set_background_colors(std::slice::from_ref(cell_ref), color)
    }

    /// Color several cells as one undoable step.
    ///
    /// Every reference is checked before any cell changes. Cells that already
    /// have the color are left out of the history entry.
    pub fn set_background_colors(&mut self, cell_refs: &[CellRef], color: u32) -> Result<()> {
        let indices = cell_refs
            .iter()
            .map(|cell_ref| self.index_of(cell_ref))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        let snapshots: Vec<_> = indices
            .into_iter()
            .filter(|index| seen.insert(*index))
            .map(|index| &self.cells[index])
            .filter(|cell| cell.background_color() != color)
            .cloned()
            .collect();
        if snapshots.is_empty() {
            return Ok(());
        }

        let changed: Vec<CellRef> = snapshots.iter().map(|cell| cell.cell_ref()).collect();
        self.push_undo(Command {
            description: COLOR_CHANGE.to_string(),
            cells: snapshots,
        });
        self.modified = true;
        for cell_ref in changed {
            self.apply_color(cell_ref, color);
        }
        Ok(())
    }

    /// Change text without recording history.
    pub(crate) fn apply_text(&mut self, cell_ref: CellRef, text: &str) {
        let Some(cell) = self.cell_mut(&cell_ref) else {
            return;
        };
        if !cell.set_text(text) {
            return;
        }
        self.formulas.remove(&cell_ref);
        self.notify(cell_ref, CellProperty::Text);
        self.recalculate_from(cell_ref);
    }

    /// Change color without recording history.
    pub(crate) fn apply_color(&mut self, cell_ref: CellRef, color: u32) {
        let changed = self
            .cell_mut(&cell_ref)
            .is_some_and(|cell| cell.set_background_color(color));
        if changed {
            self.notify(cell_ref, CellProperty::BackgroundColor);
        }
    }

    /// Push an undo entry for a new edit. Clears redo.
    fn push_undo(&mut self, command: Command) {
        self.undo_stack.push(command);
        self.redo_stack.clear();
        self.trim_undo();
    }

    fn trim_undo(&mut self) {
        while self.undo_stack.len() > self.history_limit {
            let dropped = self.undo_stack.remove(0);
            warn!(
                "history limit {} reached, dropping oldest entry ({})",
                self.history_limit, dropped.description
            );
        }
    }

    /// Revert the most recent edit. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(command) = self.undo_stack.pop() else {
            return false;
        };
        debug!("undo {}", command.description);
        let inverse = self.restore(command);
        self.redo_stack.push(inverse);
        self.modified = true;
        true
    }

    /// Reapply the most recently undone edit. Returns false when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(command) = self.redo_stack.pop() else {
            return false;
        };
        debug!("redo {}", command.description);
        let inverse = self.restore(command);
        self.undo_stack.push(inverse);
        self.trim_undo();
        self.modified = true;
        true
    }

    /// Write snapshots back onto the grid and return the state they replaced.
    ///
    /// Text and color come from the snapshot; value and error are derived
    /// again from the current grid.
    fn restore(&mut self, command: Command) -> Command {
        let current = command
            .cells
            .iter()
            .filter_map(|snapshot| self.cell(&snapshot.cell_ref()).cloned())
            .collect();
        for snapshot in &command.cells {
            let cell_ref = snapshot.cell_ref();
            self.apply_color(cell_ref, snapshot.background_color());
            self.apply_text(cell_ref, snapshot.text());
        }
        Command {
            description: command.description,
            cells: current,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Description of the entry `undo` would revert.
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|c| c.description.as_str())
    }

    /// Description of the entry `redo` would reapply.
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|c| c.description.as_str())
    }

    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
