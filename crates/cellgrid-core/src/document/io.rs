use super::{CellProperty, Spreadsheet};
use crate::error::{Result, SheetError};
use crate::storage::{StoredCell, parse_xml, parse_xml_content, write_xml, write_xml_content};
use cellgrid_engine::engine::CellRef;
use log::debug;
use std::path::{Path, PathBuf};

impl Spreadsheet {
    /// Serialize every non-default cell.
    pub fn to_xml(&self) -> Result<String> {
        write_xml_content(self.cells())
    }

    /// Replace the sheet contents with an XML document.
    ///
    /// All names are checked against the grid before anything changes. The
    /// load itself records no history and leaves both stacks empty.
    pub fn load_xml(&mut self, content: &str) -> Result<()> {
        self.replace_cells(parse_xml_content(content)?)
    }

    /// Save to the current file path.
    /// Returns the path saved to.
    pub fn save_file(&mut self) -> Result<PathBuf> {
        let Some(path) = &self.file_path else {
            return Err(SheetError::NoFilePath);
        };

        write_xml(path, self.cells())?;
        self.modified = false;
        Ok(path.clone())
    }

    /// Save to `path` and make it the current file path.
    pub fn save_as(&mut self, path: &Path) -> Result<PathBuf> {
        self.file_path = Some(path.to_path_buf());
        self.save_file()
    }

    /// Load from file
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        self.replace_cells(parse_xml(path)?)?;
        self.file_path = Some(path.to_path_buf());
        Ok(())
    }

    fn replace_cells(&mut self, stored: Vec<StoredCell>) -> Result<()> {
        let resolved = stored
            .into_iter()
            .map(|cell| match self.resolve(&cell.name) {
                Some(cell_ref) => Ok((cell_ref, cell)),
                None => Err(SheetError::InvalidCellName(cell.name)),
            })
            .collect::<Result<Vec<(CellRef, StoredCell)>>>()?;

        self.clear_cells();
        for (cell_ref, cell) in &resolved {
            self.apply_color(*cell_ref, cell.background_color);
            self.apply_text(*cell_ref, &cell.text);
        }
        debug!("loaded {} cells", resolved.len());

        self.clear_history();
        self.modified = false;
        Ok(())
    }

    /// Return every cell to its default state, notifying observers of each
    /// cell that had content.
    fn clear_cells(&mut self) {
        let occupied: Vec<CellRef> = self
            .cells()
            .filter(|cell| !cell.is_default())
            .map(|cell| cell.cell_ref())
            .collect();
        self.reset_cells();
        for cell_ref in occupied {
            for property in [
                CellProperty::Text,
                CellProperty::Value,
                CellProperty::BackgroundColor,
                CellProperty::Error,
            ] {
                self.notify(cell_ref, property);
            }
        }
    }
}
