//! Cell data structures for the spreadsheet grid.
//!
//! A [`Cell`] keeps the raw text the user typed, the display value derived
//! from it, an optional error message and a background color. Cells never
//! evaluate themselves: the owning sheet decides the value and writes it back
//! through the setters, which report whether anything actually changed.

use super::cell_ref::CellRef;

/// Background color meaning "no color set" (packed ARGB, all ones).
pub const DEFAULT_BACKGROUND: u32 = 0xFFFF_FFFF;

/// Generic error marker for formulas that cannot be evaluated.
pub const CELL_ERROR: &str = "#error";

/// Error shown on every cell taking part in a reference cycle.
pub const CIRCULAR_REFERENCE_ERROR: &str = "#error: Cell is referencing itself";

/// What a cell's text asks for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CellInput<'a> {
    /// Shown verbatim.
    Literal(&'a str),
    /// Formula body (text after the leading `=`).
    Formula(&'a str),
}

impl<'a> CellInput<'a> {
    /// Classify raw cell text. Only `=` followed by at least one more
    /// character is a formula; a bare `=` is literal text.
    pub fn classify(text: &'a str) -> CellInput<'a> {
        match text.strip_prefix('=') {
            Some(body) if !body.is_empty() => CellInput::Formula(body),
            _ => CellInput::Literal(text),
        }
    }
}

/// One addressable unit of the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    cell_ref: CellRef,
    text: String,
    value: String,
    error: Option<String>,
    background_color: u32,
}

impl Cell {
    pub fn new(cell_ref: CellRef) -> Cell {
        Cell {
            cell_ref,
            text: String::new(),
            value: String::new(),
            error: None,
            background_color: DEFAULT_BACKGROUND,
        }
    }

    pub fn cell_ref(&self) -> CellRef {
        self.cell_ref
    }

    pub fn row(&self) -> usize {
        self.cell_ref.row
    }

    pub fn column(&self) -> usize {
        self.cell_ref.col
    }

    /// Column letters plus one-based row ("B1").
    pub fn name(&self) -> String {
        self.cell_ref.name()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The display value: the error message when errored, otherwise the
    /// computed value (or the literal text).
    pub fn value(&self) -> &str {
        match self.error() {
            Some(message) => message,
            None => &self.value,
        }
    }

    /// The error message, if one is set and not blank.
    pub fn error(&self) -> Option<&str> {
        self.error
            .as_deref()
            .filter(|message| !message.trim().is_empty())
    }

    pub fn is_errored(&self) -> bool {
        self.error().is_some()
    }

    pub fn background_color(&self) -> u32 {
        self.background_color
    }

    /// True when the cell holds no text and no color.
    pub fn is_default(&self) -> bool {
        self.text.is_empty() && self.background_color == DEFAULT_BACKGROUND
    }

    /// Returns true if the text changed.
    pub fn set_text(&mut self, text: &str) -> bool {
        if self.text == text {
            return false;
        }
        self.text = text.to_string();
        true
    }

    /// Returns true if the computed value changed.
    pub fn set_value(&mut self, value: String) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        true
    }

    /// Returns true if the error state changed.
    pub fn set_error(&mut self, error: Option<String>) -> bool {
        if self.error == error {
            return false;
        }
        self.error = error;
        true
    }

    /// Returns true if the color changed.
    pub fn set_background_color(&mut self, color: u32) -> bool {
        if self.background_color == color {
            return false;
        }
        self.background_color = color;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cell_is_default() {
        let cell = Cell::new(CellRef::new(1, 0));
        assert_eq!(cell.name(), "B1");
        assert_eq!(cell.text(), "");
        assert_eq!(cell.value(), "");
        assert_eq!(cell.background_color(), DEFAULT_BACKGROUND);
        assert!(!cell.is_errored());
        assert!(cell.is_default());
    }

    #[test]
    fn test_error_overrides_value() {
        let mut cell = Cell::new(CellRef::new(0, 0));
        cell.set_value("10".to_string());
        assert!(cell.set_error(Some(CELL_ERROR.to_string())));
        assert_eq!(cell.value(), CELL_ERROR);
        assert!(cell.set_error(None));
        assert_eq!(cell.value(), "10");
    }

    #[test]
    fn test_blank_error_is_not_an_error() {
        let mut cell = Cell::new(CellRef::new(0, 0));
        cell.set_value("1".to_string());
        cell.set_error(Some("  ".to_string()));
        assert!(!cell.is_errored());
        assert_eq!(cell.value(), "1");
    }

    #[test]
    fn test_setters_report_changes() {
        let mut cell = Cell::new(CellRef::new(0, 0));
        assert!(cell.set_text("=1"));
        assert!(!cell.set_text("=1"));
        assert!(cell.set_background_color(0xFF80_00));
        assert!(!cell.set_background_color(0xFF80_00));
        assert!(!cell.is_default());
    }

    #[test]
    fn test_classify_input() {
        assert_eq!(CellInput::classify("=A1+2"), CellInput::Formula("A1+2"));
        assert_eq!(CellInput::classify("="), CellInput::Literal("="));
        assert_eq!(CellInput::classify("hello"), CellInput::Literal("hello"));
        assert_eq!(CellInput::classify(""), CellInput::Literal(""));
        assert_eq!(CellInput::classify(" =1"), CellInput::Literal(" =1"));
    }
}
