//! XML persistence for spreadsheet documents.
//!
//! ```xml
//! <Spreadsheet>
//!   <SpreadsheetCell IndexName="B1">
//!     <BackgroundColor>4294967295</BackgroundColor>
//!     <Text>=A1+6</Text>
//!   </SpreadsheetCell>
//! </Spreadsheet>
//! ```
//!
//! Only cells with text or a non-default color are written; anything absent
//! reads back as a default cell.

mod parser;
mod writer;

pub use parser::{StoredCell, parse_xml, parse_xml_content};
pub use writer::{write_xml, write_xml_content};

pub(crate) const ROOT: &str = "Spreadsheet";
pub(crate) const CELL: &str = "SpreadsheetCell";
pub(crate) const INDEX_NAME: &str = "IndexName";
pub(crate) const BACKGROUND_COLOR: &str = "BackgroundColor";
pub(crate) const TEXT: &str = "Text";
