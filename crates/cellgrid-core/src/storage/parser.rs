//! Parser for the spreadsheet XML format

use super::{CELL, INDEX_NAME, ROOT};
use crate::error::{Result, SheetError};
use cellgrid_engine::engine::DEFAULT_BACKGROUND;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fs;
use std::path::Path;

/// One `SpreadsheetCell` element as read from disk.
///
/// The name is not validated here; the document decides whether it fits
/// its grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredCell {
    pub name: String,
    pub text: String,
    pub background_color: u32,
}

#[derive(Clone, Copy)]
enum Field {
    Text,
    BackgroundColor,
}

/// Parse an XML file into stored cells
pub fn parse_xml(path: &Path) -> Result<Vec<StoredCell>> {
    let content = fs::read_to_string(path)?;
    parse_xml_content(&content)
}

/// Parse XML content from a string
pub fn parse_xml_content(content: &str) -> Result<Vec<StoredCell>> {
    let mut reader = Reader::from_str(content);
    let mut buf = Vec::new();

    let mut cells = Vec::new();
    let mut root_seen = false;
    let mut current: Option<StoredCell> = None;
    let mut field: Option<Field> = None;
    let mut color = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                check_root(&e, &mut root_seen)?;
                match e.local_name().as_ref() {
                    b"SpreadsheetCell" => current = Some(start_cell(&e)?),
                    b"Text" if current.is_some() => field = Some(Field::Text),
                    b"BackgroundColor" if current.is_some() => {
                        color.clear();
                        field = Some(Field::BackgroundColor);
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                check_root(&e, &mut root_seen)?;
                if e.local_name().as_ref() == CELL.as_bytes() {
                    cells.push(start_cell(&e)?);
                }
            }
            Event::Text(e) => {
                if let (Some(cell), Some(field)) = (current.as_mut(), field) {
                    let text = e.unescape()?;
                    match field {
                        Field::Text => cell.text.push_str(&text),
                        Field::BackgroundColor => color.push_str(&text),
                    }
                }
            }
            Event::CData(e) => {
                if let (Some(cell), Some(Field::Text)) = (current.as_mut(), field) {
                    cell.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"SpreadsheetCell" => {
                    if let Some(cell) = current.take() {
                        cells.push(cell);
                    }
                }
                b"BackgroundColor" => {
                    if let Some(cell) = current.as_mut() {
                        cell.background_color = parse_color(&color);
                    }
                    field = None;
                }
                b"Text" => field = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !root_seen {
        return Err(SheetError::Parse {
            message: format!("Missing <{}> root element", ROOT),
        });
    }
    Ok(cells)
}

fn check_root(e: &BytesStart<'_>, root_seen: &mut bool) -> Result<()> {
    if *root_seen {
        return Ok(());
    }
    if e.local_name().as_ref() != ROOT.as_bytes() {
        return Err(SheetError::Parse {
            message: format!(
                "Expected <{}> root element, found <{}>",
                ROOT,
                String::from_utf8_lossy(e.local_name().as_ref())
            ),
        });
    }
    *root_seen = true;
    Ok(())
}

fn start_cell(e: &BytesStart<'_>) -> Result<StoredCell> {
    let mut name = None;
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == INDEX_NAME.as_bytes() {
            name = Some(attr.unescape_value()?.into_owned());
        }
    }
    let name = name.ok_or_else(|| SheetError::Parse {
        message: format!("<{}> without {} attribute", CELL, INDEX_NAME),
    })?;
    Ok(StoredCell {
        name,
        text: String::new(),
        background_color: DEFAULT_BACKGROUND,
    })
}

/// Unparsable colors fall back to the default.
fn parse_color(text: &str) -> u32 {
    text.trim().parse().unwrap_or(DEFAULT_BACKGROUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell() {
        let content = r#"<?xml version="1.0" encoding="utf-8"?>
<Spreadsheet>
  <SpreadsheetCell IndexName="B1">
    <BackgroundColor>16744448</BackgroundColor>
    <Text>=A1+6</Text>
  </SpreadsheetCell>
</Spreadsheet>"#;
        let cells = parse_xml_content(content).unwrap();
        assert_eq!(
            cells,
            vec![StoredCell {
                name: "B1".to_string(),
                text: "=A1+6".to_string(),
                background_color: 16744448,
            }]
        );
    }

    #[test]
    fn test_missing_children_are_defaults() {
        let content = r#"<Spreadsheet>
  <SpreadsheetCell IndexName="A1"><Text>hi</Text></SpreadsheetCell>
  <SpreadsheetCell IndexName="A2"><BackgroundColor>oops</BackgroundColor></SpreadsheetCell>
  <SpreadsheetCell IndexName="A3"/>
</Spreadsheet>"#;
        let cells = parse_xml_content(content).unwrap();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].text, "hi");
        assert_eq!(cells[0].background_color, DEFAULT_BACKGROUND);
        assert_eq!(cells[1].text, "");
        assert_eq!(cells[1].background_color, DEFAULT_BACKGROUND);
        assert_eq!(cells[2].name, "A3");
    }

    #[test]
    fn test_text_is_unescaped_and_kept_verbatim() {
        let content = r#"<Spreadsheet><SpreadsheetCell IndexName="C2"><Text>  a &lt; b &amp; c  </Text></SpreadsheetCell></Spreadsheet>"#;
        let cells = parse_xml_content(content).unwrap();
        assert_eq!(cells[0].text, "  a < b & c  ");
    }

    #[test]
    fn test_empty_spreadsheet() {
        assert!(parse_xml_content("<Spreadsheet/>").unwrap().is_empty());
        assert!(
            parse_xml_content("<Spreadsheet></Spreadsheet>")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_wrong_root_is_rejected() {
        let result = parse_xml_content("<Workbook><SpreadsheetCell IndexName=\"A1\"/></Workbook>");
        assert!(matches!(result, Err(SheetError::Parse { .. })));
        assert!(matches!(
            parse_xml_content(""),
            Err(SheetError::Parse { .. })
        ));
    }

    #[test]
    fn test_cell_without_name_is_rejected() {
        let result = parse_xml_content("<Spreadsheet><SpreadsheetCell/></Spreadsheet>");
        assert!(matches!(result, Err(SheetError::Parse { .. })));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let result = parse_xml_content("<Spreadsheet><Text></Spreadsheet>");
        assert!(matches!(result, Err(SheetError::Xml(_))));
    }
}
