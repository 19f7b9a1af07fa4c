//! Writer for the spreadsheet XML format

use super::{BACKGROUND_COLOR, CELL, INDEX_NAME, ROOT, TEXT};
use crate::error::Result;
use cellgrid_engine::engine::Cell;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Write cells to an XML file
pub fn write_xml<'a>(path: &Path, cells: impl IntoIterator<Item = &'a Cell>) -> Result<()> {
    let content = write_xml_content(cells)?;
    fs::write(path, content)?;
    Ok(())
}

/// Write cells to an XML string. Default cells are skipped.
pub fn write_xml_content<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(ROOT)))?;

    for cell in cells {
        if cell.is_default() {
            continue;
        }
        let name = cell.name();
        let mut start = BytesStart::new(CELL);
        start.push_attribute((INDEX_NAME, name.as_str()));
        writer.write_event(Event::Start(start))?;

        let color = cell.background_color().to_string();
        write_text_element(&mut writer, BACKGROUND_COLOR, &color)?;
        write_text_element(&mut writer, TEXT, cell.text())?;

        writer.write_event(Event::End(BytesEnd::new(CELL)))?;
    }

    writer.write_event(Event::End(BytesEnd::new(ROOT)))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    tag: &str,
    text: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
