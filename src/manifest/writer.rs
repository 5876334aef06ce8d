//! Manifest serialization
//!
//! Output format: XML declaration with UTF-8 encoding, then the element tree
//! indented by two spaces.

use super::parser::{Element, Manifest};
use crate::{Result, RoomserviceError};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

/// Render a manifest as a pretty-printed XML document
pub fn to_xml_string(manifest: &Manifest) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_error)?;
    write_element(&mut writer, manifest.root())?;

    let mut xml = String::from_utf8(writer.into_inner())
        .map_err(|e| RoomserviceError::Other(format!("Manifest is not valid UTF-8: {}", e)))?;
    xml.push('\n');
    Ok(xml)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(write_error)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_error)?;
    Ok(())
}

fn write_error(e: impl std::fmt::Display) -> RoomserviceError {
    RoomserviceError::Other(format!("Failed to write manifest XML: {}", e))
}
