use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::error::Result;

/// Attribute list for one element; `None` values are skipped on output.
pub type AttrList<'a> = Vec<(&'a str, Option<String>)>;

/// Thin wrapper over the quick-xml writer used by every dataset's `to_xml`.
/// Attribute values are escaped by quick-xml.
pub struct MarkupWriter {
    writer: Writer<Vec<u8>>,
}

impl MarkupWriter {
    pub fn new() -> Self {
        Self { writer: Writer::new_with_indent(Vec::new(), b' ', 2) }
    }
    pub fn open(&mut self, tag: &str, attrs: AttrList) -> Result<()> {
        self.writer.write_event(Event::Start(element(tag, &attrs)))?;
        Ok(())
    }
    pub fn empty(&mut self, tag: &str, attrs: AttrList) -> Result<()> {
        self.writer.write_event(Event::Empty(element(tag, &attrs)))?;
        Ok(())
    }
    pub fn close(&mut self, tag: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }
    pub fn finish(self) -> Result<String> {
        let mut text = String::from_utf8(self.writer.into_inner())?;
        text.push('\n');
        Ok(text)
    }
}

impl Default for MarkupWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn element<'a>(tag: &'a str, attrs: &[(&str, Option<String>)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(tag);
    for (name, value) in attrs {
        if let Some(value) = value {
            start.push_attribute((*name, value.as_str()));
        }
    }
    start
}
