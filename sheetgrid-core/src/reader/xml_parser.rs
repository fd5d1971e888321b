//! XML parsing for the shared string table and worksheet cell data

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::workbook::{Cell, Grid, Row, SharedStrings};
use crate::error::{GridError, Result};

/// Element nesting seen so far, so a document cut off mid-way is rejected
#[derive(Debug, Default)]
struct Nesting {
    depth: usize,
    saw_root: bool,
}

impl Nesting {
    fn open(&mut self) {
        self.depth += 1;
        self.saw_root = true;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn empty(&mut self) {
        self.saw_root = true;
    }

    fn finish(&self, part: &str) -> Result<()> {
        if !self.saw_root {
            return Err(GridError::container(format!("{} has no root element", part)));
        }
        if self.depth > 0 {
            return Err(GridError::container(format!(
                "{} is truncated: {} unclosed elements",
                part, self.depth
            )));
        }
        Ok(())
    }
}

/// Parse `xl/sharedStrings.xml` into the ordered string table.
///
/// Each `<si>` contributes the concatenated text of its `<t>` elements,
/// rich-text runs included and phonetic (`<rPh>`) runs skipped.
pub fn parse_shared_strings(xml: &[u8]) -> Result<SharedStrings> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;
    let mut nesting = Nesting::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                nesting.open();
                match e.local_name().as_ref() {
                    b"si" => current = Some(String::new()),
                    b"rPh" => in_phonetic = true,
                    b"t" if current.is_some() && !in_phonetic => in_text = true,
                    _ => {}
                }
            }
            Event::Empty(e) => {
                nesting.empty();
                if e.local_name().as_ref() == b"si" {
                    strings.push(String::new());
                }
            }
            Event::Text(e) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => {
                nesting.close();
                match e.local_name().as_ref() {
                    b"si" => {
                        if let Some(s) = current.take() {
                            strings.push(s);
                        }
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_text = false,
                    _ => {}
                }
            }
            Event::Eof => {
                nesting.finish("shared strings")?;
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(SharedStrings::new(strings))
}

/// Which part of the open `<c>` element text is being collected into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    None,
    Value,
    Inline,
}

/// A `<c>` element whose end tag has not been seen yet
#[derive(Debug, Default)]
struct PendingCell {
    type_attr: Option<String>,
    value: Option<String>,
    inline: Option<String>,
}

impl PendingCell {
    fn from_start(e: &BytesStart<'_>) -> Result<Self> {
        Ok(Self {
            type_attr: cell_type(e)?,
            ..Self::default()
        })
    }

    fn append(&mut self, capture: Capture, text: &str) {
        let target = match capture {
            Capture::Value => &mut self.value,
            Capture::Inline => &mut self.inline,
            Capture::None => return,
        };
        target.get_or_insert_with(String::new).push_str(text);
    }

    fn finish(self) -> Cell {
        Cell::classify(self.type_attr.as_deref(), self.value, self.inline)
    }
}

fn cell_type(e: &BytesStart<'_>) -> Result<Option<String>> {
    match e.try_get_attribute("t")? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

/// Parse worksheet XML into rows of cell text.
///
/// Rows and cells keep document order. Skipped columns are not filled in:
/// only cells present in the XML appear, so a row may be shorter than its
/// neighbours. Cells outside any `<row>` are ignored.
pub fn parse_worksheet(xml: &[u8], shared: &SharedStrings) -> Result<Grid> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut grid = Grid::new();
    let mut row: Option<Row> = None;
    let mut cell: Option<PendingCell> = None;
    let mut capture = Capture::None;
    let mut in_inline = false;
    let mut in_phonetic = false;
    let mut nesting = Nesting::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                nesting.open();
                match e.local_name().as_ref() {
                    b"row" => row = Some(Row::new()),
                    b"c" if row.is_some() => cell = Some(PendingCell::from_start(&e)?),
                    b"v" if cell.is_some() => {
                        capture = Capture::Value;
                        if let Some(c) = cell.as_mut() {
                            c.append(capture, "");
                        }
                    }
                    b"is" if cell.is_some() => in_inline = true,
                    b"rPh" => in_phonetic = true,
                    b"t" if in_inline && !in_phonetic => {
                        capture = Capture::Inline;
                        if let Some(c) = cell.as_mut() {
                            c.append(capture, "");
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                nesting.empty();
                match e.local_name().as_ref() {
                    b"row" => grid.push(Row::new()),
                    b"c" => {
                        if let Some(r) = row.as_mut() {
                            r.push(PendingCell::from_start(&e)?.finish().resolve(shared));
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(e) if capture != Capture::None => {
                if let Some(c) = cell.as_mut() {
                    c.append(capture, &e.unescape()?);
                }
            }
            Event::CData(e) if capture != Capture::None => {
                if let Some(c) = cell.as_mut() {
                    c.append(capture, &String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => {
                nesting.close();
                match e.local_name().as_ref() {
                    b"v" | b"t" => capture = Capture::None,
                    b"is" => in_inline = false,
                    b"rPh" => in_phonetic = false,
                    b"c" => {
                        if let (Some(c), Some(r)) = (cell.take(), row.as_mut()) {
                            r.push(c.finish().resolve(shared));
                        }
                        capture = Capture::None;
                    }
                    b"row" => {
                        if let Some(r) = row.take() {
                            grid.push(r);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => {
                nesting.finish("worksheet")?;
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(grid)
}
