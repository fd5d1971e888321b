//! Grid data structures

use log::warn;

/// One row of cell text, in document order
pub type Row = Vec<String>;

/// Rows of cell text; the sole output of every decoder
pub type Grid = Vec<Row>;

/// Ordered shared string table of an `.xlsx` package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedStrings {
    strings: Vec<String>,
}

impl SharedStrings {
    pub fn new(strings: Vec<String>) -> Self {
        Self { strings }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.strings
    }
}

impl From<Vec<String>> for SharedStrings {
    fn from(strings: Vec<String>) -> Self {
        Self::new(strings)
    }
}

/// How a worksheet cell's text is to be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// `t="s"`: the text is an index into the shared string table
    Shared,
    /// `t="inlineStr"`: the text came from the cell's `<is>` element
    Inline,
    /// Anything else: numbers, booleans, dates, formula results, as stored
    Raw,
}

impl CellKind {
    /// Classify a cell from its `t` attribute
    pub fn from_type_attr(t: Option<&str>) -> Self {
        match t {
            Some("s") => CellKind::Shared,
            Some("inlineStr") => CellKind::Inline,
            _ => CellKind::Raw,
        }
    }
}

/// A worksheet cell before shared-string resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub kind: CellKind,
    pub text: String,
}

impl Cell {
    /// Build a cell from the pieces found in `<c>`: its type attribute,
    /// the `<v>` text and the `<is>` text.
    pub fn classify(
        type_attr: Option<&str>,
        value: Option<String>,
        inline: Option<String>,
    ) -> Self {
        let kind = CellKind::from_type_attr(type_attr);
        let text = match kind {
            CellKind::Inline => inline.or(value),
            CellKind::Shared | CellKind::Raw => value,
        }
        .unwrap_or_default();
        Self { kind, text }
    }

    /// Final text of the cell.
    ///
    /// A shared-string index that does not parse or is out of range yields
    /// an empty string rather than an error.
    pub fn resolve(self, shared: &SharedStrings) -> String {
        match self.kind {
            CellKind::Shared => {
                let resolved = self
                    .text
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| shared.get(index));
                match resolved {
                    Some(s) => s.to_string(),
                    None => {
                        warn!(
                            "Shared string index '{}' not in table of {} entries",
                            self.text,
                            shared.len()
                        );
                        String::new()
                    }
                }
            }
            CellKind::Inline | CellKind::Raw => self.text,
        }
    }
}
