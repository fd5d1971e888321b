//! sheetgrid-core: decode spreadsheet files into grids of cell text
//!
//! Two decoders share one output shape, rows of cell strings:
//!
//! - `.xlsx`: a self-contained ZIP reader walks the central directory,
//!   inflates `xl/sharedStrings.xml` and the first worksheet, and resolves
//!   shared-string references.
//! - `.xls`: bank exports that are HTML documents; the first `<table>` is read.
//!
//! Cell values are returned as stored: numbers, dates and formula results are
//! not interpreted, and skipped columns are not padded.

pub mod config;
pub mod error;
pub mod reader;

pub use config::DecodeConfig;
pub use error::{ErrorKind, GridError, Result};
pub use reader::{Grid, GridReader, Inflate, Row, SourceFormat, read_grid};
