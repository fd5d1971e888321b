//! Spreadsheet readers: `.xlsx` packages and HTML-based `.xls` exports

use log::debug;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

pub mod cursor;
pub mod html_table;
pub mod inflate;
pub mod workbook;
pub mod xml_parser;
pub mod zip_directory;

pub use inflate::{FlateInflater, Inflate};
pub use workbook::{Cell, CellKind, Grid, Row, SharedStrings};
pub use zip_directory::{CentralDirectory, DirectoryEntry, ZipContainer};

use crate::config::DecodeConfig;
use crate::error::{GridError, Result};

pub const SHARED_STRINGS_PATH: &str = "xl/sharedStrings.xml";
pub const DEFAULT_WORKSHEET_PATH: &str = "xl/worksheets/sheet1.xml";

static WORKSHEET_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^xl/worksheets/[^/]+\.xml$").expect("worksheet path pattern is valid")
});

/// Format selected from a file name's extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Office Open XML package
    Xlsx,
    /// HTML document saved with an `.xls` extension
    LegacyXls,
}

impl SourceFormat {
    /// Pick the decoder by case-insensitive suffix
    pub fn from_file_name(name: &str) -> Result<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".xlsx") {
            Ok(SourceFormat::Xlsx)
        } else if lower.ends_with(".xls") {
            Ok(SourceFormat::LegacyXls)
        } else {
            Err(GridError::UnsupportedExtension(name.to_string()))
        }
    }
}

/// Pick the worksheet to decode: `sheet1.xml` if present, else the first
/// worksheet entry in directory order.
///
/// The workbook's own sheet order and active tab are not consulted.
pub fn select_worksheet(directory: &CentralDirectory) -> Option<&str> {
    if directory.contains(DEFAULT_WORKSHEET_PATH) {
        return Some(DEFAULT_WORKSHEET_PATH);
    }
    directory.names().find(|name| WORKSHEET_PATH.is_match(name))
}

/// Decoder entry point bundling configuration with the injected inflater
#[derive(Debug, Clone, Default)]
pub struct GridReader<I: Inflate = FlateInflater> {
    config: DecodeConfig,
    inflater: I,
}

impl GridReader<FlateInflater> {
    /// Create a reader with default configuration
    pub fn new() -> Self {
        Self {
            config: DecodeConfig::default(),
            inflater: FlateInflater,
        }
    }

    /// Create a reader with custom configuration, rejecting invalid settings
    pub fn with_config(config: DecodeConfig) -> anyhow::Result<Self> {
        Self::with_inflater(config, FlateInflater)
    }
}

impl<I: Inflate> GridReader<I> {
    /// Create a reader with a custom raw-deflate implementation
    pub fn with_inflater(config: DecodeConfig, inflater: I) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self { config, inflater })
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Decode a payload, choosing the format from its declared file name
    pub fn read(&self, name: &str, bytes: &[u8]) -> Result<Grid> {
        match SourceFormat::from_file_name(name)? {
            SourceFormat::Xlsx => self.read_xlsx(bytes),
            SourceFormat::LegacyXls => self.read_legacy_xls(bytes),
        }
    }

    /// Read a file from disk and decode it
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<Grid> {
        let path = path.as_ref();
        let format = SourceFormat::from_file_name(&path.to_string_lossy())?;
        let bytes = fs::read(path)?;
        match format {
            SourceFormat::Xlsx => self.read_xlsx(&bytes),
            SourceFormat::LegacyXls => self.read_legacy_xls(&bytes),
        }
    }

    /// Decode the first worksheet of an `.xlsx` package
    pub fn read_xlsx(&self, bytes: &[u8]) -> Result<Grid> {
        let container_config = &self.config.container;
        let container = ZipContainer::open(bytes, container_config)?;

        let shared_xml = container.extract(SHARED_STRINGS_PATH, &self.inflater, container_config)?;
        let shared = match shared_xml {
            Some(xml) => xml_parser::parse_shared_strings(&xml)?,
            None => SharedStrings::default(),
        };
        debug!("Shared strings: {}", shared.len());

        let sheet_path = select_worksheet(container.directory())
            .ok_or_else(|| GridError::MissingEntry("no worksheet found".to_string()))?;
        debug!("Selected worksheet {}", sheet_path);

        let sheet_xml = container
            .extract(sheet_path, &self.inflater, container_config)?
            .ok_or_else(|| GridError::MissingEntry(sheet_path.to_string()))?;

        let grid = xml_parser::parse_worksheet(&sheet_xml, &shared)?;
        debug!("Worksheet {}: {} rows", sheet_path, grid.len());
        Ok(grid)
    }

    /// Decode an `.xls` file that holds an HTML table
    pub fn read_legacy_xls(&self, bytes: &[u8]) -> Result<Grid> {
        html_table::read_html_table(bytes, &self.config.legacy)
    }
}

/// Decode a payload with the default configuration
pub fn read_grid(name: &str, bytes: &[u8]) -> Result<Grid> {
    GridReader::new().read(name, bytes)
}
