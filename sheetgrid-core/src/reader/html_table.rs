//! Reader for `.xls` files that are really HTML tables
//!
//! Many bank portals export statements as an HTML document saved with an
//! `.xls` extension. Only the first `<table>` is read.

use encoding_rs::Encoding;
use log::debug;
use scraper::{ElementRef, Html, Selector};
use std::borrow::Cow;

use super::workbook::{Grid, Row};
use crate::config::LegacyConfig;
use crate::error::{GridError, Result};

/// Decode the payload to text: BOM first, then UTF-8, then the fallback encoding.
///
/// An unknown fallback label is only an error when the fallback is needed.
pub fn decode_text<'a>(bytes: &'a [u8], config: &LegacyConfig) -> Result<Cow<'a, str>> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return Ok(text);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(Cow::Borrowed(text));
    }

    let fallback = Encoding::for_label(config.fallback_encoding.as_bytes()).ok_or_else(|| {
        GridError::LegacyFormat(format!(
            "unknown fallback encoding '{}'",
            config.fallback_encoding
        ))
    })?;
    debug!("Legacy file is not UTF-8, decoding as {}", fallback.name());
    let (text, _, _) = fallback.decode(bytes);
    Ok(text)
}

/// Extract the first `<table>` of an HTML document into rows of trimmed cell text.
///
/// Payloads without a single `<` are rejected before any parsing.
pub fn read_html_table(bytes: &[u8], config: &LegacyConfig) -> Result<Grid> {
    if !bytes.contains(&b'<') {
        return Err(GridError::LegacyFormat("not HTML with a table".to_string()));
    }

    let text = decode_text(bytes, config)?;
    let document = Html::parse_document(&text);

    let table_selector = selector("table")?;
    let row_selector = selector("tr")?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| GridError::LegacyFormat("no <table> element found".to_string()))?;

    let grid: Grid = table
        .select(&row_selector)
        .map(|tr| {
            tr.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .collect::<Row>()
        })
        .collect();

    debug!("HTML table: {} rows", grid.len());
    Ok(grid)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| GridError::LegacyFormat(format!("invalid selector '{}': {:?}", css, e)))
}
