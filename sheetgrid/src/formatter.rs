//! Output formatters for decoded grids

use anyhow::Result;
use colored::*;
use serde::Serialize;
use sheetgrid_core::{Grid, GridError};
use std::path::PathBuf;

/// Decode result for one input file
pub struct Outcome {
    pub path: PathBuf,
    pub result: std::result::Result<Grid, GridError>,
}

/// JSON shape of one input file
#[derive(Serialize)]
struct FileReport<'a> {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<&'a Grid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Print grids in human-readable format, one block per file
pub fn print_human(outcomes: &[Outcome], headers: bool) {
    for outcome in outcomes {
        println!("{}", format!("File: {}", outcome.path.display()).bold());

        let grid = match &outcome.result {
            Ok(grid) => grid,
            Err(e) => {
                println!("  {} {}", "ERROR".red().bold(), e);
                println!();
                continue;
            }
        };

        if grid.is_empty() {
            println!("  {}", "(no rows)".bright_black());
            println!();
            continue;
        }

        for (index, row) in grid.iter().enumerate() {
            let line = row.join(" | ");
            if headers && index == 0 {
                println!("  {}", line.cyan().bold());
            } else {
                println!("  {}", line);
            }
        }

        let data_rows = if headers { grid.len() - 1 } else { grid.len() };
        println!("  {} {}", "Rows:".bold(), data_rows);
        println!();
    }
}

/// Print grids in JSON format
pub fn print_json(outcomes: &[Outcome]) -> Result<()> {
    let reports: Vec<FileReport<'_>> = outcomes
        .iter()
        .map(|outcome| FileReport {
            file: outcome.path.display().to_string(),
            rows: outcome.result.as_ref().ok(),
            error: outcome.result.as_ref().err().map(|e| e.to_string()),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
