//! Readers for route collections and the side tables mining needs.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use serde_json::Value;

use crate::config::AnalysisConfig;
use crate::library::TemplateLibrary;
use crate::results::ScoreTable;
use crate::route::RouteBatch;
use crate::scoring::StockTable;
use crate::types::RetroMineError;

/// Column holding canonical templates in tabular template libraries
const LIBRARY_COLUMN: &str = "canonical_smarts";

/// Reads route search output.
///
/// # Errors
///
/// Returns [`RetroMineError::Io`] when the file cannot be read and
/// [`RetroMineError::Json`] or [`RetroMineError::InvalidRoute`] for
/// malformed content.
pub fn read_route_batch(path: impl AsRef<Path>) -> Result<RouteBatch, RetroMineError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let value: Value = serde_json::from_reader(reader)?;
    let batch = RouteBatch::from_value(value)?;
    log::info!("Loaded {} targets from {}", batch.len(), path.display());
    Ok(batch)
}

/// Reads a stock table from JSON or TSV.
///
/// # Errors
///
/// Returns [`RetroMineError::Parse`] for malformed TSV rows.
pub fn read_stock_table(path: impl AsRef<Path>) -> Result<StockTable, RetroMineError> {
    parse_stock_table(&fs::read_to_string(path)?)
}

/// Parses a stock table.
///
/// A document starting with `{` is read as a JSON object of key to price.
/// Anything else is read as `key<TAB>price` rows; blank lines and `#`
/// comments are skipped and a first row whose price is not a number is
/// taken as a header.
///
/// # Errors
///
/// Returns [`RetroMineError::Json`] or [`RetroMineError::Parse`] for
/// malformed content.
pub fn parse_stock_table(text: &str) -> Result<StockTable, RetroMineError> {
    if text.trim_start().starts_with('{') {
        return Ok(serde_json::from_str(text)?);
    }

    let mut stock = StockTable::new();
    let mut first_row = true;
    for (number, line) in data_lines(text) {
        let mut fields = line.split('\t');
        let (Some(key), Some(price)) = (fields.next(), fields.next()) else {
            return Err(RetroMineError::Parse(format!(
                "stock line {number}: expected 'key<TAB>price'"
            )));
        };
        match price.trim().parse::<f64>() {
            Ok(price) => stock.insert(key.trim(), price),
            Err(_) if first_row => {}
            Err(err) => {
                return Err(RetroMineError::Parse(format!(
                    "stock line {number}: invalid price '{}': {err}",
                    price.trim()
                )));
            }
        }
        first_row = false;
    }
    Ok(stock)
}

/// Reads a reference template library.
///
/// # Errors
///
/// Returns [`RetroMineError::Parse`] when a tabular library has rows
/// without the template column.
pub fn read_template_library(path: impl AsRef<Path>) -> Result<TemplateLibrary, RetroMineError> {
    parse_template_library(&fs::read_to_string(path)?)
}

/// Parses a template library: one template per line, or TSV with a
/// `canonical_smarts` header column.
///
/// # Errors
///
/// Returns [`RetroMineError::Parse`] when a row lacks the template column.
pub fn parse_template_library(text: &str) -> Result<TemplateLibrary, RetroMineError> {
    let mut lines = data_lines(text).peekable();
    let column = lines.peek().and_then(|(_, header)| {
        header
            .split('\t')
            .position(|name| name.trim() == LIBRARY_COLUMN)
    });
    if column.is_some() {
        lines.next();
    }
    let column = column.unwrap_or(0);

    let mut library = TemplateLibrary::new();
    for (number, line) in lines {
        let template = line.split('\t').nth(column).ok_or_else(|| {
            RetroMineError::Parse(format!(
                "library line {number}: missing column {LIBRARY_COLUMN}"
            ))
        })?;
        library.insert(template.trim());
    }
    Ok(library)
}

/// Reads a JSON score table, re-ranked by score.
///
/// # Errors
///
/// Returns [`RetroMineError::Json`] for anything but an object of numbers.
pub fn read_score_table(path: impl AsRef<Path>) -> Result<ScoreTable, RetroMineError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Reads an analysis configuration from JSON; missing fields take defaults.
///
/// # Errors
///
/// Returns [`RetroMineError::Json`] for malformed files and
/// [`RetroMineError::Configuration`] for out-of-range values.
pub fn read_config(path: impl AsRef<Path>) -> Result<AnalysisConfig, RetroMineError> {
    let reader = BufReader::new(File::open(path)?);
    let config: AnalysisConfig = serde_json::from_reader(reader)?;
    config.validate()?;
    Ok(config)
}

/// Non-blank, non-comment lines with their 1-based line numbers.
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
}
