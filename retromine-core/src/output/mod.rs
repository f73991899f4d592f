//! Output formatting for template score tables.
//!
//! ## Supported Formats
//!
//! - **JSON**: object mapping template to score, best first
//! - **TSV**: `template<TAB>score` rows under a header line
//!
//! ## Examples
//!
//! ```rust
//! use retromine_core::config::OutputFormat;
//! use retromine_core::output::write_scores;
//! use retromine_core::results::ScoreTable;
//!
//! let table = ScoreTable::from_scores([("A>>B", 0.5)]);
//! let mut buffer = Vec::new();
//! write_scores(&mut buffer, &table, OutputFormat::Tsv)?;
//! assert_eq!(String::from_utf8(buffer)?, "template\tscore\nA>>B\t0.5\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::OutputFormat;
use crate::results::{MiningResults, ScoreTable};
use crate::types::RetroMineError;

mod formats {
    pub mod json;
    pub mod tsv;
}

use formats::{json::write_json_format, tsv::write_tsv_format};

/// Writes one score table in the requested format.
///
/// # Errors
///
/// Returns [`RetroMineError::Io`] or [`RetroMineError::Json`] when writing
/// fails.
pub fn write_scores<W: Write>(
    writer: &mut W,
    table: &ScoreTable,
    format: OutputFormat,
) -> Result<(), RetroMineError> {
    match format {
        OutputFormat::Json => write_json_format(writer, table),
        OutputFormat::Tsv => write_tsv_format(writer, table),
    }
}

/// Writes every table of a mining run into `dir` as
/// `<name>_templates.<ext>`, returning the written paths.
///
/// The unused, overlooked and novel tables are only written when the run
/// had an alternative collection.
///
/// # Errors
///
/// Returns [`RetroMineError::Io`] when a file cannot be created or written.
pub fn write_mining_results(
    dir: &Path,
    results: &MiningResults,
    format: OutputFormat,
) -> Result<Vec<PathBuf>, RetroMineError> {
    let mut tables = vec![("popular", &results.popular)];
    if let Some(unused) = &results.unused {
        tables.push(("unused", unused));
        tables.push(("overlooked", &results.overlooked));
        tables.push(("novel", &results.novel));
    }

    let mut written = Vec::with_capacity(tables.len());
    for (name, table) in tables {
        let path = dir.join(format!("{name}_templates.{}", format.extension()));
        let mut writer = BufWriter::new(File::create(&path)?);
        write_scores(&mut writer, table, format)?;
        writer.flush()?;
        log::debug!("Wrote {} templates to {}", table.len(), path.display());
        written.push(path);
    }
    Ok(written)
}
