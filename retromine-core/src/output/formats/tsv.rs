use std::io::Write;

use crate::results::ScoreTable;
use crate::types::RetroMineError;

/// Write a score table as `template<TAB>score` rows under a header line.
///
/// Scores use the shortest form that parses back to the same value.
pub fn write_tsv_format<W: Write>(writer: &mut W, table: &ScoreTable) -> Result<(), RetroMineError> {
    writeln!(writer, "template\tscore")?;
    for (template, score) in table.iter() {
        writeln!(writer, "{template}\t{score}")?;
    }
    Ok(())
}
