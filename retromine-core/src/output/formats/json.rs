use std::io::Write;

use crate::results::ScoreTable;
use crate::types::RetroMineError;

/// Write a score table as a pretty-printed JSON object, best template first
pub fn write_json_format<W: Write>(writer: &mut W, table: &ScoreTable) -> Result<(), RetroMineError> {
    serde_json::to_writer_pretty(&mut *writer, table)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_json_keeps_rank_order() {
        let table = ScoreTable::from_scores([("low", 0.1), ("high", 0.9)]);
        let mut buffer = Vec::new();
        write_json_format(&mut buffer, &table).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output, "{\n  \"high\": 0.9,\n  \"low\": 0.1\n}\n");
    }

    #[test]
    fn test_write_json_empty_table() {
        let mut buffer = Vec::new();
        write_json_format(&mut buffer, &ScoreTable::new()).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "{}\n");
    }
}
