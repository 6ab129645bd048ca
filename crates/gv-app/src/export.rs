//! JSON export of step records.

use std::io::Write;
use std::path::Path;

use gv_scope::StepRecord;

use crate::error::AppResult;

/// Serialize records as JSON lines, one record per line.
pub fn to_json_lines(records: &[StepRecord]) -> AppResult<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

/// Write records to a file as JSON lines.
pub fn write_json_lines(path: &Path, records: &[StepRecord]) -> AppResult<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(to_json_lines(records)?.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_serialize_one_per_line() {
        let record = StepRecord {
            exported_at: "2026-08-29T00:00:00Z".into(),
            sim_time_s: 1e-3,
            dt_s: 1e-3,
            failed_steps: 0,
            nodes: Vec::new(),
            components: Vec::new(),
        };
        let text = to_json_lines(&[record.clone(), record]).unwrap();
        assert_eq!(text.lines().count(), 2);
        let back: StepRecord = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(back.sim_time_s, 1e-3);
    }
}
