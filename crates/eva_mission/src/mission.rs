//! Mission plan files.
//!
//! A mission CSV has a header row and one task-letter column per EVA
//! (e.g. `EVA-1 Type`, `EVA-2 Type`). Cells of the chosen column are trimmed
//! and concatenated top to bottom into one sequence string. Every row must
//! carry a task in that column.

use anyhow::{Context, Result};
use eva_core::EvaError;
use std::io::Read;
use std::path::Path;

/// Header names of a mission file.
pub fn list_columns<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path.as_ref())
        .with_context(|| format!("Failed to open mission file: {}", path.as_ref().display()))?;
    let headers = reader.headers().context("Failed to read mission header")?;
    Ok(headers.iter().map(str::to_string).collect())
}

/// Read the task sequence stored in `column` of a mission file.
pub fn load_column<P: AsRef<Path>>(path: P, column: &str) -> Result<String> {
    let file = std::fs::File::open(path.as_ref())
        .with_context(|| format!("Failed to open mission file: {}", path.as_ref().display()))?;
    read_column(file, column)
        .with_context(|| format!("Invalid mission file: {}", path.as_ref().display()))
}

/// Same as [`load_column`] over any reader.
pub fn read_column<R: Read>(source: R, column: &str) -> Result<String> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source);

    let index = reader
        .headers()
        .context("Failed to read mission header")?
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| EvaError::missing(format!("mission column '{}'", column)))?;

    let mut sequence = String::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read mission row {}", row + 1))?;
        match record.get(index) {
            Some(cell) if !cell.is_empty() => sequence.push_str(cell),
            _ => {
                return Err(EvaError::missing(format!(
                    "task in mission row {} of column '{}'",
                    row + 1,
                    column
                ))
                .into())
            }
        }
    }
    tracing::debug!("Loaded {} task letters from column '{}'", sequence.chars().count(), column);
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PLAN: &str = "\
Step,EVA-1 Type,EVA-2 Type
1, L ,N
2,N,H
3,H,R
4,C,E
";

    #[test]
    fn test_read_column_concatenates_trimmed_cells() {
        let seq = read_column(PLAN.as_bytes(), "EVA-1 Type").unwrap();
        assert_eq!(seq, "LNHC");
        let seq = read_column(PLAN.as_bytes(), "EVA-2 Type").unwrap();
        assert_eq!(seq, "NHRE");
    }

    #[test]
    fn test_missing_column_is_missing_configuration() {
        let err = read_column(PLAN.as_bytes(), "EVA-3 Type").unwrap_err();
        let eva = err.downcast_ref::<EvaError>().expect("EvaError inside");
        assert_eq!(eva, &EvaError::missing("mission column 'EVA-3 Type'"));
    }

    #[test]
    fn test_blank_cell_stops_the_plan() {
        let plan = "Step,EVA-1 Type\n1,L\n2,\n3,H\n";
        let err = read_column(plan.as_bytes(), "EVA-1 Type").unwrap_err();
        assert_eq!(
            err.downcast_ref::<EvaError>(),
            Some(&EvaError::missing("task in mission row 2 of column 'EVA-1 Type'"))
        );
    }

    #[test]
    fn test_short_row_stops_the_plan() {
        let plan = "Step,EVA-1 Type\n1,L\n2\n3,H\n";
        let err = read_column(plan.as_bytes(), "EVA-1 Type").unwrap_err();
        assert!(err.to_string().contains("mission row 2"), "{}", err);
    }

    #[test]
    fn test_file_helpers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PLAN.as_bytes()).unwrap();

        let columns = list_columns(file.path()).unwrap();
        assert_eq!(columns, vec!["Step", "EVA-1 Type", "EVA-2 Type"]);
        assert_eq!(load_column(file.path(), "EVA-2 Type").unwrap(), "NHRE");

        assert!(load_column("/nonexistent/mission.csv", "EVA-1 Type").is_err());
    }

    #[test]
    fn test_demo_plan() {
        let plan = include_str!("../../../demos/solar_panel_installation.csv");
        assert_eq!(read_column(plan.as_bytes(), "EVA-1 Type").unwrap(), "LNHHNTCCNR");
        assert_eq!(read_column(plan.as_bytes(), "EVA-2 Type").unwrap(), "LNNHHNCPER");
    }
}
