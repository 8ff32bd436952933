//! Mission log table.
//!
//! One record per engine call, preceded by three reference records:
//! `B` (baseline snapshot), `MIN` and `MAX` (limit bounds per variable).
//! Values are rounded to a fixed number of decimals when written.

use anyhow::{Context, Result};
use eva_core::{PhysiologicalState, PhysiologyProfile, Variable};
use std::io::Write;
use std::path::Path;

pub const BASELINE_LABEL: &str = "B";
pub const MIN_LABEL: &str = "MIN";
pub const MAX_LABEL: &str = "MAX";

/// Decimal places beyond this are noise for an `f64`.
pub const MAX_PRECISION: u32 = 15;

/// Round `value` to `precision` decimal places, capped at [`MAX_PRECISION`].
/// Non-finite values pass through.
pub fn round_to(value: f64, precision: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(precision.min(MAX_PRECISION) as i32);
    (value * scale).round() / scale
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub label: String,
    pub task: String,
    /// Indexed like [`Variable::ALL`].
    pub values: [f64; Variable::COUNT],
    pub mission_elapsed_time: u64,
}

impl LogRecord {
    pub fn from_state(label: impl Into<String>, task: impl Into<String>, state: &PhysiologicalState) -> Self {
        let mut values = [0.0; Variable::COUNT];
        for (var, value) in state.values() {
            values[var.index()] = value;
        }
        Self {
            label: label.into(),
            task: task.into(),
            values,
            mission_elapsed_time: state.mission_elapsed_time,
        }
    }

    pub fn get(&self, var: Variable) -> f64 {
        self.values[var.index()]
    }
}

/// Layout options for [`EvaLog::write_csv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    pub precision: u32,
    /// Variables as rows, records as columns.
    pub transpose: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            precision: 4,
            transpose: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaLog {
    records: Vec<LogRecord>,
}

impl EvaLog {
    /// Start a log with the baseline snapshot and the limit records.
    pub fn new(profile: &PhysiologyProfile, initial: &PhysiologicalState) -> Self {
        let bound = |label: &str, pick: fn(eva_core::Limits) -> f64| {
            let mut values = [0.0; Variable::COUNT];
            for var in Variable::ALL {
                values[var.index()] = pick(profile.limits(var));
            }
            LogRecord {
                label: label.to_string(),
                task: label.to_string(),
                values,
                mission_elapsed_time: 0,
            }
        };
        Self {
            records: vec![
                LogRecord::from_state(BASELINE_LABEL, BASELINE_LABEL, initial),
                bound(MIN_LABEL, |l| l.min),
                bound(MAX_LABEL, |l| l.max),
            ],
        }
    }

    pub fn push(&mut self, record: LogRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Records after the three reference records.
    pub fn steps(&self) -> &[LogRecord] {
        &self.records[3..]
    }

    pub fn last(&self) -> &LogRecord {
        // `new` always seeds three records
        &self.records[self.records.len() - 1]
    }

    pub fn write_csv<W: Write>(&self, writer: W, options: LogOptions) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        let fmt = |v: f64| round_to(v, options.precision).to_string();

        if options.transpose {
            let mut header = vec![String::new()];
            header.extend(self.records.iter().map(|r| r.label.clone()));
            out.write_record(&header)?;

            let mut row = vec!["task".to_string()];
            row.extend(self.records.iter().map(|r| r.task.clone()));
            out.write_record(&row)?;

            for var in Variable::ALL {
                let mut row = vec![var.name().to_string()];
                row.extend(self.records.iter().map(|r| fmt(r.get(var))));
                out.write_record(&row)?;
            }

            let mut row = vec!["mission_elapsed_time".to_string()];
            row.extend(self.records.iter().map(|r| r.mission_elapsed_time.to_string()));
            out.write_record(&row)?;
        } else {
            let mut header = vec!["label".to_string(), "task".to_string()];
            header.extend(Variable::ALL.iter().map(|v| v.name().to_string()));
            header.push("mission_elapsed_time".to_string());
            out.write_record(&header)?;

            for record in &self.records {
                let mut row = vec![record.label.clone(), record.task.clone()];
                row.extend(record.values.iter().map(|v| fmt(*v)));
                row.push(record.mission_elapsed_time.to_string());
                out.write_record(&row)?;
            }
        }

        out.flush().context("Failed to flush log")?;
        Ok(())
    }

    /// Write the log to `path`, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P, options: LogOptions) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        self.write_csv(file, options)?;
        tracing::info!("Log written to {} ({} records)", path.display(), self.records.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eva_core::Astronaut;
    use std::sync::Arc;

    fn sample_log() -> EvaLog {
        let profile = Arc::new(PhysiologyProfile::default());
        let mut a = Astronaut::new(Arc::clone(&profile));
        let mut log = EvaLog::new(&profile, a.state());
        a.work_normal(10).unwrap();
        log.push(LogRecord::from_state("10", "N", a.state()));
        log
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(37.005555556, 4), 37.0056);
        assert_eq!(round_to(0.1 + 0.2, 4), 0.3);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(f64::INFINITY, 4), f64::INFINITY);
    }

    #[test]
    fn test_round_to_caps_precision() {
        assert_eq!(round_to(37.0, 400), 37.0);
        assert_eq!(round_to(0.98, u32::MAX), 0.98);
        assert!(round_to(37.123456789, 1000).is_finite());
    }

    #[test]
    fn test_unbounded_limits_are_written_as_infinity() {
        let defaults = PhysiologyProfile::default();
        let mut text = String::from("[baseline]\n");
        for var in Variable::ALL {
            text.push_str(&format!("{} = {:?}\n", var.name(), defaults.baseline(var)));
        }
        text.push_str(
            "[limits]\nheart_rate = { min = 40.0, max = 180.0 }\n\
             [tasks.rest]\n[tasks.low]\n[tasks.normal]\n[tasks.hard]\n[tasks.cognitive]\n[tasks.emergency]\n",
        );
        let profile = PhysiologyProfile::from_toml_str(&text).unwrap();
        assert!(!profile.limits(Variable::CoreTemp).is_bounded());

        let state = eva_core::PhysiologicalState::from_baseline(
            |v| profile.baseline(v),
            eva_core::Anthropometrics::default(),
        );
        let log = EvaLog::new(&profile, &state);
        assert_eq!(log.records()[1].get(Variable::CoreTemp), f64::NEG_INFINITY);
        assert_eq!(log.records()[2].get(Variable::CoreTemp), f64::INFINITY);

        let mut buf = Vec::new();
        log.write_csv(&mut buf, LogOptions { precision: 4, transpose: true }).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("heart_rate,70,40,180"), "{}", text);
        assert!(text.contains("core_temp,37,-inf,inf"), "{}", text);
    }

    #[test]
    fn test_reference_records_come_first() {
        let log = sample_log();
        let labels: Vec<_> = log.records().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "MIN", "MAX", "10"]);
        assert_eq!(log.records()[0].get(Variable::HeartRate), 70.0);
        assert_eq!(log.records()[1].get(Variable::HeartRate), 40.0);
        assert_eq!(log.records()[2].get(Variable::HeartRate), 180.0);
        assert_eq!(log.steps().len(), 1);
        assert_eq!(log.last().mission_elapsed_time, 10);
    }

    #[test]
    fn test_csv_rows() {
        let log = sample_log();
        let mut buf = Vec::new();
        log.write_csv(&mut buf, LogOptions::default()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("label,task,heart_rate,blood_pressure_sys,"));
        assert!(lines[0].ends_with(",radiation_dose,mission_elapsed_time"));
        assert!(lines[1].starts_with("B,B,70,120,80,12,0.98,"));
        assert!(lines[4].starts_with("10,N,110,"));
        assert!(lines[4].ends_with(",10"));
    }

    #[test]
    fn test_csv_transposed() {
        let log = sample_log();
        let mut buf = Vec::new();
        log.write_csv(
            &mut buf,
            LogOptions {
                precision: 4,
                transpose: true,
            },
        )
        .unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 2 + Variable::COUNT + 1);
        assert_eq!(lines[0], ",B,MIN,MAX,10");
        assert_eq!(lines[1], "task,B,MIN,MAX,N");
        assert_eq!(lines[2], "heart_rate,70,40,180,110");
        assert_eq!(lines[lines.len() - 1], "mission_elapsed_time,0,0,0,10");
    }

    #[test]
    fn test_precision_applies_on_write() {
        let profile = PhysiologyProfile::default();
        let mut state = eva_core::PhysiologicalState::from_baseline(
            |v| profile.baseline(v),
            eva_core::Anthropometrics::default(),
        );
        state.core_temp = 37.123456;
        let mut log = EvaLog::new(&profile, &state);
        log.push(LogRecord::from_state("1", "N", &state));

        let mut buf = Vec::new();
        log.write_csv(&mut buf, LogOptions { precision: 2, transpose: true }).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("core_temp,37.12,34,39,37.12"), "{}", text);
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("eva_log.csv");
        sample_log().save(&path, LogOptions::default()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 5);
    }
}
