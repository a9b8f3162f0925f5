//! Baseline from a CSV export of historical Tier 1 observations
//!
//! The file needs a header row naming `CO2`, `CH4` and `N2O` columns; other
//! columns (facility, year, ...) are ignored. Empty cells are skipped so a
//! partially populated export still yields per-gas means. Quoted fields
//! containing commas are not supported.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use super::{Baseline, BaselineError, BaselineSource, BaselineStatus};
use crate::types::Gas;

/// Re-reads the CSV on every resolve so an updated export is picked up
/// without a restart.
///
/// The first failure after a success (or at startup) is logged at warn,
/// repeats at debug.
#[derive(Debug)]
pub struct CsvBaselineSource {
    path: PathBuf,
    name: String,
    failing: AtomicBool,
}

impl CsvBaselineSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("csv:{}", path.display());
        Self {
            path,
            name,
            failing: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Baseline, BaselineError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| BaselineError::Io(self.path.clone(), e))?;
        parse_baseline(&text)
    }
}

#[async_trait]
impl BaselineSource for CsvBaselineSource {
    async fn resolve(&self) -> BaselineStatus {
        match self.load().await {
            Ok(baseline) => {
                if self.failing.swap(false, Ordering::Relaxed) {
                    info!(path = %self.path.display(), "Baseline available again");
                }
                BaselineStatus::Available(baseline)
            }
            Err(e) => {
                if self.failing.swap(true, Ordering::Relaxed) {
                    debug!(path = %self.path.display(), error = %e, "Baseline unavailable");
                } else {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Baseline unavailable, deviation falls back to raw Tier 1 values"
                    );
                }
                BaselineStatus::Unavailable
            }
        }
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// Compute per-gas means from CSV text.
pub(crate) fn parse_baseline(text: &str) -> Result<Baseline, BaselineError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let header: Vec<&str> = match lines.next() {
        Some((_, line)) => line.split(',').map(|c| c.trim().trim_matches('"')).collect(),
        None => return Err(BaselineError::MissingColumn(Gas::Co2)),
    };

    let mut columns = Vec::with_capacity(Gas::ALL.len());
    for gas in Gas::ALL {
        let idx = header
            .iter()
            .position(|c| *c == gas.symbol())
            .ok_or(BaselineError::MissingColumn(gas))?;
        columns.push((gas, idx));
    }

    let mut sums: BTreeMap<Gas, (f64, usize)> = BTreeMap::new();
    let mut rows = 0usize;
    for (line_no, line) in lines {
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        rows += 1;
        for &(gas, idx) in &columns {
            let cell = cells.get(idx).copied().unwrap_or("").trim_matches('"');
            if cell.is_empty() {
                continue;
            }
            let value: f64 = cell.parse().map_err(|_| BaselineError::InvalidValue {
                line: line_no + 1,
                gas,
                value: cell.to_string(),
            })?;
            let entry = sums.entry(gas).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    let mut means = BTreeMap::new();
    for gas in Gas::ALL {
        match sums.get(&gas) {
            Some(&(sum, n)) if n > 0 => {
                means.insert(gas, sum / n as f64);
            }
            _ => return Err(BaselineError::Empty(gas)),
        }
    }

    Ok(Baseline {
        means,
        observations: rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_means_per_gas() {
        let baseline = parse_baseline("facility,CO2,CH4,N2O\na,400,2,0.3\nb,420,4,0.5\n").unwrap();
        assert_eq!(baseline.observations, 2);
        assert!((baseline.mean(Gas::Co2).unwrap() - 410.0).abs() < 1e-9);
        assert!((baseline.mean(Gas::Ch4).unwrap() - 3.0).abs() < 1e-9);
        assert!((baseline.mean(Gas::N2o).unwrap() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_empty_cells_skipped() {
        let baseline = parse_baseline("CO2,CH4,N2O\n400,,0.3\n420,4,\n").unwrap();
        assert!((baseline.mean(Gas::Ch4).unwrap() - 4.0).abs() < 1e-9);
        assert!((baseline.mean(Gas::N2o).unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_missing_column() {
        let err = parse_baseline("CO2,CH4\n1,2\n").unwrap_err();
        assert!(matches!(err, BaselineError::MissingColumn(Gas::N2o)));
    }

    #[test]
    fn test_header_only_is_empty() {
        let err = parse_baseline("CO2,CH4,N2O\n").unwrap_err();
        assert!(matches!(err, BaselineError::Empty(Gas::Co2)));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let err = parse_baseline("CO2,CH4,N2O\n1,2,3\nx,2,3\n").unwrap_err();
        match err {
            BaselineError::InvalidValue { line, gas, .. } => {
                assert_eq!(line, 3);
                assert_eq!(gas, Gas::Co2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let source = CsvBaselineSource::new("/nonexistent/historical_ghgp.csv");
        assert_eq!(source.resolve().await, BaselineStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_failure_state_tracks_recovery() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historical_ghgp.csv");
        let source = CsvBaselineSource::new(&path);

        assert_eq!(source.resolve().await, BaselineStatus::Unavailable);
        assert!(source.failing.load(Ordering::Relaxed));
        assert_eq!(source.resolve().await, BaselineStatus::Unavailable);
        assert!(source.failing.load(Ordering::Relaxed));

        std::fs::write(&path, "CO2,CH4,N2O\n400,2,0.3\n").unwrap();
        assert!(source.resolve().await.is_available());
        assert!(!source.failing.load(Ordering::Relaxed));

        std::fs::write(&path, "CO2,CH4\n400,2\n").unwrap();
        assert_eq!(source.resolve().await, BaselineStatus::Unavailable);
        assert!(source.failing.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_file_resolves() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "CO2,CH4,N2O").unwrap();
        writeln!(file, "400,2,0.3").unwrap();
        file.flush().unwrap();

        let source = CsvBaselineSource::new(file.path());
        match source.resolve().await {
            BaselineStatus::Available(b) => assert_eq!(b.observations, 1),
            BaselineStatus::Unavailable => panic!("expected baseline"),
        }
    }
}
