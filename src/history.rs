//! Past results and the statistics built from them.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::util::{mean, progress_score};

/// One stored test result, as kept by the backend and by the local result log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub user_id: String,
    pub chars_per_minute: f64,
    pub accuracy: f64,
    pub time_seconds: f64,
    pub language: String,
    pub difficulty: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LastResult {
    pub time: Option<f64>,
    pub accuracy: Option<f64>,
    pub chars_per_minute: Option<f64>,
    pub language: Option<String>,
    pub difficulty: Option<String>,
}

/// Shortest time, highest accuracy and highest speed over all results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestPerformance {
    pub time: Option<f64>,
    pub accuracy: Option<f64>,
    pub chars_per_minute: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvgStatistics {
    pub time: Option<f64>,
    pub accuracy: Option<f64>,
    pub chars_per_minute: Option<f64>,
    #[serde(default)]
    pub total_tests: usize,
}

/// Last result against the user's own history, in percent of one standard deviation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressMetrics {
    pub speed_progress: f64,
    pub accuracy_progress: f64,
    pub time_progress: f64,
}

/// Body of `GET /api/statistics/{user_id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub last_result: Option<LastResult>,
    pub best_performance: Option<BestPerformance>,
    pub avg_statistics: Option<AvgStatistics>,
    #[serde(default)]
    pub progress_metrics: ProgressMetrics,
    #[serde(default)]
    pub all_test_results: Vec<TestRecord>,
}

impl StatisticsReport {
    /// Build the report the backend would send, from records in chronological order
    pub fn from_records(user_id: &str, records: Vec<TestRecord>) -> Result<Self> {
        let Some(last) = records.last() else {
            return Err(Error::NoStatistics(user_id.to_string()));
        };

        let speeds = column(&records, |r| r.chars_per_minute);
        let accuracies = column(&records, |r| r.accuracy);
        let times = column(&records, |r| r.time_seconds);

        let last_result = LastResult {
            time: Some(last.time_seconds),
            accuracy: Some(last.accuracy),
            chars_per_minute: Some(last.chars_per_minute),
            language: Some(last.language.clone()),
            difficulty: Some(last.difficulty.clone()),
        };

        let best_performance = BestPerformance {
            time: bounds(&times).map(|(min, _)| min),
            accuracy: bounds(&accuracies).map(|(_, max)| max),
            chars_per_minute: bounds(&speeds).map(|(_, max)| max),
        };

        let avg_statistics = AvgStatistics {
            time: mean(&times),
            accuracy: mean(&accuracies),
            chars_per_minute: mean(&speeds),
            total_tests: records.len(),
        };

        let progress_metrics = ProgressMetrics {
            speed_progress: progress_score(&speeds, false),
            accuracy_progress: progress_score(&accuracies, false),
            time_progress: progress_score(&times, true),
        };

        Ok(Self {
            last_result: Some(last_result),
            best_performance: Some(best_performance),
            avg_statistics: Some(avg_statistics),
            progress_metrics,
            all_test_results: records,
        })
    }

    pub fn total_tests(&self) -> usize {
        self.all_test_results.len()
    }

    /// (test number, value) points for the history charts, oldest first
    pub fn series<F: Fn(&TestRecord) -> f64>(&self, f: F) -> Vec<(f64, f64)> {
        self.all_test_results
            .iter()
            .enumerate()
            .map(|(i, r)| ((i + 1) as f64, f(r)))
            .collect()
    }
}

fn column<F: Fn(&TestRecord) -> f64>(records: &[TestRecord], f: F) -> Vec<f64> {
    records.iter().map(f).collect()
}

fn bounds(values: &[f64]) -> Option<(f64, f64)> {
    match values.iter().copied().minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v, v)),
        MinMaxResult::MinMax(min, max) => Some((min, max)),
    }
}

/// Anything that can produce a user's statistics
pub trait StatisticsSource: Send + Sync {
    fn load(&self, user_id: &str) -> Result<StatisticsReport>;
}

pub struct HttpStatisticsSource {
    api: ApiClient,
}

impl HttpStatisticsSource {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl StatisticsSource for HttpStatisticsSource {
    fn load(&self, user_id: &str) -> Result<StatisticsReport> {
        let path = format!("/api/statistics/{user_id}");
        match self.api.get_json::<StatisticsReport>(&path, &[]) {
            Err(Error::Http { status: 404, .. }) => {
                info!(user_id, "no statistics on server");
                Err(Error::NoStatistics(user_id.to_string()))
            }
            Ok(report) if report.all_test_results.is_empty() => {
                Err(Error::NoStatistics(user_id.to_string()))
            }
            other => other,
        }
    }
}

/// Append-only CSV log of results, used in offline mode
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records in the order they were written; a missing log is empty
    pub fn read_all(&self) -> Result<Vec<TestRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::new();
        for row in reader.deserialize::<TestRecord>() {
            match row {
                Ok(record) => records.push(record),
                Err(err) => warn!(
                    path = %self.path.display(),
                    error = %err,
                    "skipping malformed result row"
                ),
            }
        }
        Ok(records)
    }

    /// Append one record, writing the header if the log is new or empty
    pub fn append(&self, record: &TestRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let needs_header = fs::metadata(&self.path).map_or(true, |m| m.len() == 0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        debug!(path = %self.path.display(), "result appended");
        Ok(())
    }
}

/// Statistics computed from the local result log
pub struct CsvStatisticsSource {
    log: ResultLog,
}

impl CsvStatisticsSource {
    pub fn new(log: ResultLog) -> Self {
        Self { log }
    }
}

impl StatisticsSource for CsvStatisticsSource {
    fn load(&self, user_id: &str) -> Result<StatisticsReport> {
        let records = self
            .log
            .read_all()?
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect();
        StatisticsReport::from_records(user_id, records)
    }
}
