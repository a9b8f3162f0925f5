//! Pipeline Context and Shared State
//!
//! State shared between the pipeline loop, the advisory listener and the
//! API handlers. The loop is the only writer of history and statistics;
//! the advisory listener is the only writer of the recommendation.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use super::history::HistoryBuffer;
use crate::config::defaults::NO_RECOMMENDATION;
use crate::emissions::GwpTable;
use crate::types::{ProcessedRecord, TieredReading};

// ============================================================================
// Latest Recommendation
// ============================================================================

/// Most recent cloud recommendation. Last writer wins.
///
/// Cloning shares the same slot, so the advisory listener and the API hold
/// handles to one value.
#[derive(Debug, Clone)]
pub struct LatestRecommendation {
    inner: Arc<ArcSwap<String>>,
}

impl Default for LatestRecommendation {
    fn default() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(NO_RECOMMENDATION.to_string())),
        }
    }
}

impl LatestRecommendation {
    pub fn set(&self, text: impl Into<String>) {
        self.inner.store(Arc::new(text.into()));
    }

    pub fn get(&self) -> String {
        self.inner.load_full().as_ref().clone()
    }

    /// True until the first advisory arrives.
    pub fn is_default(&self) -> bool {
        self.inner.load().as_str() == NO_RECOMMENDATION
    }
}

// ============================================================================
// Pipeline Statistics
// ============================================================================

/// Running counters maintained by the pipeline loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub ticks: u64,
    pub records_produced: u64,
    pub validation_rejects: u64,
    pub source_failures: u64,
    pub publish_failures: u64,
    pub alerts: u64,
    pub last_record_time: Option<chrono::DateTime<chrono::Utc>>,
}

// ============================================================================
// Data Report
// ============================================================================

/// Zero-valued stand-in for `current` before the first record exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderRecord {
    pub time: String,
    pub data: TieredReading,
    pub co2e: f64,
    pub alert: bool,
}

impl Default for PlaceholderRecord {
    fn default() -> Self {
        Self {
            time: "N/A".to_string(),
            data: TieredReading::zeroed(),
            co2e: 0.0,
            alert: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CurrentRecord {
    Record(ProcessedRecord),
    Placeholder(PlaceholderRecord),
}

/// Dashboard view: `{current, history, recommendation}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataReport {
    pub current: CurrentRecord,
    pub history: Vec<ProcessedRecord>,
    pub recommendation: String,
}

// ============================================================================
// Pipeline Context
// ============================================================================

/// Handles shared by every long-running task.
///
/// Cheap to clone; all clones refer to the same history, statistics and
/// recommendation.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    gwp: GwpTable,
    history: Arc<RwLock<HistoryBuffer>>,
    stats: Arc<RwLock<PipelineStats>>,
    recommendation: LatestRecommendation,
    started: Instant,
}

impl PipelineContext {
    pub fn new(gwp: GwpTable, history_capacity: usize) -> Self {
        Self {
            gwp,
            history: Arc::new(RwLock::new(HistoryBuffer::new(history_capacity))),
            stats: Arc::new(RwLock::new(PipelineStats::default())),
            recommendation: LatestRecommendation::default(),
            started: Instant::now(),
        }
    }

    pub fn gwp(&self) -> &GwpTable {
        &self.gwp
    }

    pub fn recommendation(&self) -> &LatestRecommendation {
        &self.recommendation
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub async fn history_snapshot(&self) -> Vec<ProcessedRecord> {
        self.history.read().await.snapshot()
    }

    pub async fn latest(&self) -> Option<ProcessedRecord> {
        self.history.read().await.latest().cloned()
    }

    pub async fn history_capacity(&self) -> usize {
        self.history.read().await.capacity()
    }

    pub async fn stats(&self) -> PipelineStats {
        self.stats.read().await.clone()
    }

    /// Assemble the dashboard report from one consistent history snapshot.
    pub async fn report(&self) -> DataReport {
        let history = self.history_snapshot().await;
        let current = match history.last() {
            Some(record) => CurrentRecord::Record(record.clone()),
            None => CurrentRecord::Placeholder(PlaceholderRecord::default()),
        };
        DataReport {
            current,
            history,
            recommendation: self.recommendation.get(),
        }
    }

    pub(crate) async fn push_record(&self, record: ProcessedRecord) {
        self.history.write().await.push(record);
    }

    pub(crate) async fn publish_stats(&self, stats: &PipelineStats) {
        *self.stats.write().await = stats.clone();
    }
}
