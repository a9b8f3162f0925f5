//! Tick-driven processing loop shared across all reading sources.
//!
//! One cycle per tick:
//!
//! ```text
//! Idle → Fetching → Validating → Converting → Aggregating → Publishing → Idle
//! ```
//!
//! Every failure ends the tick early and returns to `Idle`; none is fatal.

use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::source::{ReadingSource, SourceError};
use super::{PipelineContext, PipelineStats};
use crate::baseline::{BaselineSource, NoBaseline};
use crate::config::defaults::TICK_INTERVAL_SECS;
use crate::config::PipelineConfig;
use crate::emissions::{
    AlertEvaluator, DeviationEstimator, GasConverter, ReadingValidator, ValidationError,
};
use crate::publish::Publisher;
use crate::types::ProcessedRecord;

/// Source failures are logged at warn on the first occurrence and then once
/// per this many consecutive failures.
const SOURCE_FAILURE_LOG_EVERY: u64 = 12;

// ============================================================================
// Stage / Outcome
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Fetching,
    Validating,
    Converting,
    Aggregating,
    Publishing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Fetching => "fetching",
            PipelineStage::Validating => "validating",
            PipelineStage::Converting => "converting",
            PipelineStage::Aggregating => "aggregating",
            PipelineStage::Publishing => "publishing",
        };
        f.write_str(name)
    }
}

/// Result of a single tick.
#[derive(Debug)]
pub enum TickOutcome {
    /// A record was produced and stored. `published` is false when the sink failed.
    Processed {
        record: ProcessedRecord,
        published: bool,
    },
    /// The reading failed validation; nothing was stored or published.
    Rejected(ValidationError),
    /// The source produced no reading this tick.
    SourceUnavailable(SourceError),
    /// Cancellation arrived while waiting on the source.
    Cancelled,
}

// ============================================================================
// Processing Loop
// ============================================================================

/// Owns all state needed for the tick loop.
///
/// Built with [`new()`](ProcessingLoop::new), optionally configured with
/// [`with_pipeline_config()`](ProcessingLoop::with_pipeline_config) and
/// [`with_baseline()`](ProcessingLoop::with_baseline), then consumed by
/// [`run()`](ProcessingLoop::run). Tests drive single ticks with
/// [`tick()`](ProcessingLoop::tick).
pub struct ProcessingLoop {
    ctx: PipelineContext,
    validator: ReadingValidator,
    converter: GasConverter,
    deviations: DeviationEstimator,
    alerts: AlertEvaluator,
    baseline: Box<dyn BaselineSource>,
    publisher: Box<dyn Publisher>,
    cancel_token: CancellationToken,
    interval: Duration,
    stage: PipelineStage,
    stats: PipelineStats,
    consecutive_source_failures: u64,
}

impl ProcessingLoop {
    pub fn new(
        ctx: PipelineContext,
        publisher: Box<dyn Publisher>,
        cancel_token: CancellationToken,
    ) -> Self {
        let converter = GasConverter::new(*ctx.gwp());
        Self {
            ctx,
            validator: ReadingValidator::default(),
            converter,
            deviations: DeviationEstimator,
            alerts: AlertEvaluator::default(),
            baseline: Box::new(NoBaseline),
            publisher,
            cancel_token,
            interval: Duration::from_secs(TICK_INTERVAL_SECS),
            stage: PipelineStage::Idle,
            stats: PipelineStats::default(),
            consecutive_source_failures: 0,
        }
    }

    /// Apply cadence and thresholds. History capacity is fixed by the context.
    pub fn with_pipeline_config(mut self, config: &PipelineConfig) -> Self {
        self.validator = ReadingValidator::new(config.anomaly_ceiling_kg);
        self.alerts = AlertEvaluator::new(config.alert_threshold_kg);
        self.interval = Duration::from_secs(config.tick_interval_secs.max(1));
        self
    }

    pub fn with_baseline(mut self, baseline: Box<dyn BaselineSource>) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Tick until cancellation. Returns final pipeline statistics.
    ///
    /// Ticks run on a fixed interval; a tick that overruns is followed
    /// immediately by the next, later ticks shift rather than burst.
    pub async fn run<S: ReadingSource + ?Sized>(mut self, source: &mut S) -> PipelineStats {
        info!(
            source = source.source_name(),
            sink = self.publisher.sink_name(),
            baseline = self.baseline.source_name(),
            interval_secs = self.interval.as_secs_f64(),
            "📊 Processing readings"
        );
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("[ProcessingLoop] Shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {}
            }

            if let TickOutcome::Cancelled = self.tick(source).await {
                info!("[ProcessingLoop] Shutdown signal received");
                break;
            }
        }

        log_final_stats(&self.stats, self.ctx.history_capacity().await);
        self.stats
    }

    /// Run exactly one cycle against `source`.
    pub async fn tick<S: ReadingSource + ?Sized>(&mut self, source: &mut S) -> TickOutcome {
        let outcome = self.tick_inner(source).await;
        if !matches!(outcome, TickOutcome::Cancelled) {
            self.stats.ticks += 1;
        }
        self.enter(PipelineStage::Idle);
        self.ctx.publish_stats(&self.stats).await;
        outcome
    }

    async fn tick_inner<S: ReadingSource + ?Sized>(&mut self, source: &mut S) -> TickOutcome {
        // Fetching
        self.enter(PipelineStage::Fetching);
        let fetched = tokio::select! {
            _ = self.cancel_token.cancelled() => return TickOutcome::Cancelled,
            fetched = source.next_reading() => fetched,
        };
        let reading = match fetched {
            Ok(reading) => {
                if self.consecutive_source_failures > 0 {
                    info!(
                        failures = self.consecutive_source_failures,
                        "Source {} recovered",
                        source.source_name()
                    );
                }
                self.consecutive_source_failures = 0;
                reading
            }
            Err(e) => {
                self.stats.source_failures += 1;
                self.consecutive_source_failures += 1;
                let n = self.consecutive_source_failures;
                if n == 1 || n % SOURCE_FAILURE_LOG_EVERY == 0 {
                    warn!(code = e.code(), consecutive = n, "Source {} unavailable: {}", source.source_name(), e);
                } else {
                    debug!(code = e.code(), consecutive = n, "Source {} unavailable: {}", source.source_name(), e);
                }
                return TickOutcome::SourceUnavailable(e);
            }
        };

        // Validating
        self.enter(PipelineStage::Validating);
        let reading = match self.validator.validate(reading) {
            Ok(reading) => reading,
            Err(e) => {
                self.stats.validation_rejects += 1;
                warn!(code = e.code(), "Reading rejected: {}", e);
                return TickOutcome::Rejected(e);
            }
        };

        // Converting
        self.enter(PipelineStage::Converting);
        let co2e = self.converter.to_co2e(&reading);

        // Aggregating
        self.enter(PipelineStage::Aggregating);
        let baseline = self.baseline.resolve().await;
        let deviation = self.deviations.deviation(&reading, &baseline);
        let alert = self.alerts.is_alert(co2e);
        let record = ProcessedRecord {
            time: chrono::Utc::now(),
            data: reading,
            co2e,
            deviation,
            alert,
        };
        self.ctx.push_record(record.clone()).await;
        self.stats.records_produced += 1;
        self.stats.last_record_time = Some(record.time);

        if alert {
            self.stats.alerts += 1;
            warn!(
                co2e = record.co2e,
                threshold_kg = self.alerts.threshold_kg(),
                "🚨 ALERT: CO2e exceeds {}",
                describe_threshold(self.alerts.threshold_kg())
            );
        }
        info!(
            co2e = record.co2e,
            alert,
            degraded_deviation = record.deviation.is_degraded(),
            "Record #{} processed",
            self.stats.records_produced
        );

        // Publishing
        self.enter(PipelineStage::Publishing);
        let published = match self.publisher.publish(&record.publish_payload()).await {
            Ok(()) => true,
            Err(e) => {
                self.stats.publish_failures += 1;
                warn!(code = e.code(), sink = self.publisher.sink_name(), "Publish failed: {}", e);
                false
            }
        };

        TickOutcome::Processed { record, published }
    }

    fn enter(&mut self, stage: PipelineStage) {
        self.stage = stage;
        debug!(stage = %stage, "Pipeline stage");
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// "1 ton" for the default threshold, kilograms otherwise.
fn describe_threshold(threshold_kg: f64) -> String {
    if threshold_kg == 1000.0 {
        "1 ton".to_string()
    } else {
        format!("{threshold_kg} kg")
    }
}

fn log_final_stats(stats: &PipelineStats, history_capacity: usize) {
    info!("");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("📊 FINAL STATISTICS");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("   Ticks:                {}", stats.ticks);
    info!("   Records Produced:     {}", stats.records_produced);
    info!("   Alerts:               {}", stats.alerts);
    info!("   Validation Rejects:   {}", stats.validation_rejects);
    info!("   Source Failures:      {}", stats.source_failures);
    info!("   Publish Failures:     {}", stats.publish_failures);
    info!("   History Capacity:     {}", history_capacity);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
