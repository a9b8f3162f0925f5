//! emissions-edge - Edge Greenhouse-Gas Emissions Pipeline
//!
//! Converts tiered gas readings to CO2e every tick, keeps a rolling
//! history, raises threshold alerts and forwards each record downstream.
//!
//! # Usage
//!
//! ```bash
//! # Replay the built-in reference readings, log each record
//! cargo run --release
//!
//! # Accept one JSON reading per TCP connection, publish over MQTT
//! ./emissions-edge --source tcp --publisher mqtt
//!
//! # Pipe readings in as JSON lines
//! simulate_sensor | ./emissions-edge --source stdin --interval 1
//! ```
//!
//! # Environment Variables
//!
//! - `EMISSIONS_CONFIG`: Path to an `edge_config.toml`
//! - `EMISSIONS_SERVER_ADDR`: Reporting API bind address (default: 0.0.0.0:5001)
//! - `EMISSIONS_CORS_ORIGINS`: Comma-separated extra CORS origins
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use axum::Router;
use emissions_edge::advisory::AdvisoryListener;
use emissions_edge::api::{create_app, ComponentNames, DashboardState};
use emissions_edge::baseline::{BaselineSource, CsvBaselineSource, NoBaseline};
use emissions_edge::config::{EdgeConfig, PublisherKind, SourceKind};
use emissions_edge::emissions::GwpTable;
use emissions_edge::pipeline::{
    CannedSource, PipelineContext, ProcessingLoop, ReadingSource, StdinSource, TcpSource,
};
use emissions_edge::publish::{HttpPublisher, LogPublisher, MqttSession, Publisher};

/// Time allowed for tasks to finish after cancellation before exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "emissions-edge")]
#[command(about = "Edge greenhouse-gas emissions pipeline")]
#[command(version)]
struct CliArgs {
    /// Reading source (overrides [source] kind)
    #[arg(long, value_enum)]
    source: Option<SourceKind>,

    /// Listen address for `--source tcp` (default: 0.0.0.0:12345)
    #[arg(long, value_name = "HOST:PORT")]
    tcp_bind: Option<String>,

    /// Downstream sink (overrides [publisher] kind)
    #[arg(long, value_enum)]
    publisher: Option<PublisherKind>,

    /// Webhook URL for `--publisher http`
    #[arg(long, value_name = "URL")]
    http_url: Option<String>,

    /// Seconds between pipeline ticks
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// CSV of historical Tier 1 observations for deviation estimates
    #[arg(long, value_name = "PATH")]
    baseline_csv: Option<String>,

    /// Override the server address (default: "0.0.0.0:5001")
    #[arg(short, long, env = "EMISSIONS_SERVER_ADDR")]
    addr: Option<String>,

    /// Do not subscribe to cloud recommendations
    #[arg(long)]
    no_mqtt_advisories: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl CliArgs {
    /// Layer command-line overrides onto the loaded file config.
    fn apply(&self, config: &mut EdgeConfig) {
        if let Some(kind) = self.source {
            config.source.kind = kind;
        }
        if let Some(ref bind) = self.tcp_bind {
            config.source.tcp_bind = bind.clone();
        }
        if let Some(kind) = self.publisher {
            config.publisher.kind = kind;
        }
        if let Some(ref url) = self.http_url {
            config.publisher.http_url = url.clone();
        }
        if let Some(secs) = self.interval {
            config.pipeline.tick_interval_secs = secs;
        }
        if let Some(ref path) = self.baseline_csv {
            config.baseline.csv_path = path.clone();
        }
        if let Some(ref addr) = self.addr {
            config.server.addr = addr.clone();
        }
        if self.no_mqtt_advisories {
            config.mqtt.advisories = false;
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    PipelineLoop,
    AdvisoryListener,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::PipelineLoop => write!(f, "PipelineLoop"),
            TaskName::AdvisoryListener => write!(f, "AdvisoryListener"),
        }
    }
}

// ============================================================================
// Component Wiring
// ============================================================================

async fn build_source(config: &EdgeConfig) -> Result<Box<dyn ReadingSource>> {
    let source: Box<dyn ReadingSource> = match config.source.kind {
        SourceKind::Canned => {
            info!("📥 Input: canned reference readings (cyclic)");
            Box::new(CannedSource::reference())
        }
        SourceKind::Tcp => {
            let bind = &config.source.tcp_bind;
            let source = TcpSource::bind(bind)
                .await
                .with_context(|| format!("Failed to start TCP ingest on {bind}"))?;
            info!("📥 Input: TCP ingest on {} (one JSON reading per connection)", bind);
            Box::new(source)
        }
        SourceKind::Stdin => {
            info!("📥 Input: stdin (JSON readings, one per line)");
            Box::new(StdinSource::new())
        }
    };
    Ok(source)
}

fn build_publisher(
    config: &EdgeConfig,
    session: Option<&MqttSession>,
) -> Result<Box<dyn Publisher>> {
    let publisher: Box<dyn Publisher> = match (config.publisher.kind, session) {
        (PublisherKind::Log, _) => {
            info!("📤 Output: log only");
            Box::new(LogPublisher)
        }
        (PublisherKind::Mqtt, Some(session)) => {
            info!(
                "📤 Output: MQTT {}:{} topic {}",
                config.mqtt.host, config.mqtt.port, config.mqtt.data_topic
            );
            Box::new(session.publisher())
        }
        (PublisherKind::Mqtt, None) => {
            anyhow::bail!("MQTT publisher selected but no MQTT session was created")
        }
        (PublisherKind::Http, _) => {
            info!("📤 Output: HTTP POST {}", config.publisher.http_url);
            Box::new(
                HttpPublisher::new(&config.publisher.http_url)
                    .context("Failed to build HTTP publisher")?,
            )
        }
    };
    Ok(publisher)
}

fn build_baseline(config: &EdgeConfig) -> Box<dyn BaselineSource> {
    match config.baseline.csv_path() {
        Some(path) => {
            info!("📚 Baseline: {}", path.display());
            Box::new(CsvBaselineSource::new(path))
        }
        None => {
            info!("📚 Baseline: none (deviation falls back to raw Tier 1 values)");
            Box::new(NoBaseline)
        }
    }
}

// ============================================================================
// Task Spawning
// ============================================================================

/// Every task reports which one it was, so a failure can name its task.
type TaskOutcome = (TaskName, Result<()>);

/// Serve the reporting API until cancelled.
fn spawn_http_server(
    task_set: &mut JoinSet<TaskOutcome>,
    listener: tokio::net::TcpListener,
    app: Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[{}] Task starting", TaskName::HttpServer);
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { cancel_token.cancelled().await })
            .await
            .context("Reporting API server failed");
        (TaskName::HttpServer, result)
    });
}

/// Watch the tasks until shutdown.
///
/// All three tasks run until cancellation, so one that returns while the
/// token is still live stops the process, whether it returned Ok or not.
async fn run_supervisor(
    task_set: &mut JoinSet<TaskOutcome>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("🔒 Supervisor: {} tasks running", task_set.len());

    let outcome = tokio::select! {
        biased;
        _ = cancel_token.cancelled() => {
            info!("🛑 Supervisor: Shutdown signal received");
            return Ok(());
        }
        joined = task_set.join_next() => joined,
    };

    let shutting_down = cancel_token.is_cancelled();
    cancel_token.cancel();
    match outcome {
        Some(Ok((_, Ok(())))) if shutting_down => Ok(()),
        Some(Ok((task, Ok(())))) => {
            error!(task = %task, "🔒 Supervisor: Task exited before shutdown");
            Err(anyhow::anyhow!("{task} exited before shutdown"))
        }
        Some(Ok((task, Err(e)))) => {
            error!(task = %task, error = %e, "🔒 Supervisor: Task failed");
            Err(e.context(format!("{task} failed")))
        }
        Some(Err(e)) => {
            error!(error = %e, "🔒 Supervisor: Task panicked");
            Err(anyhow::anyhow!("Task panicked: {e}"))
        }
        None => Ok(()),
    }
}

/// Let cancelled tasks wind down (final statistics, graceful HTTP close).
async fn drain_tasks(task_set: &mut JoinSet<TaskOutcome>) {
    let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while let Some(joined) = task_set.join_next().await {
            match joined {
                Ok((task, Ok(()))) => info!(task = %task, "🔒 Supervisor: Task stopped"),
                Ok((task, Err(e))) => warn!(task = %task, error = %e, "🔒 Supervisor: Task failed during shutdown"),
                Err(e) => warn!(error = %e, "🔒 Supervisor: Task panicked during shutdown"),
            }
        }
    })
    .await;

    if drained.is_err() {
        warn!("🔒 Supervisor: Tasks still running after {:?}, aborting", SHUTDOWN_GRACE);
        task_set.abort_all();
    }
}

// ============================================================================
// Pipeline Runner
// ============================================================================

async fn run_pipeline(config: EdgeConfig, cancel_token: CancellationToken) -> Result<()> {
    let ctx = PipelineContext::new(GwpTable::STANDARD, config.pipeline.history_capacity);

    let needs_mqtt = config.mqtt.advisories || config.publisher.kind == PublisherKind::Mqtt;
    let session = needs_mqtt.then(|| MqttSession::new(&config.mqtt));

    let mut source = build_source(&config).await?;
    let publisher = build_publisher(&config, session.as_ref())?;
    let baseline = build_baseline(&config);

    let components = ComponentNames {
        source: source.source_name().to_string(),
        publisher: publisher.sink_name().to_string(),
        baseline: baseline.source_name().to_string(),
    };
    let state = DashboardState::new(ctx.clone(), config.pipeline.alert_threshold_kg)
        .with_components(components);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind reporting API on {}", config.server.addr))?;
    info!("🌐 Reporting API: http://{}/api/v1/data", config.server.addr);

    info!("🔒 Supervisor: Initializing task monitoring");
    let mut task_set: JoinSet<TaskOutcome> = JoinSet::new();

    // Task 1: HTTP Server
    spawn_http_server(&mut task_set, listener, app, cancel_token.clone());

    // Task 2: Pipeline Loop
    let processing_loop = ProcessingLoop::new(ctx.clone(), publisher, cancel_token.clone())
        .with_pipeline_config(&config.pipeline)
        .with_baseline(baseline);
    task_set.spawn(async move {
        info!("[{}] Task starting", TaskName::PipelineLoop);
        let _stats = processing_loop.run(source.as_mut()).await;
        (TaskName::PipelineLoop, Ok(()))
    });

    // Task 3: Advisory Listener (also drives MQTT publishes)
    if let Some(session) = session {
        let mut listener = AdvisoryListener::new(session, ctx.recommendation().clone());
        if !config.mqtt.advisories {
            listener = listener.without_subscription();
        }
        let advisory_cancel = cancel_token.clone();
        task_set.spawn(async move {
            info!("[{}] Task starting", TaskName::AdvisoryListener);
            listener.run(advisory_cancel).await;
            (TaskName::AdvisoryListener, Ok(()))
        });
    } else {
        info!("💬 Advisories: disabled");
    }

    let result = run_supervisor(&mut task_set, cancel_token).await;
    drain_tasks(&mut task_set).await;
    result
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    let mut config = EdgeConfig::load();
    args.apply(&mut config);
    config
        .validate()
        .context("Invalid configuration after applying command-line overrides")?;

    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  emissions-edge - Edge Greenhouse-Gas Emissions Pipeline");
    info!("  Tier 1/2/3 readings → CO2e → history → alerts → downstream");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        "⏱️  Tick: {}s | History: {} records | Alert > {} kg CO2e | Anomaly ceiling: {} kg CO2",
        config.pipeline.tick_interval_secs,
        config.pipeline.history_capacity,
        config.pipeline.alert_threshold_kg,
        config.pipeline.anomaly_ceiling_kg
    );
    info!("");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    run_pipeline(config, cancel_token).await?;

    info!("");
    info!("✓ emissions-edge shutdown complete");
    Ok(())
}
