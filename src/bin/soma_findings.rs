// soma_findings - BODY organ daemon
// Metadata findings service accessible via Unix Domain Socket

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use soma_findings::organ::{FindingsOrgan, Organ, Response, Stimulus};
use soma_findings::wire::{read_frame, write_frame};
use soma_findings::{EngineConfig, FindingsEngine, UdsEnhancedClient};

#[derive(Parser)]
#[command(name = "soma_findings", version, about = "SOMA Findings Daemon - Metadata Findings Organ")]
struct Args {
    /// Unix socket path for UDS server
    #[arg(long, default_value = "/tmp/soma_findings.sock")]
    socket_path: String,

    /// Socket of the enhanced extraction organ; rule-based only when unset
    #[arg(long)]
    enhanced_socket: Option<String>,

    /// Upper bound on the enhanced extraction call
    #[arg(long, default_value_t = 8000)]
    enhanced_timeout_ms: u64,

    /// JSON device table replacing the bundled one
    #[arg(long)]
    device_database: Option<PathBuf>,

    /// Omit findings for absent fields instead of emitting "not available"
    #[arg(long)]
    omit_unavailable: bool,

    /// Extract findings from one metadata JSON file, print them and exit
    #[arg(long, value_name = "FILE")]
    once: Option<PathBuf>,
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default()
            .with_timeout(Duration::from_millis(self.enhanced_timeout_ms))
            .with_unavailable(!self.omit_unavailable);
        if let Some(path) = &self.device_database {
            config = config.with_device_database(path);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut engine = FindingsEngine::new(&args.engine_config())
        .context("Failed to initialize findings engine")?;
    if let Some(enhanced_socket) = &args.enhanced_socket {
        engine = engine.with_enhancer(Arc::new(UdsEnhancedClient::new(enhanced_socket)));
    }
    let engine = Arc::new(engine);

    if let Some(path) = &args.once {
        return run_once(&engine, path).await;
    }

    info!("🔎 Starting SOMA Findings Daemon");
    info!("   Socket: {}", args.socket_path);
    match &args.enhanced_socket {
        Some(socket) => info!("   Enhanced: {} ({}ms bound)", socket, args.enhanced_timeout_ms),
        None => info!("   Enhanced: disabled (rule-based findings only)"),
    }

    // Track startup time for health checks
    let start_time = Instant::now();

    let organ = Arc::new(FindingsOrgan::with_engine(engine));
    let card = organ.describe();
    info!("   ✓ {} v{} with {} functions", card.name, card.version, card.functions.len());

    // Remove old socket if exists
    let socket_path = PathBuf::from(&args.socket_path);
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)
            .context("Failed to remove old socket")?;
    }

    // Create UDS listener
    let listener = UnixListener::bind(&socket_path)
        .context("Failed to bind Unix socket")?;

    info!("   ✓ Listening on {}", args.socket_path);

    // Serve requests
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let organ = Arc::clone(&organ);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, organ, start_time).await {
                        error!("Connection error: {:#}", e);
                    }
                });
            }
            Err(e) => {
                error!("Accept error: {}", e);
            }
        }
    }
}

/// One-shot mode: metadata JSON file in, findings report JSON out
async fn run_once(engine: &FindingsEngine, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let tree: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse metadata JSON in {}", path.display()))?;

    let report = engine.extract_report(&tree).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Handle a single UDS connection
async fn handle_connection(
    mut stream: UnixStream,
    organ: Arc<FindingsOrgan>,
    start_time: Instant,
) -> Result<()> {
    loop {
        let stimulus: Stimulus = match read_frame(&mut stream)
            .await
            .context("Failed to read stimulus")?
        {
            Some(stimulus) => stimulus,
            None => {
                debug!("Client disconnected");
                return Ok(());
            }
        };

        debug!("Received: op={}", stimulus.op);

        // Handle health check specially (no organ processing needed)
        let response = if stimulus.op == "health" || stimulus.op == "health.check" {
            Response {
                ok: true,
                output: serde_json::json!({
                    "status": "healthy",
                    "organ": "soma_findings",
                    "version": env!("CARGO_PKG_VERSION"),
                    "uptime_ms": start_time.elapsed().as_millis() as u64,
                }),
                latency_ms: 0,
                cost: None,
            }
        } else {
            // Process via Organ trait
            match organ.stimulate(stimulus).await {
                Ok(resp) => resp,
                Err(e) => {
                    error!("Stimulate error: {:?}", e);
                    Response::error(e.to_string(), 0)
                }
            }
        };

        write_frame(&mut stream, &response)
            .await
            .context("Failed to write response")?;

        debug!("Sent: ok={}, latency={}ms", response.ok, response.latency_ms);
    }
}
