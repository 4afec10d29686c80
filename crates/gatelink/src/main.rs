//! gatelink - gateway connection client
//!
//! Connects to a gateway, keeps the connection alive and reconnects with
//! exponential backoff, resuming the session whenever the peer allows it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use gatelink::handshake::{await_hello, opening_command};
use gatelink::ws::WsTransport;
use gatelink::{
    EngineOutcome, GatelinkConfig, GatelinkError, GatewayEngine, Interruption, RecoveryPlan,
    ResumeState, StandardProtocol, Transport,
};
use gatelink_proto::Payload;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "gatelink")]
#[command(about = "Persistent gateway connection client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and stay connected until interrupted
    Run {
        /// Path to config file
        #[arg(short, long, default_value = "gatelink.toml")]
        config: PathBuf,

        /// Gateway URL (overrides the config file)
        #[arg(long, env = "GATELINK_URL")]
        url: Option<String>,

        /// Authentication token (overrides the config file)
        #[arg(long, env = "GATELINK_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Generate a sample config file
    InitConfig {
        /// Path to write config
        #[arg(short, long, default_value = "gatelink.toml")]
        output: PathBuf,

        /// Gateway URL
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("gatelink=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, url, token } => run_client(config, url, token).await?,
        Commands::InitConfig { output, url } => init_config(output, url)?,
    }

    Ok(())
}

async fn run_client(
    config_path: PathBuf,
    url: Option<String>,
    token: Option<String>,
) -> anyhow::Result<()> {
    info!(config = %config_path.display(), "starting gatelink");

    let mut config = GatelinkConfig::from_file(&config_path)?;
    if let Some(url) = url {
        config.url = url;
    }
    if token.is_some() {
        config.token = token;
    }
    config.validate()?;

    let token = config
        .token
        .clone()
        .context("no token configured: set `token` in the config file or pass --token")?;
    let protocol = Arc::new(StandardProtocol::new(token, config.intents));
    let reconnect = config.reconnect_config();

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            on_signal.cancel();
        }
    });

    let mut session = ResumeState::new();
    let mut resume = false;
    let mut attempt: u32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            () = shutdown.cancelled() => Ok(EngineOutcome::Success),
            result = connect_once(&config, &protocol, &mut session, resume, shutdown.clone()) => result,
        };

        let outcome = match result {
            Ok(outcome) => {
                attempt = 1;
                outcome
            }
            Err(e) => {
                warn!(error = %e, "connection attempt failed");
                attempt = attempt.saturating_add(1);
                let interruption = if resume {
                    Interruption::resumable(e.to_string())
                } else {
                    Interruption::fresh(e.to_string())
                };
                EngineOutcome::Recoverable(interruption)
            }
        };

        match reconnect.plan(&outcome, attempt) {
            RecoveryPlan::Stop => {
                info!("gatelink stopped");
                return Ok(());
            }
            RecoveryPlan::Abort => {
                error!(outcome = outcome.label(), "giving up on gateway");
                anyhow::bail!("gateway connection ended: {}", describe(&outcome));
            }
            RecoveryPlan::Retry { delay, resume: resumable } => {
                resume = resumable && session.ticket().is_some();
                info!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    resume,
                    "reconnecting"
                );
                tokio::select! {
                    () = shutdown.cancelled() => {
                        info!("gatelink stopped");
                        return Ok(());
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

/// Open one connection, complete the handshake and run the engine on it.
///
/// The inbound buffer is drained on this task while the engine runs, feeding
/// the session state used for resuming.
async fn connect_once(
    config: &GatelinkConfig,
    protocol: &Arc<StandardProtocol>,
    session: &mut ResumeState,
    resume: bool,
    shutdown: CancellationToken,
) -> Result<EngineOutcome, GatelinkError> {
    let url = if resume {
        session.resume_url().unwrap_or(config.url.as_str())
    } else {
        config.url.as_str()
    };
    let (sink, mut source) = WsTransport::connect(url, config.connect_timeout())
        .await?
        .split();

    let hello = await_hello(&mut source, config.handshake_timeout()).await?;
    info!(
        interval_ms = hello.heartbeat_interval,
        resume, "gateway handshake complete"
    );

    let ticket = if resume {
        session.ticket()
    } else {
        session.clear();
        None
    };

    let (engine, mut inbound) =
        GatewayEngine::new(protocol.clone(), config.engine_config(hello.interval()));
    engine.submit_command(opening_command(protocol, ticket.as_ref())?);

    let run = engine.run((sink, source), shutdown);
    tokio::pin!(run);

    let outcome = loop {
        tokio::select! {
            outcome = &mut run => break outcome,
            Some(payload) = inbound.recv() => dispatch(session, &payload),
        }
    };
    while let Ok(payload) = inbound.try_recv() {
        dispatch(session, &payload);
    }

    Ok(outcome)
}

fn dispatch(session: &mut ResumeState, payload: &Payload) {
    session.observe(payload);
    match payload.event() {
        Some(event) => debug!(event, sequence = ?payload.sequence(), "dispatch received"),
        None => debug!(op = %payload.op(), "envelope received"),
    }
}

fn describe(outcome: &EngineOutcome) -> String {
    match outcome {
        EngineOutcome::Success => "stopped".to_string(),
        EngineOutcome::Recoverable(interruption) => {
            format!("reconnect attempts exhausted ({})", interruption.reason)
        }
        EngineOutcome::Fatal(fault) => fault.to_string(),
    }
}

fn init_config(output: PathBuf, url: Option<String>) -> anyhow::Result<()> {
    let mut config = GatelinkConfig::default();
    if let Some(url) = url {
        config.url = url;
    }
    config.validate()?;

    std::fs::write(&output, config.to_toml()?)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("Config written to {}", output.display());
    println!();
    println!("Edit the file to add your token, then run:");
    println!("  gatelink run --config {}", output.display());

    Ok(())
}
