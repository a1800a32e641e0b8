use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solver_config::ConfigLoader;
use solver_service::{api::ApiServer, service::build_quote_service};
use solver_types::{QuoteEngineConfig, QuoteIntent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "quote-engine")]
#[command(about = "Cross-chain intent quote engine", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(short, long, value_name = "FILE", default_value = "config/example.toml")]
	config: PathBuf,

	/// JSON snapshot of the solver's token balances
	#[arg(short, long, value_name = "FILE", env = "SOLVER_BALANCES")]
	balances: Option<PathBuf>,

	/// Log level, overrides the configured one
	#[arg(long, env = "SOLVER_LOG_LEVEL")]
	log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
	/// Start the HTTP API
	Serve,
	/// Quote a single intent read from a JSON file
	Quote {
		#[arg(short, long, value_name = "FILE")]
		intent: PathBuf,
		/// Size the destination transfers from the reward instead
		#[arg(long)]
		reverse: bool,
	},
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

	let log_level = cli
		.log_level
		.clone()
		.unwrap_or_else(|| config.service.log_level.clone());
	setup_tracing(&log_level);

	match cli.command {
		Some(Commands::Serve) | None => serve(config, cli.balances.as_deref()).await,
		Some(Commands::Quote { intent, reverse }) => {
			quote(config, cli.balances.as_deref(), &intent, reverse).await
		},
		Some(Commands::Validate) => {
			validate(&config);
			Ok(())
		},
	}
}

async fn serve(config: QuoteEngineConfig, balances: Option<&Path>) -> Result<()> {
	info!("Starting {}", config.service.name);
	let port = config.service.http_port;

	let quotes = build_quote_service(config, balances)
		.await
		.context("Failed to build quote service")?;

	ApiServer::new(port, Arc::new(quotes))
		.run(shutdown_signal())
		.await
		.context("API server failed")?;

	info!("Quote engine stopped");
	Ok(())
}

async fn quote(
	config: QuoteEngineConfig,
	balances: Option<&Path>,
	intent: &Path,
	reverse: bool,
) -> Result<()> {
	let content = tokio::fs::read_to_string(intent)
		.await
		.with_context(|| format!("Failed to read intent {}", intent.display()))?;
	let intent: QuoteIntent = serde_json::from_str(&content).context("Failed to parse intent")?;

	let quotes = build_quote_service(config, balances)
		.await
		.context("Failed to build quote service")?;

	let outcome = if reverse {
		quotes.get_reverse_quote(&intent).await
	} else {
		quotes.get_quote(&intent).await
	}
	.with_context(|| format!("Quote {} failed", intent.quote_id))?;

	for (execution_type, err) in &outcome.failures {
		error!(%execution_type, error = %err, "Execution type not quoted");
	}
	println!("{}", serde_json::to_string_pretty(&outcome.quote_data)?);
	Ok(())
}

fn validate(config: &QuoteEngineConfig) {
	info!("Configuration is valid");
	info!("Service name: {}", config.service.name);
	info!("HTTP port: {}", config.service.http_port);

	let mut chains: Vec<_> = config.solvers.values().collect();
	chains.sort_by_key(|solver| solver.chain_id);
	for solver in chains {
		info!(
			"  Solver: {} ({}), {} targets",
			solver.network,
			solver.chain_id,
			solver.targets.len()
		);
	}

	for source in &config.intent_sources {
		info!(
			"  Intent source: {} ({}), {} tokens",
			source.network,
			source.chain_id,
			source.tokens.len()
		);
	}
}

fn setup_tracing(log_level: &str) {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			error!("Failed to listen for Ctrl+C: {}", e);
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			},
			Err(e) => {
				error!("Failed to install SIGTERM handler: {}", e);
				std::future::pending::<()>().await;
			},
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}

	info!("Shutdown signal received");
}
