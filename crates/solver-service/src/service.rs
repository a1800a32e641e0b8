//! Service wiring: builds the quote service from a loaded configuration.

use anyhow::{Context, Result};
use solver_config::ConfigService;
use solver_fee::{BalanceService, BalanceSnapshot, FeeService, MemoryBalanceProvider};
use solver_quote::{QuoteRepository, QuoteService, TracingAnalytics};
use solver_storage::{create_storage, StorageService};
use solver_types::QuoteEngineConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Loads a JSON balance snapshot into an in-memory balance provider.
pub async fn load_balances(path: &Path) -> Result<MemoryBalanceProvider> {
	let content = tokio::fs::read_to_string(path)
		.await
		.with_context(|| format!("Failed to read balance snapshot {}", path.display()))?;
	let snapshot: BalanceSnapshot =
		serde_json::from_str(&content).context("Failed to parse balance snapshot")?;

	info!(
		path = %path.display(),
		balances = snapshot.balances.len(),
		"Loaded balance snapshot"
	);
	Ok(MemoryBalanceProvider::from_snapshot(snapshot))
}

/// Builds the quote service and its collaborators.
pub async fn build_quote_service(
	config: QuoteEngineConfig,
	balances: Option<&Path>,
) -> Result<QuoteService> {
	let provider = match balances {
		Some(path) => load_balances(path).await?,
		None => {
			warn!("No balance snapshot given, solver balances are empty");
			MemoryBalanceProvider::new()
		},
	};

	let storage = StorageService::new(create_storage(&config.storage));
	let record_ttl = config.storage.record_ttl_seconds.map(Duration::from_secs);
	let config = ConfigService::new(config);
	let balances = BalanceService::new(Arc::new(provider), config.clone());
	let fee = FeeService::new(config.clone(), balances);
	let repository = QuoteRepository::new(Arc::new(storage)).with_ttl(record_ttl);

	info!(
		chains = ?config.supported_chains(),
		execution_types = ?config.quotes_config().intent_execution_types,
		"Quote service ready"
	);

	Ok(QuoteService::new(config, fee, repository).with_analytics(Arc::new(TracingAnalytics)))
}
