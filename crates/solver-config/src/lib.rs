//! Configuration loading for the quote engine.
//!
//! Configuration files may be TOML, JSON or YAML (chosen by extension).
//! `${VAR_NAME}` placeholders are substituted from the environment before
//! parsing, then a small set of `SOLVER_`-prefixed variables override the
//! parsed values, and finally the result is validated.

use regex::Regex;
use solver_types::{FeeAlgorithm, FeeConfig, FeeTierConstants, QuoteEngineConfig, StorageBackend};
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

mod service;

pub use service::ConfigService;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("Unsupported config format: {0}")]
	UnsupportedFormat(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
	Toml,
	Json,
	Yaml,
}

impl ConfigFormat {
	/// Picks the format from a file extension.
	pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Ok(ConfigFormat::Toml),
			Some("json") => Ok(ConfigFormat::Json),
			Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
			_ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
		}
	}
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "SOLVER_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<QuoteEngineConfig, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;

		let path = Path::new(file_path);
		if !path.exists() {
			return Err(ConfigError::FileNotFound(file_path.clone()));
		}

		info!(path = %file_path, "Loading configuration");
		let format = ConfigFormat::from_path(path)?;
		let content = tokio::fs::read_to_string(path).await?;

		let mut config = self.parse(&content, format)?;
		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;

		Ok(config)
	}

	/// Parses configuration text after substituting environment variables.
	pub fn parse(&self, content: &str, format: ConfigFormat) -> Result<QuoteEngineConfig, ConfigError> {
		let substituted = substitute_env_vars(content)?;

		match format {
			ConfigFormat::Toml => {
				toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))
			},
			ConfigFormat::Json => serde_json::from_str(&substituted)
				.map_err(|e| ConfigError::ParseError(e.to_string())),
			ConfigFormat::Yaml => serde_yaml::from_str(&substituted)
				.map_err(|e| ConfigError::ParseError(e.to_string())),
		}
	}

	fn apply_env_overrides(&self, config: &mut QuoteEngineConfig) -> Result<(), ConfigError> {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			debug!("Overriding log level from environment");
			config.service.log_level = log_level;
		}

		if let Ok(http_port) = env::var(format!("{}HTTP_PORT", self.env_prefix)) {
			config.service.http_port = http_port
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid HTTP port: {}", e)))?;
		}

		if let Ok(overhead) = env::var(format!("{}DEFAULT_GAS_OVERHEAD", self.env_prefix)) {
			let overhead = overhead.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid default gas overhead: {}", e))
			})?;
			config.intent.default_gas_overhead = Some(overhead);
		}

		Ok(())
	}
}

fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let mut result = content.to_string();

	// Find and replace ${VAR_NAME} patterns
	let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::ParseError(e.to_string()))?;

	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

/// Checks cross-references and fee constants of a parsed configuration.
pub fn validate_config(config: &QuoteEngineConfig) -> Result<(), ConfigError> {
	if config.service.name.is_empty() {
		return Err(ConfigError::ValidationError(
			"Service name cannot be empty".to_string(),
		));
	}

	if config.quotes.intent_execution_types.is_empty() {
		return Err(ConfigError::ValidationError(
			"At least one intent execution type must be configured".to_string(),
		));
	}

	validate_fee(&config.intent.default_fee, "intent.default_fee")?;

	for (chain_id, solver) in &config.solvers {
		if *chain_id != solver.chain_id {
			return Err(ConfigError::ValidationError(format!(
				"Solver key {} does not match its chain_id {}",
				chain_id, solver.chain_id
			)));
		}
		if let Some(fee) = &solver.fee {
			validate_fee(fee, &format!("solvers.{}.fee", chain_id))?;
		}
		for (address, target) in &solver.targets {
			if target.min_balance > target.target_balance {
				return Err(ConfigError::ValidationError(format!(
					"Target {} on chain {} has min_balance above target_balance",
					address, chain_id
				)));
			}
			if target.max_balance.is_some_and(|max| max < target.target_balance) {
				return Err(ConfigError::ValidationError(format!(
					"Target {} on chain {} has max_balance below target_balance",
					address, chain_id
				)));
			}
		}
	}

	for source in &config.intent_sources {
		if !config.solvers.contains_key(&source.chain_id) {
			return Err(ConfigError::ValidationError(format!(
				"Intent source on chain {} has no solver",
				source.chain_id
			)));
		}
	}

	let estimate = &config.fulfillment_estimate;
	if estimate.execution_padding_seconds.is_sign_negative()
		|| estimate.block_time_percentile.is_sign_negative()
		|| estimate.default_block_time.is_sign_negative()
	{
		return Err(ConfigError::ValidationError(
			"Fulfillment estimate parameters cannot be negative".to_string(),
		));
	}

	if config.storage.backend == StorageBackend::File && config.storage.path.is_none() {
		return Err(ConfigError::ValidationError(
			"File storage backend requires a path".to_string(),
		));
	}

	Ok(())
}

fn validate_fee(fee: &FeeConfig, location: &str) -> Result<(), ConfigError> {
	if fee.algorithm != FeeAlgorithm::Linear {
		// Other algorithms are rejected when a fee is computed, not at load time.
		return Ok(());
	}

	let tiers: [(&str, Option<&FeeTierConstants>); 3] = [
		("token", Some(&fee.constants.token)),
		("non_swap_token", fee.constants.non_swap_token.as_ref()),
		("native", Some(&fee.constants.native)),
	];

	for (name, tier) in tiers {
		if let Some(tier) = tier {
			if tier.tranche.unit_size.is_zero() {
				return Err(ConfigError::ValidationError(format!(
					"{}.constants.{}.tranche.unit_size must be non-zero",
					location, name
				)));
			}
		}
	}

	Ok(())
}
