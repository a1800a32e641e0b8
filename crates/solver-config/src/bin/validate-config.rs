//! Configuration validation utility
//!
//! Usage: cargo run --bin validate-config config/example.toml

use std::env;
use std::process;

use solver_config::ConfigLoader;

#[tokio::main]
async fn main() {
	let args: Vec<String> = env::args().collect();

	if args.len() != 2 {
		eprintln!("Usage: {} <config-file>", args[0]);
		process::exit(1);
	}

	let config_path = &args[1];

	println!("Validating configuration file: {}", config_path);

	match ConfigLoader::new().with_file(config_path).load().await {
		Ok(config) => {
			println!("Configuration is valid");
			println!("Service name: {}", config.service.name);
			println!("Solvers configured: {}", config.solvers.len());
			println!("Intent sources: {}", config.intent_sources.len());
			println!(
				"Execution types: {:?}",
				config.quotes.intent_execution_types
			);
			println!("Storage backend: {:?}", config.storage.backend);
		},
		Err(e) => {
			eprintln!("Configuration validation failed:");
			eprintln!("{}", e);
			process::exit(1);
		},
	}
}
