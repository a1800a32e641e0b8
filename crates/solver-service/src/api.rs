//! HTTP API for quote requests.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Json, Response},
	routing::{get, post},
	Router,
};
use serde::Serialize;
use solver_quote::{QuoteError, QuoteOutcome, QuoteService};
use solver_types::{IntentExecutionType, QuoteData, QuoteIntent, QuoteIntentRecord};
use std::future::Future;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument, warn};

/// API server for the quote engine
pub struct ApiServer {
	port: u16,
	quotes: Arc<QuoteService>,
}

#[derive(Clone)]
struct AppState {
	quotes: Arc<QuoteService>,
}

impl ApiServer {
	pub fn new(port: u16, quotes: Arc<QuoteService>) -> Self {
		Self { port, quotes }
	}

	pub fn router(&self) -> Router {
		router(self.quotes.clone())
	}

	#[instrument(skip_all, fields(port = self.port))]
	pub async fn run(
		self,
		shutdown: impl Future<Output = ()> + Send + 'static,
	) -> anyhow::Result<()> {
		let app = self.router();
		let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", self.port)).await?;

		info!("API server listening on port {}", self.port);

		axum::serve(listener, app)
			.with_graceful_shutdown(shutdown)
			.await?;

		Ok(())
	}
}

fn router(quotes: Arc<QuoteService>) -> Router {
	Router::new()
		.route("/health", get(health_check))
		.route("/api/v1/quotes", post(get_quote))
		.route("/api/v1/quotes/reverse", post(get_reverse_quote))
		.route("/api/v1/quotes/{quote_id}", get(get_quote_records))
		.with_state(AppState { quotes })
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
	quote_data: QuoteData,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	errors: Vec<ExecutionTypeError>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionTypeError {
	intent_execution_type: IntentExecutionType,
	error: &'static str,
	message: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
	error: &'static str,
	message: String,
}

impl From<QuoteOutcome> for QuoteResponse {
	fn from(outcome: QuoteOutcome) -> Self {
		Self {
			quote_data: outcome.quote_data,
			errors: outcome
				.failures
				.into_iter()
				.map(|(intent_execution_type, err)| ExecutionTypeError {
					intent_execution_type,
					error: err.name(),
					message: err.to_string(),
				})
				.collect(),
		}
	}
}

fn error_response(err: &QuoteError) -> Response {
	let status = if err.is_client_error() {
		StatusCode::BAD_REQUEST
	} else {
		StatusCode::INTERNAL_SERVER_ERROR
	};
	warn!(error = %err, status = status.as_u16(), "Quote request failed");
	(
		status,
		Json(ErrorResponse {
			error: err.name(),
			message: err.to_string(),
		}),
	)
		.into_response()
}

fn quote_response(result: Result<QuoteOutcome, QuoteError>) -> Response {
	match result {
		Ok(outcome) => Json(QuoteResponse::from(outcome)).into_response(),
		Err(err) => error_response(&err),
	}
}

/// Returns 200 while the service is running
async fn health_check() -> Json<serde_json::Value> {
	Json(serde_json::json!({
		"status": "ok",
		"timestamp": chrono::Utc::now().timestamp()
	}))
}

async fn get_quote(State(state): State<AppState>, Json(intent): Json<QuoteIntent>) -> Response {
	quote_response(state.quotes.get_quote(&intent).await)
}

async fn get_reverse_quote(
	State(state): State<AppState>,
	Json(intent): Json<QuoteIntent>,
) -> Response {
	quote_response(state.quotes.get_reverse_quote(&intent).await)
}

async fn get_quote_records(
	State(state): State<AppState>,
	Path(quote_id): Path<String>,
) -> Response {
	match state.quotes.repository().fetch_by_quote_id(&quote_id).await {
		Ok(records) if records.is_empty() => StatusCode::NOT_FOUND.into_response(),
		Ok(records) => Json::<Vec<QuoteIntentRecord>>(records).into_response(),
		Err(err) => error_response(&err),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::service::build_quote_service;
	use alloy_primitives::{address, Address, U256};
	use solver_config::{ConfigFormat, ConfigLoader};
	use solver_types::erc20::encode_transfer;
	use solver_types::{Call, QuoteReward, QuoteRoute, TokenAmount};

	const USDC_OP: Address = address!("0b2c639c533813f4aa9d7837caf62653d097ff85");
	const USDC_BASE: Address = address!("833589fcd6edb6e08f4c7c32d4f71b54bda02913");

	async fn state() -> State<AppState> {
		let config = ConfigLoader::new()
			.parse(include_str!("../../../config/example.toml"), ConfigFormat::Toml)
			.unwrap();
		let quotes = build_quote_service(config, None).await.unwrap();
		State(AppState {
			quotes: Arc::new(quotes),
		})
	}

	fn intent(destination: u64) -> QuoteIntent {
		let amount = U256::from(10_000_000u64);
		QuoteIntent {
			quote_id: "api-test".to_string(),
			route: QuoteRoute {
				source: 10,
				destination,
				inbox: Address::repeat_byte(0x84),
				tokens: vec![TokenAmount::new(USDC_BASE, amount)],
				calls: vec![Call {
					target: USDC_BASE,
					data: encode_transfer(Address::repeat_byte(0xbb), amount),
					value: U256::ZERO,
				}],
			},
			reward: QuoteReward {
				creator: Address::repeat_byte(0x01),
				prover: address!("0000000000000000000000000000000000003000"),
				deadline: u64::MAX,
				native_value: U256::ZERO,
				tokens: vec![TokenAmount::new(USDC_OP, U256::from(11_000_000u64))],
			},
			intent_execution_types: vec![IntentExecutionType::SelfPublish],
		}
	}

	#[tokio::test]
	async fn test_unknown_destination_is_bad_request() {
		let response = get_quote(state().await, Json(intent(42161))).await;
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn test_without_balances_intent_is_rejected() {
		// No snapshot, so the transfer limit check cannot price the fill
		let response = get_reverse_quote(state().await, Json(intent(8453))).await;
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn test_records_of_unknown_quote_are_not_found() {
		let response = get_quote_records(state().await, Path("missing".to_string())).await;
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
	}

	#[test]
	fn test_error_status_mapping() {
		let response = error_response(&QuoteError::NoExecutionTypes);
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);

		let response = error_response(&QuoteError::DefaultGasOverheadUndefined);
		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}
}
