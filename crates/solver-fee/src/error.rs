use alloy_primitives::{Address, U256};
use num_bigint::BigInt;
use solver_types::{FeeAlgorithm, NormalizedTotal};
use thiserror::Error;

/// Errors raised while pricing an intent.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeeError {
	#[error("No intent source for source chain {0}")]
	NoIntentSourceForSource(u64),

	#[error("No intent source for destination chain {0}")]
	NoIntentSourceForDestination(u64),

	#[error("No solver for destination chain {0}")]
	NoSolverForDestination(u64),

	#[error("Error occurred when fetching reward tokens for chain {0}")]
	FetchingRewardTokensFailed(u64),

	#[error("Error occurred when fetching route tokens for chain {0}")]
	FetchingRouteTokensFailed(u64),

	#[error("Error occurred when fetching call tokens for chain {0}")]
	FetchingCallTokensFailed(u64),

	#[error("Reward token {0} not found in intent")]
	RewardTokenNotFound(Address),

	#[error("Route token {0} not found in intent")]
	RouteTokenNotFound(Address),

	#[error("Call to {0} is not an ERC20 transfer the solver supports")]
	NonErc20TargetInCalls(Address),

	#[error("Solver on chain {chain_id} has no balance for target {target}")]
	FailedToFetchTarget { chain_id: u64, target: Address },

	#[error("Invalid function data for target {0}")]
	InvalidFunctionData(Address),

	#[error(
		"Solver on chain {chain_id} lacks liquidity for {target}: requested {requested}, balance {balance}, min balance {min_balance}"
	)]
	SolverLacksLiquidity {
		chain_id: u64,
		target: Address,
		requested: U256,
		balance: U256,
		min_balance: BigInt,
	},

	#[error("Solver on chain {chain_id} uses unsupported fee algorithm {algorithm}")]
	InvalidSolverAlgorithm {
		chain_id: u64,
		algorithm: FeeAlgorithm,
	},

	#[error("Invalid fee configuration: {0}")]
	InvalidFeeConfig(String),

	#[error("Only single call routes are supported")]
	MultiFulfillRoute,

	#[error("Reward tokens contain duplicates")]
	DuplicatedRewardToken,

	#[error("Route is infeasible: ask ({ask}) exceeds reward ({reward})")]
	RouteIsInfeasible {
		ask: NormalizedTotal,
		reward: NormalizedTotal,
	},

	#[error("Reward is infeasible: fee ({fee}) exceeds reward ({reward})")]
	RewardIsInfeasible {
		fee: NormalizedTotal,
		reward: NormalizedTotal,
	},

	#[error("Balance provider error: {0}")]
	BalanceProvider(String),
}
