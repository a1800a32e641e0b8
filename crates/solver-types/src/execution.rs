//! Intent execution types.
//!
//! The execution type decides who publishes the intent on the source chain
//! and therefore which quoting path serves it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an intent will be brought on-chain once quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentExecutionType {
	/// The user publishes and funds the intent themselves.
	SelfPublish,
	/// The solver publishes the intent using the user's signed permit.
	Gasless,
	/// The intent is fulfilled from the crowd liquidity pool.
	CrowdLiquidity,
}

impl IntentExecutionType {
	pub fn as_str(&self) -> &'static str {
		match self {
			IntentExecutionType::SelfPublish => "SELF_PUBLISH",
			IntentExecutionType::Gasless => "GASLESS",
			IntentExecutionType::CrowdLiquidity => "CROWD_LIQUIDITY",
		}
	}
}

impl fmt::Display for IntentExecutionType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for IntentExecutionType {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"SELF_PUBLISH" => Ok(IntentExecutionType::SelfPublish),
			"GASLESS" => Ok(IntentExecutionType::Gasless),
			"CROWD_LIQUIDITY" => Ok(IntentExecutionType::CrowdLiquidity),
			other => Err(format!("Unknown intent execution type: {}", other)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_round_trips_through_strings() {
		for kind in [
			IntentExecutionType::SelfPublish,
			IntentExecutionType::Gasless,
			IntentExecutionType::CrowdLiquidity,
		] {
			assert_eq!(kind.to_string().parse::<IntentExecutionType>(), Ok(kind));
		}
		assert!("SOMETHING_ELSE".parse::<IntentExecutionType>().is_err());
	}
}
