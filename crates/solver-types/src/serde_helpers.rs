//! Serde helpers shared by the data model and the configuration shapes.
//!
//! Amounts are carried as decimal strings so that values above `2^53` survive
//! JSON consumers untouched. Deserialization also accepts plain integers and,
//! for `U256`, `0x`-prefixed hex strings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInteger {
	Str(String),
	Signed(i64),
	Unsigned(u64),
}

impl RawInteger {
	fn into_string(self) -> String {
		match self {
			RawInteger::Str(s) => s.trim().to_string(),
			RawInteger::Signed(v) => v.to_string(),
			RawInteger::Unsigned(v) => v.to_string(),
		}
	}
}

/// Serde module for `U256` as a decimal string.
pub mod u256_serde {
	use super::RawInteger;
	use alloy_primitives::U256;
	use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
	use std::str::FromStr;

	pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		value.to_string().serialize(serializer)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = RawInteger::deserialize(deserializer)?.into_string();
		U256::from_str(&raw).map_err(D::Error::custom)
	}
}

/// Serde module for `Option<U256>` as an optional decimal string.
pub mod option_u256_serde {
	use super::RawInteger;
	use alloy_primitives::U256;
	use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
	use std::str::FromStr;

	pub fn serialize<S>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		value.map(|v| v.to_string()).serialize(serializer)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
	where
		D: Deserializer<'de>,
	{
		Option::<RawInteger>::deserialize(deserializer)?
			.map(|raw| U256::from_str(&raw.into_string()).map_err(D::Error::custom))
			.transpose()
	}
}

/// Serde module for signed arbitrary-precision integers as decimal strings.
pub mod bigint_serde {
	use super::RawInteger;
	use num_bigint::BigInt;
	use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

	pub fn serialize<S>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		value.to_str_radix(10).serialize(serializer)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<BigInt, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = RawInteger::deserialize(deserializer)?.into_string();
		BigInt::parse_bytes(raw.as_bytes(), 10)
			.ok_or_else(|| D::Error::custom(format!("Invalid integer: {}", raw)))
	}
}

/// Serde module for unsigned arbitrary-precision integers as decimal strings.
pub mod biguint_serde {
	use super::RawInteger;
	use num_bigint::BigUint;
	use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

	pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		value.to_str_radix(10).serialize(serializer)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = RawInteger::deserialize(deserializer)?.into_string();
		BigUint::parse_bytes(raw.as_bytes(), 10)
			.ok_or_else(|| D::Error::custom(format!("Invalid unsigned integer: {}", raw)))
	}
}

/// Custom deserializer for `HashMap<u64, T>` whose keys arrive as strings,
/// which is the only key type TOML tables support.
pub fn deserialize_chain_id_map<'de, D, T>(deserializer: D) -> Result<HashMap<u64, T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	let map = HashMap::<String, T>::deserialize(deserializer)?;

	map.into_iter()
		.map(|(k, v)| {
			k.parse::<u64>()
				.map(|id| (id, v))
				.map_err(|_| serde::de::Error::custom(format!("Invalid chain ID: {}", k)))
		})
		.collect()
}

/// Custom serializer for `HashMap<u64, T>` that writes chain ids as string keys.
pub fn serialize_chain_id_map<S, T>(map: &HashMap<u64, T>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
	T: Serialize,
{
	let string_map: HashMap<String, &T> = map.iter().map(|(k, v)| (k.to_string(), v)).collect();

	string_map.serialize(serializer)
}
