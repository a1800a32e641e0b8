//! ERC-20 call data helpers.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

sol! {
	function transfer(address to, uint256 amount) external returns (bool);
}

/// Name used for the transfer selector in solver target configs.
pub const TRANSFER_SELECTOR_NAME: &str = "transfer";

/// A decoded `transfer(address,uint256)` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Erc20Transfer {
	pub recipient: Address,
	pub amount: U256,
}

/// Encodes `transfer(recipient, amount)` call data.
pub fn encode_transfer(recipient: Address, amount: U256) -> Bytes {
	transferCall {
		to: recipient,
		amount,
	}
	.abi_encode()
	.into()
}

/// Decodes call data as an ERC-20 transfer, returning `None` for anything else.
pub fn decode_transfer(data: &[u8]) -> Option<Erc20Transfer> {
	if !is_transfer(data) {
		return None;
	}
	transferCall::abi_decode(data, true)
		.ok()
		.map(|call| Erc20Transfer {
			recipient: call.to,
			amount: call.amount,
		})
}

/// Returns true if the call data starts with the transfer selector.
pub fn is_transfer(data: &[u8]) -> bool {
	data.len() >= 4 && data[..4] == transferCall::SELECTOR
}

/// Maps a 4-byte selector to the function name used in target configs.
pub fn selector_name(data: &[u8]) -> Option<&'static str> {
	if is_transfer(data) {
		Some(TRANSFER_SELECTOR_NAME)
	} else {
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	#[test]
	fn test_encode_then_decode_transfer() {
		let recipient = address!("00000000000000000000000000000000000000aa");
		let data = encode_transfer(recipient, U256::from(1_234_567u64));

		assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
		assert_eq!(data.len(), 68);
		assert_eq!(
			decode_transfer(&data),
			Some(Erc20Transfer {
				recipient,
				amount: U256::from(1_234_567u64),
			})
		);
		assert_eq!(selector_name(&data), Some("transfer"));
	}

	#[test]
	fn test_rejects_other_calldata() {
		assert_eq!(decode_transfer(&[]), None);
		assert_eq!(decode_transfer(&[0x09, 0x5e, 0xa7, 0xb3, 0x00]), None);
		// right selector, truncated arguments
		assert_eq!(decode_transfer(&[0xa9, 0x05, 0x9c, 0xbb, 0x01]), None);
		assert_eq!(selector_name(&[0x01, 0x02]), None);
	}
}
