//! Persistence of quote intents and their receipts.

use chrono::Utc;
use solver_storage::{StorageError, StorageService};
use solver_types::{IntentExecutionType, QuoteIntent, QuoteIntentRecord, QuoteReceipt};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::QuoteError;

const RECORDS_NAMESPACE: &str = "quote_intents";
const INDEX_NAMESPACE: &str = "quote_index";

/// Stores one record per execution type of a quote request, and an index
/// from the caller's quote id to those records.
#[derive(Clone)]
pub struct QuoteRepository {
	storage: Arc<StorageService>,
	ttl: Option<Duration>,
}

impl QuoteRepository {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage, ttl: None }
	}

	/// Expires records and index entries `ttl` after their last write.
	pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
		self.ttl = ttl;
		self
	}

	async fn put(&self, record: &QuoteIntentRecord) -> Result<(), QuoteError> {
		self.storage
			.store_with_ttl(RECORDS_NAMESPACE, &record.id, record, self.ttl)
			.await?;
		Ok(())
	}

	/// Record ids stored under `quote_id`, empty if unknown.
	async fn index(&self, quote_id: &str) -> Result<Vec<String>, QuoteError> {
		match self.storage.retrieve(INDEX_NAMESPACE, quote_id).await {
			Ok(ids) => Ok(ids),
			Err(StorageError::NotFound) => Ok(Vec::new()),
			Err(err) => Err(err.into()),
		}
	}

	/// Creates a record for every execution type requested by `intent` that
	/// is also in `supported`, keeping the request order.
	pub async fn store_quote_intents(
		&self,
		intent: &QuoteIntent,
		supported: &[IntentExecutionType],
	) -> Result<Vec<QuoteIntentRecord>, QuoteError> {
		let mut records: Vec<QuoteIntentRecord> = Vec::new();

		for execution_type in &intent.intent_execution_types {
			if !supported.contains(execution_type)
				|| records.iter().any(|r| r.intent_execution_type == *execution_type)
			{
				continue;
			}

			let record = QuoteIntentRecord {
				id: Uuid::new_v4().to_string(),
				intent_execution_type: *execution_type,
				intent: intent.clone(),
				created_at: Utc::now().timestamp(),
				receipt: None,
			};
			self.put(&record).await?;
			records.push(record);
		}

		// Repeated requests under one quote id keep the earlier records reachable
		let mut ids = self.index(&intent.quote_id).await?;
		ids.extend(records.iter().map(|r| r.id.clone()));
		self.storage
			.store_with_ttl(INDEX_NAMESPACE, &intent.quote_id, &ids, self.ttl)
			.await?;

		debug!(quote_id = %intent.quote_id, records = records.len(), "Stored quote intents");
		Ok(records)
	}

	pub async fn fetch(&self, id: &str) -> Result<QuoteIntentRecord, QuoteError> {
		Ok(self.storage.retrieve(RECORDS_NAMESPACE, id).await?)
	}

	/// Records of a quote request, empty if the quote id is unknown.
	pub async fn fetch_by_quote_id(
		&self,
		quote_id: &str,
	) -> Result<Vec<QuoteIntentRecord>, QuoteError> {
		let ids = self.index(quote_id).await?;

		let mut records = Vec::with_capacity(ids.len());
		for id in ids {
			match self.fetch(&id).await {
				Ok(record) => records.push(record),
				// expired ahead of the index
				Err(QuoteError::Storage(StorageError::NotFound)) => {},
				Err(err) => return Err(err),
			}
		}
		Ok(records)
	}

	/// Attaches the quote outcome to a stored record.
	pub async fn update_receipt(
		&self,
		record: &mut QuoteIntentRecord,
		receipt: QuoteReceipt,
	) -> Result<(), QuoteError> {
		record.receipt = Some(receipt);
		self.put(record).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fixtures::{transfer_intent, usdc, USDC_OP};
	use solver_storage::implementations::memory::MemoryStorage;

	fn repository() -> QuoteRepository {
		QuoteRepository::new(Arc::new(StorageService::new(Box::new(MemoryStorage::new()))))
	}

	#[tokio::test]
	async fn test_one_record_per_supported_type() {
		let repository = repository();
		let mut intent = transfer_intent(USDC_OP, usdc(11), usdc(10));
		intent.intent_execution_types = vec![
			IntentExecutionType::Gasless,
			IntentExecutionType::CrowdLiquidity,
			IntentExecutionType::SelfPublish,
			IntentExecutionType::Gasless,
		];

		let records = repository
			.store_quote_intents(
				&intent,
				&[IntentExecutionType::SelfPublish, IntentExecutionType::Gasless],
			)
			.await
			.unwrap();

		let types: Vec<_> = records.iter().map(|r| r.intent_execution_type).collect();
		assert_eq!(
			types,
			vec![IntentExecutionType::Gasless, IntentExecutionType::SelfPublish]
		);
		assert_ne!(records[0].id, records[1].id);

		let stored = repository.fetch_by_quote_id("quote-test").await.unwrap();
		assert_eq!(stored.len(), 2);
		assert_eq!(stored[0].id, records[0].id);
	}

	#[tokio::test]
	async fn test_receipt_is_persisted() {
		let repository = repository();
		let intent = transfer_intent(USDC_OP, usdc(11), usdc(10));
		let mut records = repository
			.store_quote_intents(&intent, &[IntentExecutionType::SelfPublish])
			.await
			.unwrap();

		let record = &mut records[0];
		repository
			.update_receipt(record, QuoteReceipt::Failed("InfeasibleQuote".to_string()))
			.await
			.unwrap();

		let stored = repository.fetch(&record.id).await.unwrap();
		assert_eq!(
			stored.receipt,
			Some(QuoteReceipt::Failed("InfeasibleQuote".to_string()))
		);
	}

	#[tokio::test]
	async fn test_unknown_quote_id_has_no_records() {
		assert!(repository()
			.fetch_by_quote_id("missing")
			.await
			.unwrap()
			.is_empty());
	}

	#[tokio::test]
	async fn test_repeated_quote_id_keeps_earlier_records() {
		let repository = repository();
		let intent = transfer_intent(USDC_OP, usdc(11), usdc(10));

		let first = repository
			.store_quote_intents(&intent, &[IntentExecutionType::SelfPublish])
			.await
			.unwrap();
		let second = repository
			.store_quote_intents(&intent, &[IntentExecutionType::SelfPublish])
			.await
			.unwrap();

		let ids: Vec<_> = repository
			.fetch_by_quote_id("quote-test")
			.await
			.unwrap()
			.into_iter()
			.map(|r| r.id)
			.collect();
		assert_eq!(ids, vec![first[0].id.clone(), second[0].id.clone()]);
	}

	#[tokio::test]
	async fn test_records_expire_after_ttl() {
		let repository = repository().with_ttl(Some(Duration::ZERO));
		let intent = transfer_intent(USDC_OP, usdc(11), usdc(10));
		let records = repository
			.store_quote_intents(&intent, &[IntentExecutionType::SelfPublish])
			.await
			.unwrap();

		assert!(matches!(
			repository.fetch(&records[0].id).await,
			Err(QuoteError::Storage(StorageError::NotFound))
		));
		assert!(repository
			.fetch_by_quote_id("quote-test")
			.await
			.unwrap()
			.is_empty());
	}
}
