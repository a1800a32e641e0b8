//! Storage module for the quote engine.
//!
//! This module provides abstractions for persisting quote intents and their
//! outcomes, with an in-memory backend for tests and single-process
//! deployments and a file backend for simple persistence.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use solver_types::{StorageBackend, StorageConfig};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// This trait must be implemented by any storage backend that wants to
/// integrate with the quote engine. It provides basic key-value operations
/// with optional TTL support.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes with optional time-to-live.
	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// High-level storage service that provides typed operations.
///
/// Values are serialized to JSON and stored under `namespace:id`.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	/// Stores a serializable value with optional time-to-live.
	pub async fn store_with_ttl<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes(&Self::key(namespace, id), bytes, ttl)
			.await
	}

	/// Stores a serializable value without time-to-live.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		self.store_with_ttl(namespace, id, data, None).await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}

	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}
}

/// Creates the storage backend selected in configuration.
pub fn create_storage(config: &StorageConfig) -> Box<dyn StorageInterface> {
	match config.backend {
		StorageBackend::Memory => Box::new(implementations::memory::MemoryStorage::new()),
		StorageBackend::File => {
			let path = config
				.path
				.clone()
				.unwrap_or_else(|| "./data/storage".to_string());
			Box::new(implementations::file::FileStorage::new(PathBuf::from(path)))
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde::Deserialize;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Record {
		id: String,
		amount: u64,
	}

	#[tokio::test]
	async fn test_typed_store_and_retrieve() {
		let storage = StorageService::new(create_storage(&StorageConfig::default()));
		let record = Record {
			id: "a".to_string(),
			amount: 7,
		};

		storage.store("records", "a", &record).await.unwrap();
		assert!(storage.exists("records", "a").await.unwrap());
		assert!(!storage.exists("other", "a").await.unwrap());

		let loaded: Record = storage.retrieve("records", "a").await.unwrap();
		assert_eq!(loaded, record);

		storage.remove("records", "a").await.unwrap();
		let missing: Result<Record, _> = storage.retrieve("records", "a").await;
		assert!(matches!(missing, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn test_retrieve_wrong_shape_is_serialization_error() {
		let storage = StorageService::new(create_storage(&StorageConfig::default()));
		storage.store("records", "n", &42u64).await.unwrap();

		let result: Result<Record, _> = storage.retrieve("records", "n").await;
		assert!(matches!(result, Err(StorageError::Serialization(_))));
	}

	#[tokio::test]
	async fn test_file_backend_from_config() {
		let dir = tempfile::tempdir().unwrap();
		let config = StorageConfig {
			backend: StorageBackend::File,
			path: Some(dir.path().to_string_lossy().to_string()),
			record_ttl_seconds: None,
		};
		let storage = StorageService::new(create_storage(&config));

		storage.store("quotes", "q-1", &"hello").await.unwrap();
		let value: String = storage.retrieve("quotes", "q-1").await.unwrap();
		assert_eq!(value, "hello");
	}
}
