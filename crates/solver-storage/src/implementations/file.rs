//! File-based storage backend.
//!
//! Each key becomes a JSON file under the base directory. Keys stored with a
//! TTL get a sibling `.expires` file holding the unix expiry in seconds.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracing::debug;

pub struct FileStorage {
	base_path: PathBuf,
}

impl FileStorage {
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	fn safe_key(key: &str) -> String {
		key.replace(['/', '\\', ':'], "_")
	}

	fn data_path(&self, key: &str) -> PathBuf {
		self.base_path.join(format!("{}.json", Self::safe_key(key)))
	}

	fn expiry_path(&self, key: &str) -> PathBuf {
		self.base_path
			.join(format!("{}.expires", Self::safe_key(key)))
	}

	fn now_secs() -> u64 {
		SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_secs())
			.unwrap_or_default()
	}

	async fn is_expired(&self, key: &str) -> Result<bool, StorageError> {
		match fs::read_to_string(self.expiry_path(key)).await {
			Ok(raw) => {
				let expires_at: u64 = raw
					.trim()
					.parse()
					.map_err(|e| StorageError::Backend(format!("Corrupt expiry for {}: {}", key, e)))?;
				Ok(expires_at <= Self::now_secs())
			},
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn remove_if_present(path: PathBuf) -> Result<(), StorageError> {
		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		if self.is_expired(key).await? {
			debug!(key, "Dropping expired entry");
			self.delete(key).await?;
			return Err(StorageError::NotFound);
		}

		match fs::read(self.data_path(key)).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		fs::create_dir_all(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		let path = self.data_path(key);

		// Write to a temp file then rename so readers never see partial data
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		match ttl {
			Some(ttl) => {
				let expires_at = Self::now_secs().saturating_add(ttl.as_secs());
				fs::write(self.expiry_path(key), expires_at.to_string())
					.await
					.map_err(|e| StorageError::Backend(e.to_string()))?;
			},
			None => Self::remove_if_present(self.expiry_path(key)).await?,
		}

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		Self::remove_if_present(self.data_path(key)).await?;
		Self::remove_if_present(self.expiry_path(key)).await
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		if self.is_expired(key).await? {
			return Ok(false);
		}
		fs::try_exists(self.data_path(key))
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}
