// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Durability backends for access snapshots.
//!
//! A backend stores one opaque blob. The access core owns the encoding; the
//! backend only has to hand back the last blob it was given.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::StoreError;

pub trait AccessStore: Send + Sync {
	/// Returns the last saved blob, or `None` if nothing was ever saved.
	fn load(&self) -> Result<Option<Vec<u8>>, StoreError>;

	/// Replaces the stored blob.
	fn save(&self, blob: &[u8]) -> Result<(), StoreError>;
}

/// Stores the snapshot in a single file.
///
/// Writes go to a sibling `.tmp` file that is then renamed over the target,
/// so readers never observe a partially written snapshot.
#[derive(Debug, Clone)]
pub struct FileAccessStore {
	path: PathBuf,
}

impl FileAccessStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn tmp_path(&self) -> PathBuf {
		let mut name = self
			.path
			.file_name()
			.map(|n| n.to_os_string())
			.unwrap_or_else(|| "access".into());
		name.push(".tmp");
		self.path.with_file_name(name)
	}
}

impl AccessStore for FileAccessStore {
	fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
		match std::fs::read(&self.path) {
			Ok(blob) => {
				debug!(path = %self.path.display(), bytes = blob.len(), "loaded access snapshot");
				Ok(Some(blob))
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				debug!(path = %self.path.display(), "access snapshot not found");
				Ok(None)
			}
			Err(e) => Err(e.into()),
		}
	}

	fn save(&self, blob: &[u8]) -> Result<(), StoreError> {
		if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
			std::fs::create_dir_all(dir)?;
		}

		let tmp_path = self.tmp_path();
		std::fs::write(&tmp_path, blob)?;
		std::fs::rename(&tmp_path, &self.path)?;

		debug!(path = %self.path.display(), bytes = blob.len(), "saved access snapshot");
		Ok(())
	}
}

/// Keeps the snapshot in memory. Useful for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryAccessStore {
	blob: Mutex<Option<Vec<u8>>>,
}

impl MemoryAccessStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_blob(blob: Vec<u8>) -> Self {
		Self {
			blob: Mutex::new(Some(blob)),
		}
	}

	/// Copy of the stored blob.
	pub fn contents(&self) -> Option<Vec<u8>> {
		self.blob.lock().clone()
	}
}

impl AccessStore for MemoryAccessStore {
	fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
		Ok(self.blob.lock().clone())
	}

	fn save(&self, blob: &[u8]) -> Result<(), StoreError> {
		*self.blob.lock() = Some(blob.to_vec());
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	mod file_store {
		use super::*;

		#[test]
		fn missing_file_loads_none() {
			let dir = TempDir::new().unwrap();
			let store = FileAccessStore::new(dir.path().join("access.json"));

			assert!(store.load().unwrap().is_none());
		}

		#[test]
		fn save_then_load() {
			let dir = TempDir::new().unwrap();
			let store = FileAccessStore::new(dir.path().join("access.json"));

			store.save(b"{\"version\":1}").unwrap();
			assert_eq!(store.load().unwrap().unwrap(), b"{\"version\":1}");
		}

		#[test]
		fn save_replaces_previous_blob() {
			let dir = TempDir::new().unwrap();
			let store = FileAccessStore::new(dir.path().join("access.json"));

			store.save(b"first, and longer").unwrap();
			store.save(b"second").unwrap();
			assert_eq!(store.load().unwrap().unwrap(), b"second");
		}

		#[test]
		fn save_creates_parent_directories() {
			let dir = TempDir::new().unwrap();
			let path = dir.path().join("nested").join("state").join("access.json");
			let store = FileAccessStore::new(&path);

			store.save(b"{}").unwrap();
			assert!(path.exists());
		}

		#[test]
		fn save_leaves_no_tmp_file() {
			let dir = TempDir::new().unwrap();
			let store = FileAccessStore::new(dir.path().join("access.json"));

			store.save(b"{}").unwrap();
			assert!(!dir.path().join("access.json.tmp").exists());
		}

		#[test]
		fn unreadable_path_is_an_error() {
			let dir = TempDir::new().unwrap();
			// A directory cannot be read as a file.
			let store = FileAccessStore::new(dir.path());

			assert!(matches!(store.load(), Err(StoreError::Io(_))));
		}
	}

	mod memory_store {
		use super::*;

		#[test]
		fn starts_empty() {
			let store = MemoryAccessStore::new();
			assert!(store.load().unwrap().is_none());
		}

		#[test]
		fn keeps_last_blob() {
			let store = MemoryAccessStore::new();
			store.save(b"one").unwrap();
			store.save(b"two").unwrap();
			assert_eq!(store.contents().unwrap(), b"two");
		}

		#[test]
		fn with_blob_is_loadable() {
			let store = MemoryAccessStore::with_blob(b"seed".to_vec());
			assert_eq!(store.load().unwrap().unwrap(), b"seed");
		}
	}
}
