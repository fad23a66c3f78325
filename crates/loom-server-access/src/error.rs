// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the access-control core.
//!
//! Lookups never fail: a missing rule or member is reported through a boolean
//! flag. Errors only come from the durability backend, the snapshot codec and
//! configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by an [`AccessStore`](crate::store::AccessStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("store unavailable: {0}")]
	Unavailable(String),
}

/// Errors raised while encoding or decoding a persisted snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("unsupported snapshot version {found} (expected {expected})")]
	UnsupportedVersion { found: u32, expected: u32 },
}

/// Errors returned by the mutating access-control API.
///
/// In-memory state has already been updated when one of these is returned;
/// only durability failed.
#[derive(Debug, Error)]
pub enum AccessError {
	#[error("store error: {0}")]
	Store(#[from] StoreError),

	#[error("snapshot error: {0}")]
	Snapshot(#[from] SnapshotError),
}

pub type Result<T> = std::result::Result<T, AccessError>;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config file {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },

	#[error("validation error: {0}")]
	Validation(String),
}

impl ConfigError {
	pub fn validation(msg: impl Into<String>) -> Self {
		Self::Validation(msg.into())
	}
}
