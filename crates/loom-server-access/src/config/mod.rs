// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the access core.
//!
//! Sources are merged lowest precedence first:
//! 1. Built-in defaults
//! 2. TOML file
//! 3. Environment variables (`LOOM_SERVER_ACCESS_*`)

mod sources;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
use crate::error::ConfigError;

pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

const DEFAULT_STORE_PATH: &str = "access.json";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccessConfig {
	pub cache: CacheConfig,
	pub store: StoreConfig,
	pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
	/// Zero disables decision caching.
	pub ttl: Duration,
	pub max_entries: usize,
	/// Drop affected cached decisions as soon as a rule or group changes.
	///
	/// A decision resolved while a mutation is in flight is not cached, so
	/// callers see every completed mutation on their next check. When false,
	/// cached decisions may lag a mutation by up to `ttl`.
	pub invalidate_on_write: bool,
}

impl Default for CacheConfig {
	fn default() -> Self {
		Self {
			ttl: DEFAULT_TTL,
			max_entries: DEFAULT_MAX_ENTRIES,
			invalidate_on_write: true,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
	pub path: PathBuf,
}

impl Default for StoreConfig {
	fn default() -> Self {
		Self {
			path: PathBuf::from(DEFAULT_STORE_PATH),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
	pub level: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: DEFAULT_LOG_LEVEL.to_string(),
		}
	}
}

/// Partial configuration as read from one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessConfigLayer {
	pub cache: Option<CacheConfigLayer>,
	pub store: Option<StoreConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
}

impl AccessConfigLayer {
	pub fn merge(&mut self, other: Self) {
		merge_section(&mut self.cache, other.cache, CacheConfigLayer::merge);
		merge_section(&mut self.store, other.store, StoreConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}

	pub fn finalize(self) -> AccessConfig {
		AccessConfig {
			cache: self.cache.unwrap_or_default().finalize(),
			store: self.store.unwrap_or_default().finalize(),
			logging: self.logging.unwrap_or_default().finalize(),
		}
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	if let Some(incoming) = other {
		if let Some(existing) = base.as_mut() {
			merge(existing, incoming);
		} else {
			*base = Some(incoming);
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheConfigLayer {
	pub ttl_secs: Option<u64>,
	pub max_entries: Option<usize>,
	pub invalidate_on_write: Option<bool>,
}

impl CacheConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.ttl_secs.is_some() {
			self.ttl_secs = other.ttl_secs;
		}
		if other.max_entries.is_some() {
			self.max_entries = other.max_entries;
		}
		if other.invalidate_on_write.is_some() {
			self.invalidate_on_write = other.invalidate_on_write;
		}
	}

	pub fn finalize(self) -> CacheConfig {
		let defaults = CacheConfig::default();
		CacheConfig {
			ttl: self.ttl_secs.map(Duration::from_secs).unwrap_or(defaults.ttl),
			max_entries: self.max_entries.unwrap_or(defaults.max_entries),
			invalidate_on_write: self
				.invalidate_on_write
				.unwrap_or(defaults.invalidate_on_write),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfigLayer {
	pub path: Option<PathBuf>,
}

impl StoreConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.path.is_some() {
			self.path = other.path;
		}
	}

	pub fn finalize(self) -> StoreConfig {
		StoreConfig {
			path: self
				.path
				.unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH)),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfigLayer {
	pub level: Option<String>,
}

impl LoggingConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.level.is_some() {
			self.level = other.level;
		}
	}

	pub fn finalize(self) -> LoggingConfig {
		LoggingConfig {
			level: self
				.level
				.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
		}
	}
}

/// Load configuration from defaults, an optional TOML file and the environment.
pub fn load_config(config_path: Option<PathBuf>) -> Result<AccessConfig, ConfigError> {
	let mut sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(DefaultsSource), Box::new(EnvSource)];
	if let Some(path) = config_path {
		sources.push(Box::new(TomlSource::new(path)));
	}
	load_from_sources(sources)
}

/// Merge the given sources by precedence and validate the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<AccessConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = AccessConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	let config = merged.finalize();
	validate_config(&config)?;

	info!(
		cache_ttl_secs = config.cache.ttl.as_secs(),
		cache_max_entries = config.cache.max_entries,
		invalidate_on_write = config.cache.invalidate_on_write,
		store = %config.store.path.display(),
		"access configuration loaded"
	);

	Ok(config)
}

fn validate_config(config: &AccessConfig) -> Result<(), ConfigError> {
	if config.cache.max_entries == 0 {
		return Err(ConfigError::validation(
			"cache.max_entries must be greater than zero; set cache.ttl_secs = 0 to disable caching",
		));
	}
	if config.store.path.as_os_str().is_empty() {
		return Err(ConfigError::validation("store.path must not be empty"));
	}
	Ok(())
}
