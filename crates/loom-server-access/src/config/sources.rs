// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files and environment variables.

use std::path::PathBuf;

use tracing::{debug, trace};

use super::{AccessConfigLayer, CacheConfigLayer, LoggingConfigLayer, StoreConfigLayer};
use crate::error::ConfigError;

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<AccessConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<AccessConfigLayer, ConfigError> {
		Ok(AccessConfigLayer::default())
	}
}

/// TOML file source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<AccessConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(AccessConfigLayer::default());
		}

		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: AccessConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed access config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: LOOM_SERVER_ACCESS_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<AccessConfigLayer, ConfigError> {
		Ok(AccessConfigLayer {
			cache: Some(CacheConfigLayer {
				ttl_secs: env_parse("LOOM_SERVER_ACCESS_CACHE_TTL_SECS")?,
				max_entries: env_parse("LOOM_SERVER_ACCESS_CACHE_MAX_ENTRIES")?,
				invalidate_on_write: env_bool("LOOM_SERVER_ACCESS_CACHE_INVALIDATE_ON_WRITE"),
			}),
			store: Some(StoreConfigLayer {
				path: env_var("LOOM_SERVER_ACCESS_STORE_PATH").map(PathBuf::from),
			}),
			logging: Some(LoggingConfigLayer {
				level: env_var("LOOM_SERVER_ACCESS_LOG_LEVEL"),
			}),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid numeric value '{v}'"),
		}),
		None => Ok(None),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;
	use tempfile::TempDir;

	#[test]
	fn precedence_orders_sources() {
		assert!(Precedence::Defaults < Precedence::ConfigFile);
		assert!(Precedence::ConfigFile < Precedence::Environment);
	}

	#[test]
	fn missing_toml_file_is_empty_layer() {
		let dir = TempDir::new().unwrap();
		let source = TomlSource::new(dir.path().join("absent.toml"));
		assert_eq!(source.load().unwrap(), AccessConfigLayer::default());
	}

	#[test]
	fn toml_file_is_parsed() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("access.toml");
		std::fs::write(
			&path,
			r#"
			[cache]
			ttl_secs = 15
			invalidate_on_write = false

			[store]
			path = "/var/lib/loom/access.json"
			"#,
		)
		.unwrap();

		let config = TomlSource::new(&path).load().unwrap().finalize();
		assert_eq!(config.cache.ttl, Duration::from_secs(15));
		assert!(!config.cache.invalidate_on_write);
		assert_eq!(config.store.path, PathBuf::from("/var/lib/loom/access.json"));
		assert_eq!(config.logging.level, "info");
	}

	#[test]
	fn invalid_toml_reports_path() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("broken.toml");
		std::fs::write(&path, "[cache\nttl_secs = ").unwrap();

		match TomlSource::new(&path).load() {
			Err(ConfigError::TomlParse { path: reported, .. }) => assert_eq!(reported, path),
			other => panic!("expected TOML parse error, got {other:?}"),
		}
	}
}
