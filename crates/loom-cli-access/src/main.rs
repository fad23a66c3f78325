// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `loom-access` - inspect and edit file-source access rules.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use loom_server_access::{load_config, AccessConfig, AccessControl, FileAccessStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Command;

#[derive(Parser, Debug)]
#[command(
	name = "loom-access",
	about = "Manage path-based access rules for Loom file sources",
	version
)]
struct Cli {
	/// TOML configuration file
	#[arg(long, global = true, env = "LOOM_ACCESS_CONFIG")]
	config: Option<PathBuf>,

	/// Snapshot file, overriding `store.path` from the configuration
	#[arg(long, global = true)]
	store: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let mut config = load_config(cli.config.clone())?;
	if let Some(path) = cli.store {
		config.store.path = path;
	}

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	// Anything logged while loading the configuration predates the subscriber.
	log_config(&config, cli.config.as_deref());

	let store = Arc::new(FileAccessStore::new(config.store.path.clone()));
	let access = AccessControl::open(store, &config.cache)?;

	let mut stdout = std::io::stdout().lock();
	commands::run(cli.command, &access, &mut stdout)
}

fn log_config(config: &AccessConfig, config_file: Option<&Path>) {
	tracing::info!(
		config_file = ?config_file,
		cache_ttl_secs = config.cache.ttl.as_secs(),
		cache_max_entries = config.cache.max_entries,
		invalidate_on_write = config.cache.invalidate_on_write,
		store = %config.store.path.display(),
		log_level = %config.logging.level,
		"access configuration loaded"
	);
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io;
	use std::sync::Mutex;

	#[derive(Clone, Default)]
	struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

	impl io::Write for CapturedLogs {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.0.lock().unwrap().extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	#[test]
	fn config_summary_reaches_installed_subscriber() {
		let logs = CapturedLogs::default();
		let writer = logs.clone();
		let subscriber = tracing_subscriber::fmt()
			.with_ansi(false)
			.with_writer(move || writer.clone())
			.finish();

		let mut config = AccessConfig::default();
		config.store.path = PathBuf::from("/srv/loom/access.json");
		tracing::subscriber::with_default(subscriber, || {
			log_config(&config, Some(Path::new("/etc/loom/access.toml")))
		});

		let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
		assert!(output.contains("access configuration loaded"));
		assert!(output.contains("/srv/loom/access.json"));
		assert!(output.contains("/etc/loom/access.toml"));
	}

	#[test]
	fn global_flags_parse_after_subcommand() {
		let cli = Cli::try_parse_from([
			"loom-access",
			"check",
			"media",
			"/secret",
			"alice",
			"--store",
			"/tmp/access.json",
		])
		.unwrap();

		assert_eq!(cli.store, Some(PathBuf::from("/tmp/access.json")));
		assert!(matches!(cli.command, Command::Check(_)));
	}

	#[test]
	fn missing_subcommand_is_rejected() {
		assert!(Cli::try_parse_from(["loom-access"]).is_err());
	}
}
