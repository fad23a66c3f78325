// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persisted form of the rule table and group registry.
//!
//! The snapshot is a single JSON document with sorted keys. Empty rules are
//! never written; empty groups are, since a group outlives its members.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::rules::RuleSnapshot;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSnapshot {
	pub version: u32,
	#[serde(default)]
	pub rules: RuleSnapshot,
	#[serde(default)]
	pub groups: BTreeMap<String, BTreeSet<String>>,
}

impl AccessSnapshot {
	/// Builds a snapshot, dropping empty rules and sources left with none.
	pub fn new(rules: RuleSnapshot, groups: BTreeMap<String, BTreeSet<String>>) -> Self {
		let rules = rules
			.into_iter()
			.filter_map(|(source, paths)| {
				let paths: BTreeMap<_, _> = paths
					.into_iter()
					.filter(|(_, rule)| !rule.is_empty())
					.collect();
				(!paths.is_empty()).then_some((source, paths))
			})
			.collect();

		Self {
			version: SNAPSHOT_VERSION,
			rules,
			groups,
		}
	}

	pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
		Ok(serde_json::to_vec_pretty(self)?)
	}

	pub fn decode(blob: &[u8]) -> Result<Self, SnapshotError> {
		let snapshot: AccessSnapshot = serde_json::from_slice(blob)?;
		if snapshot.version != SNAPSHOT_VERSION {
			return Err(SnapshotError::UnsupportedVersion {
				found: snapshot.version,
				expected: SNAPSHOT_VERSION,
			});
		}
		Ok(snapshot)
	}

	pub fn rule_count(&self) -> usize {
		self.rules.values().map(BTreeMap::len).sum()
	}
}
