// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sparse table of rules keyed by source and normalized path.
//!
//! The table is the only owner of rule state. Readers get copies; writers go
//! through [`RuleTable::insert_member`] and [`RuleTable::remove_member`].

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use crate::path;
use crate::types::{AccessRule, Effect, SubjectKind};

/// Deep copy of every rule, ordered by source then path.
pub type RuleSnapshot = BTreeMap<String, BTreeMap<String, AccessRule>>;

#[derive(Debug, Default)]
pub struct RuleTable {
	rules: RwLock<HashMap<String, HashMap<String, AccessRule>>>,
}

impl RuleTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a table from persisted rules, re-normalizing every path.
	pub fn from_snapshot(snapshot: RuleSnapshot) -> Self {
		let mut rules: HashMap<String, HashMap<String, AccessRule>> = HashMap::new();
		for (source, paths) in snapshot {
			let by_path = rules.entry(source).or_default();
			for (rule_path, rule) in paths {
				let key = path::normalize(&rule_path);
				let merged = by_path.entry(key).or_default();
				merged.deny.users.extend(rule.deny.users);
				merged.deny.groups.extend(rule.deny.groups);
				merged.allow.users.extend(rule.allow.users);
				merged.allow.groups.extend(rule.allow.groups);
			}
		}
		Self {
			rules: RwLock::new(rules),
		}
	}

	/// Inserts a member, creating the rule if the path has none yet.
	///
	/// Returns true if the member was not already present.
	pub fn insert_member(
		&self,
		source: &str,
		rule_path: &str,
		effect: Effect,
		kind: SubjectKind,
		name: &str,
	) -> bool {
		self
			.rules
			.write()
			.entry(source.to_string())
			.or_default()
			.entry(rule_path.to_string())
			.or_default()
			.insert(effect, kind, name)
	}

	/// Removes a member if present. The rule itself is kept even when it becomes
	/// empty.
	pub fn remove_member(
		&self,
		source: &str,
		rule_path: &str,
		effect: Effect,
		kind: SubjectKind,
		name: &str,
	) -> bool {
		self
			.rules
			.write()
			.get_mut(source)
			.and_then(|paths| paths.get_mut(rule_path))
			.map(|rule| rule.remove(effect, kind, name))
			.unwrap_or(false)
	}

	/// Removes a username from both user sets of every rule.
	///
	/// Returns the `(source, path)` of every rule that changed.
	pub fn remove_user_everywhere(&self, username: &str) -> Vec<(String, String)> {
		let mut changed = Vec::new();
		let mut rules = self.rules.write();
		for (source, paths) in rules.iter_mut() {
			for (rule_path, rule) in paths.iter_mut() {
				let denied = rule.remove(Effect::Deny, SubjectKind::User, username);
				let allowed = rule.remove(Effect::Allow, SubjectKind::User, username);
				if denied || allowed {
					changed.push((source.clone(), rule_path.clone()));
				}
			}
		}
		changed
	}

	/// Copy of the rule stored at exactly this path, empty rules included.
	pub fn get(&self, source: &str, rule_path: &str) -> Option<AccessRule> {
		self
			.rules
			.read()
			.get(source)
			.and_then(|paths| paths.get(rule_path))
			.cloned()
	}

	/// Finds the nearest non-empty rule on the ancestor chain of `rule_path`.
	///
	/// Returns the path the rule is attached to and a copy of it. Empty rules
	/// are stepped over as if absent.
	pub fn nearest(&self, source: &str, rule_path: &str) -> Option<(String, AccessRule)> {
		let rules = self.rules.read();
		let paths = rules.get(source)?;
		path::ancestors(rule_path).find_map(|candidate| {
			paths
				.get(&candidate)
				.filter(|rule| !rule.is_empty())
				.map(|rule| (candidate, rule.clone()))
		})
	}

	/// Deep copy of one source's rules.
	pub fn for_source(&self, source: &str) -> BTreeMap<String, AccessRule> {
		self
			.rules
			.read()
			.get(source)
			.map(|paths| {
				paths
					.iter()
					.map(|(p, rule)| (p.clone(), rule.clone()))
					.collect()
			})
			.unwrap_or_default()
	}

	/// Deep copy of the whole table.
	pub fn snapshot(&self) -> RuleSnapshot {
		self
			.rules
			.read()
			.iter()
			.map(|(source, paths)| {
				let paths = paths
					.iter()
					.map(|(p, rule)| (p.clone(), rule.clone()))
					.collect();
				(source.clone(), paths)
			})
			.collect()
	}
}
