// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The access-control service shared by every request path.
//!
//! [`AccessControl`] owns the rule table, the group registry, the decision
//! cache and a handle to the durability backend. Each component has its own
//! lock and no two are ever held at once. Mutations update memory first and
//! then flush a full snapshot; reads never touch the backend.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, instrument, trace, warn};

use crate::cache::{CacheKey, DecisionCache};
use crate::config::CacheConfig;
use crate::engine::{self, Resolution};
use crate::error::Result;
use crate::groups::GroupRegistry;
use crate::path;
use crate::rules::{RuleSnapshot, RuleTable};
use crate::snapshot::AccessSnapshot;
use crate::store::{AccessStore, MemoryAccessStore};
use crate::types::{AccessRule, Effect, SubjectKind};

pub struct AccessControl {
	rules: RuleTable,
	groups: GroupRegistry,
	cache: DecisionCache,
	store: Arc<dyn AccessStore>,
	/// Serializes snapshot-and-save so the last flush writes the newest state.
	flush_lock: Mutex<()>,
	invalidate_on_write: bool,
}

impl std::fmt::Debug for AccessControl {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AccessControl")
			.field("cached_decisions", &self.cache.len())
			.field("invalidate_on_write", &self.invalidate_on_write)
			.finish_non_exhaustive()
	}
}

impl AccessControl {
	/// Creates an empty service without reading the backend.
	pub fn new(store: Arc<dyn AccessStore>, config: &CacheConfig) -> Self {
		Self::from_parts(RuleTable::new(), GroupRegistry::new(), store, config)
	}

	/// Creates a service seeded from the backend's last snapshot.
	///
	/// A backend with nothing saved yields an empty service.
	pub fn open(store: Arc<dyn AccessStore>, config: &CacheConfig) -> Result<Self> {
		let snapshot = match store.load()? {
			Some(blob) => AccessSnapshot::decode(&blob)?,
			None => AccessSnapshot::default(),
		};

		info!(
			rules = snapshot.rule_count(),
			groups = snapshot.groups.len(),
			"access rules loaded"
		);

		Ok(Self::from_parts(
			RuleTable::from_snapshot(snapshot.rules),
			GroupRegistry::from_snapshot(snapshot.groups),
			store,
			config,
		))
	}

	/// Service backed by a [`MemoryAccessStore`] with default cache settings.
	pub fn in_memory() -> Self {
		Self::new(Arc::new(MemoryAccessStore::new()), &CacheConfig::default())
	}

	fn from_parts(
		rules: RuleTable,
		groups: GroupRegistry,
		store: Arc<dyn AccessStore>,
		config: &CacheConfig,
	) -> Self {
		Self {
			rules,
			groups,
			cache: DecisionCache::new(config.ttl, config.max_entries),
			store,
			flush_lock: Mutex::new(()),
			invalidate_on_write: config.invalidate_on_write,
		}
	}

	// Decisions

	/// Returns whether `username` may see `path` within `source`.
	///
	/// Never fails: paths with no rule on their ancestor chain are permitted.
	pub fn permitted(&self, source: &str, path: &str, username: &str) -> bool {
		let rule_path = path::normalize(path);
		let key = CacheKey::new(source, &rule_path, username);

		if let Some(permitted) = self.cache.get(&key) {
			trace!(source, path = %rule_path, username, permitted, "cached access decision");
			return permitted;
		}

		let generation = self.cache.generation();
		let resolution = engine::resolve(&self.rules, &self.groups, source, &rule_path, username);
		let permitted = resolution.is_permitted();

		debug!(
			source,
			path = %rule_path,
			username,
			rule = ?resolution.rule_path,
			decision = ?resolution.decision,
			permitted,
			"access resolved"
		);

		self.cache.set_if_current(key, permitted, generation);
		permitted
	}

	/// Resolves without the cache and reports which rule decided and why.
	pub fn explain(&self, source: &str, path: &str, username: &str) -> Resolution {
		let rule_path = path::normalize(path);
		engine::resolve(&self.rules, &self.groups, source, &rule_path, username)
	}

	// Rule mutations

	#[instrument(level = "debug", skip(self))]
	pub fn deny_user(&self, source: &str, path: &str, username: &str) -> Result<()> {
		self.add_member(source, path, Effect::Deny, SubjectKind::User, username)
	}

	#[instrument(level = "debug", skip(self))]
	pub fn allow_user(&self, source: &str, path: &str, username: &str) -> Result<()> {
		self.add_member(source, path, Effect::Allow, SubjectKind::User, username)
	}

	#[instrument(level = "debug", skip(self))]
	pub fn deny_group(&self, source: &str, path: &str, group: &str) -> Result<()> {
		self.add_member(source, path, Effect::Deny, SubjectKind::Group, group)
	}

	#[instrument(level = "debug", skip(self))]
	pub fn allow_group(&self, source: &str, path: &str, group: &str) -> Result<()> {
		self.add_member(source, path, Effect::Allow, SubjectKind::Group, group)
	}

	#[instrument(level = "debug", skip(self))]
	pub fn remove_deny_user(&self, source: &str, path: &str, username: &str) -> Result<bool> {
		self.drop_member(source, path, Effect::Deny, SubjectKind::User, username)
	}

	#[instrument(level = "debug", skip(self))]
	pub fn remove_allow_user(&self, source: &str, path: &str, username: &str) -> Result<bool> {
		self.drop_member(source, path, Effect::Allow, SubjectKind::User, username)
	}

	#[instrument(level = "debug", skip(self))]
	pub fn remove_deny_group(&self, source: &str, path: &str, group: &str) -> Result<bool> {
		self.drop_member(source, path, Effect::Deny, SubjectKind::Group, group)
	}

	#[instrument(level = "debug", skip(self))]
	pub fn remove_allow_group(&self, source: &str, path: &str, group: &str) -> Result<bool> {
		self.drop_member(source, path, Effect::Allow, SubjectKind::Group, group)
	}

	/// Adds a member to one side of the rule at `path`, creating the rule if
	/// needed, then flushes. Already-present members still flush.
	pub fn add_member(
		&self,
		source: &str,
		path: &str,
		effect: Effect,
		kind: SubjectKind,
		name: &str,
	) -> Result<()> {
		let rule_path = path::normalize(path);
		if self
			.rules
			.insert_member(source, &rule_path, effect, kind, name)
		{
			debug!(source, path = %rule_path, %effect, %kind, name, "rule member added");
			self.invalidate_path(source, &rule_path);
		}
		self.flush()
	}

	/// Removes a member from one side of the rule at `path`.
	///
	/// Returns false without flushing when the member was not present.
	pub fn drop_member(
		&self,
		source: &str,
		path: &str,
		effect: Effect,
		kind: SubjectKind,
		name: &str,
	) -> Result<bool> {
		let rule_path = path::normalize(path);
		if !self
			.rules
			.remove_member(source, &rule_path, effect, kind, name)
		{
			return Ok(false);
		}

		debug!(source, path = %rule_path, %effect, %kind, name, "rule member removed");
		self.invalidate_path(source, &rule_path);
		self.flush()?;
		Ok(true)
	}

	// Groups

	#[instrument(level = "debug", skip(self))]
	pub fn add_user_to_group(&self, group: &str, username: &str) -> Result<()> {
		if self.groups.add_user(group, username) {
			self.invalidate_user(username);
		}
		self.flush()
	}

	/// Returns false without flushing when the user was not a member.
	#[instrument(level = "debug", skip(self))]
	pub fn remove_user_from_group(&self, group: &str, username: &str) -> Result<bool> {
		if !self.groups.remove_user(group, username) {
			return Ok(false);
		}
		self.invalidate_user(username);
		self.flush()?;
		Ok(true)
	}

	pub fn is_user_in_group(&self, username: &str, group: &str) -> bool {
		self.groups.is_user_in_group(username, group)
	}

	pub fn group_members(&self, group: &str) -> Vec<String> {
		self.groups.members(group)
	}

	pub fn groups_for_user(&self, username: &str) -> Vec<String> {
		self.groups.groups_for(username)
	}

	pub fn all_groups(&self) -> BTreeMap<String, BTreeSet<String>> {
		self.groups.snapshot()
	}

	// Reads

	/// Copy of the rule attached to exactly this path, if any.
	pub fn get_rule(&self, source: &str, path: &str) -> Option<AccessRule> {
		self.rules.get(source, &path::normalize(path))
	}

	/// Deep copy of every rule.
	pub fn all_rules(&self) -> RuleSnapshot {
		self.rules.snapshot()
	}

	pub fn rules_for_source(&self, source: &str) -> BTreeMap<String, AccessRule> {
		self.rules.for_source(source)
	}

	// Administration

	/// Removes a username from every rule and every group.
	///
	/// Returns the number of rules and groups changed; flushes only if that is
	/// non-zero.
	#[instrument(level = "debug", skip(self))]
	pub fn remove_user(&self, username: &str) -> Result<usize> {
		let changed_rules = self.rules.remove_user_everywhere(username);
		let rules_changed = changed_rules.len();
		let groups_changed = self.groups.remove_user_everywhere(username);
		let changed = rules_changed + groups_changed;
		if changed == 0 {
			return Ok(0);
		}

		info!(username, rules_changed, groups_changed, "user removed from access rules");
		// An emptied allow list changes the outcome for everyone under it.
		for (source, rule_path) in &changed_rules {
			self.invalidate_path(source, rule_path);
		}
		self.invalidate_user(username);
		self.flush()?;
		Ok(changed)
	}

	pub fn clear_cache(&self) {
		self.cache.clear();
	}

	/// Writes the current rules and groups to the backend.
	///
	/// Component locks are only held while copying state, never during I/O.
	pub fn flush(&self) -> Result<()> {
		let _guard = self.flush_lock.lock();

		let snapshot = AccessSnapshot::new(self.rules.snapshot(), self.groups.snapshot());
		let blob = snapshot.encode()?;

		if let Err(e) = self.store.save(&blob) {
			warn!(error = %e, "failed to persist access snapshot");
			return Err(e.into());
		}

		debug!(
			rules = snapshot.rule_count(),
			groups = snapshot.groups.len(),
			bytes = blob.len(),
			"access snapshot persisted"
		);
		Ok(())
	}

	fn invalidate_path(&self, source: &str, rule_path: &str) {
		if self.invalidate_on_write {
			let dropped = self.cache.invalidate_path(source, rule_path);
			trace!(source, path = rule_path, dropped, "invalidated cached decisions");
		}
	}

	fn invalidate_user(&self, username: &str) {
		if self.invalidate_on_write {
			let dropped = self.cache.invalidate_user(username);
			trace!(username, dropped, "invalidated cached decisions");
		}
	}
}
