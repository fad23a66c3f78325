// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Group membership registry.
//!
//! Groups are flat: a group holds usernames only, never other groups. Rules
//! reference groups by name, so a rule may name a group that has no members.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct GroupRegistry {
	groups: RwLock<HashMap<String, HashSet<String>>>,
}

impl GroupRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a registry from a persisted membership map.
	pub fn from_snapshot(groups: BTreeMap<String, BTreeSet<String>>) -> Self {
		let groups = groups
			.into_iter()
			.map(|(name, members)| (name, members.into_iter().collect()))
			.collect();
		Self {
			groups: RwLock::new(groups),
		}
	}

	/// Adds a user to a group, creating the group on first use.
	///
	/// Returns true if the user was not already a member.
	pub fn add_user(&self, group: &str, username: &str) -> bool {
		self
			.groups
			.write()
			.entry(group.to_string())
			.or_default()
			.insert(username.to_string())
	}

	/// Removes a user from a group. An emptied group stays registered.
	///
	/// Returns true if the user was a member.
	pub fn remove_user(&self, group: &str, username: &str) -> bool {
		self
			.groups
			.write()
			.get_mut(group)
			.map(|members| members.remove(username))
			.unwrap_or(false)
	}

	/// Removes a user from every group. Returns the number of groups touched.
	pub fn remove_user_everywhere(&self, username: &str) -> usize {
		let mut groups = self.groups.write();
		groups
			.values_mut()
			.filter_map(|members| members.remove(username).then_some(()))
			.count()
	}

	pub fn is_user_in_group(&self, username: &str, group: &str) -> bool {
		self
			.groups
			.read()
			.get(group)
			.map(|members| members.contains(username))
			.unwrap_or(false)
	}

	/// Returns the first of `groups` (in iteration order) that has `username` as
	/// a member, checking the whole set under one read lock.
	pub fn first_match<'a, I>(&self, username: &str, groups: I) -> Option<String>
	where
		I: IntoIterator<Item = &'a String>,
	{
		let registry = self.groups.read();
		groups
			.into_iter()
			.find(|group| {
				registry
					.get(group.as_str())
					.map(|members| members.contains(username))
					.unwrap_or(false)
			})
			.cloned()
	}

	/// Sorted copy of a group's members. Unknown groups have no members.
	pub fn members(&self, group: &str) -> Vec<String> {
		let mut members: Vec<String> = self
			.groups
			.read()
			.get(group)
			.map(|members| members.iter().cloned().collect())
			.unwrap_or_default();
		members.sort();
		members
	}

	/// Sorted names of every group the user belongs to.
	pub fn groups_for(&self, username: &str) -> Vec<String> {
		let mut names: Vec<String> = self
			.groups
			.read()
			.iter()
			.filter(|(_, members)| members.contains(username))
			.map(|(name, _)| name.clone())
			.collect();
		names.sort();
		names
	}

	/// Deep, ordered copy of the whole registry, empty groups included.
	pub fn snapshot(&self) -> BTreeMap<String, BTreeSet<String>> {
		self
			.groups
			.read()
			.iter()
			.map(|(name, members)| (name.clone(), members.iter().cloned().collect()))
			.collect()
	}
}
