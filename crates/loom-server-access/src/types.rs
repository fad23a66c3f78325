// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rule data model.
//!
//! - [`RuleSet`]: usernames and group names named by one side of a rule
//! - [`AccessRule`]: the deny and allow sides attached to one path
//! - [`Effect`] and [`SubjectKind`]: address one of the four member sets

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A set of usernames and group names.
///
/// Usernames match exactly and case-sensitively. Group names are resolved
/// through the group registry at evaluation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
	#[serde(default)]
	pub users: BTreeSet<String>,
	#[serde(default)]
	pub groups: BTreeSet<String>,
}

impl RuleSet {
	pub fn is_empty(&self) -> bool {
		self.users.is_empty() && self.groups.is_empty()
	}

	pub fn contains_user(&self, username: &str) -> bool {
		self.users.contains(username)
	}

	fn members_mut(&mut self, kind: SubjectKind) -> &mut BTreeSet<String> {
		match kind {
			SubjectKind::User => &mut self.users,
			SubjectKind::Group => &mut self.groups,
		}
	}
}

/// Access rule attached to one exact path within one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
	#[serde(default)]
	pub deny: RuleSet,
	#[serde(default)]
	pub allow: RuleSet,
}

impl AccessRule {
	/// A rule with nothing on either side behaves as if no rule existed.
	pub fn is_empty(&self) -> bool {
		self.deny.is_empty() && self.allow.is_empty()
	}

	/// Returns true when the allow side names anyone, which turns unmatched
	/// users from permitted into denied.
	pub fn has_allow_list(&self) -> bool {
		!self.allow.is_empty()
	}

	/// Adds a member. Returns true if it was not already present.
	pub fn insert(&mut self, effect: Effect, kind: SubjectKind, name: &str) -> bool {
		self.side_mut(effect).members_mut(kind).insert(name.to_string())
	}

	/// Removes a member. Returns true if it was present.
	pub fn remove(&mut self, effect: Effect, kind: SubjectKind, name: &str) -> bool {
		self.side_mut(effect).members_mut(kind).remove(name)
	}

	fn side_mut(&mut self, effect: Effect) -> &mut RuleSet {
		match effect {
			Effect::Allow => &mut self.allow,
			Effect::Deny => &mut self.deny,
		}
	}
}

/// Which side of a rule a member sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
	Allow,
	Deny,
}

impl fmt::Display for Effect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Effect::Allow => write!(f, "allow"),
			Effect::Deny => write!(f, "deny"),
		}
	}
}

/// Whether a member names a user or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
	User,
	Group,
}

impl fmt::Display for SubjectKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SubjectKind::User => write!(f, "user"),
			SubjectKind::Group => write!(f, "group"),
		}
	}
}
