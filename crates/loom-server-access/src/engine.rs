// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access resolution.
//!
//! Resolution walks the ancestor chain of a path and evaluates the first
//! non-empty rule it meets:
//!
//! 1. **Nearest rule wins**: a rule on `/a/b` decides `/a/b/c` on its own and
//!    rules further up are never merged in.
//! 2. **Deny first**: an explicit user or group deny always wins.
//! 3. **Allow-list flips the default**: when the allow side names anyone, only
//!    those users (directly or through a group) are permitted.
//! 4. **No rule permits**: with no rule anywhere on the chain, access is granted.
//!
//! Rule evaluation is a pure function of the rule, the username and group
//! membership. The rule table and group registry are never locked together.

use serde::Serialize;

use crate::groups::GroupRegistry;
use crate::rules::RuleTable;
use crate::types::AccessRule;

/// Outcome of a resolution together with the reason for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "group", rename_all = "snake_case")]
pub enum Decision {
	/// No rule on the ancestor chain.
	NoRule,
	/// Username listed on the deny side.
	DeniedUser,
	/// Member of a group listed on the deny side.
	DeniedGroup(String),
	/// Username listed on the allow side.
	AllowedUser,
	/// Member of a group listed on the allow side.
	AllowedGroup(String),
	/// An allow-list is active and the user is not on it.
	NotAllowListed,
	/// The rule only denies others.
	NoAllowList,
}

impl Decision {
	pub fn is_permitted(&self) -> bool {
		matches!(
			self,
			Decision::NoRule
				| Decision::AllowedUser
				| Decision::AllowedGroup(_)
				| Decision::NoAllowList
		)
	}
}

/// A decision and the path of the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
	pub decision: Decision,
	/// `None` when no rule applied.
	pub rule_path: Option<String>,
}

impl Resolution {
	pub fn is_permitted(&self) -> bool {
		self.decision.is_permitted()
	}
}

/// Evaluates one rule for one user.
pub fn evaluate_rule(rule: &AccessRule, username: &str, groups: &GroupRegistry) -> Decision {
	if rule.deny.contains_user(username) {
		return Decision::DeniedUser;
	}

	if let Some(group) = groups.first_match(username, &rule.deny.groups) {
		return Decision::DeniedGroup(group);
	}

	if !rule.has_allow_list() {
		return Decision::NoAllowList;
	}

	if rule.allow.contains_user(username) {
		return Decision::AllowedUser;
	}

	match groups.first_match(username, &rule.allow.groups) {
		Some(group) => Decision::AllowedGroup(group),
		None => Decision::NotAllowListed,
	}
}

/// Resolves access to an already normalized path without touching any cache.
pub fn resolve(
	rules: &RuleTable,
	groups: &GroupRegistry,
	source: &str,
	rule_path: &str,
	username: &str,
) -> Resolution {
	// The table lock is released before group membership is consulted.
	match rules.nearest(source, rule_path) {
		Some((found_at, rule)) => Resolution {
			decision: evaluate_rule(&rule, username, groups),
			rule_path: Some(found_at),
		},
		None => Resolution {
			decision: Decision::NoRule,
			rule_path: None,
		},
	}
}
