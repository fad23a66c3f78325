// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use loom_server_access::AccessControl;

struct AccessCase {
	name: &'static str,
	path: &'static str,
	user: &'static str,
	expected: bool,
}

fn run_access_cases(access: &AccessControl, cases: &[AccessCase]) {
	for case in cases {
		assert_eq!(
			access.permitted("src", case.path, case.user),
			case.expected,
			"case `{}` failed: {} on {}",
			case.name,
			case.user,
			case.path
		);
	}
}

#[test]
fn test_no_rules_permits_everyone() {
	let access = AccessControl::in_memory();

	run_access_cases(
		&access,
		&[
			AccessCase {
				name: "public_document",
				path: "/public/doc.txt",
				user: "anyone",
				expected: true,
			},
			AccessCase {
				name: "source_root",
				path: "/",
				user: "anyone",
				expected: true,
			},
		],
	);
}

#[test]
fn test_deny_user() {
	let access = AccessControl::in_memory();
	access.deny_user("src", "/secret", "alice").unwrap();

	run_access_cases(
		&access,
		&[
			AccessCase {
				name: "denied_user_blocked",
				path: "/secret",
				user: "alice",
				expected: false,
			},
			AccessCase {
				name: "other_user_unaffected",
				path: "/secret",
				user: "bob",
				expected: true,
			},
			AccessCase {
				name: "deny_inherited_by_descendants",
				path: "/secret/deeper/file.txt",
				user: "alice",
				expected: false,
			},
			AccessCase {
				name: "sibling_unaffected",
				path: "/secretive",
				user: "alice",
				expected: true,
			},
		],
	);
}

#[test]
fn test_allow_user_activates_allow_list() {
	let access = AccessControl::in_memory();
	access.allow_user("src", "/vip", "bob").unwrap();

	run_access_cases(
		&access,
		&[
			AccessCase {
				name: "allowed_user_permitted",
				path: "/vip",
				user: "bob",
				expected: true,
			},
			AccessCase {
				name: "unlisted_user_denied",
				path: "/vip",
				user: "alice",
				expected: false,
			},
		],
	);
}

#[test]
fn test_deny_group() {
	let access = AccessControl::in_memory();
	access.add_user_to_group("admins", "alice").unwrap();
	access.deny_group("src", "/admin", "admins").unwrap();

	run_access_cases(
		&access,
		&[
			AccessCase {
				name: "group_member_denied",
				path: "/admin",
				user: "alice",
				expected: false,
			},
			AccessCase {
				name: "non_member_permitted",
				path: "/admin",
				user: "bob",
				expected: true,
			},
		],
	);
}

#[test]
fn test_combined_rule() {
	let access = AccessControl::in_memory();
	access.add_user_to_group("admins", "alice").unwrap();
	access.add_user_to_group("vip", "bob").unwrap();
	access.deny_user("src", "/combo", "eve").unwrap();
	access.allow_user("src", "/combo", "carol").unwrap();
	access.deny_group("src", "/combo", "admins").unwrap();
	access.allow_group("src", "/combo", "vip").unwrap();

	run_access_cases(
		&access,
		&[
			AccessCase {
				name: "explicit_deny",
				path: "/combo",
				user: "eve",
				expected: false,
			},
			AccessCase {
				name: "explicit_allow",
				path: "/combo",
				user: "carol",
				expected: true,
			},
			AccessCase {
				name: "group_deny",
				path: "/combo",
				user: "alice",
				expected: false,
			},
			AccessCase {
				name: "group_allow",
				path: "/combo",
				user: "bob",
				expected: true,
			},
			AccessCase {
				name: "nobody_else",
				path: "/combo",
				user: "mallory",
				expected: false,
			},
		],
	);
}

#[test]
fn test_deny_wins_within_one_rule() {
	let access = AccessControl::in_memory();
	access.allow_user("src", "/both", "alice").unwrap();
	access.deny_user("src", "/both", "alice").unwrap();

	assert!(!access.permitted("src", "/both", "alice"));
}

#[test]
fn test_nearest_ancestor_wins_without_merging() {
	let access = AccessControl::in_memory();
	access.allow_user("src", "/a", "bob").unwrap();
	access.deny_user("src", "/a/b", "carol").unwrap();

	run_access_cases(
		&access,
		&[
			AccessCase {
				name: "child_rule_overrides_parent_allow_list",
				path: "/a/b/c",
				user: "alice",
				expected: true,
			},
			AccessCase {
				name: "child_rule_denies",
				path: "/a/b/c",
				user: "carol",
				expected: false,
			},
			AccessCase {
				name: "parent_rule_applies_elsewhere",
				path: "/a/x",
				user: "alice",
				expected: false,
			},
		],
	);
}

#[test]
fn test_group_membership_change_after_rule_creation() {
	let access = AccessControl::in_memory();
	access.allow_group("src", "/team", "staff").unwrap();
	assert!(!access.permitted("src", "/team", "dave"));

	access.add_user_to_group("staff", "dave").unwrap();
	assert!(access.permitted("src", "/team", "dave"));
}

#[test]
fn test_idempotent_mutations() {
	let access = AccessControl::in_memory();
	access.deny_user("src", "/x", "alice").unwrap();
	access.deny_user("src", "/x", "alice").unwrap();

	let rule = access.get_rule("src", "/x").unwrap();
	assert_eq!(rule.deny.users.len(), 1);

	assert!(!access.remove_allow_user("src", "/x", "alice").unwrap());
	assert!(access.remove_deny_user("src", "/x", "alice").unwrap());
	assert!(!access.remove_deny_user("src", "/x", "alice").unwrap());
}

#[test]
fn test_emptied_rule_no_longer_shadows_parent() {
	let access = AccessControl::in_memory();
	access.deny_user("src", "/a", "alice").unwrap();
	access.deny_group("src", "/a/b", "contractors").unwrap();
	access.remove_deny_group("src", "/a/b", "contractors").unwrap();

	assert!(access.get_rule("src", "/a/b").is_some());
	assert!(!access.permitted("src", "/a/b/c", "alice"));
}

#[test]
fn test_sources_are_independent() {
	let access = AccessControl::in_memory();
	access.deny_user("photos", "/", "alice").unwrap();

	assert!(!access.permitted("photos", "/2024/beach.jpg", "alice"));
	assert!(access.permitted("documents", "/2024/taxes.pdf", "alice"));
}
