// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use loom_server_access::{
	AccessControl, AccessError, CacheConfig, FileAccessStore, SnapshotError,
};
use tempfile::TempDir;

fn open(dir: &TempDir) -> AccessControl {
	let store = Arc::new(FileAccessStore::new(dir.path().join("access.json")));
	AccessControl::open(store, &CacheConfig::default()).unwrap()
}

#[test]
fn test_rules_and_groups_survive_restart() {
	let dir = TempDir::new().unwrap();
	{
		let access = open(&dir);
		access.add_user_to_group("admins", "alice").unwrap();
		access.add_user_to_group("vip", "bob").unwrap();
		access.deny_user("src", "/combo", "eve").unwrap();
		access.allow_user("src", "/combo", "carol").unwrap();
		access.deny_group("src", "/combo", "admins").unwrap();
		access.allow_group("src", "/combo", "vip").unwrap();
	}

	let access = open(&dir);
	assert!(!access.permitted("src", "/combo", "eve"));
	assert!(access.permitted("src", "/combo", "carol"));
	assert!(!access.permitted("src", "/combo", "alice"));
	assert!(access.permitted("src", "/combo", "bob"));
	assert!(!access.permitted("src", "/combo", "mallory"));
	assert_eq!(access.group_members("admins"), vec!["alice"]);
}

#[test]
fn test_fresh_store_starts_empty() {
	let dir = TempDir::new().unwrap();
	let access = open(&dir);

	assert!(access.all_rules().is_empty());
	assert!(access.all_groups().is_empty());
	assert!(access.permitted("src", "/anything", "anyone"));
}

#[test]
fn test_empty_group_survives_restart() {
	let dir = TempDir::new().unwrap();
	{
		let access = open(&dir);
		access.add_user_to_group("retired", "old").unwrap();
		access.remove_user_from_group("retired", "old").unwrap();
	}

	let access = open(&dir);
	assert!(access.all_groups().contains_key("retired"));
	assert!(access.group_members("retired").is_empty());
}

#[test]
fn test_hand_written_snapshot_is_normalized_on_load() {
	let dir = TempDir::new().unwrap();
	std::fs::write(
		dir.path().join("access.json"),
		r#"{
			"version": 1,
			"rules": { "src": { "private/": { "deny": { "users": ["alice"] } } } },
			"groups": {}
		}"#,
	)
	.unwrap();

	let access = open(&dir);
	assert!(access.get_rule("src", "/private").is_some());
	assert!(!access.permitted("src", "/private/notes", "alice"));
}

#[test]
fn test_unsupported_version_is_rejected() {
	let dir = TempDir::new().unwrap();
	std::fs::write(dir.path().join("access.json"), r#"{"version": 99}"#).unwrap();

	let store = Arc::new(FileAccessStore::new(dir.path().join("access.json")));
	let err = AccessControl::open(store, &CacheConfig::default()).unwrap_err();
	assert!(matches!(
		err,
		AccessError::Snapshot(SnapshotError::UnsupportedVersion { found: 99, .. })
	));
}
