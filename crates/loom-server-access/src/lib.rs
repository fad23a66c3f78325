// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Path-based access control for Loom file sources.
//!
//! This crate decides whether a user may see a path inside a storage source:
//!
//! - [`RuleTable`] - sparse allow/deny rules keyed by source and path
//! - [`GroupRegistry`] - flat group membership referenced by rules
//! - [`engine`] - nearest-ancestor resolution with deny-first evaluation
//! - [`DecisionCache`] - short-TTL memo of resolved decisions
//! - [`AccessControl`] - the service tying these together with persistence
//!
//! # Usage
//!
//! ```
//! use loom_server_access::AccessControl;
//!
//! let access = AccessControl::in_memory();
//! access.deny_user("media", "/secret", "alice").unwrap();
//!
//! assert!(!access.permitted("media", "/secret/plans.txt", "alice"));
//! assert!(access.permitted("media", "/secret/plans.txt", "bob"));
//! assert!(access.permitted("media", "/public", "alice"));
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod groups;
pub mod listing;
pub mod path;
pub mod rules;
pub mod service;
pub mod snapshot;
pub mod store;
pub mod types;

pub use cache::{CacheKey, DecisionCache};
pub use config::{load_config, AccessConfig, CacheConfig, StoreConfig};
pub use engine::{Decision, Resolution};
pub use error::{AccessError, ConfigError, Result, SnapshotError, StoreError};
pub use groups::GroupRegistry;
pub use listing::{DirectoryListing, FilteredListing, VisibleChildren};
pub use rules::{RuleSnapshot, RuleTable};
pub use service::AccessControl;
pub use snapshot::AccessSnapshot;
pub use store::{AccessStore, FileAccessStore, MemoryAccessStore};
pub use types::{AccessRule, Effect, RuleSet, SubjectKind};
