// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Short-lived memo of access decisions.
//!
//! Entries are advisory: losing one only costs a fresh resolution. Expiry is
//! checked lazily on read; there is no background sweeper.
//!
//! Every invalidation bumps a generation counter. A decision resolved before
//! an invalidation is refused by [`DecisionCache::set_if_current`], so a
//! concurrent mutation cannot be papered over by a stale result.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::trace;

use crate::path;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_ENTRIES: usize = 100_000;

/// A full cache evicts this fraction of its capacity at once.
const EVICTION_DIVISOR: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
	pub source: String,
	pub path: String,
	pub username: String,
}

impl CacheKey {
	pub fn new(source: &str, path: &str, username: &str) -> Self {
		Self {
			source: source.to_string(),
			path: path.to_string(),
			username: username.to_string(),
		}
	}
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
	permitted: bool,
	expires_at: Instant,
}

#[derive(Debug)]
struct CacheState {
	entries: HashMap<CacheKey, CacheEntry>,
	/// Expired entries are swept on overflow at most once per TTL.
	next_sweep: Instant,
}

#[derive(Debug)]
pub struct DecisionCache {
	state: RwLock<CacheState>,
	generation: AtomicU64,
	ttl: Duration,
	max_entries: usize,
}

impl Default for DecisionCache {
	fn default() -> Self {
		Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
	}
}

impl DecisionCache {
	/// Creates a cache. A zero `ttl` disables caching entirely.
	pub fn new(ttl: Duration, max_entries: usize) -> Self {
		Self {
			state: RwLock::new(CacheState {
				entries: HashMap::new(),
				next_sweep: Instant::now(),
			}),
			generation: AtomicU64::new(0),
			ttl,
			max_entries: max_entries.max(1),
		}
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	pub fn is_enabled(&self) -> bool {
		!self.ttl.is_zero()
	}

	/// Current invalidation generation. Read it before resolving a decision
	/// and hand it back to [`DecisionCache::set_if_current`].
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	/// Returns the cached decision if one exists and has not expired.
	pub fn get(&self, key: &CacheKey) -> Option<bool> {
		if !self.is_enabled() {
			return None;
		}

		let now = Instant::now();
		{
			let state = self.state.read();
			match state.entries.get(key) {
				Some(entry) if entry.expires_at > now => return Some(entry.permitted),
				Some(_) => {}
				None => return None,
			}
		}

		let mut state = self.state.write();
		if state.entries.get(key).is_some_and(|e| e.expires_at <= now) {
			state.entries.remove(key);
			trace!(source = %key.source, path = %key.path, "expired decision dropped");
		}
		None
	}

	pub fn set(&self, key: CacheKey, permitted: bool) {
		if !self.is_enabled() {
			return;
		}
		let mut state = self.state.write();
		self.insert(&mut state, key, permitted);
	}

	/// Stores a decision only if no invalidation happened since `generation`
	/// was read. Returns whether the decision was stored.
	pub fn set_if_current(&self, key: CacheKey, permitted: bool, generation: u64) -> bool {
		if !self.is_enabled() {
			return false;
		}
		let mut state = self.state.write();
		if self.generation.load(Ordering::Acquire) != generation {
			trace!(source = %key.source, path = %key.path, "decision resolved before invalidation not cached");
			return false;
		}
		self.insert(&mut state, key, permitted);
		true
	}

	/// Drops every decision for `source` at or below `prefix`.
	pub fn invalidate_path(&self, source: &str, prefix: &str) -> usize {
		let mut state = self.state.write();
		self.generation.fetch_add(1, Ordering::AcqRel);
		let before = state.entries.len();
		state
			.entries
			.retain(|key, _| !(key.source == source && path::is_within(&key.path, prefix)));
		before - state.entries.len()
	}

	/// Drops every decision made for `username`.
	pub fn invalidate_user(&self, username: &str) -> usize {
		let mut state = self.state.write();
		self.generation.fetch_add(1, Ordering::AcqRel);
		let before = state.entries.len();
		state.entries.retain(|key, _| key.username != username);
		before - state.entries.len()
	}

	pub fn clear(&self) {
		let mut state = self.state.write();
		self.generation.fetch_add(1, Ordering::AcqRel);
		state.entries.clear();
	}

	pub fn len(&self) -> usize {
		self.state.read().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.state.read().entries.is_empty()
	}

	fn insert(&self, state: &mut CacheState, key: CacheKey, permitted: bool) {
		let now = Instant::now();
		if state.entries.len() >= self.max_entries && !state.entries.contains_key(&key) {
			self.make_room(state, now);
		}

		state.entries.insert(
			key,
			CacheEntry {
				permitted,
				expires_at: now + self.ttl,
			},
		);
	}

	fn make_room(&self, state: &mut CacheState, now: Instant) {
		if now >= state.next_sweep {
			state.entries.retain(|_, entry| entry.expires_at > now);
			state.next_sweep = now + self.ttl;
		}

		if state.entries.len() >= self.max_entries {
			let batch = (self.max_entries / EVICTION_DIVISOR).max(1);
			let evicted = evict_soonest(&mut state.entries, batch);
			trace!(evicted, "decision cache full");
		}
	}
}

/// Removes the `count` entries closest to expiry. Returns how many went.
fn evict_soonest(entries: &mut HashMap<CacheKey, CacheEntry>, count: usize) -> usize {
	let doomed: Vec<CacheKey> = {
		let mut by_expiry: Vec<(Instant, &CacheKey)> = entries
			.iter()
			.map(|(key, entry)| (entry.expires_at, key))
			.collect();
		let count = count.min(by_expiry.len());
		if count == 0 {
			return 0;
		}
		if count < by_expiry.len() {
			by_expiry.select_nth_unstable_by_key(count - 1, |(expires_at, _)| *expires_at);
		}
		by_expiry[..count].iter().map(|(_, key)| (*key).clone()).collect()
	};

	for key in &doomed {
		entries.remove(key);
	}
	doomed.len()
}
