// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Canonical rule paths.
//!
//! Rules are keyed by a normalized, unix-style absolute path. Normalization is
//! lexical and lossy-safe: any input produces a usable key, and `..` never
//! climbs above the source root.

pub const ROOT: &str = "/";

/// Normalizes a path into the canonical rule-key form.
///
/// ```
/// use loom_server_access::path::normalize;
///
/// assert_eq!(normalize("docs//reports/"), "/docs/reports");
/// assert_eq!(normalize("\\a\\b\\..\\c"), "/a/c");
/// assert_eq!(normalize(""), "/");
/// ```
pub fn normalize(path: &str) -> String {
	let unified = path.replace('\\', "/");
	let mut segments: Vec<&str> = Vec::new();

	for segment in unified.split('/') {
		match segment {
			"" | "." => {}
			".." => {
				segments.pop();
			}
			other => segments.push(other),
		}
	}

	if segments.is_empty() {
		return ROOT.to_string();
	}

	let mut out = String::with_capacity(unified.len() + 1);
	for segment in segments {
		out.push('/');
		out.push_str(segment);
	}
	out
}

/// Returns the parent of a normalized path, or `None` for the root.
pub fn parent(path: &str) -> Option<String> {
	if path == ROOT || path.is_empty() {
		return None;
	}
	match path.rfind('/') {
		Some(0) | None => Some(ROOT.to_string()),
		Some(idx) => Some(path[..idx].to_string()),
	}
}

/// Joins a child name onto a parent path and normalizes the result.
pub fn join(parent: &str, child: &str) -> String {
	normalize(&format!("{parent}/{child}"))
}

/// Returns true when `path` equals `prefix` or lies below it.
///
/// Both arguments must already be normalized. The check is segment-aware, so
/// `/ab` is not within `/a`.
pub fn is_within(path: &str, prefix: &str) -> bool {
	if prefix == ROOT {
		return true;
	}
	match path.strip_prefix(prefix) {
		Some(rest) => rest.is_empty() || rest.starts_with('/'),
		None => false,
	}
}

/// Iterates over a normalized path and each of its parents, ending at `/`.
pub fn ancestors(path: &str) -> Ancestors {
	Ancestors {
		next: Some(path.to_string()),
	}
}

#[derive(Debug, Clone)]
pub struct Ancestors {
	next: Option<String>,
}

impl Iterator for Ancestors {
	type Item = String;

	fn next(&mut self) -> Option<Self::Item> {
		let current = self.next.take()?;
		self.next = parent(&current);
		Some(current)
	}
}
