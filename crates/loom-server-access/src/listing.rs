// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory-listing filter.
//!
//! A listing that had entries but in which the user can see none is reported
//! as `denied`, so callers can tell an empty directory from a forbidden one.

use serde::{Deserialize, Serialize};

use crate::path;
use crate::service::AccessControl;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisibleChildren {
	pub visible: Vec<String>,
	pub denied: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryListing {
	pub folders: Vec<String>,
	pub files: Vec<String>,
}

impl DirectoryListing {
	pub fn is_empty(&self) -> bool {
		self.folders.is_empty() && self.files.is_empty()
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilteredListing {
	pub folders: Vec<String>,
	pub files: Vec<String>,
	pub denied: bool,
}

impl AccessControl {
	/// Keeps the child names under `parent` that `username` may see, in listing
	/// order.
	pub fn filter_visible_children<S: AsRef<str>>(
		&self,
		source: &str,
		parent: &str,
		children: &[S],
		username: &str,
	) -> VisibleChildren {
		let visible = self.visible(source, parent, children, username);
		VisibleChildren {
			denied: !children.is_empty() && visible.is_empty(),
			visible,
		}
	}

	/// Filters a folders-and-files listing of `parent`.
	pub fn filter_listing(
		&self,
		source: &str,
		parent: &str,
		listing: &DirectoryListing,
		username: &str,
	) -> FilteredListing {
		let folders = self.visible(source, parent, &listing.folders, username);
		let files = self.visible(source, parent, &listing.files, username);
		FilteredListing {
			denied: !listing.is_empty() && folders.is_empty() && files.is_empty(),
			folders,
			files,
		}
	}

	fn visible<S: AsRef<str>>(
		&self,
		source: &str,
		parent: &str,
		children: &[S],
		username: &str,
	) -> Vec<String> {
		children
			.iter()
			.map(|child| child.as_ref())
			.filter(|name| self.permitted(source, &path::join(parent, name), username))
			.map(str::to_string)
			.collect()
	}
}
