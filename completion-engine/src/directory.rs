// Copyright 2026 The frog-shell authors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Filename completion over the last whitespace-delimited token of the
//! prompt, cycling through matching directory entries on repeated
//! requests for the same fragment (NotDir and read failures are
//! swallowed locally, per §7: a listing failure costs filename
//! completion, not the whole completer stack).

use std::path::{Path, PathBuf};

/// The directory to list and the fragment its entries must start with,
/// split out of the last whitespace-delimited token of a prompt.
struct Target {
	dir: PathBuf,
	fragment: String,
}

fn split_last_token(prefix: &str) -> Option<&str> {
	prefix.rsplit(char::is_whitespace).next()
}

fn split_target(token: &str) -> Target {
	match token.rfind('/') {
		Some(i) => {
			let dir = if i == 0 { "/".to_string() } else { token[..i].to_string() };
			Target { dir: PathBuf::from(dir), fragment: token[i + 1..].to_string() }
		}
		None => Target { dir: PathBuf::from("."), fragment: token.to_string() },
	}
}

fn matching_entries(dir: &Path, fragment: &str) -> Vec<String> {
	let read = match std::fs::read_dir(dir) {
		Ok(r) => r,
		Err(err) => {
			log::debug!("directory completer: could not list {}: {}", dir.display(), err);
			return Vec::new();
		}
	};
	let mut names: Vec<String> = read
		.filter_map(|entry| entry.ok())
		.map(|entry| entry.file_name().to_string_lossy().into_owned())
		.filter(|name| name.starts_with(fragment))
		.collect();
	names.sort();
	names
}

/// Stateful so repeated Tab presses on an unchanged fragment walk
/// through every matching entry instead of only ever returning the
/// first.
#[derive(Default)]
pub struct DirectoryCompleter {
	last_token: Option<String>,
	position: usize,
}

impl DirectoryCompleter {
	pub fn new() -> Self {
		DirectoryCompleter::default()
	}

	/// `prefix` is the whole current prompt; only its last
	/// whitespace-delimited token is used. Returns the suffix to append
	/// to that token, not the whole completion.
	pub fn query(&mut self, prefix: &str) -> Option<Vec<u8>> {
		let token = split_last_token(prefix)?;
		let target = split_target(token);
		if !target.dir.is_dir() {
			return None;
		}
		let entries = matching_entries(&target.dir, &target.fragment);
		if entries.is_empty() {
			self.last_token = None;
			self.position = 0;
			return None;
		}

		if self.last_token.as_deref() == Some(token) {
			self.position = (self.position + 1) % entries.len();
		} else {
			self.last_token = Some(token.to_string());
			self.position = 0;
		}

		let chosen = &entries[self.position];
		Some(chosen.as_bytes()[target.fragment.len()..].to_vec())
	}
}
