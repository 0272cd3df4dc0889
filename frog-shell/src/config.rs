// Copyright 2026 The frog-shell authors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Small, environment-variable-driven configuration, in the style of
//! the config structs scattered across the example pack rather than a
//! full config-file parser (out of scope for this shell).

use history_store::Config as StoreConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Shell-wide tunables. Every field has a sensible default and can be
/// overridden by an environment variable, which is all an interactive
/// shell and its `--test-mp` harness need.
#[derive(Clone, Debug)]
pub struct ShellConfig {
	/// `FROG_STATE_DIR`: where the `.frog` history file and its
	/// `.frog-sync` coordination directory live. Defaults to the current
	/// directory, matching `BackingStore::open(None)`.
	pub state_dir: Option<PathBuf>,
	pub store: StoreConfig,
}

impl Default for ShellConfig {
	fn default() -> Self {
		let mut store = StoreConfig::default();
		if let Some(blocks) = env_usize("FROG_INITIAL_BLOCKS") {
			store.initial_blocks = blocks;
		}
		if let Some(factor) = env_usize("FROG_GROWTH_FACTOR") {
			store.growth_factor = factor;
		}
		if let Some(cap) = env_u32("FROG_RESIZE_RETRY_CAP") {
			store.resize_retry_cap = cap;
		}
		if let Some(ms) = env_u64("FROG_RESIZE_RETRY_BACKOFF_MS") {
			store.resize_retry_backoff = Duration::from_millis(ms);
		}
		ShellConfig { state_dir: std::env::var_os("FROG_STATE_DIR").map(PathBuf::from), store }
	}
}

fn env_usize(name: &str) -> Option<usize> {
	std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_u32(name: &str) -> Option<u32> {
	std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_u64(name: &str) -> Option<u64> {
	std::env::var(name).ok().and_then(|v| v.parse().ok())
}
