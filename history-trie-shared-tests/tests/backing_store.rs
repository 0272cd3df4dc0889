// Copyright 2026 The frog-shell authors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The same shared property suite, run against the persistent,
//! memory-mapped [`history_store::BackingStore`] so it is held to the
//! same invariants as the in-memory oracle (`memory.rs`), including
//! across the resize protocol: `small_store_config` keeps the initial
//! capacity tiny so several of these tests force at least one grow.

use history_store::{BackingStore, Config};
use history_trie_shared_tests::{bounded_block_growth, case_sensitive, monotone_cost, round_trip};
use std::time::Duration;

fn small_store_config() -> Config {
	Config { initial_blocks: 2, growth_factor: 2, resize_retry_cap: 50, resize_retry_backoff: Duration::from_millis(1) }
}

fn open(dir: &std::path::Path) -> BackingStore {
	BackingStore::open_with_config(Some(dir), small_store_config()).unwrap()
}

#[test]
fn round_trip_forces_a_resize() {
	let dir = tempfile::tempdir().unwrap();
	let lines: Vec<Vec<u8>> = (0..30).map(|i| format!("history-line-{}", i).into_bytes()).collect();
	round_trip(open(dir.path()), &lines);
}

#[test]
fn case_sensitive_lookup() {
	let dir = tempfile::tempdir().unwrap();
	case_sensitive(open(dir.path()));
}

#[test]
fn cost_monotone_and_saturating() {
	let dir = tempfile::tempdir().unwrap();
	monotone_cost(open(dir.path()), b"git status", 5, 3);
	let dir2 = tempfile::tempdir().unwrap();
	monotone_cost(open(dir2.path()), b"git status", 5, 20);
}

#[test]
fn duplicate_inserts_do_not_grow_blocks() {
	let dir = tempfile::tempdir().unwrap();
	bounded_block_growth(open(dir.path()), b"cargo test --workspace", 50);
}

#[test]
fn reopening_the_file_preserves_every_insert() {
	let dir = tempfile::tempdir().unwrap();
	let lines: Vec<&[u8]> = vec![b"ls -la", b"git commit -m wip", b"cargo build --release"];
	{
		let mut trie = history_trie::Trie::new(open(dir.path()));
		for line in &lines {
			trie.insert(line).unwrap();
		}
	}
	let mut trie = history_trie::Trie::new(open(dir.path()));
	for line in &lines {
		let m = trie.walk(line).into_match().expect("line survives a reopen");
		assert_eq!(m.consumed, line.len());
	}
}
