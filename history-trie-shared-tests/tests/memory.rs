// Copyright 2026 The frog-shell authors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The shared property suite run against the in-memory `BlockStore`, the
//! reference oracle every other implementation is checked against.

use history_trie_memory::MemoryBlockStore;
use history_trie_shared_tests::{bounded_block_growth, case_sensitive, determinism, monotone_cost, round_trip};

#[test]
fn round_trip_fixed_set() {
	round_trip(MemoryBlockStore::new(), &[b"bug".to_vec(), b"ben".to_vec(), b"buggin".to_vec(), b"ls -la".to_vec()]);
}

#[test]
fn case_sensitive_lookup() {
	case_sensitive(MemoryBlockStore::new());
}

#[test]
fn cost_monotone_and_saturating() {
	monotone_cost(MemoryBlockStore::new(), b"git status", 5, 3);
	monotone_cost(MemoryBlockStore::new(), b"git status", 5, 20);
}

#[test]
fn duplicate_inserts_do_not_grow_blocks() {
	bounded_block_growth(MemoryBlockStore::new(), b"cargo test --workspace", 50);
}

#[test]
fn two_independent_stores_agree() {
	let lines: Vec<Vec<u8>> =
		(0..40).map(|i| format!("cmd-{}", i % 7).into_bytes()).collect();
	determinism(MemoryBlockStore::new(), MemoryBlockStore::new(), &lines);
}

#[quickcheck_macros::quickcheck]
fn round_trip_property(lines: Vec<history_trie_shared_tests::CommandLine>) -> bool {
	let lines: Vec<Vec<u8>> = lines.into_iter().map(|l| l.0).collect();
	let mut trie = history_trie::Trie::new(MemoryBlockStore::new());
	for line in &lines {
		trie.insert(line).unwrap();
	}
	lines.iter().all(|line| {
		trie.walk(line).into_match().map(|m| m.consumed == line.len() && m.extension.is_empty()).unwrap_or(false)
	})
}

#[quickcheck_macros::quickcheck]
fn prefix_extension_property(line: history_trie_shared_tests::CommandLine) -> bool {
	let s = &line.0;
	if s.is_empty() {
		return true;
	}
	let mut trie = history_trie::Trie::new(MemoryBlockStore::new());
	trie.insert(s).unwrap();
	(1..s.len()).all(|cut| match trie.walk(&s[..cut]).into_match() {
		Some(m) => m.consumed == cut,
		None => false,
	})
}
