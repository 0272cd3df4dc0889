// Copyright 2026 The frog-shell authors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::PathBuf;

use history_trie::{BlockStore, Trie, TrieWalker};

use crate::classify::is_global;
use crate::directory::DirectoryCompleter;
use crate::namespace::{global_key, local_key};
use crate::quoting::has_unmatched_quotes;

/// Flags and cursor state a caller threads through repeated [`CompletionEngine::query`]
/// calls as the user holds Tab.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryFlags {
	/// If set, an empty prefix is still offered filename completion
	/// (listing the current directory) instead of short-circuiting to
	/// no suggestion.
	pub complete_to_files_from_empty_prefix: bool,
	/// Which of the sub-completers' results to return, in the fixed
	/// order local history, global history, directory. Advance this
	/// externally on each repeated request; out-of-range values fall
	/// through to `None`.
	pub cycle_index: usize,
}

/// Consumes accepted command lines and produces completions for an
/// in-progress prompt, backed by a single physical [`Trie`] shared by a
/// namespaced local-history view, a namespaced global-history view, and
/// a (non-trie) filesystem directory completer.
pub struct CompletionEngine<S> {
	trie: Trie<S>,
	directory: DirectoryCompleter,
}

impl<S: BlockStore> CompletionEngine<S> {
	pub fn new(backing: S) -> Self {
		CompletionEngine { trie: Trie::new(backing), directory: DirectoryCompleter::new() }
	}

	pub fn into_store(self) -> S {
		self.trie.into_store()
	}

	/// Record that `accepted_line` was just run: always under the local
	/// (cwd-namespaced) history, and additionally under the global
	/// namespace when the line passes the path-free heuristic.
	pub fn update(&mut self, accepted_line: &str) {
		if accepted_line.is_empty() {
			return;
		}
		let cwd = current_dir();
		if let Err(err) = self.trie.insert(&local_key(&cwd, accepted_line)) {
			log::warn!("could not record history for {:?}: {}", accepted_line, err);
		}
		if is_global(accepted_line) {
			if let Err(err) = self.trie.insert(&global_key(accepted_line)) {
				log::warn!("could not record global history for {:?}: {}", accepted_line, err);
			}
		}
	}

	/// Produce a completion for `prefix`, consuming one slot of
	/// `flags.cycle_index` per sub-completer that had a suggestion to
	/// offer, in order: local history, global history, directory.
	pub fn query(&mut self, prefix: &str, flags: QueryFlags) -> Option<Vec<u8>> {
		if prefix.is_empty() {
			return None;
		}

		let mut candidates = Vec::with_capacity(3);

		let cwd = current_dir();
		if let Some(ext) = self.query_history(&local_key(&cwd, prefix), flags) {
			candidates.push(ext);
		}
		if let Some(ext) = self.query_history(&global_key(prefix), flags) {
			candidates.push(ext);
		}
		if !has_unmatched_quotes(prefix) {
			if let Some(ext) = self.directory.query(prefix) {
				candidates.push(ext);
			}
		}

		candidates.into_iter().nth(flags.cycle_index)
	}

	fn query_history(&mut self, namespaced_query: &[u8], flags: QueryFlags) -> Option<Vec<u8>> {
		let result = TrieWalker::complete(&mut self.trie, namespaced_query)?;
		if result.is_empty() && flags.complete_to_files_from_empty_prefix {
			// An exact match with nothing to add is uninteresting when the
			// caller wants the directory completer to have a shot at
			// offering real filenames instead.
			return None;
		}
		Some(result)
	}
}

fn current_dir() -> PathBuf {
	std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
	use super::*;
	use history_trie_memory::MemoryBlockStore;

	fn engine() -> CompletionEngine<MemoryBlockStore> {
		CompletionEngine::new(MemoryBlockStore::new())
	}

	#[test]
	fn empty_prefix_never_completes() {
		let mut e = engine();
		e.update("git status");
		assert!(e.query("", QueryFlags::default()).is_none());
	}

	#[test]
	fn learns_a_line_and_completes_its_prefix() {
		let mut e = engine();
		e.update("git commit -m wip");
		let suggestion = e.query("git com", QueryFlags::default()).expect("a suggestion");
		assert_eq!(suggestion, b"mit -m wip".to_vec());
	}

	#[test]
	fn exact_match_has_no_extension_but_counts_as_a_result_by_default() {
		let mut e = engine();
		e.update("ls");
		assert_eq!(e.query("ls", QueryFlags::default()), Some(Vec::new()));
	}

	#[test]
	fn empty_extension_is_skipped_when_the_flag_prefers_file_completion() {
		let mut e = engine();
		e.update("ls");
		let flags = QueryFlags { complete_to_files_from_empty_prefix: true, cycle_index: 0 };
		assert!(e.query("ls", flags).is_none());
	}

	#[test]
	fn unknown_prefix_with_no_directory_match_yields_nothing() {
		let mut e = engine();
		assert!(e.query("totally-unknown-command", QueryFlags::default()).is_none());
	}
}
