// Copyright 2026 The frog-shell authors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::block::ROOT;
use crate::result::WalkResult;
use crate::store::BlockStore;
use crate::trie::Trie;

/// A cursor into a [`Trie`]: just the block a walk or insert should start
/// from. Cheap to copy; callers that want to resume a walk across several
/// queries hold onto one of these instead of re-deriving it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrieView {
	pub current_block: u32,
}

impl TrieView {
	pub fn root() -> Self {
		TrieView { current_block: ROOT }
	}
}

impl Default for TrieView {
	fn default() -> Self {
		Self::root()
	}
}

/// Combines [`Trie::walk`] and [`Trie::walk_to_end`] into the single
/// operation a completion engine actually wants: "how should the user's
/// current prefix be extended?".
pub struct TrieWalker;

impl TrieWalker {
	/// Walk `query` from the root and, if it is fully consumed without
	/// landing on a leaf, greedily complete to a full historical line.
	/// Returns `None` if `query` isn't a known prefix at all.
	pub fn complete<S: BlockStore>(trie: &mut Trie<S>, query: &[u8]) -> Option<Vec<u8>> {
		let m = trie.walk(query).into_match()?;
		if m.consumed != query.len() {
			return None;
		}
		if m.reached_leaf {
			return Some(m.extension);
		}
		let mut out = m.extension;
		out.extend(trie.walk_to_end(m.block));
		Some(out)
	}
}
