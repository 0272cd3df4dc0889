// Copyright 2026 The frog-shell authors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::block::{Edge, Label, TrieBlock, BASE_COST, K, LABEL_LEN, ROOT};
use crate::result::{WalkMatch, WalkResult};
use crate::store::BlockStore;

/// The radix trie, generic over its backing [`BlockStore`].
pub struct Trie<S> {
	store: S,
}

impl<S: BlockStore> Trie<S> {
	pub fn new(store: S) -> Self {
		Trie { store }
	}

	pub fn store(&self) -> &S {
		&self.store
	}

	pub fn store_mut(&mut self) -> &mut S {
		&mut self.store
	}

	pub fn into_store(self) -> S {
		self.store
	}

	/// Insert `key` with the default top-level cost, bubbling the touched
	/// sibling chain so the most recently touched path sorts first.
	///
	/// Inserting an empty key is a no-op.
	pub fn insert(&mut self, key: &[u8]) -> Result<(), S::Error> {
		self.insert_with_cost(key, BASE_COST)
	}

	pub fn insert_with_cost(&mut self, key: &[u8], base_cost: u16) -> Result<(), S::Error> {
		if key.is_empty() {
			return Ok(());
		}
		self.insert_into(ROOT, key, base_cost)
	}

	/// Insert `key` starting at the head of the sibling chain `start`,
	/// re-sorting that chain by cost before returning. `start` is always
	/// the head of its chain: a child pointer or the root, never a block
	/// reached only via `next`.
	fn insert_into(&mut self, start: u32, key: &[u8], base_cost: u16) -> Result<(), S::Error> {
		let result = self.insert_into_inner(start, key, base_cost);
		self.sort_chain(start);
		result
	}

	fn insert_into_inner(&mut self, start: u32, key: &[u8], base_cost: u16) -> Result<(), S::Error> {
		let mut block = start;
		loop {
			let len = self.store.block(block).len as usize;
			let mut matched = None;
			for i in 0..len {
				let label = self.store.block(block).labels[i];
				// An empty-label edge is a sentinel marking "this prefix is
				// itself a stored string". A literal re-insert of the same
				// (now-empty) remaining key is the only way to land on one
				// again; treat that as a hit rather than re-splitting it
				// into an identical edge on every duplicate (see DESIGN.md).
				if label.len() == 0 {
					if key.is_empty() {
						let cost = self.store.block(block).costs[i];
						self.store.block_mut(block).costs[i] = cost.saturating_sub(1);
						return Ok(());
					}
					continue;
				}
				let cp = label.common_prefix_len(key);
				if cp == 0 {
					continue;
				}
				matched = Some((i, cp));
				break;
			}

			if let Some((i, cp)) = matched {
				let edge_len = self.store.block(block).labels[i].len();
				let is_leaf = self.store.block(block).is_leaf(i);
				if cp == edge_len && !is_leaf {
					let child = self.store.block(block).children[i];
					let cost = self.store.block(block).costs[i];
					self.store.block_mut(block).costs[i] = cost.saturating_sub(1);
					return self.insert_into(child, &key[cp..], base_cost);
				} else {
					let new_block = self.split_edge(block, i, cp)?;
					return self.insert_into(new_block, &key[cp..], base_cost);
				}
			}

			if len == K {
				let next = self.store.block(block).next;
				if next != 0 {
					block = next;
					continue;
				}
				let new_sibling = self.store.append(TrieBlock::empty())?;
				self.store.block_mut(block).next = new_sibling;
				block = new_sibling;
				continue;
			}

			return self.append_edge(block, key, base_cost);
		}
	}

	/// Split edge `i` of `block` at `cp` bytes, moving its tail into a new
	/// block. Returns the new block's index, into which the caller should
	/// continue inserting `key[cp..]`.
	fn split_edge(&mut self, block: u32, i: usize, cp: usize) -> Result<u32, S::Error> {
		let old = self.store.block(block).edge(i);
		let tail = Label::from_slice(&old.label.as_bytes()[cp..]);

		let mut new_block = TrieBlock::empty();
		new_block.set_edge(0, Edge { label: tail, child: old.child, cost: old.cost, leaf: old.leaf });
		new_block.len = 1;
		let new_index = self.store.append(new_block)?;

		let b = self.store.block_mut(block);
		b.set_edge(
			i,
			Edge {
				label: Label::from_slice(&old.label.as_bytes()[..cp]),
				child: new_index,
				cost: old.cost.saturating_sub(1),
				leaf: false,
			},
		);
		Ok(new_index)
	}

	fn append_edge(&mut self, block: u32, key: &[u8], base_cost: u16) -> Result<(), S::Error> {
		let len = self.store.block(block).len as usize;
		debug_assert!(len < K);
		if key.len() < LABEL_LEN {
			let b = self.store.block_mut(block);
			b.set_edge(len, Edge { label: Label::from_slice(key), child: 0, cost: base_cost, leaf: true });
			b.len += 1;
			Ok(())
		} else {
			let head = Label::from_slice(&key[..LABEL_LEN]);
			let new_block = self.store.append(TrieBlock::empty())?;
			let b = self.store.block_mut(block);
			b.set_edge(len, Edge { label: head, child: new_block, cost: base_cost, leaf: false });
			b.len += 1;
			self.insert_into(new_block, &key[LABEL_LEN..], base_cost)
		}
	}

	/// Bubble-sort the edges of the sibling chain starting at `start` by
	/// ascending cost, swapping on `>=` so that edges touched in the same
	/// insert bubble in front of equal-cost, less-recently-touched edges.
	/// Not idempotent: a second sort of an all-equal-cost chain keeps
	/// permuting it.
	fn sort_chain(&mut self, start: u32) {
		let positions = self.chain_positions(start);
		let n = positions.len();
		for _ in 0..n {
			for w in 0..n.saturating_sub(1) {
				let (ba, ia) = positions[w];
				let (bb, ib) = positions[w + 1];
				let cost_a = self.store.block(ba).costs[ia];
				let cost_b = self.store.block(bb).costs[ib];
				if cost_a >= cost_b {
					self.swap_edges(ba, ia, bb, ib);
				}
			}
		}
	}

	fn swap_edges(&mut self, ba: u32, ia: usize, bb: u32, ib: usize) {
		if ba == bb {
			self.store.block_mut(ba).swap_edges(ia, ib);
		} else {
			let edge_a = self.store.block(ba).edge(ia);
			let edge_b = self.store.block(bb).edge(ib);
			self.store.block_mut(ba).set_edge(ia, edge_b);
			self.store.block_mut(bb).set_edge(ib, edge_a);
		}
	}

	/// Every live edge in the sibling chain starting at `start`, as
	/// `(block, edge_index)` pairs, in chain order.
	pub fn chain_positions(&mut self, start: u32) -> Vec<(u32, usize)> {
		let mut out = Vec::new();
		let mut block = start;
		let mut guard = 0usize;
		loop {
			let b = self.store.block(block);
			for i in 0..b.len as usize {
				out.push((block, i));
			}
			let next = b.next;
			if next == 0 {
				break;
			}
			block = next;
			guard += 1;
			// `next` is acyclic by construction (root can never be a
			// `next` target); this caps a corrupted chain instead of
			// hanging forever.
			if guard > self.store.block_count() as usize {
				break;
			}
		}
		out
	}

	/// Walk `query` from the root.
	pub fn walk(&mut self, query: &[u8]) -> WalkResult {
		self.walk_from(ROOT, query)
	}

	fn walk_from(&mut self, start: u32, query: &[u8]) -> WalkResult {
		let mut block = start;
		let mut consumed = 0usize;
		loop {
			match self.find_matching_edge(block, &query[consumed..]) {
				None => {
					let next = self.store.block(block).next;
					if next == 0 {
						return WalkResult::NotFound;
					}
					block = next;
				}
				Some((i, chars_used)) => {
					let edge = self.store.block(block).edge(i);
					if edge.leaf {
						consumed += chars_used;
						let extension = edge.label.as_bytes()[chars_used..].to_vec();
						return WalkResult::Found(WalkMatch {
							consumed,
							extension,
							reached_leaf: true,
							cost: edge.cost,
							block,
						});
					}
					consumed += chars_used;
					if consumed == query.len() {
						let extension = edge.label.as_bytes()[chars_used..].to_vec();
						return WalkResult::Found(WalkMatch {
							consumed,
							extension,
							reached_leaf: false,
							cost: edge.cost,
							block: edge.child,
						});
					}
					block = edge.child;
				}
			}
		}
	}

	/// The first (lowest-cost) live, non-sentinel edge in `block`, if any.
	fn find_matching_edge(&mut self, block: u32, remaining: &[u8]) -> Option<(usize, usize)> {
		let b = self.store.block(block);
		for i in 0..b.len as usize {
			let label = b.labels[i];
			if label.len() == 0 {
				continue;
			}
			let lb = label.as_bytes();
			let cp = label.common_prefix_len(remaining);
			if cp == lb.len() || cp == remaining.len() {
				if cp == 0 {
					continue;
				}
				return Some((i, cp));
			}
		}
		None
	}

	/// Follow the lowest-cost edge (index 0, after sorting) greedily from
	/// `block` until a leaf or an empty block is reached, concatenating
	/// labels. Used to complete a partial match to a full historical line.
	pub fn walk_to_end(&mut self, mut block: u32) -> Vec<u8> {
		let mut out = Vec::new();
		let mut guard = 0usize;
		loop {
			let b = self.store.block(block);
			if b.len == 0 {
				break;
			}
			let edge = b.edge(0);
			out.extend_from_slice(edge.label.as_bytes());
			if edge.leaf {
				break;
			}
			block = edge.child;
			guard += 1;
			if guard > self.store.block_count() as usize {
				break;
			}
		}
		out
	}
}
