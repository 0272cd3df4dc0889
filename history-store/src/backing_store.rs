// Copyright 2026 The frog-shell authors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs::{File, OpenOptions};
use std::mem::size_of;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use history_trie::{BlockStore, TrieBlock};
use memmap2::MmapMut;

use crate::error::BackingStoreError;
use crate::header::{FileHeader, HEADER_LEN};
use crate::named_sync::{NamedEvent, NamedMutex, PeerCounter};

const DATA_FILE: &str = "history.frog";
const SYNC_DIR: &str = ".frog-sync";

/// Tunables for the resize protocol and initial sizing. The defaults are
/// conservative enough for interactive use; tests shrink them to keep
/// retry loops fast.
#[derive(Clone, Debug)]
pub struct Config {
	/// Blocks the file is created with.
	pub initial_blocks: usize,
	/// Multiplier applied to capacity each time the file must grow.
	pub growth_factor: usize,
	/// How many times to poll while waiting on a peer or a timed event
	/// before giving up with [`BackingStoreError::ResizeTimeout`].
	pub resize_retry_cap: u32,
	/// Delay between polls.
	pub resize_retry_backoff: Duration,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			initial_blocks: 64,
			growth_factor: 2,
			resize_retry_cap: 200,
			resize_retry_backoff: Duration::from_millis(10),
		}
	}
}

struct Sync {
	writer_mutex: NamedMutex,
	unload_event: NamedEvent,
	reload_event: NamedEvent,
	peers: PeerCounter,
	acked: PeerCounter,
}

impl Sync {
	fn open(sync_dir: &Path) -> Result<Self, BackingStoreError> {
		std::fs::create_dir_all(sync_dir)?;
		Ok(Sync {
			writer_mutex: NamedMutex::open(&sync_dir.join("writer.lock"))?,
			unload_event: NamedEvent::open(sync_dir.join("unload.evt"))?,
			reload_event: NamedEvent::open(sync_dir.join("reload.evt"))?,
			peers: PeerCounter::open(sync_dir.join("peers.cnt"), sync_dir.join("peers.lock"))?,
			acked: PeerCounter::open(sync_dir.join("acked.cnt"), sync_dir.join("acked.lock"))?,
		})
	}
}

/// A persistent, memory-mapped, multi-process [`BlockStore`].
///
/// Every block access goes through the current mapping of a single
/// `.frog` file in the shell's state directory. Growing that file (when
/// [`BlockStore::append`] finds no room left) is coordinated with any
/// other process mapping the same file through a handful of small files
/// in a `.frog-sync` sibling directory: a writer mutex, two generation
/// counters standing in for named unload/reload events, and a peer
/// counter (see `named_sync`). A background thread watches the unload
/// counter and flags a pending remap for the foreground thread to pick up
/// the next time it actually dereferences a block.
pub struct BackingStore {
	file: File,
	mmap: MmapMut,
	config: Config,
	sync: Arc<Sync>,
	pending_remap: Arc<AtomicBool>,
	stop_background: Arc<AtomicBool>,
	background: Option<JoinHandle<()>>,
}

impl BackingStore {
	/// Open (creating if necessary) the history file under `state_dir`,
	/// defaulting to the current directory if `None`.
	pub fn open(state_dir: Option<&Path>) -> Result<Self, BackingStoreError> {
		Self::open_with_config(state_dir, Config::default())
	}

	pub fn open_with_config(state_dir: Option<&Path>, config: Config) -> Result<Self, BackingStoreError> {
		let dir = match state_dir {
			Some(p) => p.to_path_buf(),
			None => std::env::current_dir()?,
		};
		std::fs::create_dir_all(&dir)?;
		let data_path = dir.join(DATA_FILE);
		let sync_dir = dir.join(SYNC_DIR);

		let file = OpenOptions::new().read(true).write(true).create(true).open(&data_path)?;
		let existing_len = file.metadata()?.len();

		let mmap = if existing_len == 0 {
			Self::initialize_file(&file, &config)?
		} else {
			let mmap = unsafe { MmapMut::map_mut(&file) }.map_err(BackingStoreError::MapFailed)?;
			Self::validate_existing(&mmap, existing_len)?;
			mmap
		};

		let sync = Arc::new(Sync::open(&sync_dir)?);
		sync.peers.increment()?;

		let pending_remap = Arc::new(AtomicBool::new(false));
		let stop_background = Arc::new(AtomicBool::new(false));
		let background = Self::spawn_background(
			Arc::clone(&sync),
			Arc::clone(&pending_remap),
			Arc::clone(&stop_background),
			config.resize_retry_backoff,
		);

		Ok(BackingStore { file, mmap, config, sync, pending_remap, stop_background, background: Some(background) })
	}

	fn initialize_file(file: &File, config: &Config) -> Result<MmapMut, BackingStoreError> {
		let size = HEADER_LEN + config.initial_blocks * size_of::<TrieBlock>();
		file.set_len(size as u64)?;
		let mut mmap = unsafe { MmapMut::map_mut(file) }.map_err(BackingStoreError::MapFailed)?;
		FileHeader::write_fresh(&mut mmap, size as i32);
		write_block(&mut mmap, 0, &TrieBlock::empty());
		FileHeader::set_block_count(&mut mmap, 1);
		mmap.flush()?;
		Ok(mmap)
	}

	fn validate_existing(mmap: &MmapMut, file_len: u64) -> Result<(), BackingStoreError> {
		FileHeader::validate(mmap)?;
		let declared = FileHeader::size_in_bytes(mmap);
		if declared < 0 || declared as u64 != file_len {
			return Err(BackingStoreError::FileTooSmall);
		}
		let count = FileHeader::block_count(mmap) as usize;
		if count > FileHeader::capacity_for_file_len(file_len as usize) {
			return Err(BackingStoreError::FileTooSmall);
		}
		Ok(())
	}

	fn spawn_background(
		sync: Arc<Sync>,
		pending_remap: Arc<AtomicBool>,
		stop: Arc<AtomicBool>,
		backoff: Duration,
	) -> JoinHandle<()> {
		std::thread::spawn(move || {
			let mut last_unload = sync.unload_event.generation().unwrap_or(0);
			let mut last_reload = sync.reload_event.generation().unwrap_or(0);
			while !stop.load(Ordering::Acquire) {
				std::thread::sleep(backoff);
				let generation = match sync.unload_event.generation() {
					Ok(g) => g,
					Err(_) => continue,
				};
				if generation == last_unload {
					continue;
				}
				last_unload = generation;
				if let Err(err) = sync.acked.increment() {
					log::warn!("failed to acknowledge history file unload: {}", err);
				}

				// Don't flag a remap until the writer has actually grown the
				// file and raised "reload" (§4.2 step 6): acking only tells
				// the writer we've released our view, it says nothing yet
				// about the file's new size.
				let mut reloaded = false;
				while !stop.load(Ordering::Acquire) {
					std::thread::sleep(backoff);
					match sync.reload_event.generation() {
						Ok(g) if g != last_reload => {
							last_reload = g;
							reloaded = true;
							break;
						}
						_ => continue,
					}
				}
				if reloaded {
					pending_remap.store(true, Ordering::Release);
				}
			}
		})
	}

	/// Remap if the background thread has flagged a pending change since
	/// our last access.
	fn ensure_current(&mut self) {
		if self.pending_remap.swap(false, Ordering::AcqRel) {
			match unsafe { MmapMut::map_mut(&self.file) } {
				Ok(mmap) => self.mmap = mmap,
				Err(err) => {
					// A failed remap here means every block behind the old
					// mapping's capacity is still readable, but anything a
					// peer appended past it isn't. There is no way to
					// surface this through the infallible-looking
					// BlockStore::block/block_mut signatures; make the
					// failure loud instead of silently serving stale data.
					panic!("failed to remap history file after an unload signal: {}", err);
				}
			}
		}
	}

	fn capacity(&self) -> usize {
		FileHeader::capacity_for_file_len(self.mmap.len())
	}

	fn append_block(&mut self, block: TrieBlock) -> Result<u32, BackingStoreError> {
		let _writer = self.sync.writer_mutex.lock()?;
		self.ensure_current();

		let count = FileHeader::block_count(&self.mmap) as usize;
		if count >= self.capacity() {
			self.grow()?;
		}

		let count = FileHeader::block_count(&self.mmap) as usize;
		write_block(&mut self.mmap, count, &block);
		FileHeader::set_block_count(&mut self.mmap, (count + 1) as u64);
		self.mmap.flush().map_err(BackingStoreError::Io)?;
		Ok(count as u32)
	}

	/// Grow the backing file, coordinating with any peer process also
	/// mapping it. Must be called with the writer mutex already held.
	fn grow(&mut self) -> Result<(), BackingStoreError> {
		let new_capacity = self.capacity().max(1) * self.config.growth_factor;
		let new_size = HEADER_LEN + new_capacity * size_of::<TrieBlock>();

		let live_peers = self.sync.peers.get()?;
		self.sync.acked.reset()?;
		self.sync.unload_event.raise()?;

		// Every peer but us needs to acknowledge before we touch the file
		// out from under them.
		let target = live_peers.saturating_sub(1);
		if target > 0 {
			let acked = Self::wait_for_acks(&self.sync, target, self.config.resize_retry_backoff, self.config.resize_retry_cap)?;
			if !acked {
				return Err(BackingStoreError::ResizeTimeout);
			}
		}

		self.file.set_len(new_size as u64)?;
		let mut mmap = unsafe { MmapMut::map_mut(&self.file) }.map_err(BackingStoreError::MapFailed)?;
		FileHeader::set_size_in_bytes(&mut mmap, new_size as i32);
		self.mmap = mmap;
		self.mmap.flush().map_err(BackingStoreError::Io)?;

		self.sync.reload_event.raise()?;
		Ok(())
	}

	fn wait_for_acks(sync: &Sync, target: u64, backoff: Duration, retry_cap: u32) -> Result<bool, BackingStoreError> {
		for _ in 0..retry_cap {
			if sync.acked.get()? >= target {
				return Ok(true);
			}
			std::thread::sleep(backoff);
		}
		Ok(sync.acked.get()? >= target)
	}
}

fn block_offset(index: usize) -> usize {
	HEADER_LEN + index * size_of::<TrieBlock>()
}

fn write_block(mmap: &mut [u8], index: usize, block: &TrieBlock) {
	let start = block_offset(index);
	let bytes = unsafe { std::slice::from_raw_parts(block as *const TrieBlock as *const u8, size_of::<TrieBlock>()) };
	mmap[start..start + size_of::<TrieBlock>()].copy_from_slice(bytes);
}

/// # Safety
/// `index` must be within the file's declared block count, and `mmap`'s
/// base address must be aligned to `align_of::<TrieBlock>()` (guaranteed:
/// memory maps start on a page boundary, and `HEADER_LEN` is a multiple
/// of that alignment).
unsafe fn block_ref(mmap: &[u8], index: usize) -> &TrieBlock {
	let start = block_offset(index);
	&*(mmap[start..start + size_of::<TrieBlock>()].as_ptr() as *const TrieBlock)
}

unsafe fn block_ref_mut(mmap: &mut [u8], index: usize) -> &mut TrieBlock {
	let start = block_offset(index);
	&mut *(mmap[start..start + size_of::<TrieBlock>()].as_mut_ptr() as *mut TrieBlock)
}

impl BlockStore for BackingStore {
	type Error = BackingStoreError;

	fn block_count(&mut self) -> u32 {
		self.ensure_current();
		FileHeader::block_count(&self.mmap) as u32
	}

	fn block(&mut self, index: u32) -> &TrieBlock {
		self.ensure_current();
		unsafe { block_ref(&self.mmap, index as usize) }
	}

	fn block_mut(&mut self, index: u32) -> &mut TrieBlock {
		self.ensure_current();
		unsafe { block_ref_mut(&mut self.mmap, index as usize) }
	}

	fn append(&mut self, block: TrieBlock) -> Result<u32, Self::Error> {
		self.append_block(block)
	}
}

impl Drop for BackingStore {
	fn drop(&mut self) {
		self.stop_background.store(true, Ordering::Release);
		if let Some(handle) = self.background.take() {
			let _ = handle.join();
		}
		let _ = self.mmap.flush();
		let _ = self.sync.peers.decrement();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use history_trie::ROOT;

	fn test_config() -> Config {
		Config { initial_blocks: 2, growth_factor: 2, resize_retry_cap: 20, resize_retry_backoff: Duration::from_millis(1) }
	}

	#[test]
	fn fresh_store_has_a_single_root_block() {
		let dir = tempfile::tempdir().unwrap();
		let mut store = BackingStore::open_with_config(Some(dir.path()), test_config()).unwrap();
		assert_eq!(store.block_count(), 1);
		assert_eq!(store.block(ROOT).len, 0);
	}

	#[test]
	fn append_beyond_initial_capacity_triggers_a_grow() {
		let dir = tempfile::tempdir().unwrap();
		let mut store = BackingStore::open_with_config(Some(dir.path()), test_config()).unwrap();
		for _ in 0..10 {
			store.append(TrieBlock::empty()).unwrap();
		}
		assert_eq!(store.block_count(), 11);
	}

	#[test]
	fn reopening_an_existing_store_preserves_its_blocks() {
		let dir = tempfile::tempdir().unwrap();
		{
			let mut store = BackingStore::open_with_config(Some(dir.path()), test_config()).unwrap();
			store.append(TrieBlock::empty()).unwrap();
			store.append(TrieBlock::empty()).unwrap();
		}
		let mut reopened = BackingStore::open_with_config(Some(dir.path()), test_config()).unwrap();
		assert_eq!(reopened.block_count(), 3);
	}

	#[test]
	fn corrupted_magic_is_rejected_on_open() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(DATA_FILE);
		std::fs::write(&path, vec![0u8; HEADER_LEN + size_of::<TrieBlock>()]).unwrap();
		let err = BackingStore::open_with_config(Some(dir.path()), test_config()).unwrap_err();
		assert!(matches!(err, BackingStoreError::FileCorrupted));
	}

	#[test]
	fn edits_through_block_mut_persist_across_reopen() {
		let dir = tempfile::tempdir().unwrap();
		{
			let mut store = BackingStore::open_with_config(Some(dir.path()), test_config()).unwrap();
			store.block_mut(ROOT).len = 1;
		}
		let mut reopened = BackingStore::open_with_config(Some(dir.path()), test_config()).unwrap();
		assert_eq!(reopened.block(ROOT).len, 1);
	}
}
