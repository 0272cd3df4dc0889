// Copyright 2026 The frog-shell authors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The cross-process coordination primitives the resize protocol needs:
//! a writer mutex, two generation-counter "events" (unload/reload), and a
//! peer counter. Real named kernel objects aren't portable across the
//! platforms `fs2` already abstracts over, so all three are built on small
//! files in a shared directory plus `fs2`'s advisory file locks. Each
//! primitive is named by its file, so any process that opens the same
//! state directory interoperates with any other, regardless of language
//! or binary.

use byteorder::{ByteOrder, LittleEndian};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// An advisory, named, cross-process mutex backed by a lock file.
pub struct NamedMutex {
	file: File,
}

impl NamedMutex {
	pub fn open(path: &Path) -> io::Result<Self> {
		let file = OpenOptions::new().read(true).write(true).create(true).open(path)?;
		Ok(NamedMutex { file })
	}

	pub fn lock(&self) -> io::Result<NamedMutexGuard<'_>> {
		self.file.lock_exclusive()?;
		Ok(NamedMutexGuard { mutex: self })
	}
}

pub struct NamedMutexGuard<'a> {
	mutex: &'a NamedMutex,
}

impl Drop for NamedMutexGuard<'_> {
	fn drop(&mut self) {
		let _ = FileExt::unlock(&self.mutex.file);
	}
}

/// A generation counter: raising the event bumps it, waiters poll until
/// the generation they last observed has changed. There is no blocking
/// wait primitive here, only the counter; callers own their own polling
/// loop and retry budget (see `BackingStore`'s resize protocol).
pub struct NamedEvent {
	path: PathBuf,
}

impl NamedEvent {
	pub fn open(path: PathBuf) -> io::Result<Self> {
		if !path.exists() {
			let mut bytes = [0u8; 8];
			LittleEndian::write_u64(&mut bytes, 0);
			std::fs::write(&path, bytes)?;
		}
		Ok(NamedEvent { path })
	}

	pub fn generation(&self) -> io::Result<u64> {
		let bytes = std::fs::read(&self.path)?;
		if bytes.len() < 8 {
			return Ok(0);
		}
		Ok(LittleEndian::read_u64(&bytes))
	}

	pub fn raise(&self) -> io::Result<()> {
		let current = self.generation()?;
		let mut bytes = [0u8; 8];
		LittleEndian::write_u64(&mut bytes, current.wrapping_add(1));
		std::fs::write(&self.path, bytes)
	}

	/// Poll until the generation differs from `since`, sleeping
	/// `backoff` between attempts, up to `retry_cap` attempts.
	pub fn wait_for_change(&self, since: u64, backoff: Duration, retry_cap: u32) -> io::Result<bool> {
		for _ in 0..retry_cap {
			if self.generation()? != since {
				return Ok(true);
			}
			std::thread::sleep(backoff);
		}
		Ok(self.generation()? != since)
	}
}

/// A counter of processes currently holding a view onto the mapping,
/// backed by a file and guarded by its own lock so increments and
/// decrements from different processes don't race.
pub struct PeerCounter {
	path: PathBuf,
	guard: NamedMutex,
}

impl PeerCounter {
	pub fn open(path: PathBuf, guard_path: PathBuf) -> io::Result<Self> {
		if !path.exists() {
			let mut bytes = [0u8; 8];
			LittleEndian::write_u64(&mut bytes, 0);
			std::fs::write(&path, bytes)?;
		}
		let guard = NamedMutex::open(&guard_path)?;
		Ok(PeerCounter { path, guard })
	}

	pub fn get(&self) -> io::Result<u64> {
		let bytes = std::fs::read(&self.path)?;
		if bytes.len() < 8 {
			return Ok(0);
		}
		Ok(LittleEndian::read_u64(&bytes))
	}

	pub fn increment(&self) -> io::Result<u64> {
		let _lock = self.guard.lock()?;
		let next = self.get()?.saturating_add(1);
		self.set(next)?;
		Ok(next)
	}

	pub fn decrement(&self) -> io::Result<u64> {
		let _lock = self.guard.lock()?;
		let next = self.get()?.saturating_sub(1);
		self.set(next)?;
		Ok(next)
	}

	/// Zero the counter. Used by the resize protocol to reset the "peers
	/// that have acknowledged this round's unload signal" count before
	/// raising it.
	pub fn reset(&self) -> io::Result<()> {
		let _lock = self.guard.lock()?;
		self.set(0)
	}

	fn set(&self, value: u64) -> io::Result<()> {
		let mut bytes = [0u8; 8];
		LittleEndian::write_u64(&mut bytes, value);
		std::fs::write(&self.path, bytes)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mutex_round_trips_lock_and_unlock() {
		let dir = tempfile::tempdir().unwrap();
		let mutex = NamedMutex::open(&dir.path().join("writer.lock")).unwrap();
		{
			let _g = mutex.lock().unwrap();
		}
		let _g2 = mutex.lock().unwrap();
	}

	#[test]
	fn event_generation_advances_on_raise() {
		let dir = tempfile::tempdir().unwrap();
		let event = NamedEvent::open(dir.path().join("unload.evt")).unwrap();
		let g0 = event.generation().unwrap();
		event.raise().unwrap();
		assert_eq!(event.generation().unwrap(), g0 + 1);
	}

	#[test]
	fn wait_for_change_sees_an_already_advanced_generation() {
		let dir = tempfile::tempdir().unwrap();
		let event = NamedEvent::open(dir.path().join("reload.evt")).unwrap();
		let since = event.generation().unwrap();
		event.raise().unwrap();
		let changed = event.wait_for_change(since, Duration::from_millis(1), 5).unwrap();
		assert!(changed);
	}

	#[test]
	fn wait_for_change_times_out_when_nothing_raises() {
		let dir = tempfile::tempdir().unwrap();
		let event = NamedEvent::open(dir.path().join("reload.evt")).unwrap();
		let since = event.generation().unwrap();
		let changed = event.wait_for_change(since, Duration::from_millis(1), 3).unwrap();
		assert!(!changed);
	}

	#[test]
	fn peer_counter_increments_and_decrements() {
		let dir = tempfile::tempdir().unwrap();
		let counter = PeerCounter::open(dir.path().join("peers.cnt"), dir.path().join("peers.lock")).unwrap();
		assert_eq!(counter.get().unwrap(), 0);
		assert_eq!(counter.increment().unwrap(), 1);
		assert_eq!(counter.increment().unwrap(), 2);
		assert_eq!(counter.decrement().unwrap(), 1);
	}
}
