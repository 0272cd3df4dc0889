// Copyright 2026 The frog-shell authors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `--test-mp`: the multi-process test harness surface. Each subcommand
//! opens the real persistent `BackingStore` and drives the production
//! `Trie` directly (not through `CompletionEngine`'s namespacing) so
//! tests can spawn many `frog` processes against one state directory and
//! check the resize protocol and block-level invariants end to end.

use std::path::Path;
use std::process::ExitCode;

use history_store::BackingStore;
use history_trie::Trie;

use crate::config::ShellConfig;

pub fn insert(state_dir: &Path, line: &str) -> ExitCode {
	match open_trie(state_dir) {
		Ok(mut trie) => match trie.insert(line.as_bytes()) {
			Ok(()) => ExitCode::SUCCESS,
			Err(err) => {
				eprintln!("insert failed: {}", err);
				ExitCode::FAILURE
			}
		},
		Err(err) => {
			eprintln!("{}", err);
			ExitCode::FAILURE
		}
	}
}

pub fn search(state_dir: &Path, line: &str) -> ExitCode {
	match open_trie(state_dir) {
		Ok(mut trie) => {
			let found = trie
				.walk(line.as_bytes())
				.into_match()
				.map(|m| m.consumed == line.len())
				.unwrap_or(false);
			if found {
				ExitCode::SUCCESS
			} else {
				ExitCode::FAILURE
			}
		}
		Err(err) => {
			eprintln!("{}", err);
			ExitCode::FAILURE
		}
	}
}

pub fn verify(state_dir: &Path, lines: &[String]) -> ExitCode {
	let mut trie = match open_trie(state_dir) {
		Ok(trie) => trie,
		Err(err) => {
			eprintln!("{}", err);
			return ExitCode::FAILURE;
		}
	};
	for line in lines {
		let found = trie
			.walk(line.as_bytes())
			.into_match()
			.map(|m| m.consumed == line.len())
			.unwrap_or(false);
		if !found {
			eprintln!("missing: {:?}", line);
			return ExitCode::FAILURE;
		}
	}
	ExitCode::SUCCESS
}

fn open_trie(state_dir: &Path) -> Result<Trie<BackingStore>, history_store::BackingStoreError> {
	let config = ShellConfig::default();
	let store = BackingStore::open_with_config(Some(state_dir), config.store)?;
	Ok(Trie::new(store))
}
