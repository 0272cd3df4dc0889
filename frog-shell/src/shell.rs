// Copyright 2026 The frog-shell authors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A minimal line-reading loop standing in for the real interactive
//! shell. The console input decoder, prompt editing buffer, and
//! child-process launcher are external collaborators outside this
//! crate's scope (§1); this loop only exercises the contract between
//! them and the completion engine: accept a line, show the
//! completion for the next one.

use std::io::{self, BufRead, Write};

use completion_engine::{CompletionEngine, QueryFlags};
use history_store::BackingStore;

use crate::config::ShellConfig;

pub fn run(config: ShellConfig) -> io::Result<()> {
	let store = BackingStore::open_with_config(config.state_dir.as_deref(), config.store.clone())
		.map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
	let mut engine = CompletionEngine::new(store);

	let stdin = io::stdin();
	let mut stdout = io::stdout();
	loop {
		write!(stdout, "frog> ")?;
		stdout.flush()?;

		let mut line = String::new();
		if stdin.lock().read_line(&mut line)? == 0 {
			break;
		}
		let line = line.trim_end_matches(['\n', '\r']);
		if line.is_empty() {
			continue;
		}
		if line == "exit" || line == "quit" {
			break;
		}

		if let Some(suggestion) = engine.query(line, QueryFlags::default()) {
			if !suggestion.is_empty() {
				writeln!(stdout, "  -> {}{}", line, String::from_utf8_lossy(&suggestion))?;
			}
		}
		engine.update(line);
	}
	Ok(())
}
