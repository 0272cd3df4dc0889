// Copyright 2026 The frog-shell authors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Drives the `--test-mp` harness across real, separately spawned `frog`
//! processes sharing one state directory, exercising the on-disk format
//! and the resize protocol the way the production shell actually would
//! (as opposed to `history-trie-shared-tests`, which drives the trie
//! in-process against the same `BlockStore`).

use std::path::Path;
use std::process::Command;

fn frog() -> Command {
	Command::new(env!("CARGO_BIN_EXE_frog"))
}

fn insert(state_dir: &Path, line: &str) -> bool {
	frog().args(["--test-mp", "insert"]).arg(state_dir).arg(line).status().unwrap().success()
}

fn search(state_dir: &Path, line: &str) -> bool {
	frog().args(["--test-mp", "search"]).arg(state_dir).arg(line).status().unwrap().success()
}

fn verify(state_dir: &Path, lines: &[&str]) -> bool {
	frog().args(["--test-mp", "verify"]).arg(state_dir).args(lines).status().unwrap().success()
}

#[test]
fn a_separate_process_can_find_what_another_process_inserted() {
	let dir = tempfile::tempdir().unwrap();
	assert!(insert(dir.path(), "git commit -m wip"));
	assert!(search(dir.path(), "git commit -m wip"));
	assert!(!search(dir.path(), "never inserted"));
}

#[test]
fn many_inserting_processes_force_the_resize_protocol_and_all_survive() {
	let dir = tempfile::tempdir().unwrap();
	let lines: Vec<String> = (0..40).map(|i| format!("process-insert-{}", i)).collect();
	for line in &lines {
		assert!(insert(dir.path(), line), "insert of {:?} failed", line);
	}
	let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
	assert!(verify(dir.path(), &refs));
}

#[test]
fn verify_fails_when_any_line_is_missing() {
	let dir = tempfile::tempdir().unwrap();
	assert!(insert(dir.path(), "ls -la"));
	assert!(!verify(dir.path(), &["ls -la", "not inserted"]));
}
