// Copyright 2026 The frog-shell authors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The heuristic that decides whether an accepted line is safe to learn
//! into the cross-directory global history: a line that names a
//! filesystem path is almost certainly meaningless outside the directory
//! it was typed in (`rm build/output.bin`), so only path-free lines are
//! promoted.

use std::path::Path;

/// `true` if no whitespace-delimited token in `line` resolves as an
/// existing path relative to the process's current directory. `.` and
/// `..` are never treated as disqualifying, since almost every command
/// line in every directory contains one of them (`cd ..`, `ls .`).
pub fn is_global(line: &str) -> bool {
	line.split_whitespace().all(|token| token == "." || token == ".." || !Path::new(token).exists())
}
