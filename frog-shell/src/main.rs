// Copyright 2026 The frog-shell authors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

mod config;
mod shell;
mod test_mp;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use config::ShellConfig;

/// `--test-mp insert|search|verify <state_dir> <line...>` is modeled as a
/// single flag plus trailing positional args, rather than a `clap`
/// subcommand, to match the fixed three-subcommand, variable-arity
/// surface the test harness expects (`verify` takes one or more lines).
#[derive(Parser)]
#[command(name = "frog", about = "A shell that learns your command history")]
struct Cli {
	/// Enable debug logging and use the current directory as the state
	/// directory.
	#[arg(long)]
	debug: bool,

	#[arg(long, value_name = "MODE")]
	test_mp: Option<String>,

	#[arg(trailing_var_arg = true, allow_hyphen_values = true)]
	rest: Vec<String>,
}

fn main() -> ExitCode {
	let cli = Cli::parse();

	let level = if cli.debug { log::LevelFilter::Debug } else { log::LevelFilter::Warn };
	env_logger::Builder::from_default_env().filter_level(level).init();

	if let Some(mode) = cli.test_mp.as_deref() {
		return run_test_mp(mode, &cli.rest);
	}

	let mut config = ShellConfig::default();
	if cli.debug {
		config.state_dir = Some(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
	}
	match shell::run(config) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("frog: {}", err);
			ExitCode::FAILURE
		}
	}
}

fn run_test_mp(mode: &str, rest: &[String]) -> ExitCode {
	match (mode, rest) {
		("insert", [state_dir, line]) => test_mp::insert(&PathBuf::from(state_dir), line),
		("search", [state_dir, line]) => test_mp::search(&PathBuf::from(state_dir), line),
		("verify", [state_dir, lines @ ..]) if !lines.is_empty() => {
			test_mp::verify(&PathBuf::from(state_dir), lines)
		}
		_ => {
			eprintln!("usage: frog --test-mp <insert|search|verify> <state_dir> <line...>");
			ExitCode::FAILURE
		}
	}
}
