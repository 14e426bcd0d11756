use std::{ffi::OsString, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use log::info;
use wrap::{
    cli::{self, WrapcArgs},
    io::{create_output, open_input},
    wrapc,
};

fn run(raw: &[OsString], args: WrapcArgs) -> anyhow::Result<()> {
    let config = args.common.load_config().context("loading aliases")?;
    let input_path = args.common.input.clone();
    let args = cli::apply_alias(raw, args, &config, input_path.as_deref())?;
    let options = args.wrapc_options()?;

    let input = open_input(args.common.input.as_deref())?;
    let output = create_output(args.common.output.as_deref())?;
    wrapc::run(input, output, &options)?;
    if let Some(path) = &args.common.input {
        info!("formatted comments in {}", path.display());
    }
    Ok(())
}

/// Reflow the comments in a source file.
///
/// ```sh
/// wrapc -w 72 -f src/lib.rs -o /tmp/lib.rs
/// wrapc -p '// #' < script.sh
/// ```
fn main() -> ExitCode {
    let raw: Vec<OsString> = std::env::args_os().collect();
    let args = match WrapcArgs::try_parse_from(&raw) {
        Ok(args) => args,
        Err(err) => return cli::clap_exit(&err),
    };
    cli::init_logging(args.common.debug);
    match run(&raw, args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => cli::failure(&err),
    }
}
