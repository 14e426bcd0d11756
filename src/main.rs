use std::{
    ffi::OsString,
    io::Write,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;
use log::{error, info};
use rayon::prelude::*;
use wrap::{
    Error, wrap_stream,
    cli::{self, WrapArgs},
    config::Config,
    io::{create_output, open_input},
};

/// Format one input into memory, applying the alias its name selects.
fn format_file(
    raw: &[OsString],
    args: &WrapArgs,
    config: &Config,
    path: Option<&Path>,
) -> wrap::Result<Vec<u8>> {
    let args = cli::apply_alias(raw, args.clone(), config, path)?;
    let input = open_input(path)?;
    let mut out = Vec::new();
    wrap_stream(input, &mut out, &args.common.wrap_options())?;
    if let Some(path) = path {
        info!("formatted {}", path.display());
    }
    Ok(out)
}

fn run(raw: &[OsString], args: &WrapArgs) -> anyhow::Result<()> {
    let config = args.common.load_config().context("loading aliases")?;
    let inputs: Vec<Option<&Path>> = if args.files.is_empty() {
        vec![args.common.input.as_deref()]
    } else {
        args.common
            .input
            .as_deref()
            .into_iter()
            .chain(args.files.iter().map(PathBuf::as_path))
            .map(Some)
            .collect()
    };

    let results: Vec<_> = inputs
        .par_iter()
        .map(|path| format_file(raw, args, &config, *path))
        .collect();

    let mut output = create_output(args.common.output.as_deref())?;
    let several = inputs.len() > 1;
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(bytes) => output.write_all(&bytes).map_err(Error::from)?,
            Err(err) => {
                if several {
                    error!("{err}");
                }
                errors.push(err);
            }
        }
    }
    output.flush().map_err(Error::from)?;
    match Error::worst(errors) {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Reflow the files named on the command line, or standard input.
///
/// ```sh
/// # Markdown at 72 columns
/// wrap -m -w 72 README.md
///
/// # Mail-style paragraphs separated by a single blank line
/// wrap -s 2 -l 2 < notes.txt
/// ```
fn main() -> ExitCode {
    let raw: Vec<OsString> = std::env::args_os().collect();
    let args = match WrapArgs::try_parse_from(&raw) {
        Ok(args) => args,
        Err(err) => return cli::clap_exit(&err),
    };
    cli::init_logging(args.common.debug);
    match run(&raw, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => cli::failure(&err),
    }
}
