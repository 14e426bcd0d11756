//! Command line handling shared by `wrap` and `wrapc`.
//!
//! Arguments are parsed twice when an alias applies: the first parse finds
//! `-c`, `-a` and the input file, then the alias arguments are placed in
//! front of the user's and the whole line is parsed again. Flags override
//! themselves, so whatever the user typed wins over the alias.

use std::{
    ffi::OsString,
    io::Write,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{ArgAction, Parser};
use log::{LevelFilter, debug, error};

use crate::{
    Error, Result,
    comment::CommentDelimMap,
    config::Config,
    error::EX_USAGE,
    wrap::WrapOptions,
    wrapc::WrapcOptions,
};

fn positive(value: &str) -> std::result::Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".into()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Flags understood by both binaries.
#[derive(clap::Args, Debug, Clone)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "each flag toggles an independent formatting option"
)]
pub struct CommonArgs {
    /// Output width in columns
    #[arg(
        short = 'w',
        long = "width",
        value_name = "N",
        default_value_t = 80,
        value_parser = positive
    )]
    pub width: usize,
    /// Tab stop for measuring indentation
    #[arg(
        short = 't',
        long = "tab-width",
        value_name = "N",
        default_value_t = 8,
        value_parser = positive
    )]
    pub tab_width: usize,
    /// Newlines that end a plain-text paragraph
    #[arg(
        short = 's',
        long = "paragraph-newlines",
        value_name = "N",
        default_value_t = 2,
        value_parser = positive
    )]
    pub paragraph_newlines: usize,
    /// Read input from FILE
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub input: Option<PathBuf>,
    /// Write output to FILE
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Read aliases from FILE instead of ~/.wraprc
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Apply the named alias
    #[arg(short = 'a', long = "alias", value_name = "NAME")]
    pub alias: Option<String>,
    /// Extra indent for continuation lines
    #[arg(short = 'l', long = "hang-indent", value_name = "N", default_value_t = 0)]
    pub hang_indent: usize,
    /// Spaces in front of every output line
    #[arg(short = 'L', long = "left-margin", value_name = "N", default_value_t = 0)]
    pub left_margin: usize,
    /// Bullet characters that start a hanging paragraph
    #[arg(short = 'h', long = "hang-chars", value_name = "CHARS", default_value = "")]
    pub hang_chars: String,
    /// Leading characters that force a paragraph break
    #[arg(short = 'b', long = "break-chars", value_name = "CHARS", default_value = "")]
    pub break_chars: String,
    /// Keep runs of spaces between words
    #[arg(short = 'e', long = "keep-spaces")]
    pub keep_spaces: bool,
    /// Treat input as Markdown
    #[arg(short = 'm', long = "markdown")]
    pub markdown: bool,
    /// More logging; repeat for more detail
    #[arg(short = 'd', long = "debug", action = ArgAction::Count)]
    pub debug: u8,
    /// Print help
    #[arg(long = "help", action = ArgAction::Help)]
    #[allow(dead_code, reason = "clap handles the flag itself")]
    help: Option<bool>,
}

impl CommonArgs {
    /// Formatting options for these flags.
    #[must_use]
    pub fn wrap_options(&self) -> WrapOptions {
        WrapOptions {
            width: self.width,
            tab_width: self.tab_width,
            paragraph_newlines: self.paragraph_newlines,
            left_margin: self.left_margin,
            hang_indent: self.hang_indent,
            hang_chars: self.hang_chars.clone(),
            break_chars: self.break_chars.clone(),
            keep_spaces: self.keep_spaces,
            markdown: self.markdown,
        }
    }

    /// The alias file named by `-c`, or the default one.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Config::load(path),
            None => Config::load_default(),
        }
    }
}

/// Arguments of the `wrap` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wrap",
    version,
    about = "Reflow plain text or Markdown paragraphs",
    disable_help_flag = true,
    args_override_self = true
)]
pub struct WrapArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    /// Files to format; standard input when none
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// Arguments of the `wrapc` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wrapc",
    version,
    about = "Reflow comments in source code",
    disable_help_flag = true,
    args_override_self = true
)]
pub struct WrapcArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    /// Comment delimiters, separated by spaces or commas
    #[arg(short = 'p', long = "delimiters", value_name = "LIST", allow_hyphen_values = true)]
    pub delimiters: Option<String>,
    /// Width counts the comment body only
    #[arg(short = 'W', long = "body-width")]
    pub body_width: bool,
}

impl WrapcArgs {
    /// # Errors
    ///
    /// Returns [`Error::Usage`] for a bad `-p` list.
    pub fn wrapc_options(&self) -> Result<WrapcOptions> {
        let delimiters = match &self.delimiters {
            Some(list) => CommentDelimMap::parse(list)?,
            None => CommentDelimMap::default(),
        };
        Ok(WrapcOptions {
            wrap: self.common.wrap_options(),
            delimiters,
            body_width: self.body_width,
        })
    }
}

/// Access to the shared flags of either binary.
pub trait Command: Parser {
    fn common(&self) -> &CommonArgs;
}

impl Command for WrapArgs {
    fn common(&self) -> &CommonArgs {
        &self.common
    }
}

impl Command for WrapcArgs {
    fn common(&self) -> &CommonArgs {
        &self.common
    }
}

/// Apply the alias chosen by `-a`, or by the pattern matching `input`.
///
/// `raw` is the full command line including the program name; `parsed`
/// is its first parse and is returned unchanged when no alias applies.
///
/// # Errors
///
/// Returns [`Error::Usage`] when `-a` names an unknown alias or the alias
/// arguments do not parse.
pub fn apply_alias<T: Command>(
    raw: &[OsString],
    parsed: T,
    config: &Config,
    input: Option<&Path>,
) -> Result<T> {
    let alias = match parsed.common().alias.as_deref() {
        Some(name) => Some(
            config
                .alias(name)
                .ok_or_else(|| Error::Usage(format!("unknown alias `{name}`")))?,
        ),
        None => input.and_then(|path| config.pattern_find(path)),
    };
    let Some(alias) = alias else {
        return Ok(parsed);
    };
    debug!("using alias `{}`: {:?}", alias.name, alias.args);

    let mut args = Vec::with_capacity(raw.len() + alias.args.len());
    args.extend(raw.first().cloned());
    args.extend(alias.args.iter().map(OsString::from));
    args.extend(raw.iter().skip(1).cloned());
    T::try_parse_from(args)
        .map_err(|e| Error::Usage(format!("alias `{}`: {}", alias.name, clap_message(&e))))
}

/// First line of a clap error without its `error:` tag.
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}

/// Print a parse failure (or help/version) and pick the exit status.
#[must_use]
pub fn clap_exit(err: &clap::Error) -> ExitCode {
    // Nothing better to do if stderr is gone.
    let _ = err.print();
    if err.use_stderr() {
        ExitCode::from(EX_USAGE)
    } else {
        ExitCode::SUCCESS
    }
}

/// Log `err` and map it to the exit status of the [`Error`] inside it.
#[must_use]
pub fn failure(err: &anyhow::Error) -> ExitCode {
    error!("{err:#}");
    let code = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map_or(crate::error::EX_OSERR, Error::exit_code);
    ExitCode::from(code)
}

/// Set up `env_logger` for `-d` given `verbosity` times.
///
/// `RUST_LOG` still overrides the level per module.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // A logger may already be installed, e.g. by a test harness.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();
}
