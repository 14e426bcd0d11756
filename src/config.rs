//! Alias file parsing.
//!
//! The file (by default `~/.wraprc`) defines named option sets and the
//! filename patterns that select them:
//!
//! ```text
//! # comments run to the end of the line
//! [aliases]
//! mail = -w 72 -s 2
//! md   = -m -w 80 -h "*-"
//!
//! [patterns]
//! *.md     = md
//! *.eml    = mail
//! ```
//!
//! `[patterns]` (any case) holds `glob = alias` lines; every other section,
//! and the part of the file before the first section, holds aliases.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, warn};

use crate::{Error, Result};

/// File name of the per-user alias file in the home directory.
pub const DEFAULT_FILE_NAME: &str = ".wraprc";

/// A named list of command line arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub args: Vec<String>,
}

/// Aliases in definition order; a later definition replaces an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasSet {
    aliases: Vec<Alias>,
}

impl AliasSet {
    /// Add `alias`, returning `true` when it replaced an existing one.
    pub fn define(&mut self, alias: Alias) -> bool {
        if let Some(slot) = self.aliases.iter_mut().find(|a| a.name == alias.name) {
            *slot = alias;
            return true;
        }
        self.aliases.push(alias);
        false
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Alias> {
        self.aliases.iter().find(|a| a.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alias> {
        self.aliases.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// A filename glob bound to an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub glob: glob::Pattern,
    pub alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Aliases,
    Patterns,
}

/// Parsed alias file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    aliases: AliasSet,
    patterns: Vec<Pattern>,
}

impl Config {
    /// Parse alias file text; `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] with the line and column of the first
    /// malformed line, bad glob, unterminated quote, or pattern that names
    /// an unknown alias.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    ///
    /// use wrap::config::Config;
    ///
    /// let config = Config::parse("mail = -w 72\n[Patterns]\n*.eml = mail\n", Path::new("rc"))?;
    /// assert_eq!(config.alias("mail").map(|a| a.args.len()), Some(2));
    /// assert_eq!(
    ///     config.pattern_find(Path::new("/tmp/note.eml")).map(|a| a.name.as_str()),
    ///     Some("mail")
    /// );
    /// # Ok::<(), wrap::Error>(())
    /// ```
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut config = Self::default();
        let mut section = Section::Aliases;
        // (pattern, line, column) for the unknown-alias check at the end.
        let mut pending = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = strip_comment(raw);
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let start_col = line.len() - line.trim_start().len() + 1;

            if trimmed.starts_with('[') {
                let Some(name) = trimmed
                    .strip_prefix('[')
                    .and_then(|rest| rest.strip_suffix(']'))
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                else {
                    return Err(Error::config(path, line_no, start_col, "malformed section header"));
                };
                section = if name.eq_ignore_ascii_case("patterns") {
                    Section::Patterns
                } else {
                    Section::Aliases
                };
                continue;
            }

            let Some(eq) = line.find('=') else {
                return Err(Error::config(path, line_no, start_col, "expected `name = value`"));
            };
            let key = line[..eq].trim();
            if key.is_empty() {
                return Err(Error::config(path, line_no, start_col, "missing name before `=`"));
            }
            let value = &line[eq + 1..];
            let value_col = eq + 2 + (value.len() - value.trim_start().len());

            match section {
                Section::Aliases => {
                    let args = split_args(value).map_err(|offset| {
                        Error::config(path, line_no, eq + 2 + offset, "unterminated quote")
                    })?;
                    let alias = Alias {
                        name: key.to_string(),
                        args,
                    };
                    if config.aliases.define(alias) {
                        warn!("{}:{line_no}: alias `{key}` redefined", path.display());
                    }
                }
                Section::Patterns => {
                    let alias = value.trim();
                    if alias.is_empty() {
                        return Err(Error::config(path, line_no, value_col, "missing alias name"));
                    }
                    let glob = glob::Pattern::new(key).map_err(|e| {
                        let message = format!("bad pattern: {}", e.msg);
                        Error::config(path, line_no, start_col + e.pos, message)
                    })?;
                    config.patterns.push(Pattern {
                        glob,
                        alias: alias.to_string(),
                    });
                    pending.push((line_no, value_col));
                }
            }
        }

        for (pattern, (line_no, column)) in config.patterns.iter().zip(pending) {
            if config.aliases.get(&pattern.alias).is_none() {
                return Err(Error::config(
                    path,
                    line_no,
                    column,
                    format!("unknown alias `{}`", pattern.alias),
                ));
            }
        }
        Ok(config)
    }

    /// Load an explicitly named alias file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] when the file cannot be read, or a parse
    /// error from [`Config::parse`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text, path)?;
        debug!(
            "loaded {} aliases and {} patterns from {}",
            config.aliases.len(),
            config.patterns.len(),
            path.display()
        );
        Ok(config)
    }

    /// Load `~/.wraprc`, treating a missing file as empty.
    ///
    /// # Errors
    ///
    /// As [`Config::load`], for a file that exists.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            Some(path) => {
                debug!("no alias file at {}", path.display());
                Ok(Self::default())
            }
            None => {
                debug!("no home directory; skipping alias file");
                Ok(Self::default())
            }
        }
    }

    /// `~/.wraprc`, when a home directory is known.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(DEFAULT_FILE_NAME))
    }

    #[must_use]
    pub fn alias(&self, name: &str) -> Option<&Alias> {
        self.aliases.get(name)
    }

    #[must_use]
    pub fn aliases(&self) -> &AliasSet {
        &self.aliases
    }

    #[must_use]
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Alias of the first pattern, in declaration order, that matches
    /// `path` or its file name.
    #[must_use]
    pub fn pattern_find(&self, path: &Path) -> Option<&Alias> {
        let file_name = path.file_name().map(|n| n.to_string_lossy());
        let pattern = self.patterns.iter().find(|p| {
            p.glob.matches_path(path) || file_name.as_deref().is_some_and(|n| p.glob.matches(n))
        })?;
        self.aliases.get(&pattern.alias)
    }
}

/// Cut a `#` comment that is not inside quotes.
fn strip_comment(line: &str) -> &str {
    let mut quote = None;
    for (idx, ch) in line.char_indices() {
        match (quote, ch) {
            (Some(q), _) if q == ch => quote = None,
            (None, '"' | '\'') => quote = Some(ch),
            (None, '#') => return &line[..idx],
            _ => {}
        }
    }
    line
}

/// Split alias arguments on whitespace; quotes group words.
///
/// On an unterminated quote, returns its byte offset in `value`.
fn split_args(value: &str) -> std::result::Result<Vec<String>, usize> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quote: Option<(char, usize)> = None;
    for (idx, ch) in value.char_indices() {
        match quote {
            Some((q, _)) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some((ch, idx));
                in_arg = true;
            }
            None if ch.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            None => {
                current.push(ch);
                in_arg = true;
            }
        }
    }
    if let Some((_, offset)) = quote {
        return Err(offset);
    }
    if in_arg {
        args.push(current);
    }
    Ok(args)
}
