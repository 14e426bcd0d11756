//! Opening the input and output streams named on the command line.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use crate::{Error, Result};

/// `-` names the standard stream.
fn is_std(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| p.as_os_str() != "-")
}

/// Open `path` for reading, or standard input when it is `None` or `-`.
///
/// # Errors
///
/// Returns [`Error::Open`] when the file cannot be opened.
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead + Send>> {
    let Some(path) = is_std(path) else {
        return Ok(Box::new(BufReader::new(io::stdin())));
    };
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(BufReader::new(file)))
}

/// Create `path` for writing, or standard output when it is `None` or `-`.
///
/// # Errors
///
/// Returns [`Error::Create`] when the file cannot be created.
pub fn create_output(path: Option<&Path>) -> Result<Box<dyn Write + Send>> {
    let Some(path) = is_std(path) else {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    };
    let file = File::create(path).map_err(|source| Error::Create {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(BufWriter::new(file)))
}
