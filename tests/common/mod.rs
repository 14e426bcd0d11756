//! Utility helpers shared across integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;

/// Build a `Vec<String>` from a list of string slices.
macro_rules! lines_vec {
    ($($line:expr),* $(,)?) => {
        vec![$($line.to_string()),*]
    };
}

/// Command for one of the crate's binaries.
///
/// `HOME` points at the test directory so a developer's own `~/.wraprc`
/// cannot change the results.
pub fn bin(name: &str) -> Command {
    let mut cmd = Command::cargo_bin(name).expect("failed to create command");
    cmd.env("HOME", concat!(env!("CARGO_MANIFEST_DIR"), "/tests"))
        .env_remove("RUST_LOG");
    cmd
}

/// Write `contents` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("failed to write test file");
    path
}

/// Assert common wrapping expectations for a list item.
///
/// Verifies the number of lines, the marker on the first line, the width of
/// every line, and that continuation lines hang under the item text.
pub fn assert_wrapped_list_item(output: &[String], prefix: &str, expected: usize, width: usize) {
    assert!(expected > 0, "expected line count must be positive");
    assert_eq!(output.len(), expected, "unexpected line count: {output:?}");
    assert!(output.first().is_some_and(|line| line.starts_with(prefix)));
    assert!(
        output.iter().all(|l| l.chars().count() <= width),
        "line wider than {width}: {output:?}"
    );
    let indent = " ".repeat(prefix.len());
    for line in output.iter().skip(1) {
        assert!(line.starts_with(&indent), "{line:?} does not hang under {prefix:?}");
        assert!(!line[indent.len()..].starts_with(' '), "{line:?} is over-indented");
    }
}
