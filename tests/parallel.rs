//! Tests for parallel processing of multiple input files.

use wrap::{WrapOptions, wrap_lines};

#[macro_use]
mod prelude;
use prelude::*;

#[test]
fn outputs_follow_argument_order() {
    let dir = tempdir().expect("failed to create temporary directory");
    let mut files = Vec::new();
    let mut expected = String::new();
    let options = WrapOptions {
        width: 12,
        ..WrapOptions::default()
    };
    for i in 0..8 {
        let text = lines_vec![format!("file {i} has a few words to wrap"), "", format!("end {i}")];
        files.push(write_file(dir.path(), &format!("f{i}.txt"), &(text.join("\n") + "\n")));
        for line in wrap_lines(&text, &options) {
            expected.push_str(&line);
            expected.push('\n');
        }
    }

    let mut cmd = bin("wrap");
    cmd.args(["-w", "12"]);
    for path in &files {
        cmd.arg(path);
    }
    cmd.assert().success().stdout(expected);
}

#[test]
fn missing_file_keeps_other_output() {
    let dir = tempdir().expect("failed to create temporary directory");
    let good = write_file(dir.path(), "good.txt", "alpha beta\n");
    let missing = dir.path().join("missing.txt");
    bin("wrap")
        .arg(&good)
        .arg(&missing)
        .assert()
        .code(66)
        .stdout("alpha beta\n")
        .stderr(predicate::str::contains("missing.txt"));
}

#[test]
fn single_file_matches_stdin() {
    let dir = tempdir().expect("failed to create temporary directory");
    let text = "one two three four five six\n";
    let path = write_file(dir.path(), "one.txt", text);
    let from_file = bin("wrap")
        .args(["-w", "10"])
        .arg(&path)
        .output()
        .expect("failed to run wrap");
    bin("wrap")
        .args(["-w", "10"])
        .write_stdin(text)
        .assert()
        .success()
        .stdout(String::from_utf8(from_file.stdout).expect("utf8"));
}
