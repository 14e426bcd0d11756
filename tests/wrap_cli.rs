//! Command line behaviour of the `wrap` binary.

use std::fs;

#[macro_use]
mod prelude;
use prelude::*;

#[test]
fn wraps_standard_input() {
    bin("wrap")
        .args(["-w", "14"])
        .write_stdin("one two three four five\n")
        .assert()
        .success()
        .stdout("one two three\nfour five\n");
}

#[test]
fn markdown_flag_hangs_list_items() {
    bin("wrap")
        .args(["-m", "-w", "14"])
        .write_stdin("- alpha beta gamma delta\n")
        .assert()
        .success()
        .stdout("- alpha beta\n  gamma delta\n");
}

#[rstest]
#[case(&["-s", "1"], "a\nb\n", "a\nb\n")]
#[case(&["-s", "3"], "a\nb\n\nc\n", "a b c\n")]
#[case(&["-L", "2", "-w", "10"], "aa bb cc dd\n", "  aa bb cc\n  dd\n")]
#[case(&["-l", "2", "-w", "7"], "aaa bbb ccc\n", "aaa bbb\n  ccc\n")]
#[case(&["-h", "*", "-w", "10"], "* one two three\n", "* one two\n  three\n")]
#[case(&["-e"], "a   b\nc\n", "a   b c\n")]
fn plain_flags(#[case] args: &[&str], #[case] input: &str, #[case] expected: &str) {
    bin("wrap")
        .args(args)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(expected.to_string());
}

#[test]
fn later_flag_overrides_earlier() {
    bin("wrap")
        .args(["-w", "5", "-w", "80"])
        .write_stdin("one two three\n")
        .assert()
        .success()
        .stdout("one two three\n");
}

#[test]
fn reads_and_writes_named_files() {
    let dir = tempdir().expect("failed to create temporary directory");
    let input = write_file(dir.path(), "in.txt", "aaa bbb ccc\n");
    let output = dir.path().join("out.txt");
    bin("wrap")
        .args(["-w", "7", "-f"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout("");
    assert_eq!(fs::read_to_string(&output).expect("read output"), "aaa bbb\nccc\n");
}

#[test]
fn version_flag_prints_version() {
    bin("wrap")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn long_help_exits_cleanly() {
    bin("wrap")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--hang-chars"));
}

#[rstest]
#[case(&["-w", "0"])]
#[case(&["-t"])]
#[case(&["--no-such-flag"])]
fn usage_errors_exit_64(#[case] args: &[&str]) {
    bin("wrap").args(args).assert().code(64);
}

#[test]
fn missing_input_exits_66() {
    let dir = tempdir().expect("failed to create temporary directory");
    bin("wrap")
        .arg(dir.path().join("absent.txt"))
        .assert()
        .code(66)
        .stderr(predicate::str::contains("cannot open"));
}

#[test]
fn uncreatable_output_exits_73() {
    let dir = tempdir().expect("failed to create temporary directory");
    bin("wrap")
        .arg("-o")
        .arg(dir.path().join("no/such/dir/out.txt"))
        .write_stdin("x\n")
        .assert()
        .code(73)
        .stderr(predicate::str::contains("cannot create"));
}

#[test]
fn debug_flag_logs_files() {
    let dir = tempdir().expect("failed to create temporary directory");
    let input = write_file(dir.path(), "notes.txt", "x\n");
    bin("wrap")
        .arg("-d")
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("[INFO]").and(predicate::str::contains("notes.txt")));
}
