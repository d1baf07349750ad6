use std::fs;
use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn write_tempfile(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create tempfile");
    write!(file, "{contents}").expect("write tempfile");
    file
}

fn bin(name: &str) -> Command {
    Command::cargo_bin(name).unwrap_or_else(|err| panic!("binary {name} should be built: {err}"))
}

#[test]
fn help_and_version_succeed() {
    for name in ["json-diff", "json-patch", "json-cat"] {
        bin(name).arg("--help").assert().success().stdout(predicate::str::contains("Usage:"));
        bin(name).arg("--version").assert().success().stdout(predicate::str::contains(name));
    }
}

#[test]
fn diff_files_prints_the_delta() {
    let lhs = write_tempfile("{\"foo\":\"bar\"}");
    let rhs = write_tempfile("{\"foo\":\"baz\"}");
    bin("json-diff")
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .success()
        .stdout("[[[\"foo\"],\"baz\"]]\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn diff_reads_the_right_side_from_stdin() {
    let lhs = write_tempfile("[1,2,3]");
    bin("json-diff").arg(lhs.path()).write_stdin("[1,3]").assert().success().stdout("[[[1]]]\n");
}

#[test]
fn diff_pair_on_stdin_renders_a_udiff_with_headers() {
    bin("json-diff")
        .arg("-u")
        .write_stdin("[{\"foo\":\"bar\"}, {\"foo\":\"baz\"}]")
        .assert()
        .success()
        .stdout("--- <stdin>[0]\n+++ <stdin>[1]\n {\n  \"foo\":\n-  \"bar\"\n+  \"baz\"\n }\n");
}

#[test]
fn diff_file_headers_carry_modification_times_and_patch_back() {
    let lhs = write_tempfile("{\"foo\":\"bar\"}");
    let rhs = write_tempfile("{\"foo\":\"baz\"}");
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("change.udiff");
    bin("json-diff").arg("-u").arg("-o").arg(&out).arg(lhs.path()).arg(rhs.path()).assert().success();

    let text = fs::read_to_string(&out).expect("output written");
    let stamp = r"\t\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} [+-]\d{2}:\d{2}\n";
    let header = format!(r"^--- [^\t]+{stamp}\+\+\+ [^\t]+{stamp} \{{\n");
    assert!(predicate::str::is_match(header).expect("valid regex").eval(&text), "{text}");

    bin("json-patch")
        .arg(lhs.path())
        .arg(&out)
        .assert()
        .success()
        .stdout("{\"foo\":\"baz\"}\n");
}

#[test]
fn diff_verbose_reports_compression_on_stderr() {
    bin("json-diff")
        .args(["-v", "-f"])
        .write_stdin("[[16], []]")
        .assert()
        .success()
        .stdout("[[[],[]]]\n")
        .stderr(predicate::str::starts_with("Size of delta"));
}

#[test]
fn diff_writes_to_an_output_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("delta.json");
    bin("json-diff")
        .arg("-o")
        .arg(&out)
        .write_stdin("[[16], []]")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    assert_eq!(fs::read_to_string(out).expect("output written"), "[[[0]]]\n");
}

#[test]
fn diff_rejects_invalid_json() {
    let lhs = write_tempfile("{not json");
    bin("json-diff")
        .arg(lhs.path())
        .write_stdin("1")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to decode"));
}

#[test]
fn patch_applies_json_deltas_and_udiffs() {
    let struc = write_tempfile("{\"foo\":\"bar\"}");
    let delta = write_tempfile("[[[\"foo\"],\"baz\"]]");
    bin("json-patch")
        .arg(struc.path())
        .arg(delta.path())
        .assert()
        .success()
        .stdout("{\"foo\":\"baz\"}\n");

    let udiff = write_tempfile("--- a\n+++ b\n {\n  \"foo\":\n-  \"bar\"\n+  \"baz\"\n }\n");
    bin("json-patch")
        .arg(struc.path())
        .arg(udiff.path())
        .assert()
        .success()
        .stdout("{\"foo\":\"baz\"}\n");

    let patched = write_tempfile("{\"foo\":\"baz\"}");
    bin("json-patch")
        .arg("-r")
        .arg(patched.path())
        .arg(udiff.path())
        .assert()
        .success()
        .stdout("{\"foo\":\"bar\"}\n");
}

#[test]
fn patch_pair_on_stdin() {
    bin("json-patch")
        .write_stdin("[[1,2,3], [[[1]]]]")
        .assert()
        .success()
        .stdout("[1,3]\n");
    bin("json-patch")
        .write_stdin("[[1,3], \" [\\n  1,\\n+ 2,\\n  3\\n ]\"]")
        .assert()
        .success()
        .stdout("[1,2,3]\n");
}

#[test]
fn patch_reverse_needs_a_udiff() {
    let struc = write_tempfile("[1]");
    bin("json-patch")
        .arg("--reverse")
        .arg(struc.path())
        .write_stdin("[[[0]]]")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--reverse only applies to udiff patches"));
}

#[test]
fn patch_reports_missing_paths() {
    let struc = write_tempfile("{}");
    bin("json-patch")
        .arg(struc.path())
        .write_stdin("[[[\"a\"]]]")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("path not found"));
}

#[test]
fn cat_wraps_inputs_in_an_array() {
    let json = write_tempfile("{\"a\": [1, 2]}");
    let text = write_tempfile("plain text");
    bin("json-cat")
        .arg(json.path())
        .arg(text.path())
        .assert()
        .success()
        .stdout("[{\"a\":[1,2]},\"plain text\"]\n");
    bin("json-cat").write_stdin("3").assert().success().stdout("[3]\n");
}
