use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

const FOO_IDL: &str = include_str!("fixtures/foo.idl");
const ADD_METHOD_PATCH: &str = include_str!("fixtures/add_method.patch");

fn run_check(tree: &Path, diff: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_iid-check"))
        .arg(tree)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(diff.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn tree_with_foo(content: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("xpcom/base")).unwrap();
    fs::write(dir.path().join("xpcom/base/foo.idl"), content).unwrap();
    dir
}

#[test]
fn test_flags_method_added_without_new_iid() {
    let tree = tree_with_foo(FOO_IDL);
    let output = run_check(tree.path(), ADD_METHOD_PATCH);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "ERROR: Interface 'nsIFoo', in file 'foo.idl' needs a new IID\n"
    );
}

#[test]
fn test_output_is_stable_across_runs() {
    let tree = tree_with_foo(FOO_IDL);
    let first = run_check(tree.path(), ADD_METHOD_PATCH);
    let second = run_check(tree.path(), ADD_METHOD_PATCH);
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_new_iid_silences_the_finding() {
    let bumped = FOO_IDL.replacen(
        "uuid(11111111-1111-1111-1111-111111111111)",
        "uuid(22222222-2222-2222-2222-222222222222)",
        1,
    );
    let patch = ADD_METHOD_PATCH.replacen(
        " [scriptable, uuid(11111111-1111-1111-1111-111111111111)]\n",
        "-[scriptable, uuid(11111111-1111-1111-1111-111111111111)]\n+[scriptable, uuid(22222222-2222-2222-2222-222222222222)]\n",
        1,
    );
    let tree = tree_with_foo(&bumped);
    let output = run_check(tree.path(), &patch);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_missing_working_tree_file_is_a_warning_not_a_failure() {
    let tree = tempfile::tempdir().unwrap();
    let output = run_check(tree.path(), ADD_METHOD_PATCH);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("xpcom/base/foo.idl"));
}

#[test]
fn test_empty_diff_fails() {
    let tree = tempfile::tempdir().unwrap();
    let output = run_check(tree.path(), "");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_markdown_report_is_written() {
    let tree = tree_with_foo(FOO_IDL);
    let report_dir = tempfile::tempdir().unwrap();
    let report_path = report_dir.path().join("report.md");

    let mut child = Command::new(env!("CARGO_BIN_EXE_iid-check"))
        .arg(tree.path())
        .arg("--output")
        .arg(&report_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(ADD_METHOD_PATCH.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let report = fs::read_to_string(&report_path).unwrap();
    assert!(report.contains("- **nsIFoo** (`xpcom/base/foo.idl:11`): method `void b()` added"));
    assert!(report.contains("| nsIFooListener | cosmetic | no |"));
}
