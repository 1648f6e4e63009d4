//! Integration tests for the `vuln-lsp-bootstrap` binary entry point.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn dry_run_replays_documents() {
    let mut command = cargo_bin_cmd!("vuln-lsp-bootstrap");
    command.args(["--dry-run", "--log-format", "compact", "pom.xml", "notes.txt"]);
    command
        .assert()
        .success()
        .stdout(contains("\"executable\": \"vuln-lsp\""))
        .stdout(contains("session 1 running pom.xml"))
        .stdout(contains("skipped notes.txt"));
}

#[test]
fn unknown_log_format_exits_with_usage_error() {
    let mut command = cargo_bin_cmd!("vuln-lsp-bootstrap");
    command.args(["--log-format", "xml", "pom.xml"]);
    command.assert().code(2).stderr(contains("--log-format"));
}
