#![cfg(feature = "cli_api")]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[allow(deprecated)]
fn cli() -> Command {
    Command::cargo_bin("cli").unwrap()
}

#[test]
fn builds_and_computes_a_chain() {
    cli()
        .write_stdin("task Dig 2\ntask Pour 3\nlink 18 19\ncompute\ncritical\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Added task 18."))
        .stdout(predicate::str::contains("Added task 19."))
        .stdout(predicate::str::contains("Linked 18 -> 19 (FS)."))
        .stdout(predicate::str::contains("crit_path=18->19"))
        .stdout(predicate::str::contains("Critical path: 18 Dig -> 19 Pour"));
}

#[test]
fn reports_errors_and_keeps_going() {
    cli()
        .write_stdin("task Dig 1\nlink 18 18\nlink 18 42\nfrobnicate\ntask Pour 1\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Error:"))
        .stdout(predicate::str::contains("Error: Unknown command. Type 'help'."))
        .stdout(predicate::str::contains("Added task 19."));
}

#[test]
fn prices_an_assignment() {
    cli()
        .write_stdin("resource alice 10\ntask Dig 1\nassign alice 19 100\ncost 19\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Added resource 18."))
        .stdout(predicate::str::contains("Added assignment 20."))
        .stdout(predicate::str::contains("Cost of 19: 240.00"));
}

#[test]
fn batches_defer_the_refresh() {
    cli()
        .write_stdin("batch begin\ntask A 1\ntask B 1\nbatch end\nbatch end\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Batch started."))
        .stdout(predicate::str::contains("Batch ended (tasks=2"))
        .stdout(predicate::str::contains("Error: invalid operation"));
}

#[test]
fn exports_a_csv_report() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schedule.csv");
    let script = format!("task Dig 2\nexport csv {}\nquit\n", path.display());

    cli()
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written to"));

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("Dig"));
    assert_eq!(text.lines().count(), 2);
}

#[test]
fn help_lists_commands() {
    cli()
        .write_stdin("help\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("export <json|csv> <path>"));
}
