use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn taskmate_help_works() {
    Command::cargo_bin("taskmate")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("personal task tracking"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = [
        "list",
        "add",
        "toggle",
        "rm",
        "clear-done",
        "clear-all",
        "category",
        "summary",
    ];

    for cmd in subcommands {
        Command::cargo_bin("taskmate")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn missing_subcommand_is_usage_error() {
    Command::cargo_bin("taskmate")
        .expect("binary")
        .assert()
        .failure()
        .code(2);
}
