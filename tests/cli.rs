use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn red_light() -> Command {
    let mut cmd = Command::cargo_bin("red-light").expect("binary exists");
    cmd.env("RUST_LOG", "warn");
    cmd
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp config");
    tmp.write_all(contents.as_bytes()).expect("write config");
    tmp
}

#[test]
fn idle_session_runs_the_countdown_and_times_out() {
    red_light()
        .args(["--headless", "--strategy", "idle", "--seed", "7"])
        .assert()
        .success()
        .stdout(contains("Headless session: strategy idle, seed 7"))
        .stdout(contains("[  1.000s] Starting in 3"))
        .stdout(contains("[  3.500s] Go!"))
        .stdout(contains("[ 13.500s] Timeout!"))
        .stdout(contains("Outcome: Timeout"))
        .stdout(contains(" - player pos=(0.60, 0.00, 0.30)"));
}

#[test]
fn cautious_session_wins() {
    red_light()
        .args(["--headless", "--strategy", "cautious", "--seed", "3"])
        .assert()
        .success()
        .stdout(contains("You win!"))
        .stdout(contains("Outcome: Win"));
}

#[test]
fn holding_the_key_ends_in_a_win_or_a_loss() {
    red_light()
        .args(["--headless", "--seed", "11"])
        .assert()
        .success()
        .stdout(contains("You win!").or(contains("You lose!")));
}

#[test]
fn config_file_shortens_the_time_limit() {
    let config = config_file(
        r#"
[timing]
countdown_ms = [200, 100]
time_limit_ms = 1000
"#,
    );
    red_light()
        .args(["--headless", "--strategy", "idle", "--seed", "1", "--config"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(contains("[  0.200s] Starting in 1"))
        .stdout(contains("[  0.300s] Go!"))
        .stdout(contains("[  1.300s] Timeout!"));
}

#[test]
fn invalid_config_is_rejected() {
    let config = config_file("[timing]\ntime_limit_ms = 0\n");
    red_light()
        .args(["--headless", "--config"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(contains("invalid configuration"));
}

#[test]
fn unknown_argument_is_rejected() {
    red_light()
        .arg("--fly")
        .assert()
        .failure()
        .stderr(contains("Unknown argument: --fly"));
}
