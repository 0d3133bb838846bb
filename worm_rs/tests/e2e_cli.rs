//! End-to-end tests for the `worm` binary.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Config without cooldowns or traversal delay.
fn fast_config(temp: &TempDir) -> std::path::PathBuf {
    let path = temp.path().join("worm.toml");
    std::fs::write(
        &path,
        "create_cooldown_ms = 0\nsolve_cooldown_ms = 0\nbase_guess_time_ms = 0\n",
    )
    .expect("write config");
    path
}

fn worm(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("worm");
    cmd.env("WORM_CONFIG", fast_config(temp))
        .env("RUST_LOG", "warn");
    cmd
}

mod cli_basics {
    use super::*;

    #[test]
    fn shows_help() {
        let temp = TempDir::new().expect("tempdir");
        worm(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Help for worm:"))
            .stdout(predicate::str::contains("solve: Submit the guess"));
    }

    #[test]
    fn bare_invocation_prints_usage() {
        let temp = TempDir::new().expect("tempdir");
        worm(&temp)
            .assert()
            .success()
            .stdout(predicate::str::contains("Commands:"));
    }

    #[test]
    fn shows_version() {
        let temp = TempDir::new().expect("tempdir");
        worm(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "worm v{}",
                env!("CARGO_PKG_VERSION")
            )));
    }

    #[test]
    fn subcommand_help() {
        let temp = TempDir::new().expect("tempdir");
        worm(&temp)
            .args(["test", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Help for worm/test:"))
            .stdout(predicate::str::contains("<input> (string)"));
    }
}

mod rejected_input {
    use super::*;

    #[test]
    fn unknown_option_suggests_close_match() {
        let temp = TempDir::new().expect("tempdir");
        worm(&temp)
            .args(["create", "--pd", "4"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Unknown option '--pd'"));
    }

    #[test]
    fn missing_argument() {
        let temp = TempDir::new().expect("tempdir");
        worm(&temp)
            .arg("solve")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Missing argument 'id' for 'worm/solve'"));
    }

    #[test]
    fn action_failure_is_reported() {
        let temp = TempDir::new().expect("tempdir");
        worm(&temp)
            .args(["solve", "9"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("worm: action for 'worm/solve' failed"));
    }
}

mod sessions {
    use super::*;

    #[test]
    fn fresh_process_has_no_sessions() {
        let temp = TempDir::new().expect("tempdir");
        worm(&temp)
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No active sessions"));
    }

    #[test]
    fn repl_plays_a_session() {
        let temp = TempDir::new().expect("tempdir");
        worm(&temp)
            .arg("repl")
            .write_stdin(
                "create\n\nlist\ntest 1 A\nguess bipartite 1 true\nsolve 1\nhistory\nexit\n",
            )
            .assert()
            .success()
            .stdout(predicate::str::contains("1\t"))
            .stdout(predicate::str::contains("Reward: 0.000"))
            .stdout(predicate::str::contains("0.000\t1 tests"));
    }

    #[test]
    fn repl_keeps_going_after_errors() {
        let temp = TempDir::new().expect("tempdir");
        worm(&temp)
            .arg("repl")
            .write_stdin("solve 5\nbonus set 1\n")
            .assert()
            .success()
            .stderr(predicate::str::contains("worm session 5 does not exist"))
            .stdout(predicate::str::contains("Completions: 0.000"));
    }

    #[test]
    fn sweep_ends_sessions_of_dead_processes() {
        let temp = TempDir::new().expect("tempdir");
        worm(&temp)
            .arg("repl")
            .write_stdin("create --pid 7\ncreate --pid 8\ncreate\nsweep 8\nlist\nhistory\nexit\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("ended 1"))
            .stdout(predicate::str::contains("ended 2").not())
            .stdout(predicate::str::contains("1\t0.000\t0 tests"))
            .stdout(predicate::str::contains("2\t"))
            .stdout(predicate::str::contains("3\t"));
    }

    #[test]
    fn sweep_rejects_bad_pid_list() {
        let temp = TempDir::new().expect("tempdir");
        worm(&temp)
            .args(["sweep", "7,x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid pid 'x'"));
    }

    #[test]
    fn complete_suggests_options() {
        let temp = TempDir::new().expect("tempdir");
        worm(&temp)
            .args(["complete", "create"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--pid"));
    }
}
