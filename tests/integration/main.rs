//! Integration tests for festboard
//!
//! Each test writes its own config into a temp dir. The roster is served
//! from a `file://` origin and the results store points at a closed port,
//! so nothing here needs the network.

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const ROSTER: &str = r#"{
        "Solo Song": [
            {"NAME": "Asha", "FACULTY": "SCIENCE"},
            {"NAME": "Ravi", "FACULTY": "SOCIAL SCIENCE"}
        ]
    }"#;

    fn festboard() -> Command {
        let mut cmd = cargo_bin_cmd!("festboard");
        cmd.env_remove("FESTBOARD_CONFIG")
            .env_remove("FESTBOARD_ADMIN_PASSWORD")
            .env_remove("FESTBOARD_STORE_KEY");
        cmd
    }

    /// Write a site with a roster plus a config pointing at it
    fn workspace(extra: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let site = temp.path().join("site");
        fs::create_dir_all(&site).unwrap();
        fs::write(site.join("roster.json"), ROSTER).unwrap();

        let config = format!(
            r#"
[general]
origin = "file://{site}/"
timeout_secs = 2

[festival]
start_date = "2026-02-20"
days = 4
now = "2026-02-20T09:00"

[roster]
source = "roster.json"

[store]
base_url = "http://127.0.0.1:9"
bin_id = ""

[cache]
dir = "{cache}"
fallback_to_network_only = true

[cache.manifest]
local = []
pinned = []
{extra}
"#,
            site = site.display(),
            cache = temp.path().join("cache").display(),
            extra = extra,
        );
        let path = temp.path().join("config.toml");
        fs::write(&path, config).unwrap();
        (temp, path)
    }

    fn with_config(path: &Path) -> Command {
        let mut cmd = festboard();
        cmd.arg("--config").arg(path);
        cmd
    }

    #[test]
    fn help_displays() {
        festboard()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("festival schedule, results and leaderboard"))
            .stdout(predicate::str::contains("leaderboard"));
    }

    #[test]
    fn version_displays() {
        festboard()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("festboard"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        festboard()
            .arg("--config")
            .arg(&path)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_masks_password() {
        let (_temp, path) = workspace("[admin]\npassword = \"hunter2\"\n");

        with_config(&path)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[festival]"))
            .stdout(predicate::str::contains("********"))
            .stdout(predicate::str::contains("hunter2").not());
    }

    #[test]
    fn config_init_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        festboard()
            .arg("--config")
            .arg(&path)
            .args(["config", "init"])
            .assert()
            .success();
        assert!(path.exists());

        fs::write(&path, "# edited\n").unwrap();
        festboard()
            .arg("--config")
            .arg(&path)
            .args(["config", "init"])
            .assert()
            .success();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# edited\n");
    }

    #[test]
    fn classify_remote_data() {
        let (_temp, path) = workspace("");

        with_config(&path)
            .args(["cache", "classify", "https://api.jsonbin.io/v3/b/x/latest"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("remote-data"));
    }

    #[test]
    fn classify_local_asset() {
        let (_temp, path) = workspace("");

        with_config(&path)
            .args(["cache", "classify", "index.html"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("network-first"));
    }

    #[test]
    fn schedule_from_roster() {
        let (_temp, path) = workspace("");

        with_config(&path)
            .args(["schedule", "--day", "1", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Solo Song"))
            .stdout(predicate::str::contains("1:00 PM"));
    }

    #[test]
    fn schedule_day_out_of_range() {
        let (_temp, path) = workspace("");

        with_config(&path)
            .args(["schedule", "--day", "9"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("outside the festival"));
    }

    #[test]
    fn leaderboard_without_results() {
        let (_temp, path) = workspace("");

        with_config(&path)
            .args(["leaderboard", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("SCIENCE"));
    }

    #[test]
    fn leaderboard_with_participation() {
        let (_temp, path) = workspace("\n[scoring]\nparticipation_points = true\n");

        with_config(&path)
            .args(["leaderboard", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"score\": 1"));
    }

    #[test]
    fn home_shows_next_event() {
        let (_temp, path) = workspace("");

        with_config(&path)
            .args(["home", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Solo Song"));
    }

    #[test]
    fn admin_disabled_without_password() {
        let (_temp, path) = workspace("");

        with_config(&path)
            .args(["admin", "list"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("disabled"));
    }

    #[test]
    fn admin_rejects_wrong_password() {
        let (_temp, path) = workspace("[admin]\npassword = \"hunter2\"\n");

        with_config(&path)
            .args(["admin", "list", "--password", "guess"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Incorrect admin password"));
    }

    #[test]
    fn cache_install_then_status() {
        let (_temp, path) = workspace("");

        with_config(&path).args(["cache", "install"]).assert().success();

        with_config(&path)
            .args(["cache", "status", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("arts-fest-v2"));

        with_config(&path)
            .args(["cache", "clear", "--yes"])
            .assert()
            .success();

        with_config(&path)
            .args(["cache", "status", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("arts-fest-v2").not());
    }
}
