//! Integration tests for offgrid

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn offgrid() -> Command {
        let mut cmd = cargo_bin_cmd!("offgrid");
        cmd.env_remove("OFFGRID_CONFIG").env_remove("RUST_LOG");
        cmd
    }

    /// Config pointing at a port nothing listens on
    fn unreachable_config(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[agent]
origin = "http://127.0.0.1:9"
version = "v7"

[network]
timeout_secs = 2
"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn help_displays() {
        offgrid()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline-caching agent"));
    }

    #[test]
    fn version_displays() {
        offgrid()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("offgrid"));
    }

    #[test]
    fn config_path_honours_flag() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        offgrid()
            .args(["-c", path.to_str().unwrap(), "config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("custom.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");
        offgrid()
            .args(["-c", path.to_str().unwrap(), "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[agent]"))
            .stdout(predicate::str::contains("red-social"));
    }

    #[test]
    fn config_init_then_set() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let path_arg = path.to_str().unwrap();

        offgrid()
            .args(["-c", path_arg, "config", "init"])
            .assert()
            .success();
        assert!(path.exists());

        offgrid()
            .args(["-c", path_arg, "config", "set", "agent.version", "v2"])
            .assert()
            .success();

        offgrid()
            .args(["-c", path_arg, "plan", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("red-social-v2"))
            .stdout(predicate::str::contains("red-social-runtime-v2"));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        offgrid()
            .args(["-c", path.to_str().unwrap(), "config", "set", "agent.colour", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn invalid_config_reports_hint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent\norigin = ").unwrap();

        offgrid()
            .args(["-c", path.to_str().unwrap(), "plan"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("config init --force"));
    }

    #[test]
    fn plan_lists_precache_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");
        offgrid()
            .args(["-c", path.to_str().unwrap(), "plan", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"static_bucket\": \"red-social-v1\""))
            .stdout(predicate::str::contains("GET http://localhost:5000/static/css/style.css"));
    }

    #[test]
    fn offline_navigation_gets_notice() {
        let dir = TempDir::new().unwrap();
        let config = unreachable_config(&dir);

        offgrid()
            .args(["-c", config.to_str().unwrap(), "run", "--offline", "--format", "plain", "/feed"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "GET http://127.0.0.1:9/feed 503 offline-notice",
            ));
    }

    #[test]
    fn unreachable_origin_still_installs() {
        let dir = TempDir::new().unwrap();
        let config = unreachable_config(&dir);

        let output = offgrid()
            .args(["-c", config.to_str().unwrap(), "run", "--format", "json", "/"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["install"]["bucket"], "red-social-v7");
        assert_eq!(report["install"]["stored"], 0);
        assert!(report["install"]["failure"].is_string());
        assert_eq!(report["activation"]["claimed"], 1);
        assert_eq!(report["requests"][0]["status"], 503);
        assert_eq!(report["requests"][0]["source"], "offline-notice");
    }

    #[test]
    fn uncached_asset_offline_fails() {
        let dir = TempDir::new().unwrap();
        let config = unreachable_config(&dir);

        offgrid()
            .args([
                "-c",
                config.to_str().unwrap(),
                "run",
                "--offline",
                "--format",
                "plain",
                "--destination",
                "image",
                "/static/img/logo.png",
            ])
            .assert()
            .failure()
            .stdout(predicate::str::contains("not cached"))
            .stderr(predicate::str::contains("1 of 1 request(s) failed"));
    }

    #[test]
    fn completions_generate() {
        offgrid()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("offgrid"));
    }
}
