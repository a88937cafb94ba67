//! Integration tests for Showcase

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use showcase::cache::CacheKey;
    use showcase::config::Config;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const SHA: &str = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

    fn showcase() -> Command {
        let mut cmd = cargo_bin_cmd!("showcase");
        cmd.env_remove("SHOWCASE_CONFIG")
            .env_remove("GITHUB_TOKEN")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Config whose cache lives in `temp` and whose compiler is `sh -c script`
    fn write_config(temp: &Path, script: &str) -> PathBuf {
        let mut config = Config::default();
        config.cache.root = Some(temp.join("cache"));
        config.cache.poll_interval_ms = 10;
        config.cache.max_wait_secs = 10;
        config.general.journal = true;
        config.build.program = "sh".to_string();
        config.build.args = vec!["-c".to_string(), script.to_string()];

        let path = temp.join("config.toml");
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        path
    }

    fn with_config(path: &Path) -> Command {
        let mut cmd = showcase();
        cmd.arg("--config").arg(path);
        cmd
    }

    /// Forge on localhost where `master` is the only branch, pointing at `sha`
    fn fake_forge(sha: &'static str, requests: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        std::thread::spawn(move || {
            for stream in listener.incoming().take(requests) {
                let mut stream = stream.unwrap();
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut buf).unwrap();
                    if n == 0 {
                        break;
                    }
                    head.extend_from_slice(&buf[..n]);
                }
                let head = String::from_utf8_lossy(&head).to_string();
                let path = head.split_whitespace().nth(1).unwrap_or_default();

                let commit = format!(
                    r#"{{"sha":"{0}","url":"https://forge.test/commits/{0}"}}"#,
                    sha
                );
                let body = if path.contains("/tags") {
                    "[]".to_string()
                } else if path.contains("/branches") {
                    format!(r#"[{{"name":"master","commit":{}}}]"#, commit)
                } else {
                    commit
                };
                write!(
                    stream,
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                     content-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                )
                .unwrap();
            }
        });

        base
    }

    #[test]
    fn help_displays() {
        showcase()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("theme stylesheet build cache"));
    }

    #[test]
    fn version_displays() {
        showcase()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("showcase"));
    }

    #[test]
    fn config_path_honors_flag() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");

        with_config(&path)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("custom.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();

        with_config(&temp.path().join("missing.toml"))
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("[server]"))
            .stdout(predicate::str::contains("port = 3000"));
    }

    #[test]
    fn config_init_then_set() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        with_config(&path).args(["config", "init"]).assert().success();
        assert!(path.exists());

        with_config(&path)
            .args(["config", "set", "server.port", "8081"])
            .assert()
            .success();

        with_config(&path)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("port = 8081"));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let temp = TempDir::new().unwrap();

        with_config(&temp.path().join("config.toml"))
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn resolve_prints_commit_and_labels_key() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.cache.root = Some(temp.path().join("cache"));
        config.forge.api_url = fake_forge(SHA, 3);
        let path = temp.path().join("config.toml");
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        let key = CacheKey::derive("acme", "theme", SHA).unwrap();

        with_config(&path)
            .args(["resolve", "acme", "theme", "master"])
            .assert()
            .success()
            .stdout(format!("{}\n", SHA))
            .stderr(predicate::str::contains(key.as_str()))
            .stderr(predicate::str::contains(format!(
                "url:     /acme/theme/{}/build/theme.css",
                SHA
            )));
    }

    #[test]
    fn key_prints_digest() {
        let expected = CacheKey::derive("acme", "theme", SHA).unwrap();

        showcase()
            .args(["key", "acme", "theme", SHA])
            .assert()
            .success()
            .stdout(format!("{}\n", expected));
    }

    #[test]
    fn key_rejects_path_separators() {
        showcase()
            .args(["key", "acme/evil", "theme", SHA])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid cache key input"));
    }

    #[test]
    fn cache_path_uses_config() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path(), "true");

        with_config(&config)
            .args(["cache", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cache"));
    }

    #[test]
    fn relative_cache_root_set_and_anchored() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");

        with_config(&config)
            .args(["config", "set", "cache.root", "built"])
            .assert()
            .success();

        let written = std::fs::read_to_string(&config).unwrap();
        assert!(written.contains("root = \"built\""));

        with_config(&config)
            .args(["cache", "path"])
            .assert()
            .success()
            .stdout(format!("{}\n", temp.path().join("built").display()));
    }

    #[test]
    fn completions_generate() {
        showcase()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("showcase"));
    }

    #[cfg(unix)]
    #[test]
    fn build_commit_prints_css() {
        let temp = TempDir::new().unwrap();
        let config = write_config(
            temp.path(),
            "printf 'html,body{background:blue;}' > \"$SHOWCASE_OUTPUT\"",
        );

        with_config(&config)
            .args(["build", "acme", "theme", SHA])
            .assert()
            .success()
            .stdout("html,body{background:blue;}");

        let key = CacheKey::derive("acme", "theme", SHA).unwrap();
        let entry = temp.path().join("cache").join(key.as_str());
        assert!(entry.join("build.css").is_file());
        assert!(entry.join("component.json").is_file());
        assert!(temp.path().join("cache").join("journal.log").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn build_is_cached_per_commit() {
        let temp = TempDir::new().unwrap();
        let first = write_config(temp.path(), "printf 'a{}' > \"$SHOWCASE_OUTPUT\"");

        with_config(&first)
            .args(["build", "acme", "theme", SHA])
            .assert()
            .success()
            .stdout("a{}");

        // A compiler that would fail proves the second run never invokes it
        let second = write_config(temp.path(), "exit 1");
        with_config(&second)
            .args(["build", "acme", "theme", SHA])
            .assert()
            .success()
            .stdout("a{}");
    }

    #[cfg(unix)]
    #[test]
    fn build_force_recompiles() {
        let temp = TempDir::new().unwrap();
        let first = write_config(temp.path(), "printf 'a{}' > \"$SHOWCASE_OUTPUT\"");
        with_config(&first)
            .args(["build", "acme", "theme", SHA])
            .assert()
            .success();

        let second = write_config(temp.path(), "printf 'b{}' > \"$SHOWCASE_OUTPUT\"");
        with_config(&second)
            .args(["build", "acme", "theme", SHA, "--force"])
            .assert()
            .success()
            .stdout("b{}");
    }

    #[cfg(unix)]
    #[test]
    fn build_failure_prints_error_css() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path(), "echo 'missing index file' >&2; exit 1");

        with_config(&config)
            .args(["build", "acme", "theme", SHA])
            .assert()
            .failure()
            .stdout("body:before{white-space: pre; content:\"missing index file\";}")
            .stderr(predicate::str::contains("missing index file"));

        let key = CacheKey::derive("acme", "theme", SHA).unwrap();
        assert!(!temp.path().join("cache").join(key.as_str()).exists());
    }

    #[cfg(unix)]
    #[test]
    fn build_failure_is_retried() {
        let temp = TempDir::new().unwrap();
        let failing = write_config(temp.path(), "exit 3");
        with_config(&failing)
            .args(["build", "acme", "theme", SHA])
            .assert()
            .failure()
            .stdout(predicate::str::contains("sh exited with status 3"));

        let fixed = write_config(temp.path(), "printf 'ok{}' > \"$SHOWCASE_OUTPUT\"");
        with_config(&fixed)
            .args(["build", "acme", "theme", SHA])
            .assert()
            .success()
            .stdout("ok{}");
    }

    #[cfg(unix)]
    #[test]
    fn cache_list_and_clear() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path(), "printf 'a{}' > \"$SHOWCASE_OUTPUT\"");
        let key = CacheKey::derive("acme", "theme", SHA).unwrap();

        with_config(&config)
            .args(["build", "acme", "theme", SHA])
            .assert()
            .success();

        with_config(&config)
            .args(["cache", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(format!("{}\n", key));

        with_config(&config)
            .args(["cache", "list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"dependency\": \"acme/theme\""))
            .stdout(predicate::str::contains("\"state\": \"ready\""));

        with_config(&config)
            .args(["cache", "clear", "--yes"])
            .assert()
            .success();

        with_config(&config)
            .args(["cache", "list", "--format", "json"])
            .assert()
            .success()
            .stdout("[]\n");
    }
}
