//! Integration tests for compreg

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Isolated config and registry directories for one test
    struct Sandbox {
        temp: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let config = format!(
                "[network]\nprofile_timeout_secs = 1\n\n[profile]\nbase_profile_uri = \"http://127.0.0.1:9/base.profile.json\"\ncache_dir = {:?}\n\n[credentials.\"registry.example.org\"]\ntoken = \"s3cret\"\n",
                temp.path().join("conf").display().to_string()
            );
            fs::write(temp.path().join("config.toml"), config).unwrap();
            fs::create_dir_all(temp.path().join("registry")).unwrap();
            Self { temp }
        }

        fn registry(&self) -> PathBuf {
            self.temp.path().join("registry")
        }

        fn config(&self) -> PathBuf {
            self.temp.path().join("config.toml")
        }

        fn write_bundle(&self, name: &str, content: &str) -> PathBuf {
            let path = self.temp.path().join(name);
            fs::write(&path, content).unwrap();
            path
        }

        fn cmd(&self) -> Command {
            let mut cmd = compreg();
            cmd.env("COMPREG_CONFIG", self.config())
                .env("COMPREG_REGISTRY", self.registry());
            cmd
        }

        fn create_family(&self, name: &str) {
            self.cmd()
                .args(["family", "create", name])
                .assert()
                .success();
        }

        fn create_component(&self, family: &str, name: &str, bundle: &Path) {
            self.cmd()
                .args(["create", family, name, "--bundle"])
                .arg(bundle)
                .assert()
                .success();
        }
    }

    fn compreg() -> Command {
        let mut cmd = cargo_bin_cmd!("compreg");
        cmd.env_remove("COMPREG_REGISTRY")
            .env_remove("COMPREG_CONFIG")
            .env("COMPREG_PLAIN", "1");
        cmd
    }

    #[test]
    fn help_displays() {
        compreg()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Versioned workflow component registries"));
    }

    #[test]
    fn version_displays() {
        compreg()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("compreg"));
    }

    #[test]
    fn config_path_honors_flag() {
        let sandbox = Sandbox::new();
        compreg()
            .arg("--config")
            .arg(sandbox.config())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_redacts_tokens() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[network]"))
            .stdout(predicate::str::contains("s3cret").not());
    }

    #[test]
    fn invalid_config_shows_hint() {
        let sandbox = Sandbox::new();
        fs::write(sandbox.config(), "[network]\nrequest_timeout_secs = \"soon\"\n").unwrap();
        sandbox
            .cmd()
            .arg("families")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("compreg config init --force"));

        sandbox
            .cmd()
            .args(["config", "init", "--force"])
            .assert()
            .success();
        sandbox.cmd().arg("families").assert().success();
    }

    #[test]
    fn missing_registry_is_reported() {
        let sandbox = Sandbox::new();
        compreg()
            .env("COMPREG_CONFIG", sandbox.config())
            .arg("families")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No registry selected"));
    }

    #[test]
    fn empty_registry_lists_nothing() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["families", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::diff("[]\n"));
    }

    #[test]
    fn local_registry_has_no_licenses() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["licenses", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::diff("[]\n"));
    }

    #[test]
    fn unknown_family_fails() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["components", "imaging"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Family not found: imaging"));
    }

    #[test]
    fn families_plain_listing() {
        let sandbox = Sandbox::new();
        sandbox.create_family("text");
        sandbox.create_family("imaging");

        sandbox
            .cmd()
            .args(["families", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("imaging\ntext\n"));
    }

    #[test]
    fn family_profile_is_resolved_from_registry() {
        let sandbox = Sandbox::new();
        fs::write(
            sandbox.registry().join("text.profile.json"),
            r#"{"id": "urn:profile:text", "name": "Text"}"#,
        )
        .unwrap();

        sandbox
            .cmd()
            .args(["family", "create", "text", "--profile", "Text"])
            .assert()
            .success();
        sandbox
            .cmd()
            .args(["families", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"profile\": \"Text\""));
    }

    #[test]
    fn create_component_twice_fails() {
        let sandbox = Sandbox::new();
        let bundle = sandbox.write_bundle("tok.bundle", "tokenize v1");
        sandbox.create_family("text");
        sandbox.create_component("text", "tokenize", &bundle);

        sandbox
            .cmd()
            .args(["create", "text", "tokenize", "--bundle"])
            .arg(&bundle)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Component already exists: tokenize"))
            .stderr(predicate::str::contains("add-version"));

        sandbox
            .cmd()
            .args(["versions", "text", "tokenize", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("1\n"));
    }

    #[test]
    fn add_version_and_fetch() {
        let sandbox = Sandbox::new();
        let v1 = sandbox.write_bundle("v1.bundle", "tokenize v1");
        let v2 = sandbox.write_bundle("v2.bundle", "tokenize v2");
        sandbox.create_family("text");
        sandbox.create_component("text", "tokenize", &v1);

        sandbox
            .cmd()
            .args(["add-version", "text", "tokenize", "-m", "faster", "--bundle"])
            .arg(&v2)
            .assert()
            .success()
            .stdout(predicate::str::contains("v2"));

        sandbox
            .cmd()
            .args(["versions", "text", "tokenize", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("1\n2\n"));

        // Latest by default, raw bytes on stdout
        sandbox
            .cmd()
            .args(["fetch", "text", "tokenize"])
            .assert()
            .success()
            .stdout(predicate::str::diff("tokenize v2"));

        let out = sandbox.temp.path().join("out.bundle");
        sandbox
            .cmd()
            .args(["fetch", "text", "tokenize", "-V", "1", "-o"])
            .arg(&out)
            .assert()
            .success();
        assert_eq!(fs::read_to_string(&out).unwrap(), "tokenize v1");
    }

    #[test]
    fn show_reports_version_details() {
        let sandbox = Sandbox::new();
        let bundle = sandbox.write_bundle("tok.bundle", "tokenize v1");
        sandbox.create_family("text");
        sandbox
            .cmd()
            .args(["create", "text", "tokenize", "-d", "Split text", "--bundle"])
            .arg(&bundle)
            .assert()
            .success();

        sandbox
            .cmd()
            .args(["show", "text", "tokenize", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"version\": 1"))
            .stdout(predicate::str::contains("\"description\": \"Initial version\""))
            .stdout(predicate::str::contains("\"size_bytes\": 11"));

        sandbox
            .cmd()
            .args(["show", "text", "tokenize", "-V", "7"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Version not found"));

        sandbox
            .cmd()
            .args(["show", "text", "tokenize", "-V", "zero"])
            .assert()
            .failure();
    }

    #[test]
    fn delete_requires_confirmation() {
        let sandbox = Sandbox::new();
        let bundle = sandbox.write_bundle("tok.bundle", "tokenize v1");
        sandbox.create_family("text");
        sandbox.create_component("text", "tokenize", &bundle);

        sandbox
            .cmd()
            .args(["delete", "text", "tokenize"])
            .assert()
            .success()
            .stderr(predicate::str::contains("Nothing deleted"));
        assert!(sandbox.registry().join("text").join("tokenize").is_dir());

        sandbox
            .cmd()
            .args(["delete", "text", "tokenize", "--yes"])
            .assert()
            .success();
        assert!(!sandbox.registry().join("text").join("tokenize").exists());

        sandbox
            .cmd()
            .args(["components", "text", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn family_delete_removes_components() {
        let sandbox = Sandbox::new();
        let bundle = sandbox.write_bundle("tok.bundle", "tokenize v1");
        sandbox.create_family("text");
        sandbox.create_component("text", "tokenize", &bundle);

        sandbox
            .cmd()
            .args(["family", "delete", "text", "--yes"])
            .assert()
            .success();
        assert!(!sandbox.registry().join("text").exists());
    }

    #[test]
    fn unreachable_base_profile_is_reported() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["profile"])
            .assert()
            .success()
            .stdout(predicate::str::contains("unavailable"));
    }

    #[test]
    fn completions_generate() {
        compreg()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("compreg"));
    }
}
