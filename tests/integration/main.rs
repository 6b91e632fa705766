//! Integration tests for Cascade

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Two overlay roots, `app` above `core`, with an isolated config and cache
    struct Workspace {
        temp: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let ws = Self { temp };

            ws.touch("core/config/db.php");
            ws.touch("core/config/app.php");
            ws.touch("app/config/app.php");
            ws.touch("pkg/auth/views/login.php");
            fs::create_dir_all(ws.path("pkg/auth/classes")).unwrap();

            let config = format!(
                "[resolver]\nroots = [{:?}, {:?}]\ndefault_extension = \".php\"\n\n\
                 [cache]\ndir = {:?}\n\n[namespaces]\nAuth = {:?}\n",
                ws.path("app"),
                ws.path("core"),
                ws.path("cache"),
                ws.path("pkg/auth/classes"),
            );
            fs::write(ws.config_path(), config).unwrap();
            ws
        }

        fn path(&self, relative: &str) -> PathBuf {
            self.temp.path().join(relative)
        }

        fn touch(&self, relative: &str) {
            let path = self.path(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"").unwrap();
        }

        fn config_path(&self) -> PathBuf {
            self.path("config.toml")
        }

        fn cmd(&self) -> Command {
            let mut cmd = cascade();
            cmd.arg("--no-local")
                .arg("--config")
                .arg(self.config_path())
                .current_dir(self.temp.path());
            cmd
        }
    }

    fn cascade() -> Command {
        cargo_bin_cmd!("cascade")
    }

    fn shown(path: &Path) -> String {
        path.display().to_string()
    }

    #[test]
    fn help_displays() {
        cascade()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cascading file resolver"));
    }

    #[test]
    fn version_displays() {
        cascade()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("cascade"));
    }

    #[test]
    fn locate_falls_through_to_lower_root() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["locate", "config", "db"])
            .assert()
            .success()
            .stdout(predicate::str::contains(shown(&ws.path("core/config/db.php"))));
    }

    #[test]
    fn locate_prefers_first_root() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["locate", "config", "app"])
            .assert()
            .success()
            .stdout(predicate::str::contains(shown(&ws.path("app/config/app.php"))))
            .stdout(predicate::str::contains(shown(&ws.path("core/config/app.php"))).not());
    }

    #[test]
    fn locate_all_lists_every_root() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["locate", "config", "app", "--all", "--no-cache"])
            .assert()
            .success()
            .stdout(predicate::str::contains(shown(&ws.path("app/config/app.php"))))
            .stdout(predicate::str::contains(shown(&ws.path("core/config/app.php"))));
    }

    #[test]
    fn locate_flash_root_wins() {
        let ws = Workspace::new();
        ws.touch("preview/config/app.php");
        ws.cmd()
            .args(["locate", "config", "app", "--flash"])
            .arg(ws.path("preview"))
            .assert()
            .success()
            .stdout(predicate::str::contains(shown(&ws.path("preview/config/app.php"))));
    }

    #[test]
    fn locate_namespaced_name() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["locate", "views", "Auth::login"])
            .assert()
            .success()
            .stdout(predicate::str::contains(shown(
                &ws.path("pkg/auth/views/login.php"),
            )));
    }

    #[test]
    fn locate_missing_file_is_empty() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["locate", "config", "nope"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("Error").not());

        ws.cmd()
            .args(["locate", "config", "nope", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("null"));

        ws.cmd()
            .args(["locate", "config", "nope", "--all", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn locate_rejects_empty_namespaced_name() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["locate", "views", "Auth::"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid argument"));
    }

    #[test]
    fn locate_empty_name_is_invalid() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["locate", "config", ""])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid argument"));
    }

    #[test]
    fn locate_persists_cache() {
        let ws = Workspace::new();
        ws.cmd().args(["locate", "config", "db"]).assert().success();

        let cached: Vec<_> = fs::read_dir(ws.path("cache")).unwrap().collect();
        assert_eq!(cached.len(), 1);

        ws.cmd()
            .args(["cache", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains(shown(&ws.path("core/config/db.php"))));
    }

    #[test]
    fn cache_clear_removes_file() {
        let ws = Workspace::new();
        ws.cmd().args(["locate", "config", "db"]).assert().success();

        ws.cmd()
            .args(["cache", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cleared"));

        assert_eq!(fs::read_dir(ws.path("cache")).unwrap().count(), 0);
    }

    #[test]
    fn cache_path_is_in_cache_dir() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["cache", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains(".pathcache"))
            .stdout(predicate::str::contains(shown(&ws.path("cache"))));
    }

    #[test]
    fn list_concatenates_roots() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["list", "config", "--filter", "*.php"])
            .assert()
            .success()
            .stdout(predicate::str::contains(shown(&ws.path("app/config/app.php"))))
            .stdout(predicate::str::contains(shown(&ws.path("core/config/db.php"))));
    }

    #[test]
    fn list_rejects_bad_filter() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["list", "config", "--filter", "["])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid file filter"));
    }

    #[test]
    fn config_path() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[resolver]"))
            .stdout(predicate::str::contains(".php"));
    }

    #[test]
    fn local_config_is_merged() {
        let ws = Workspace::new();
        fs::write(
            ws.path(".cascade.toml"),
            "[resolver]\ndefault_extension = \".tpl\"\n",
        )
        .unwrap();

        cascade()
            .arg("--config")
            .arg(ws.config_path())
            .args(["config", "show"])
            .current_dir(ws.path(""))
            .assert()
            .success()
            .stdout(predicate::str::contains(".tpl"));
    }
}
