use assert_cmd::Command;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, content).expect("write");
}

fn poolgen() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("poolgen").expect("poolgen binary");
    cmd.env_remove("POOLGEN_ROOT").env_remove("RUST_LOG");
    cmd
}

/// Framework root with poolgen.toml, one module and a project importing it.
fn framework() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "poolgen.toml", "[logging]\nlevel = \"error\"\n");
    write(
        dir.path(),
        "modules/base/partner.rs",
        "use pool;\n\n#[model]\npub struct Partner {\n    pub name: String,\n    pub parent: Option<pool::Partner>,\n}\n",
    );
    write(dir.path(), "project/config/imports.rs", "use modules::base;\n");
    dir
}

#[test]
fn test_help_lists_flags() {
    poolgen()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--test"))
        .stdout(predicate::str::contains("--empty"))
        .stdout(predicate::str::contains("PROJECT_DIR"));
}

#[test]
fn test_empty_pool_with_explicit_root() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "pool/stale.rs", "pub struct Stale;\n");

    poolgen()
        .arg("--empty")
        .arg("--root")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let names: Vec<String> = fs::read_dir(dir.path().join("pool"))
        .expect("read pool")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["temp.rs"]);
}

#[test]
fn test_full_run_detects_root_and_writes_report() {
    let dir = framework();
    let report_path = dir.path().join("out").join("report.json");

    poolgen()
        .current_dir(dir.path())
        .arg("project")
        .arg("--report-json")
        .arg(&report_path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Poolgen Generate\n"))
        .stdout(predicate::str::contains("Project package found: config."))
        .stdout(predicate::str::ends_with("Pool generated successfully\n"));

    assert!(dir.path().join("pool/partner.rs").is_file());
    assert!(dir.path().join("pool/registry.rs").is_file());

    let content = fs::read_to_string(&report_path).expect("report");
    let json: serde_json::Value = serde_json::from_str(&content).expect("json");
    assert_eq!(json["package"], "config");
    assert_eq!(json["models"][0], "Partner");
    assert!(json["digest"].is_string());
}

#[test]
fn test_environment_root_is_used() {
    let dir = framework();

    poolgen()
        .env("POOLGEN_ROOT", dir.path())
        .arg("--test")
        .arg(dir.path().join("modules/base"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Pool generated successfully"));

    assert!(dir.path().join("pool/partner.rs").is_file());
}

#[test]
fn test_missing_root_suggests_fix() {
    let dir = TempDir::new().expect("tempdir");

    poolgen()
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("Suggestion:"));
}

#[rstest]
#[case("missing-project")]
#[case("project/nested")]
fn test_unresolvable_project_fails(#[case] project: &str) {
    let dir = framework();

    poolgen()
        .arg("--root")
        .arg(dir.path())
        .arg(dir.path().join(project))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Generation failed"));

    assert!(dir.path().join("pool/temp.rs").is_file());
    assert!(!dir.path().join("pool/partner.rs").exists());
}
