use std::path::Path;
use std::process::Command;

fn jarvet_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_jarvet"))
}

const CIRCULAR_SNAPSHOT: &str = r#"[
  {
    "name": "a.jar",
    "kind": "jar",
    "provides": {"com.a.A": null},
    "requires": ["com.b.B"],
    "locations": ["lib/a.jar"]
  },
  {
    "name": "b.jar",
    "kind": "jar",
    "provides": {"com.b.B": 42},
    "requires": ["com.a.A"],
    "locations": ["lib/b.jar"]
  }
]"#;

const CLEAN_SNAPSHOT: &str = r#"[
  {
    "name": "core.jar",
    "kind": "jar",
    "provides": {"com.core.Api": null},
    "requires": []
  },
  {
    "name": "app.jar",
    "kind": "jar",
    "provides": {"com.app.Main": null},
    "requires": ["com.core.Api"]
  }
]"#;

fn write_snapshot(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("snapshot.json");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_analyze_circular_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), CIRCULAR_SNAPSHOT);

    let output = jarvet_cmd()
        .args(["analyze", snapshot.to_str().unwrap()])
        .output()
        .expect("failed to run jarvet analyze");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "jarvet analyze failed: stdout={stdout}, stderr={stderr}"
    );
    assert!(stdout.contains("Findings"), "should list findings: {stdout}");
    assert!(
        stdout.contains("Circular dependencies"),
        "should flag the cycle: {stdout}"
    );
    assert!(stdout.contains("a.jar"), "should name the archive: {stdout}");
}

#[test]
fn test_analyze_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), CIRCULAR_SNAPSHOT);

    let output = jarvet_cmd()
        .args(["analyze", snapshot.to_str().unwrap(), "--format", "json"])
        .output()
        .expect("failed to run jarvet analyze --format json");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(parsed["archive_count"], 2);
    assert!(parsed["circular"]["a.jar"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("b.jar")));
}

#[test]
fn test_analyze_dot_output() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), CLEAN_SNAPSHOT);

    let output = jarvet_cmd()
        .args(["analyze", snapshot.to_str().unwrap(), "--format", "dot"])
        .output()
        .expect("failed to run jarvet analyze --format dot");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("digraph archives {"), "{stdout}");
    assert!(stdout.contains("n_app_jar -> n_core_jar"), "{stdout}");
}

#[test]
fn test_check_fails_on_circular() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), CIRCULAR_SNAPSHOT);

    let output = jarvet_cmd()
        .args(["check", snapshot.to_str().unwrap(), "--fail-on", "error"])
        .output()
        .expect("failed to run jarvet check");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        output.status.code(),
        Some(1),
        "expected exit code 1 for circular dependency: {stdout}"
    );
    assert!(stdout.contains("CHECK FAILED"), "{stdout}");
}

#[test]
fn test_check_passes_on_clean_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), CLEAN_SNAPSHOT);

    // app.jar is unused (warning), so only fail on errors
    let output = jarvet_cmd()
        .args(["check", snapshot.to_str().unwrap(), "--fail-on", "error"])
        .output()
        .expect("failed to run jarvet check");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "check should pass without errors: {stdout}"
    );
    assert!(stdout.contains("CHECK PASSED"), "{stdout}");
}

#[test]
fn test_check_respects_suppression_filter() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), CIRCULAR_SNAPSHOT);
    std::fs::write(
        dir.path().join(".jarvet.toml"),
        "[filters]\ncircular = \"a.jar,b.jar\"\n",
    )
    .unwrap();

    let output = jarvet_cmd()
        .args(["check", snapshot.to_str().unwrap(), "--fail-on", "error"])
        .output()
        .expect("failed to run jarvet check");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "suppressed cycle should not fail the check: {stdout}"
    );
}

#[test]
fn test_classification_against_profile_data() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("snapshot.json");
    std::fs::write(
        &snapshot,
        r#"[
  {
    "name": "app.jar",
    "kind": "jar",
    "provides": {"javax.servlet.Servlet": null, "com.app.Main": null},
    "requires": []
  }
]"#,
    )
    .unwrap();

    std::fs::write(
        dir.path().join("javaee5.clz"),
        "servlet-api.jar=\njavax.servlet.Servlet\njavax.servlet.ServletContext\n",
    )
    .unwrap();

    let config = format!(
        r#"
[[profiles]]
code = "javaee5"
path = "{}"

[classifiers.jdk_ee]
profiles = ["javaee5"]
red = 6
yellow = 2
"#,
        dir.path().join("javaee5.clz").display()
    );
    std::fs::write(dir.path().join(".jarvet.toml"), config).unwrap();

    let output = jarvet_cmd()
        .args(["analyze", snapshot.to_str().unwrap(), "--format", "json"])
        .output()
        .expect("failed to run jarvet analyze");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stdout={stdout}, stderr={stderr}");

    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let problems = parsed["jdk_ee_classes"].as_array().unwrap();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0]["archive"], "app.jar");
    assert_eq!(problems[0]["profiles"][0], "javaee5");
    assert!(problems[0]["origins"]["javaee5"]["servlet-api.jar"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("javax.servlet.Servlet")));
}

#[test]
fn test_missing_profile_data_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), CLEAN_SNAPSHOT);
    std::fs::write(
        dir.path().join(".jarvet.toml"),
        "[classifiers.platform]\nprofiles = [\"eap512\"]\nred = 10\nyellow = 5\n",
    )
    .unwrap();

    let output = jarvet_cmd()
        .args(["analyze", snapshot.to_str().unwrap()])
        .output()
        .expect("failed to run jarvet analyze");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(2), "{stderr}");
    assert!(stderr.contains("eap512"), "{stderr}");
}

#[test]
fn test_malformed_archive_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("snapshot.json");
    std::fs::write(
        &snapshot,
        r#"[
  {
    "name": "bad.jar",
    "kind": "jar",
    "provides": {"com.bad.B": null},
    "children": [{"name": "inner.jar", "kind": "jar", "provides": {"com.i.I": null}}]
  },
  {
    "name": "good.jar",
    "kind": "jar",
    "provides": {"com.g.G": null}
  }
]"#,
    )
    .unwrap();

    let output = jarvet_cmd()
        .args(["analyze", snapshot.to_str().unwrap()])
        .output()
        .expect("failed to run jarvet analyze");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "partial result expected: {stderr}");
    assert!(stderr.contains("bad.jar"), "{stderr}");
    assert!(stdout.contains("1 skipped"), "{stdout}");
}

#[test]
fn test_init_creates_config() {
    let dir = tempfile::tempdir().unwrap();
    let output = jarvet_cmd()
        .args(["init"])
        .current_dir(dir.path())
        .output()
        .expect("failed to run jarvet init");

    assert!(output.status.success(), "init should succeed");

    let config_path = dir.path().join(".jarvet.toml");
    assert!(config_path.exists(), ".jarvet.toml should be created");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[filters]"), "should contain [filters]");
    assert!(
        content.contains("[classifiers.platform]"),
        "should contain classifier section"
    );
}

#[test]
fn test_init_refuses_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".jarvet.toml"), "existing").unwrap();

    let output = jarvet_cmd()
        .args(["init"])
        .current_dir(dir.path())
        .output()
        .expect("failed to run jarvet init");

    assert!(!output.status.success(), "init should fail when file exists");
}
