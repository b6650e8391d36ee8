use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SQL_INJECTION: &str = r#"{
    "id": "1",
    "category": "sast",
    "message": "SQL query built from user-controlled sources",
    "description": "Building a SQL query from user-controlled sources is vulnerable to insertion of malicious SQL code by the user.",
    "severity": "High",
    "confidence": "Low",
    "scanner": {"id": "codeql", "name": "CodeQL"},
    "location": {"file": "app/views.py", "start_line": 42, "end_line": 44},
    "identifiers": [
        {"type": "codeql_query_id", "name": "py/sql-injection", "value": "py/sql-injection"},
        {"type": "cwe", "name": "CWE-89", "value": "89"}
    ]
}"#;

fn agent() -> Command {
    let mut cmd = Command::cargo_bin("codeql-agent").unwrap();
    cmd.env("CLICOLOR", "0")
        .env_remove("CLICOLOR_FORCE")
        .env_remove("RUST_LOG")
        .env_remove("CODEQL_AGENT_CONFIG");
    cmd
}

fn write_report(source: &Path, body: &str) {
    let dir = source.join("codeql-agent-results");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("gl-sast-report.json"), body).unwrap();
}

fn finding(message: &str, severity: &str, rule: &str) -> String {
    format!(
        r#"{{"message":"{}","description":"d","severity":"{}","confidence":"Medium",
           "location":{{"file":"src/main.c","start_line":1,"end_line":1}},
           "identifiers":[{{"type":"codeql_query_id","name":"{}","value":"{}"}}]}}"#,
        message, severity, rule, rule
    )
}

#[test]
fn test_missing_sourcecode_fails_without_work() {
    let temp_dir = TempDir::new().unwrap();

    agent()
        .current_dir(temp_dir.path())
        .args(["--language", "python"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("--sourcecode parameter is required!"));
}

#[test]
fn test_sourcecode_must_be_directory() {
    let temp_dir = TempDir::new().unwrap();

    agent()
        .arg("--sourcecode")
        .arg(temp_dir.path().join("missing"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("is not a directory"));
}

#[test]
fn test_report_only_renders_finding() {
    let temp_dir = TempDir::new().unwrap();
    write_report(
        temp_dir.path(),
        &format!(r#"{{"version":"15.0.0","vulnerabilities":[{}]}}"#, SQL_INJECTION),
    );

    agent()
        .arg("--sourcecode")
        .arg(temp_dir.path())
        .arg("--report-only")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[*] Message: SQL query built from user-controlled sources",
        ))
        .stdout(predicate::str::contains("[*] Severity: High"))
        .stdout(predicate::str::contains("[*] Confidence: Low"))
        .stdout(predicate::str::contains(
            "[*] Location (file:startline:endline): app/views.py:42:44",
        ))
        .stdout(predicate::str::contains("[*] Identifiers: py/sql-injection"))
        .stdout(predicate::str::contains("CWE-89").not())
        .stdout(predicate::str::contains("1 vulnerabilities reported (1 high)"));
}

#[test]
fn test_piped_output_has_no_color_codes() {
    let temp_dir = TempDir::new().unwrap();
    write_report(
        temp_dir.path(),
        &format!(r#"{{"vulnerabilities":[{}]}}"#, SQL_INJECTION),
    );

    // stdout is a pipe here, so colors stay off without CLICOLOR=0
    agent()
        .env_remove("CLICOLOR")
        .env_remove("NO_COLOR")
        .arg("--sourcecode")
        .arg(temp_dir.path())
        .arg("--report-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("[*] Severity: High"))
        .stdout(predicate::str::contains("\u{1b}[").not());
}

#[test]
fn test_report_only_preserves_order() {
    let temp_dir = TempDir::new().unwrap();
    write_report(
        temp_dir.path(),
        &format!(
            r#"{{"vulnerabilities":[{},{},{}]}}"#,
            finding("first", "Low", "c/first"),
            finding("second", "Critical", "c/second"),
            finding("third", "Medium", "c/third"),
        ),
    );

    let output = agent()
        .arg("--sourcecode")
        .arg(temp_dir.path())
        .arg("--report-only")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let first = stdout.find("c/first").unwrap();
    let second = stdout.find("c/second").unwrap();
    let third = stdout.find("c/third").unwrap();
    assert!(first < second && second < third);
}

#[test]
fn test_missing_report_is_fatal() {
    let temp_dir = TempDir::new().unwrap();

    agent()
        .arg("--sourcecode")
        .arg(temp_dir.path())
        .arg("--report-only")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Failed to read report"));
}

#[test]
fn test_invalid_report_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    write_report(temp_dir.path(), "{\"vulnerabilities\": [");

    agent()
        .arg("--sourcecode")
        .arg(temp_dir.path())
        .arg("--report-only")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Failed to parse report"));
}

#[test]
fn test_finding_without_identifiers_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    write_report(
        temp_dir.path(),
        r#"{"vulnerabilities":[{"message":"m","severity":"High","identifiers":[]}]}"#,
    );

    agent()
        .arg("--sourcecode")
        .arg(temp_dir.path())
        .arg("--report-only")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Malformed finding #0"));
}

#[test]
fn test_missing_configuration_stops_before_launch() {
    let temp_dir = TempDir::new().unwrap();

    agent()
        .current_dir(temp_dir.path())
        .arg("--sourcecode")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to read configuration"));
}

#[test]
fn test_blank_configuration_field_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("agent.json");
    fs::write(
        &config,
        r#"{"container_name":"","name":"agent","docker_working_dir":"/src","docker_results_dir":"/res"}"#,
    )
    .unwrap();

    agent()
        .arg("--sourcecode")
        .arg(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("'container_name' must not be empty"));
}
