use assert_cmd::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const GET_FN: &str = "<?php\nfunction get(){ return ['a'=>1]; }\n";

fn json_stdout(output: &std::process::Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout)
        .unwrap_or_else(|err| panic!("stdout is not JSON ({err}):\n{stdout}"))
}

#[test]
fn reports_missing_key_and_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let src = temp.path().join("src");
    fs::create_dir(&src)?;
    fs::write(src.join("get.php"), GET_FN)?;
    let config = temp.path().join("rule.json");
    fs::write(&config, r#"{"expected_keys": ["a", "b"], "target_scopes": []}"#)?;

    let output = Command::cargo_bin("wpcc-ast-check")?
        .arg("--paths")
        .arg(&src)
        .arg("--config")
        .arg(&config)
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    let json = json_stdout(&output);
    assert_eq!(json["scan_type"], "ast-check");
    assert_eq!(json["rule"], "return-array-shape");
    assert_eq!(json["files_scanned"], 1);
    assert_eq!(json["findings"].as_array().unwrap().len(), 1);
    assert_eq!(json["findings"][0]["id"], "ast-001-missing-keys");
    let message = json["findings"][0]["message"].as_str().unwrap();
    assert!(message.ends_with("missing expected keys: b"), "{message}");
    Ok(())
}

#[test]
fn satisfied_config_exits_zero() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let file = temp.path().join("get.php");
    fs::write(&file, GET_FN)?;
    let config = temp.path().join("rule.json");
    fs::write(&config, r#"{"expected_keys": ["a"]}"#)?;

    let output = Command::cargo_bin("wpcc-ast-check")?
        .arg("--paths")
        .arg(&file)
        .arg("--config")
        .arg(&config)
        .output()?;

    assert_eq!(output.status.code(), Some(0));
    let json = json_stdout(&output);
    assert_eq!(json["findings"], serde_json::json!([]));
    assert_eq!(json["shapes"][0]["keys"], serde_json::json!(["a"]));
    Ok(())
}

#[test]
fn parse_errors_do_not_fail_the_run() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let good = temp.path().join("good.php");
    let bad = temp.path().join("bad.php");
    fs::write(&good, GET_FN)?;
    fs::write(&bad, "<?php\nclass {\n")?;
    let paths = format!("{},{}", bad.display(), good.display());

    let output = Command::cargo_bin("wpcc-ast-check")?
        .args(["--paths", &paths])
        .output()?;

    assert_eq!(output.status.code(), Some(0));
    let json = json_stdout(&output);
    assert_eq!(json["files_scanned"], 2);
    assert_eq!(json["errors"].as_array().unwrap().len(), 1);
    assert_eq!(json["shapes"].as_array().unwrap().len(), 1);
    Ok(())
}

#[test]
fn missing_paths_warn_and_no_files_exit_one() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let absent = temp.path().join("absent");

    let output = Command::cargo_bin("wpcc-ast-check")?
        .arg("--paths")
        .arg(&absent)
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Warning: Path not found:"), "{stderr}");
    assert!(stderr.contains("Error: No PHP files found to scan."), "{stderr}");
    assert!(output.stdout.is_empty());
    Ok(())
}

#[test]
fn missing_paths_argument_prints_usage() -> Result<(), Box<dyn std::error::Error>> {
    let output = Command::cargo_bin("wpcc-ast-check")?.output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--paths"));

    let help = Command::cargo_bin("wpcc-ast-check")?.arg("--help").output()?;
    assert_eq!(help.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&help.stdout).contains("--paths"));
    Ok(())
}

#[test]
fn text_output_lists_shapes() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let file = temp.path().join("get.php");
    fs::write(&file, GET_FN)?;

    let output = Command::cargo_bin("wpcc-ast-check")?
        .arg("--paths")
        .arg(&file)
        .args(["--output", "text"])
        .output()?;

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Files scanned: 1"), "{stdout}");
    assert!(stdout.contains("get.php:2 - get"), "{stdout}");
    assert!(stdout.contains("Keys: [a]"), "{stdout}");
    Ok(())
}

#[test]
fn unknown_rule_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let file = temp.path().join("get.php");
    fs::write(&file, GET_FN)?;

    let output = Command::cargo_bin("wpcc-ast-check")?
        .arg("--paths")
        .arg(&file)
        .args(["--rule", "no-such-rule"])
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown rule"));
    Ok(())
}

#[test]
fn usage_errors_exit_one() -> Result<(), Box<dyn std::error::Error>> {
    let output = Command::cargo_bin("wpcc-ast-check")?.arg("--paths").output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--paths"));

    let temp = tempdir()?;
    let file = temp.path().join("get.php");
    fs::write(&file, GET_FN)?;
    let output = Command::cargo_bin("wpcc-ast-check")?
        .arg("--paths")
        .arg(&file)
        .args(["--output", "xml"])
        .output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let version = Command::cargo_bin("wpcc-ast-check")?.arg("--version").output()?;
    assert_eq!(version.status.code(), Some(0));
    Ok(())
}

#[cfg(unix)]
#[test]
fn scans_symlinked_files_inside_directories() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let real = temp.path().join("real.php");
    fs::write(&real, GET_FN)?;
    let src = temp.path().join("src");
    fs::create_dir(&src)?;
    std::os::unix::fs::symlink(&real, src.join("link.php"))?;

    let output = Command::cargo_bin("wpcc-ast-check")?
        .arg("--paths")
        .arg(&src)
        .output()?;

    assert_eq!(output.status.code(), Some(0));
    let json = json_stdout(&output);
    assert_eq!(json["files_scanned"], 1);
    assert!(json["shapes"][0]["file"].as_str().unwrap().ends_with("real.php"));
    Ok(())
}

#[test]
fn verbose_logs_are_plain_when_piped() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let file = temp.path().join("get.php");
    fs::write(&file, GET_FN)?;

    let output = Command::cargo_bin("wpcc-ast-check")?
        .arg("--paths")
        .arg(&file)
        .arg("-vv")
        .output()?;

    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("scan complete"), "{stderr}");
    assert!(!stderr.contains('\u{1b}'), "{stderr:?}");
    Ok(())
}
