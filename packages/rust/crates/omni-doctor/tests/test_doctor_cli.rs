//! Integration tests for the `doctor` CLI binary.

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write_file(path: &Path, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn doctor_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_doctor"));
    cmd.env_remove("OMNI_DOCTOR_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn setup_workspace() -> Result<TempDir, Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    write_file(
        &tmp.path().join("workspace.yaml"),
        "vaults:\n  - name: vault1\n    fs_path: vault1\n  - name: vault2\n    fs_path: vault2\n",
    )?;
    write_file(
        &tmp.path().join("vault1/foo.md"),
        "# Foo Header\n[[foo.bar]] [[dendron://vault2/baz]]\n",
    )?;
    write_file(&tmp.path().join("vault2/other.md"), "# Other\n")?;
    Ok(tmp)
}

fn run_json(cmd: &mut Command) -> Result<Value, Box<dyn std::error::Error>> {
    let output = cmd.output()?;
    assert!(
        output.status.success(),
        "doctor failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout)?;
    Ok(serde_json::from_str(&stdout)?)
}

#[test]
fn test_doctor_vaults_lists_configuration() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = setup_workspace()?;

    let payload = run_json(doctor_cmd().arg("--root").arg(tmp.path()).arg("vaults"))?;

    let names: Vec<&str> = payload["vaults"]
        .as_array()
        .ok_or("vaults is not an array")?
        .iter()
        .filter_map(|vault| vault["name"].as_str())
        .collect();
    assert_eq!(names, vec!["vault1", "vault2"]);
    Ok(())
}

#[test]
fn test_doctor_run_heading_shift() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = setup_workspace()?;

    let payload = run_json(
        doctor_cmd()
            .arg("--root")
            .arg(tmp.path())
            .args(["run", "--action", "heading-shift", "--candidate", "foo"]),
    )?;

    assert_eq!(payload["action"], "heading-shift");
    assert_eq!(payload["modified_count"], 1);
    assert_eq!(payload["outcomes"]["vault1/foo"]["status"], "modified");
    let on_disk = fs::read_to_string(tmp.path().join("vault1/foo.md"))?;
    assert!(on_disk.contains("## Foo Header"));
    let other = fs::read_to_string(tmp.path().join("vault2/other.md"))?;
    assert_eq!(other, "# Other\n");
    Ok(())
}

#[test]
fn test_doctor_run_create_missing_links() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = setup_workspace()?;

    let payload = run_json(doctor_cmd().arg("--root").arg(tmp.path()).args([
        "run",
        "--action",
        "create-missing-links",
        "--candidate",
        "dendron://vault1/foo",
    ]))?;

    assert_eq!(payload["created_count"], 2);
    assert_eq!(payload["outcomes"]["vault1/foo.bar"]["status"], "created");
    assert_eq!(payload["outcomes"]["vault2/baz"]["title"], "Baz");
    assert!(tmp.path().join("vault1/foo.bar.md").is_file());
    assert!(tmp.path().join("vault2/baz.md").is_file());
    Ok(())
}

#[test]
fn test_doctor_bad_candidates_are_skipped_not_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = setup_workspace()?;

    let payload = run_json(doctor_cmd().arg("--root").arg(tmp.path()).args([
        "run",
        "--action",
        "create-missing-links",
        "--candidate",
        "foo",
        "--candidate",
        "dendron://nowhere/x",
        "--candidate",
        "a/b",
    ]))?;

    assert_eq!(payload["created_count"], 2);
    assert_eq!(payload["skipped_count"], 2);
    assert_eq!(payload["outcomes"]["nowhere/x"]["status"], "skipped");
    assert_eq!(payload["outcomes"]["vault1/a/b"]["status"], "skipped");
    assert!(tmp.path().join("vault1/foo.bar.md").is_file());
    assert!(tmp.path().join("vault2/baz.md").is_file());
    Ok(())
}

#[test]
fn test_doctor_dry_run_from_config_override() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = setup_workspace()?;
    let conf = tmp.path().join("override.yaml");
    write_file(&conf, "doctor:\n  dry_run: true\n")?;

    let payload = run_json(
        doctor_cmd()
            .arg("--root")
            .arg(tmp.path())
            .arg("--conf")
            .arg(&conf)
            .args(["run", "--action", "create-missing-links", "--candidate", "foo"]),
    )?;

    assert_eq!(payload["dry_run"], true);
    assert_eq!(payload["created_count"], 2);
    assert!(!tmp.path().join("vault1/foo.bar.md").exists());
    Ok(())
}

#[test]
fn test_doctor_rejects_unknown_action() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = setup_workspace()?;

    let output = doctor_cmd()
        .arg("--root")
        .arg(tmp.path())
        .args(["run", "--action", "h1ToH2"])
        .output()?;

    assert!(!output.status.success());
    Ok(())
}

#[test]
fn test_doctor_fails_without_vaults() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;

    let output = doctor_cmd()
        .arg("--root")
        .arg(tmp.path())
        .args(["run", "--action", "heading-shift"])
        .output()?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no vaults"), "unexpected stderr: {stderr}");
    Ok(())
}
