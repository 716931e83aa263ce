use predicates::str::contains;
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

fn write_temp_config(contents: &str, extension: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be available")
        .as_nanos();
    path.push(format!("ward-config-{}.{}", nanos, extension));
    fs::write(&path, contents).expect("config write should succeed");
    path
}

#[test]
fn config_file_toml_runs() {
    let config = r#"
seed = 3

[resources]
physicians = 2
recovery_rooms = 6
incubators = 4

[horizon]
duration_min = 14400.0
warmup_min = 1440.0
"#;
    let path = write_temp_config(config, "toml");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ward-sim");
    cmd.args(["run", "--config", path.to_str().unwrap(), "--format", "summary"]);
    cmd.assert()
        .success()
        .stdout(contains(
            "Metadata:\nresources: G2_SC1_SR6_I4\nseed: 3\nhorizon_min: 14400.00\nwarmup_min: 1440.00\n",
        ));
}

#[test]
fn config_file_json_runs() {
    let config = r#"{
  "seed": 9,
  "resources": { "physicians": 1, "consult_rooms": 2, "recovery_rooms": 3, "incubators": 2 },
  "horizon": { "duration_min": 7200.0, "warmup_min": 0.0 }
}"#;
    let path = write_temp_config(config, "json");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ward-sim");
    cmd.args(["run", "--config", path.to_str().unwrap(), "--format", "json"]);
    cmd.assert()
        .success()
        .stdout(contains("\"seed\": 9,\n"))
        .stdout(contains("\"consult_rooms\": 2.0"))
        .stdout(contains("\"effective_min\": 7200.0"));
}

#[test]
fn flags_override_config_file() {
    let config = r#"
seed = 3

[resources]
physicians = 2
recovery_rooms = 6
incubators = 4
"#;
    let path = write_temp_config(config, "toml");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ward-sim");
    cmd.args([
        "show-config",
        "--config",
        path.to_str().unwrap(),
        "--physicians",
        "5",
        "--seed",
        "11",
    ]);
    cmd.assert()
        .success()
        .stdout(contains("Resources: G5_SC1_SR6_I4\nSeed: 11\n"));
}

#[test]
fn unsupported_extension_fails() {
    let path = write_temp_config("seed = 1", "ini");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ward-sim");
    cmd.args(["run", "--config", path.to_str().unwrap()]);
    cmd.assert()
        .failure()
        .stderr(contains("Error: unsupported config format 'ini'"));
}

#[test]
fn malformed_toml_fails() {
    let path = write_temp_config("[resources\nphysicians = 2", "toml");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ward-sim");
    cmd.args(["run", "--config", path.to_str().unwrap()]);
    cmd.assert()
        .failure()
        .stderr(contains("Error: failed to parse TOML"));
}

#[test]
fn missing_config_file_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ward-sim");
    cmd.args(["run", "--config", "/nonexistent/ward.toml"]);
    cmd.assert()
        .failure()
        .stderr(contains("Error: failed to read config '/nonexistent/ward.toml'"));
}
