use predicates::str::contains;

const SHORT_RUN: [&str; 14] = [
    "run",
    "--physicians",
    "2",
    "--recovery-rooms",
    "5",
    "--incubators",
    "3",
    "--seed",
    "42",
    "--horizon-days",
    "20",
    "--warmup-days",
    "2",
    "--format",
];

fn run_stdout(format: &str) -> String {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ward-sim");
    cmd.args(SHORT_RUN).arg(format);
    let output = cmd.output().expect("binary should run");
    assert!(output.status.success());
    String::from_utf8(output.stdout).expect("utf-8 output")
}

#[test]
fn summary_starts_with_metadata() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ward-sim");
    cmd.args(SHORT_RUN).arg("summary");
    cmd.assert()
        .success()
        .stdout(contains(
            "Metadata:\nresources: G2_SC1_SR5_I3\nseed: 42\nhorizon_min: 28800.00\nwarmup_min: 2880.00\nwindow_min: 25920.00\n",
        ))
        .stdout(contains("Summary:\nwait_overall_min: "))
        .stdout(contains("installation_cost: 0.00\n"));
}

#[test]
fn seeded_runs_are_reproducible() {
    assert_eq!(run_stdout("json"), run_stdout("json"));
    assert_eq!(run_stdout("human"), run_stdout("human"));
}

#[test]
fn json_record_is_flat_and_complete() {
    let json = run_stdout("json");
    for key in [
        "\"wait_consultation_min\"",
        "\"wait_natural_birth_min\"",
        "\"wait_cesarean_min\"",
        "\"physician_utilization_pct\"",
        "\"theater_utilization_pct\"",
        "\"recovery_idle_pct_000\"",
        "\"recovery_idle_pct_004\"",
        "\"recovery_diversion_pct\"",
        "\"incubator_diversion_pct\"",
        "\"monthly_operating_cost\"",
        "\"installation_cost\"",
        "\"effective_min\": 25920.0",
    ] {
        assert!(json.contains(key), "missing {key}");
    }
    assert!(!json.contains("recovery_idle_pct_005"));
}

#[test]
fn human_output_lists_sections() {
    let out = run_stdout("human");
    for section in [
        "Waits (min):\n",
        "Utilization (%):\n",
        "Recovery idle (%):\n",
        "Diversions (%):\n",
        "Counts:\n",
        "Costs:\n",
    ] {
        assert!(out.contains(section), "missing {section}");
    }
    assert!(out.contains("room 4: "));
}

#[test]
fn logs_go_to_stderr_only() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ward-sim");
    cmd.args(SHORT_RUN).args(["json", "--log-level", "info"]);
    cmd.assert()
        .success()
        .stderr(contains("simulation finished"))
        .stdout(contains("\"arrivals\""));
}

#[test]
fn json_seed_is_written_as_an_exact_integer() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ward-sim");
    cmd.args([
        "run",
        "--seed",
        "18446744073709551614",
        "--horizon-days",
        "2",
        "--warmup-days",
        "0",
        "--format",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(contains("\"seed\": 18446744073709551614,\n"));
}
